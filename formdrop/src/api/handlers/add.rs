use crate::api::models::add::AddQuery;
use crate::errors::Result;
use crate::render;
use axum::{extract::Query, response::Html};

#[utoipa::path(
    get,
    path = "/add",
    tag = "add",
    summary = "Add two numbers",
    params(AddQuery),
    responses(
        (status = 200, description = "Page showing `a + b`", content_type = "text/html", body = String),
        (status = 400, description = "An operand is missing or not a number")
    )
)]
pub async fn add(Query(query): Query<AddQuery>) -> Result<Html<String>> {
    let (a, b) = query.operands()?;
    Ok(Html(render::sum(a, b)))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::create_test_app;
    use axum::http::StatusCode;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_add_renders_sum() {
        let root = TempDir::new().unwrap();
        let server = create_test_app(root.path());

        let response = server.get("/add").add_query_param("a", "1").add_query_param("b", "2").await;

        response.assert_status(StatusCode::OK);
        assert!(response.text().contains("<output>1 + 2 = 3</output>"));
    }

    #[tokio::test]
    async fn test_add_rejects_non_number() {
        let root = TempDir::new().unwrap();
        let server = create_test_app(root.path());

        let response = server.get("/add?a=one&b=2").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.text(), "a is not a number");
    }
}
