//! OpenAPI documentation for the HTTP surface.

use utoipa::OpenApi;

use crate::api;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "formdrop",
        description = "Stores multipart form uploads in a directory and renders an HTML confirmation."
    ),
    paths(
        api::handlers::upload::upload_form,
        api::handlers::upload::upload_file,
        api::handlers::upload::upload_file_to_directory,
        api::handlers::add::add,
    ),
    tags(
        (name = "upload", description = "Multipart file upload"),
        (name = "add", description = "Sum of two numbers"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_routes() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/upload"));
        assert!(doc.paths.paths.contains_key("/upload/{dir}"));
        assert!(doc.paths.paths.contains_key("/add"));
    }
}
