use crate::AppState;
use crate::api::models::upload::FormSubmission;
use crate::errors::{Error, Result};
use crate::render;
use crate::storage::{Storage, TargetDirectory};
use axum::{
    extract::{Multipart, Path, State, multipart::Field},
    response::Html,
};
use tracing::{debug, info, warn};

#[utoipa::path(
    get,
    path = "/upload",
    tag = "upload",
    summary = "Upload form",
    description = "HTML form that posts `a`, `b` and `file` to the upload handler.",
    responses(
        (status = 200, description = "Upload form", content_type = "text/html", body = String)
    )
)]
pub async fn upload_form() -> Html<String> {
    Html(render::upload_form("/upload"))
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "upload",
    summary = "Upload file",
    description = "Store the `file` part of a multipart form in the default upload directory. \
                   The scalar fields `a` and `b` are accepted but not used.",
    request_body(
        content_type = "multipart/form-data",
        description = "Form with scalar fields `a`, `b` and a `file` part"
    ),
    responses(
        (status = 200, description = "Confirmation page, or a note that no file was sent", content_type = "text/html", body = String),
        (status = 400, description = "Malformed form or a filename that escapes the upload directory"),
        (status = 500, description = "The upload could not be written")
    )
)]
pub async fn upload_file(State(state): State<AppState>, multipart: Multipart) -> Result<Html<String>> {
    receive(&state, None, multipart).await
}

#[utoipa::path(
    post,
    path = "/upload/{dir}",
    tag = "upload",
    summary = "Upload file to a directory",
    description = "Same as `POST /upload`, but the trailing path selects the directory (relative to the storage root). \
                   It is created if missing.",
    params(
        ("dir" = String, Path, description = "Target directory, e.g. `albums/2024`")
    ),
    request_body(
        content_type = "multipart/form-data",
        description = "Form with scalar fields `a`, `b` and a `file` part"
    ),
    responses(
        (status = 200, description = "Confirmation page, or a note that no file was sent", content_type = "text/html", body = String),
        (status = 400, description = "Malformed form, or a directory or filename that escapes the storage root"),
        (status = 500, description = "The directory could not be created or the upload could not be written")
    )
)]
pub async fn upload_file_to_directory(
    State(state): State<AppState>,
    Path(dir): Path<String>,
    multipart: Multipart,
) -> Result<Html<String>> {
    receive(&state, Some(dir.as_str()), multipart).await
}

async fn receive(state: &AppState, requested_dir: Option<&str>, multipart: Multipart) -> Result<Html<String>> {
    let target = state.storage.target_directory(requested_dir).await?;
    let submission = read_submission(&state.storage, &target, multipart).await?;

    // TODO: decide with the form's owner whether the page should show a + b
    debug!(a = ?submission.a, b = ?submission.b, "Scalar form fields");

    Ok(Html(render::upload_result(submission.file.as_ref())))
}

/// Walk the multipart body, streaming the first named `file` part into `target`.
///
/// Unknown fields are skipped. A `file` part without a filename counts as no upload and its body
/// is discarded.
pub async fn read_submission(storage: &Storage, target: &TargetDirectory, mut multipart: Multipart) -> Result<FormSubmission> {
    let mut submission = FormSubmission::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {e}"),
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "a" => submission.a = Some(read_text(field, "a").await?),
            "b" => submission.b = Some(read_text(field, "b").await?),
            "file" => {
                let filename = field.file_name().filter(|name| !name.is_empty()).map(str::to_string);

                match filename {
                    Some(filename) if submission.file.is_none() => {
                        info!(filename = %filename, "Starting file upload stream");
                        submission.file = Some(storage.store(target, &filename, field).await?);
                    }
                    Some(filename) => {
                        warn!(filename = %filename, "Ignoring additional file part");
                    }
                    None => {
                        debug!("File part carried no filename");
                    }
                }
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    Ok(submission)
}

async fn read_text(field: Field<'_>, name: &str) -> Result<String> {
    field.text().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to read {name}: {e}"),
    })
}
