use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::path::PathBuf;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Malformed request data (bad multipart body, unparsable numbers)
    #[error("{message}")]
    BadRequest { message: String },

    /// A client-supplied name would resolve outside the directory it belongs to
    #[error("{name:?} does not resolve inside the upload directory")]
    PathEscape { name: String },

    /// Filesystem failure while creating directories or writing uploads
    #[error("Failed to {operation} at {}: {source}", .path.display())]
    Storage {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },
}

impl Error {
    pub(crate) fn storage(operation: &str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Storage {
            operation: operation.to_string(),
            path: path.into(),
            source,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } | Error::PathEscape { .. } => StatusCode::BAD_REQUEST,
            Error::Storage { .. } | Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking paths or io details
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::PathEscape { name } => format!("Invalid upload path {name:?}"),
            Error::Storage { .. } => "Failed to store the uploaded file".to_string(),
            Error::Internal { .. } => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Storage { .. } | Error::Internal { .. } => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::PathEscape { .. } => {
                tracing::warn!("Rejected upload path: {}", self);
            }
            Error::BadRequest { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        (self.status_code(), self.user_message()).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
