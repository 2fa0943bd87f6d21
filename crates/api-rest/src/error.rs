//! REST error mapping.
//!
//! Storage failures are split into client-class responses, which carry a descriptive message,
//! and server-class responses, which are logged in full and answered generically. No message
//! sent to a client contains an absolute filesystem path.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use stash_files::FilesError;
use utoipa::ToSchema;

/// JSON body returned with every error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    /// Stable machine-readable error code
    pub error: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("multipart field 'file' is missing")]
    MissingFile,
    #[error("multipart stream failed: {message}")]
    Multipart { status: StatusCode, message: String },
    #[error(transparent)]
    Files(FilesError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<FilesError> for ApiError {
    /// A write that failed because the request body itself failed (size limit, client abort)
    /// is reported with the multipart error's status rather than as a storage fault.
    fn from(err: FilesError) -> Self {
        if let FilesError::StorageWrite { source, .. } = &err {
            if let Some(multipart) = source
                .get_ref()
                .and_then(|inner| inner.downcast_ref::<MultipartError>())
            {
                return ApiError::from_multipart(multipart);
            }
        }
        ApiError::Files(err)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::from_multipart(&err)
    }
}

impl ApiError {
    fn from_multipart(err: &MultipartError) -> Self {
        ApiError::Multipart {
            status: err.status(),
            message: err.body_text(),
        }
    }

    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::MissingFile => (
                StatusCode::BAD_REQUEST,
                "missing_file",
                "Multipart field 'file' is required.".into(),
            ),
            ApiError::Multipart { status, message } => {
                (*status, "invalid_multipart", message.clone())
            }
            ApiError::Files(FilesError::EmptyInput) => (
                StatusCode::BAD_REQUEST,
                "empty_file",
                "File is empty. Please select a file to upload.".into(),
            ),
            ApiError::Files(FilesError::PathEscape(_)) => (
                StatusCode::BAD_REQUEST,
                "invalid_path",
                "Requested name is not a valid stored file name.".into(),
            ),
            ApiError::Files(FilesError::NotFound(name)) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("No file stored as {name}."),
            ),
            ApiError::Files(
                FilesError::StorageWrite { .. }
                | FilesError::StorageInit { .. }
                | FilesError::InternalPath(_),
            ) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                "Could not store the file.".into(),
            ),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal error".into(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!("{code}: {:?}", self);
        } else {
            tracing::info!("{code}: {}", self);
        }

        (
            status,
            Json(ErrorRes {
                error: code.into(),
                message,
            }),
        )
            .into_response()
    }
}
