use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use common::storage::StorageError;

use crate::gallery::CatalogError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Always `false` for error responses.
    #[schema(example = false)]
    pub success: bool,
    /// Machine-readable error code. One of: `VALIDATION_ERROR`,
    /// `INVALID_CONTENT_TYPE`, `PAYLOAD_TOO_LARGE`, `NOT_FOUND`,
    /// `STORAGE_UNAVAILABLE`, `WRITE_FAILED`, `INTERNAL_ERROR`.
    #[schema(example = "INVALID_CONTENT_TYPE")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Invalid file type. Only images are allowed.")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// Declared content type is not an accepted image MIME type.
    InvalidContentType(String),
    /// Payload exceeds the configured image size limit.
    PayloadTooLarge { actual: u64, limit: u64 },
    NotFound(String),
    /// Storage root is missing or unusable. Detail stays server-side.
    StorageUnavailable(String),
    /// Storage I/O failed. Detail stays server-side.
    WriteFailed(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    success: false,
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::InvalidContentType(declared) => {
                tracing::debug!("rejected upload with content type {declared:?}");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorBody {
                        success: false,
                        code: "INVALID_CONTENT_TYPE",
                        message: "Invalid file type. Only images are allowed.".into(),
                    },
                )
            }
            AppError::PayloadTooLarge { actual, limit } => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    success: false,
                    code: "PAYLOAD_TOO_LARGE",
                    message: format!("File size {actual} exceeds the {limit} byte limit"),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    success: false,
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::StorageUnavailable(detail) => {
                tracing::error!("storage unavailable: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        success: false,
                        code: "STORAGE_UNAVAILABLE",
                        message: "Storage is currently unavailable".into(),
                    },
                )
            }
            AppError::WriteFailed(detail) => {
                tracing::error!("storage write failed: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        success: false,
                        code: "WRITE_FAILED",
                        message: "Failed to store image".into(),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        success: false,
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => AppError::NotFound("Image not found".into()),
            StorageError::SizeLimitExceeded { actual, limit } => {
                AppError::PayloadTooLarge { actual, limit }
            }
            StorageError::Unavailable(detail) => AppError::StorageUnavailable(detail),
            StorageError::Io(e) => AppError::WriteFailed(e.to_string()),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        AppError::Internal(err.to_string())
    }
}
