use assetry_pipeline::AssetError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("file record not found: {0}")]
    RecordNotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("metadata store error: {0}")]
    Metadata(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::RecordNotFound(_) => (StatusCode::NOT_FOUND, "RECORD_NOT_FOUND"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Asset(e) => match e {
                AssetError::MissingField(_) => (StatusCode::BAD_REQUEST, "MISSING_FIELD"),
                AssetError::SizeExceeded { .. } => (StatusCode::FORBIDDEN, "FILE_TOO_LARGE"),
                AssetError::UnsupportedMediaType(_) => {
                    (StatusCode::FORBIDDEN, "UNSUPPORTED_MEDIA_TYPE")
                }
                AssetError::NotFound(_) => (StatusCode::NOT_FOUND, "FILE_NOT_FOUND"),
                AssetError::UploadInterrupted(_) => (StatusCode::BAD_REQUEST, "UPLOAD_INTERRUPTED"),
                AssetError::StorageFailure(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR")
                }
                AssetError::DerivationFailure(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "THUMBNAIL_ERROR")
                }
            },
            Self::Metadata(_) => (StatusCode::INTERNAL_SERVER_ERROR, "METADATA_ERROR"),
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = Json(json!({
            "error": code,
            "message": message,
        }));
        (status, body).into_response()
    }
}
