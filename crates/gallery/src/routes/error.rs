use axum::{
    Json,
    extract::{multipart::MultipartError, rejection::PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::photos::PhotoError;

#[derive(Debug)]
pub struct ErrorResponse {
    status: StatusCode,
    message: String,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("photo not found")]
    NotFound,
    #[error("multipart error: {0}")]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Photo(PhotoError),
}

impl From<PhotoError> for RouteError {
    fn from(error: PhotoError) -> Self {
        match error {
            PhotoError::NotFound => RouteError::NotFound,
            other => RouteError::Photo(other),
        }
    }
}

/// Photo ids are integers; anything else cannot name a photo.
impl From<PathRejection> for RouteError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection, "Unroutable photo id");
        RouteError::NotFound
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let response = match &self {
            RouteError::Validation(message) => ErrorResponse::new(StatusCode::BAD_REQUEST, *message),
            RouteError::NotFound => ErrorResponse::new(StatusCode::NOT_FOUND, "Photo not found"),
            RouteError::Multipart(e) => {
                tracing::warn!(error = %e, "Malformed multipart upload");
                ErrorResponse::new(e.status(), "Failed to read uploaded file")
            }
            RouteError::Photo(e) => {
                tracing::error!(error = %e, "Photo error");
                ErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        response.into_response()
    }
}
