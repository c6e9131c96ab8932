// ABOUTME: API error responses.
// ABOUTME: Every failure renders as a flat {"error": message} body with a 400, 404 or 500 status.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::images::ImageError;
use crate::registry::RegistryError;

#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    /// Human-readable error message.
    pub error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        if err.is_not_found() {
            ApiError::not_found(err.to_string())
        } else if err.is_client_error() {
            ApiError::bad_request(err.to_string())
        } else {
            tracing::error!(error = %err, "image operation failed");
            ApiError::internal_error(err.to_string())
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        tracing::error!(error = %err, "registry settings unavailable");
        ApiError::internal_error(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        tracing::error!(error = %err, "blocking task failed");
        ApiError::internal_error(err.to_string())
    }
}
