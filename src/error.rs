//! Request outcome to HTTP response translation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::io;
use tracing::error;

/// Outcomes a handler can surface to the client.
///
/// `NotFound` and `Conflict` are recognized conditions handled where they
/// occur; everything else is folded into `Internal`, whose detail goes to
/// the log only. The response body is always the bare status phrase.
#[derive(Debug)]
pub enum ApiError {
    NotFound,
    Conflict,
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not Found").into_response(),
            ApiError::Conflict => (StatusCode::CONFLICT, "Conflict").into_response(),
            ApiError::Internal(detail) => {
                error!(error = %detail, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}

impl From<io::Error> for ApiError {
    fn from(err: io::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}
