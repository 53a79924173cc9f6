//! Error responses for the HTTP API.
//!
//! Every variant renders as the `{"status": "error", "message": ...}`
//! envelope the control panel expects, with the status code the
//! original endpoints answered with.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors a handler can answer with directly.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Token missing or wrong on a protected endpoint.
    #[error("Unauthorized")]
    Unauthorized,

    /// Request was malformed; the message names what was missing.
    #[error("{0}")]
    BadRequest(String),

    /// No serial connection to write to.
    #[error("Serial port not available")]
    PortUnavailable,

    /// The write itself failed; the link is likely on its way to the
    /// reconnector.
    #[error("Failed to send command")]
    SendFailed,

    /// Anything else.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PortUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::SendFailed => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "status": "error",
            "message": self.to_string(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}
