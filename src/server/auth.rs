//! Token check for the state-changing endpoints.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::server::error::ApiError;
use crate::server::routes::AppState;

/// Header the control panel sends its password in.
pub const AUTH_HEADER: &str = "x-auth-token";

/// Middleware guarding the protected routes. Development mode waves
/// everything through; otherwise the request must present the
/// configured password. An unset password never matches.
pub async fn require_token(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if state.auth.development_mode {
        return next.run(req).await;
    }

    let presented = req
        .headers()
        .get(AUTH_HEADER)
        .and_then(|value| value.to_str().ok());

    match presented {
        Some(token) if !state.auth.password.is_empty() && token == state.auth.password => {
            next.run(req).await
        }
        _ => ApiError::Unauthorized.into_response(),
    }
}
