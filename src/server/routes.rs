//! HTTP surface of the controller.
//!
//! Routes answer in the envelopes the control panel expects: JSON with
//! `status`/`message` fields, a bare array for the log, and HTTP 200
//! for outcomes that are answers rather than server failures (a failed
//! dial, a command the robot never answered).

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::calibration::CalibrationStore;
use crate::config::AuthConfig;
use crate::link::{ExchangeRecord, LinkError, Reply, SerialLink};
use crate::server::error::ApiError;
use crate::server::{assets, auth};

/// Everything the handlers share. Cloned per request by axum.
#[derive(Clone)]
pub struct AppState {
    pub link: SerialLink,
    pub calibration: Arc<CalibrationStore>,
    pub auth: AuthConfig,
    pub static_dir: PathBuf,
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/send", post(send_command))
        .route("/connect", post(connect))
        .route("/log", get(command_log))
        .route("/log/clear", post(clear_log))
        .route("/calibration/save", post(save_calibration))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_token,
        ));

    Router::new()
        .route("/", get(assets::index))
        .route("/status", get(connection_status))
        .route("/ports", get(list_ports))
        .route("/calibration/get", get(load_calibration))
        .merge(protected)
        .fallback(assets::static_file)
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct SendRequest {
    #[serde(default)]
    command: String,
}

#[derive(Debug, Default, Deserialize)]
struct ConnectRequest {
    #[serde(default)]
    port: String,
}

/// Reads a JSON request body the way the panel sends them: an absent
/// or malformed body is treated as empty, never rejected.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> T {
    serde_json::from_slice(body).unwrap_or_default()
}

/// `GET /status` reports the link's state machine, nothing more.
/// Health checking is the reconnector's business.
async fn connection_status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "connected": state.link.is_connected().await }))
}

async fn list_ports(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let ports = state
        .link
        .list_ports()
        .map_err(|error| ApiError::Internal(error.to_string()))?;
    Ok(Json(json!({ "ports": ports })))
}

/// `POST /connect` dials a named port, replacing any current
/// connection. A failed dial still answers 200 with the error in the
/// envelope.
async fn connect(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let request: ConnectRequest = parse_body(&body);
    if request.port.is_empty() {
        return Err(ApiError::BadRequest("No port specified".to_string()));
    }

    match state.link.connect(&request.port).await {
        Ok(()) => Ok(Json(json!({
            "status": "success",
            "message": format!("Connected to {}", request.port),
        }))),
        Err(error) => Ok(Json(json!({
            "status": "error",
            "message": error.to_string(),
        }))),
    }
}

/// `POST /send` writes one command line and answers with whatever the
/// link attributed to it.
async fn send_command(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let request: SendRequest = parse_body(&body);
    let command = request.command.trim();
    if command.is_empty() {
        return Err(ApiError::BadRequest("No command provided".to_string()));
    }

    info!(command = %command, "sending command");

    match state.link.send(command).await {
        Ok(Reply::Json(value)) => Ok(Json(value)),
        Ok(Reply::Ack(text)) => Ok(Json(json!({ "status": "success", "message": text }))),
        Ok(Reply::Err(text)) => Ok(Json(json!({ "status": "error", "message": text }))),
        Ok(Reply::Unknown(text)) => Ok(Json(json!({ "status": "unknown", "message": text }))),
        Err(LinkError::NotConnected) => Err(ApiError::PortUnavailable),
        Err(LinkError::NoResponse { .. }) => Ok(Json(json!({
            "status": "error",
            "message": "No response from robot",
        }))),
        Err(_) => Err(ApiError::SendFailed),
    }
}

/// `GET /log` answers the raw history array, oldest first.
async fn command_log(State(state): State<AppState>) -> Json<Vec<ExchangeRecord>> {
    Json(state.link.history())
}

async fn clear_log(State(state): State<AppState>) -> Json<Value> {
    state.link.clear_history();
    Json(json!({ "status": "success", "message": "History cleared" }))
}

async fn load_calibration(State(state): State<AppState>) -> Json<Value> {
    let data = state.calibration.load().await;
    Json(json!({ "ok": true, "data": data }))
}

/// `POST /calibration/save` persists the posted JSON body verbatim.
async fn save_calibration(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    let data = serde_json::from_slice::<Value>(&body).unwrap_or_else(|_| json!({}));
    let ok = state.calibration.save(&data).await;
    Json(json!({ "ok": ok }))
}
