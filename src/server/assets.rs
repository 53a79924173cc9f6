//! Serves the control panel's static files from the configured
//! directory. Nothing here follows symlinks upward or accepts path
//! traversal; requests that try get the JSON 404 like any other miss.

use std::path::{Component, Path, PathBuf};

use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::server::routes::AppState;

/// `GET /` serves the control panel itself.
pub async fn index(State(state): State<AppState>) -> Response {
    serve_file(&state.static_dir, "index.html").await
}

/// Fallback handler: any unrouted path is tried against the static
/// directory.
pub async fn static_file(State(state): State<AppState>, uri: Uri) -> Response {
    let relative = uri.path().trim_start_matches('/');
    serve_file(&state.static_dir, relative).await
}

async fn serve_file(root: &Path, relative: &str) -> Response {
    let Some(path) = resolve(root, relative) else {
        return not_found();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            ([(header::CONTENT_TYPE, content_type_for(&path))], bytes).into_response()
        }
        Err(_) => not_found(),
    }
}

/// Joins `relative` onto `root`, accepting only plain path segments.
/// Anything with a `..`, a root, or a drive prefix resolves to nothing.
fn resolve(root: &Path, relative: &str) -> Option<PathBuf> {
    let mut path = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(segment) => path.push(segment),
            _ => return None,
        }
    }
    Some(path)
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

fn not_found() -> Response {
    let body = json!({
        "status": "error",
        "message": "Not found",
    });
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}
