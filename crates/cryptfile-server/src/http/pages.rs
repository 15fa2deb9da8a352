//! Client bundle pages and health check

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::path::Path;
use tracing::debug;

use super::AppState;

/// Routes handled by the client-side router
pub const CLIENT_ROUTES: [&str; 4] = ["/", "/password", "/success", "/failure"];

/// Health check endpoint
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Serve the bundle's `index.html`
pub async fn index(State(state): State<AppState>) -> Response {
    serve_page(&state.static_dir.join("index.html"), StatusCode::OK).await
}

/// Serve the bundle's `404.html` with a 404 status
pub async fn not_found(page: &Path) -> Response {
    serve_page(page, StatusCode::NOT_FOUND).await
}

async fn serve_page(path: &Path, status: StatusCode) -> Response {
    match tokio::fs::read(path).await {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            debug!("Page {:?} unavailable: {}", path, e);
            (StatusCode::NOT_FOUND, "Not Found").into_response()
        }
    }
}
