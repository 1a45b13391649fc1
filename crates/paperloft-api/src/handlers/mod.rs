//! HTTP handlers for paperloft-api.

pub mod account;
pub mod bookmarks;
pub mod projects;
pub mod search;
pub mod settings;

use axum::response::IntoResponse;
use axum::Json;

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
