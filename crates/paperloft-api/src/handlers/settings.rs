//! Provider settings and local data management.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use paperloft_core::{GoogleSettings, OpenAISettings};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn get_google_settings(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.library.store().google_settings()?))
}

pub async fn put_google_settings(
    State(state): State<AppState>,
    Json(body): Json<GoogleSettings>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.library.store();
    store.save_google_settings(&body)?;
    Ok(Json(store.google_settings()?))
}

pub async fn get_openai_settings(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.library.store().openai_settings()?))
}

pub async fn put_openai_settings(
    State(state): State<AppState>,
    Json(body): Json<OpenAISettings>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.library.store();
    store.save_openai_settings(&body)?;
    Ok(Json(store.openai_settings()?))
}

/// Remove local bookmarks and projects. Settings are kept.
pub async fn clear_local_data(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state.library.clear()?;
    Ok(StatusCode::NO_CONTENT)
}
