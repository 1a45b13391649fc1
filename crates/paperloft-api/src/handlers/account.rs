//! Account and cloud sync handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use paperloft_core::Error;
use paperloft_sync::{AuthUser, SyncReport};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CredentialsBody {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub captcha_token: Option<String>,
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(body): Json<CredentialsBody>,
) -> Result<Json<AuthUser>, ApiError> {
    let user = state
        .session
        .sign_in(&body.email, &body.password, body.captcha_token.as_deref())
        .await?;
    Ok(Json(user))
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(body): Json<CredentialsBody>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .session
        .sign_up(&body.email, &body.password, body.captcha_token.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn sign_out(State(state): State<AppState>) -> impl IntoResponse {
    state.session.sign_out().await;
    StatusCode::NO_CONTENT
}

pub async fn current_user(State(state): State<AppState>) -> Result<Json<AuthUser>, ApiError> {
    Ok(Json(state.session.require_user().await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct SignInSyncBody {
    /// Upload local data before loading the remote copy.
    #[serde(default)]
    pub push_local: bool,
}

/// Post sign-in routine: push, settings, load, live sync.
pub async fn sync_on_sign_in(
    State(state): State<AppState>,
    body: Option<Json<SignInSyncBody>>,
) -> Result<impl IntoResponse, ApiError> {
    let push_local = body.map(|Json(b)| b.push_local).unwrap_or_default();
    Ok(Json(state.session.sync_on_sign_in(push_local).await?))
}

#[derive(Serialize)]
pub struct PushResponse {
    #[serde(flatten)]
    pub report: SyncReport,
    pub message: String,
}

pub async fn push_local(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let report = state.session.push_local().await?;
    let message = report.summary();
    Ok(Json(PushResponse { report, message }))
}

pub async fn load_remote(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.session.load_remote().await?))
}

pub async fn push_settings(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.session.push_settings().await?;
    Ok(Json(json!({ "outcome": outcome, "message": outcome.message() })))
}

pub async fn pull_settings(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let applied = state.session.pull_settings().await?;
    Ok(Json(json!({ "applied": applied })))
}

pub async fn start_live(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state.session.start_live().await?;
    Ok(Json(json!({ "live": true })))
}

pub async fn stop_live(State(state): State<AppState>) -> impl IntoResponse {
    state.session.stop_live().await;
    Json(json!({ "live": false }))
}

pub async fn delete_artifact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.session.require_user().await?;
    if state.session.engine().delete_artifact(&user.uid, &id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound(format!("Artifact {} not found", id)).into())
    }
}
