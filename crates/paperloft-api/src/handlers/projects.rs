//! Project handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use paperloft_core::{Error, ProjectUpdate};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProjectBody {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

pub async fn list_projects(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.library.projects()?))
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(body): Json<CreateProjectBody>,
) -> Result<impl IntoResponse, ApiError> {
    let project = state.library.create_project(&body.name, &body.description)?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.library.project(&id)?))
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ProjectUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.library.update_project(&id, body)?))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if state.library.delete_project(&id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::ProjectNotFound(id).into())
    }
}

pub async fn project_papers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.library.project_papers(&id)?))
}

pub async fn add_paper(
    State(state): State<AppState>,
    Path((id, bookmark_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.library.add_paper(&id, &bookmark_id)?))
}

pub async fn remove_paper(
    State(state): State<AppState>,
    Path((id, bookmark_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.library.remove_paper(&id, &bookmark_id)?))
}
