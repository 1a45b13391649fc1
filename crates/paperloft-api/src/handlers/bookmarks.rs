//! Bookmark handlers: save/remove, listing, notes, AI notes and source links.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use paperloft_core::{arrange, BookmarkSort, Error, LinkLookupStatus, ToggleOutcome, WorkSummary};
use paperloft_inference::{AiNote, AiNoteMode, AiNoteStatus};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Substring filter.
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub sort: BookmarkSort,
}

pub async fn list_bookmarks(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let bookmarks = state.library.bookmarks()?;
    Ok(Json(arrange(&bookmarks, &params.q, params.sort)))
}

pub async fn get_bookmark(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let bookmark = state
        .library
        .bookmark(&id)?
        .ok_or(Error::BookmarkNotFound(id))?;
    Ok(Json(bookmark))
}

/// Save a search result, or remove it when already saved. New bookmarks
/// are queued for enrichment.
pub async fn toggle_bookmark(
    State(state): State<AppState>,
    Json(work): Json<WorkSummary>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.library.toggle_bookmark(&work)?;
    if let ToggleOutcome::Added { bookmark } = &outcome {
        match &state.queue {
            Some(queue) => {
                if let Err(e) = queue.enqueue(bookmark.id.clone()).await {
                    warn!(subsystem = "api", bookmark_id = %bookmark.id, error = %e, "Enrichment not queued");
                }
            }
            None => info!(subsystem = "api", bookmark_id = %bookmark.id, "Enrichment worker off, bookmark left pending"),
        }
    }
    Ok(Json(outcome))
}

pub async fn delete_bookmark(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if state.library.remove_bookmark(&id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::BookmarkNotFound(id).into())
    }
}

#[derive(Debug, Deserialize)]
pub struct NoteBody {
    pub note: String,
}

pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<NoteBody>,
) -> Result<impl IntoResponse, ApiError> {
    let bookmark = state.library.update_note(&id, &body.note)?;
    Ok(Json(bookmark))
}

/// Bookmarks as a downloadable JSON file.
pub async fn export_bookmarks(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let json = state.library.export_json()?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"research-bookmarks.json\"",
            ),
        ],
        json,
    ))
}

#[derive(Debug, Deserialize)]
pub struct AiNoteBody {
    pub mode: AiNoteMode,
    /// Project whose GPT instruction steers the prompt.
    #[serde(default)]
    pub project_id: Option<String>,
}

/// Generate an AI summary or abstract and store it on the bookmark.
///
/// Provider problems come back as the note's status, not as HTTP errors.
pub async fn generate_ai_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<AiNoteBody>,
) -> Result<Json<AiNote>, ApiError> {
    let bookmark = state
        .library
        .bookmark(&id)?
        .ok_or_else(|| Error::BookmarkNotFound(id.clone()))?;
    let instruction = match &body.project_id {
        Some(project_id) => Some(state.library.project(project_id)?.gpt_instruction),
        None => None,
    }
    .filter(|i| !i.trim().is_empty());

    let settings = state.library.store().openai_settings()?;
    let note = state
        .notes
        .write(&settings, body.mode, &bookmark, instruction.as_deref())
        .await;

    if note.status == AiNoteStatus::Ok {
        state.library.patch_bookmark(&id, |b| note.apply_to(b))?;
    }
    Ok(Json(note))
}

#[derive(Debug, Serialize)]
pub struct LinksResponse {
    pub status: LinkLookupStatus,
    pub link_count: usize,
    pub bookmark: Option<paperloft_core::Bookmark>,
}

/// Re-run the source-link lookup for one bookmark.
pub async fn refresh_links(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let bookmark = state
        .library
        .bookmark(&id)?
        .ok_or_else(|| Error::BookmarkNotFound(id.clone()))?;
    let (status, link_count, _) = state.enricher.refresh_links(&bookmark).await?;
    Ok(Json(LinksResponse {
        status,
        link_count,
        bookmark: state.library.bookmark(&id)?,
    }))
}
