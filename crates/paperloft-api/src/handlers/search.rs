//! Metadata search with cursor pagination.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use paperloft_search::{SearchFilters, SortOrder};

use crate::error::ApiError;
use crate::state::{AppState, DEFAULT_SEARCH_SESSION};

/// Header selecting the caller's search session.
pub const SESSION_HEADER: &str = "x-session-id";

#[derive(Debug, Deserialize)]
pub struct SearchBody {
    #[serde(flatten)]
    pub filters: SearchFilters,
    /// Provider relevance when absent.
    #[serde(default)]
    pub sort: Option<SortOrder>,
}

fn session_id(headers: &HeaderMap) -> &str {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SEARCH_SESSION)
}

/// Start a new search and return its first page.
pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SearchBody>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.search.get(session_id(&headers));
    let page = session.search(&body.filters, body.sort).await?;
    Ok(Json(page))
}

/// Next page of the caller's current search.
pub async fn load_more(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.search.get(session_id(&headers));
    let page = session.load_more().await?;
    Ok(Json(page))
}
