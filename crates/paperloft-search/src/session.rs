//! Cursor-paginated search state for one user.
//!
//! A [`SearchSession`] owns the cursor, running counts and resolved filter IDs
//! of the current result set. `search` always starts over, even while a page
//! is loading; `load_more` is refused while another page is in flight.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::{info, instrument, warn};

use paperloft_core::WorkSummary;

use crate::client::{OpenAlexClient, WorksQuery, INITIAL_CURSOR};
use crate::error::SearchError;
use crate::query::{build_filter, describe_filters, ResolvedEntity, SearchFilters, SortOrder};
use crate::types::WorksResponse;

/// One page of results plus the session's running counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchPage {
    pub works: Vec<WorkSummary>,
    pub total_results: u64,
    pub loaded_results: u64,
    pub has_more: bool,
    /// Status line (`Loaded 50 of 1200`, `No results found.`, ...).
    pub status: String,
    /// Description of the resolved filters.
    pub filters_summary: String,
}

/// Pagination counters for the current result set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageState {
    /// `None` once the result set is exhausted.
    pub cursor: Option<String>,
    pub total_results: u64,
    pub loaded_results: u64,
}

impl PageState {
    fn fresh() -> Self {
        Self {
            cursor: Some(INITIAL_CURSOR.to_string()),
            total_results: 0,
            loaded_results: 0,
        }
    }

    /// Fold a fetched page into the counters and return the status line.
    ///
    /// The total is taken from the first page that reports one and never
    /// refreshed. An empty page or a missing cursor ends pagination.
    pub fn apply(&mut self, response: &WorksResponse) -> String {
        if self.total_results == 0 {
            self.total_results = response.meta.count.unwrap_or(0);
        }
        self.cursor = response
            .meta
            .next_cursor
            .clone()
            .filter(|c| !c.is_empty());

        if response.results.is_empty() {
            self.cursor = None;
            return if self.total_results > 0 {
                format!("Loaded {} of {}", self.loaded_results, self.total_results)
            } else {
                "No results found.".to_string()
            };
        }

        self.loaded_results += response.results.len() as u64;
        if self.loaded_results < self.total_results && self.cursor.is_some() {
            format!("Loaded {} of {}", self.loaded_results, self.total_results)
        } else {
            self.cursor = None;
            format!("All {} results loaded", self.total_results)
        }
    }

    pub fn has_more(&self) -> bool {
        self.cursor.is_some()
    }
}

#[derive(Debug, Default)]
struct SessionState {
    /// Bumped by every `search`; stale responses are discarded.
    generation: u64,
    /// Generation of the page currently being fetched, if any.
    loading: Option<u64>,
    query: WorksQuery,
    page: PageState,
    author: Option<ResolvedEntity>,
    source: Option<ResolvedEntity>,
    filters_summary: String,
    status: String,
}

/// Search state scoped to one caller.
pub struct SearchSession {
    client: Arc<OpenAlexClient>,
    state: Mutex<SessionState>,
}

impl SearchSession {
    pub fn new(client: Arc<OpenAlexClient>) -> Self {
        Self {
            client,
            state: Mutex::new(SessionState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a new result set and fetch its first page.
    #[instrument(skip(self, filters), fields(subsystem = "search", component = "session", op = "search"))]
    pub async fn search(
        &self,
        filters: &SearchFilters,
        sort: Option<SortOrder>,
    ) -> Result<SearchPage, SearchError> {
        if !filters.has_input() {
            return Err(SearchError::NoInput);
        }

        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.loading = Some(state.generation);
            state.page = PageState::fresh();
            state.author = None;
            state.source = None;
            state.filters_summary = "Searching...".to_string();
            state.generation
        };

        let author_name = filters.author_name.trim();
        let author = if author_name.is_empty() {
            None
        } else {
            self.client.resolve_author(author_name).await
        };
        let source_name = filters.source_name.trim();
        let source = if source_name.is_empty() {
            None
        } else {
            self.client.resolve_source(source_name).await
        };

        let query = WorksQuery {
            search: filters.combined_query(),
            filter: build_filter(filters, author.as_ref(), source.as_ref()),
            sort,
        };
        let filters_summary = describe_filters(filters, author.as_ref(), source.as_ref());

        {
            let mut state = self.lock();
            if state.generation == generation {
                state.query = query.clone();
                state.author = author;
                state.source = source;
                state.filters_summary = filters_summary.clone();
            }
        }

        info!(
            search = %query.search,
            filter = %query.filter,
            sort = ?query.sort,
            "Search started"
        );

        let result = self.client.fetch_works_page(&query, INITIAL_CURSOR).await;
        self.finish(generation, PageState::fresh(), filters_summary, result)
    }

    /// Fetch the next page of the current result set.
    ///
    /// Returns an empty page when the set is exhausted or no search ran yet.
    #[instrument(skip(self), fields(subsystem = "search", component = "session", op = "load_more"))]
    pub async fn load_more(&self) -> Result<SearchPage, SearchError> {
        let (generation, query, page, filters_summary) = {
            let mut state = self.lock();
            if state.loading.is_some() {
                return Err(SearchError::Busy);
            }
            if state.page.cursor.is_none() {
                return Ok(SearchPage {
                    works: Vec::new(),
                    total_results: state.page.total_results,
                    loaded_results: state.page.loaded_results,
                    has_more: false,
                    status: state.status.clone(),
                    filters_summary: state.filters_summary.clone(),
                });
            }
            state.loading = Some(state.generation);
            (
                state.generation,
                state.query.clone(),
                state.page.clone(),
                state.filters_summary.clone(),
            )
        };

        let cursor = page.cursor.clone().unwrap_or_else(|| INITIAL_CURSOR.to_string());
        let result = self.client.fetch_works_page(&query, &cursor).await;
        self.finish(generation, page, filters_summary, result)
    }

    /// Apply a fetch outcome, committing it only if no newer search started.
    fn finish(
        &self,
        generation: u64,
        mut page: PageState,
        filters_summary: String,
        result: Result<WorksResponse, SearchError>,
    ) -> Result<SearchPage, SearchError> {
        let mut state = self.lock();
        let current = state.generation == generation;
        if state.loading == Some(generation) {
            state.loading = None;
        }

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Page load failed");
                if current {
                    state.status = e.user_message().to_string();
                }
                return Err(e);
            }
        };

        let status = page.apply(&response);
        let works: Vec<WorkSummary> = response.results.iter().map(|w| w.to_summary()).collect();

        if current {
            state.page = page.clone();
            state.status = status.clone();
        }

        Ok(SearchPage {
            works,
            total_results: page.total_results,
            loaded_results: page.loaded_results,
            has_more: page.has_more(),
            status,
            filters_summary,
        })
    }

    /// Snapshot of the current counters.
    pub fn page_state(&self) -> PageState {
        self.lock().page.clone()
    }

    /// Author and source IDs resolved by the latest search.
    pub fn resolved(&self) -> (Option<ResolvedEntity>, Option<ResolvedEntity>) {
        let state = self.lock();
        (state.author.clone(), state.source.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ResponseMeta, Work};

    fn response(count: Option<u64>, cursor: Option<&str>, results: usize) -> WorksResponse {
        WorksResponse {
            meta: ResponseMeta {
                count,
                next_cursor: cursor.map(str::to_string),
            },
            results: (0..results)
                .map(|i| Work {
                    id: format!("W{}", i),
                    ..Default::default()
                })
                .collect(),
        }
    }

    #[test]
    fn test_apply_first_page_with_more() {
        let mut page = PageState::fresh();
        let status = page.apply(&response(Some(120), Some("c1"), 50));
        assert_eq!(status, "Loaded 50 of 120");
        assert_eq!(page.cursor.as_deref(), Some("c1"));
        assert!(page.has_more());
    }

    #[test]
    fn test_apply_last_page_clears_cursor() {
        let mut page = PageState {
            cursor: Some("c2".to_string()),
            total_results: 120,
            loaded_results: 100,
        };
        let status = page.apply(&response(Some(999), Some("c3"), 20));
        assert_eq!(status, "All 120 results loaded");
        assert_eq!(page.total_results, 120);
        assert!(!page.has_more());
    }

    #[test]
    fn test_apply_empty_page_terminates() {
        let mut page = PageState {
            cursor: Some("c1".to_string()),
            total_results: 80,
            loaded_results: 50,
        };
        let status = page.apply(&response(Some(80), Some("c2"), 0));
        assert_eq!(status, "Loaded 50 of 80");
        assert!(!page.has_more());
    }

    #[test]
    fn test_apply_no_results_at_all() {
        let mut page = PageState::fresh();
        let status = page.apply(&response(Some(0), None, 0));
        assert_eq!(status, "No results found.");
        assert!(!page.has_more());
    }

    #[test]
    fn test_apply_missing_cursor_ends_even_when_short() {
        let mut page = PageState::fresh();
        let status = page.apply(&response(Some(500), None, 50));
        assert_eq!(status, "All 500 results loaded");
        assert!(!page.has_more());
    }

    #[tokio::test]
    async fn test_search_requires_input() {
        let client = Arc::new(OpenAlexClient::with_defaults().unwrap());
        let session = SearchSession::new(client);
        let err = session.search(&SearchFilters::default(), None).await.unwrap_err();
        assert!(matches!(err, SearchError::NoInput));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_load_more_before_search_is_empty() {
        let client = Arc::new(OpenAlexClient::with_defaults().unwrap());
        let session = SearchSession::new(client);
        let page = session.load_more().await.unwrap();
        assert!(page.works.is_empty());
        assert!(!page.has_more);
    }
}
