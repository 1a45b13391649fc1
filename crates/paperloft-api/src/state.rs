//! Shared application state.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

use paperloft_core::Library;
use paperloft_inference::NoteWriter;
use paperloft_jobs::{Enricher, EnrichmentQueue};
use paperloft_search::{OpenAlexClient, SearchSession};
use paperloft_sync::UserSession;

/// Session key used when a request carries no `x-session-id` header.
pub const DEFAULT_SEARCH_SESSION: &str = "default";

/// Search sessions kept before the least recently used one is evicted.
pub const MAX_SEARCH_SESSIONS: usize = 1000;

/// Search sessions keyed by caller-chosen session ID.
///
/// Bounded by an LRU cache; an evicted session starts over on its next request.
pub struct SearchSessions {
    client: Arc<OpenAlexClient>,
    sessions: Mutex<LruCache<String, Arc<SearchSession>>>,
}

impl SearchSessions {
    pub fn new(client: Arc<OpenAlexClient>) -> Self {
        Self::with_capacity(client, MAX_SEARCH_SESSIONS)
    }

    pub fn with_capacity(client: Arc<OpenAlexClient>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            client,
            sessions: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Session for `id`, created on first use.
    pub fn get(&self, id: &str) -> Arc<SearchSession> {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(session) = sessions.get(id) {
            return Arc::clone(session);
        }

        let session = Arc::new(SearchSession::new(Arc::clone(&self.client)));
        if let Some((evicted, _)) = sessions.push(id.to_string(), Arc::clone(&session)) {
            tracing::debug!(
                subsystem = "api",
                component = "search_sessions",
                evicted = %evicted,
                "Search session evicted"
            );
        }
        session
    }

    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub library: Arc<Library>,
    pub search: Arc<SearchSessions>,
    pub notes: NoteWriter,
    pub enricher: Enricher,
    /// Background enrichment; `None` when the worker is not running.
    pub queue: Option<EnrichmentQueue>,
    pub session: Arc<UserSession>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperloft_search::OpenAlexConfig;

    fn sessions(capacity: usize) -> SearchSessions {
        let client = OpenAlexClient::new(OpenAlexConfig::default()).unwrap();
        SearchSessions::with_capacity(Arc::new(client), capacity)
    }

    #[test]
    fn test_same_id_reuses_session() {
        let sessions = sessions(4);
        let a = sessions.get("tab-1");
        let b = sessions.get("tab-1");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn test_rotating_ids_stay_bounded() {
        let sessions = sessions(3);
        let first = sessions.get("s0");
        for i in 1..50 {
            sessions.get(&format!("s{}", i));
        }
        assert_eq!(sessions.len(), 3);
        assert!(!Arc::ptr_eq(&first, &sessions.get("s0")));
    }

    #[test]
    fn test_recently_used_session_survives() {
        let sessions = sessions(2);
        let kept = sessions.get("kept");
        sessions.get("other");
        sessions.get("kept");
        sessions.get("newcomer");
        assert!(Arc::ptr_eq(&kept, &sessions.get("kept")));
    }
}
