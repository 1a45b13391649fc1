//! OpenAlex client configuration.

use serde::{Deserialize, Serialize};

pub const DEFAULT_OPENALEX_URL: &str = "https://api.openalex.org";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Works requested per page.
pub const DEFAULT_PER_PAGE: u32 = 50;
/// Candidates fetched when resolving an author or source name.
pub const RESOLVE_PER_PAGE: u32 = 5;

/// Configuration for [`crate::OpenAlexClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAlexConfig {
    pub base_url: String,
    /// Contact address sent as `mailto` for the provider's polite pool.
    pub mailto: Option<String>,
    pub timeout_seconds: u64,
    pub per_page: u32,
}

impl Default for OpenAlexConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENALEX_URL.to_string(),
            mailto: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl OpenAlexConfig {
    /// Read `OPENALEX_BASE_URL`, `OPENALEX_MAILTO` and `OPENALEX_TIMEOUT`.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("OPENALEX_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENALEX_URL.to_string()),
            mailto: std::env::var("OPENALEX_MAILTO")
                .ok()
                .filter(|m| !m.trim().is_empty()),
            timeout_seconds: std::env::var("OPENALEX_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            per_page: DEFAULT_PER_PAGE,
        }
    }

    /// Point the client at another host (tests, mirrors).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OpenAlexConfig::default();
        assert_eq!(config.base_url, "https://api.openalex.org");
        assert_eq!(config.per_page, 50);
        assert!(config.mailto.is_none());
    }

    #[test]
    fn test_with_base_url() {
        let config = OpenAlexConfig::default().with_base_url("http://localhost:9");
        assert_eq!(config.base_url, "http://localhost:9");
    }
}
