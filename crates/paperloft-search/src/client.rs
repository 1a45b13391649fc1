//! HTTP client for the OpenAlex works, authors and sources endpoints.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::{OpenAlexConfig, RESOLVE_PER_PAGE};
use crate::error::SearchError;
use crate::query::{normalize_openalex_id, ResolvedEntity, SortOrder};
use crate::types::{EntityResponse, WorksResponse};

/// Cursor value that starts a fresh result set.
pub const INITIAL_CURSOR: &str = "*";

/// Parameters for one `/works` page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorksQuery {
    /// Combined keyword and exact-phrase search text.
    pub search: String,
    /// Comma-joined filter clauses.
    pub filter: String,
    pub sort: Option<SortOrder>,
}

/// OpenAlex API client.
pub struct OpenAlexClient {
    client: Client,
    config: OpenAlexConfig,
}

impl OpenAlexClient {
    pub fn new(config: OpenAlexConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| SearchError::Network(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "search",
            component = "openalex",
            base_url = %config.base_url,
            per_page = config.per_page,
            "Initializing OpenAlex client"
        );

        Ok(Self { client, config })
    }

    pub fn with_defaults() -> Result<Self, SearchError> {
        Self::new(OpenAlexConfig::default())
    }

    pub fn from_env() -> Result<Self, SearchError> {
        Self::new(OpenAlexConfig::from_env())
    }

    pub fn config(&self) -> &OpenAlexConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn with_mailto(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        if let Some(mailto) = &self.config.mailto {
            params.push(("mailto", mailto.clone()));
        }
        params
    }

    /// Fetch one page of works starting at `cursor`.
    pub async fn fetch_works_page(
        &self,
        query: &WorksQuery,
        cursor: &str,
    ) -> Result<WorksResponse, SearchError> {
        let mut params = vec![
            ("per-page", self.config.per_page.to_string()),
            ("cursor", cursor.to_string()),
        ];
        if !query.search.is_empty() {
            params.push(("search", query.search.clone()));
        }
        if !query.filter.is_empty() {
            params.push(("filter", query.filter.clone()));
        }
        if let Some(sort) = query.sort {
            params.push(("sort", sort.as_param().to_string()));
        }
        let params = self.with_mailto(params);

        let start = std::time::Instant::now();
        let response = self
            .client
            .get(self.url("works"))
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                subsystem = "search",
                component = "openalex",
                op = "fetch_works_page",
                status = status.as_u16(),
                "Works request failed"
            );
            return Err(SearchError::Status {
                status: status.as_u16(),
            });
        }

        let page: WorksResponse = response.json().await?;
        debug!(
            subsystem = "search",
            component = "openalex",
            op = "fetch_works_page",
            result_count = page.results.len(),
            total = ?page.meta.count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Works page fetched"
        );
        Ok(page)
    }

    /// Resolve an author name to the best-matching author ID.
    pub async fn resolve_author(&self, name: &str) -> Option<ResolvedEntity> {
        self.resolve("authors", name, vec![]).await
    }

    /// Resolve a journal or venue name, preferring the most prolific match.
    pub async fn resolve_source(&self, name: &str) -> Option<ResolvedEntity> {
        self.resolve(
            "sources",
            name,
            vec![("sort", "works_count:desc".to_string())],
        )
        .await
    }

    /// First match of an entity search. Any failure counts as no match.
    async fn resolve(
        &self,
        endpoint: &'static str,
        name: &str,
        extra: Vec<(&'static str, String)>,
    ) -> Option<ResolvedEntity> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut params = vec![
            ("search", name.to_string()),
            ("per-page", RESOLVE_PER_PAGE.to_string()),
        ];
        params.extend(extra);
        let params = self.with_mailto(params);

        let response = match self.client.get(self.url(endpoint)).query(&params).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(
                    subsystem = "search",
                    component = "openalex",
                    op = "resolve",
                    endpoint,
                    error = %e,
                    "Entity lookup failed"
                );
                return None;
            }
        };
        if !response.status().is_success() {
            warn!(
                subsystem = "search",
                component = "openalex",
                op = "resolve",
                endpoint,
                status = response.status().as_u16(),
                "Entity lookup rejected"
            );
            return None;
        }

        let body: EntityResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                warn!(
                    subsystem = "search",
                    component = "openalex",
                    op = "resolve",
                    endpoint,
                    error = %e,
                    "Entity lookup returned unreadable body"
                );
                return None;
            }
        };

        let first = body.results.into_iter().next()?;
        let id = normalize_openalex_id(first.id.as_deref().unwrap_or_default());
        if id.is_empty() {
            return None;
        }
        let label = match first.display_name.as_deref().filter(|n| !n.is_empty()) {
            Some(display_name) => format!("{} ({})", display_name, id),
            None => id.clone(),
        };

        debug!(
            subsystem = "search",
            component = "openalex",
            op = "resolve",
            endpoint,
            resolved_id = %id,
            "Entity resolved"
        );
        Some(ResolvedEntity { id, label })
    }
}
