//! Source-link lookup through Google Custom Search.
//!
//! Up to three queries run per bookmark: title plus first author, title with
//! citation-oriented OR terms, and the DOI as an exact term. Hits are merged
//! by normalized URL, scored against the bookmark title, and the best five
//! are kept.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use paperloft_core::{
    Bookmark, Error, GoogleSettings, LinkLookup, LinkLookupStatus, Result, SourceLink,
    SourceLinkFinder,
};

pub const DEFAULT_GOOGLE_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Results requested per query (the API maximum).
pub const RESULTS_PER_QUERY: u32 = 10;
/// Links kept per bookmark.
pub const MAX_LINKS: usize = 5;

const CITATION_OR_TERMS: &str = "pdf doi journal citation preprint";

const TITLE_MATCH_SCORE: i32 = 4;
const SNIPPET_MATCH_SCORE: i32 = 2;
const PDF_PENALTY: i32 = -1;

/// Endpoint configuration. Credentials come from the user's settings.
#[derive(Debug, Clone)]
pub struct GoogleSearchConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for GoogleSearchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GOOGLE_SEARCH_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl GoogleSearchConfig {
    /// Read `GOOGLE_SEARCH_BASE_URL` and `GOOGLE_TIMEOUT`.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("GOOGLE_SEARCH_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GOOGLE_SEARCH_URL.to_string()),
            timeout_seconds: std::env::var("GOOGLE_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// One Custom Search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkQuery {
    pub q: String,
    pub exact_terms: Option<String>,
    pub or_terms: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

/// Title usable for querying, ignoring the "Untitled" placeholder.
fn query_title(bookmark: &Bookmark) -> Option<&str> {
    let title = bookmark.title.trim();
    (!title.is_empty() && title != "Untitled").then_some(title)
}

/// Queries to run for a bookmark. Empty when there is nothing to search on.
pub fn build_queries(bookmark: &Bookmark) -> Vec<LinkQuery> {
    let mut queries = Vec::new();

    if let Some(title) = query_title(bookmark) {
        let quoted = format!("\"{}\"", title);
        let primary = match bookmark.first_author() {
            Some(author) => format!("{} {}", quoted, author),
            None => quoted.clone(),
        };
        queries.push(LinkQuery {
            q: primary,
            exact_terms: None,
            or_terms: None,
        });
        queries.push(LinkQuery {
            q: quoted,
            exact_terms: None,
            or_terms: Some(CITATION_OR_TERMS.to_string()),
        });
    }

    let doi = bookmark.doi.trim();
    if !doi.is_empty() {
        queries.push(LinkQuery {
            q: doi.to_string(),
            exact_terms: Some(doi.to_string()),
            or_terms: None,
        });
    }

    queries
}

/// Strip the fragment so `page#section` and `page` merge.
pub fn normalize_link(link: &str) -> String {
    link.split('#').next().unwrap_or_default().trim().to_string()
}

fn looks_like_pdf(link: &str) -> bool {
    let lower = link.to_lowercase();
    let path = lower.split('?').next().unwrap_or_default();
    path.ends_with(".pdf") || path.contains("/pdf/")
}

/// Score a hit against the bookmark title.
pub fn score_hit(title: &str, hit_title: &str, snippet: &str, link: &str) -> i32 {
    let needle = title.trim().to_lowercase();
    let mut score = 0;
    if !needle.is_empty() {
        let hit_title = hit_title.trim().to_lowercase();
        // Search engines cut long titles with an ellipsis.
        let stem = hit_title.trim_end_matches('…').trim_end_matches("...").trim();
        let truncated = stem.len() < hit_title.len();
        if hit_title.contains(&needle) || (truncated && !stem.is_empty() && needle.starts_with(stem)) {
            score += TITLE_MATCH_SCORE;
        }
        if snippet.to_lowercase().contains(&needle) {
            score += SNIPPET_MATCH_SCORE;
        }
    }
    if looks_like_pdf(link) {
        score += PDF_PENALTY;
    }
    score
}

/// Merge hits by normalized URL, keep the best score per URL, return the top
/// [`MAX_LINKS`] by score. Ties keep first-seen order.
pub fn rank_links(title: &str, hits: impl IntoIterator<Item = SourceLink>) -> Vec<SourceLink> {
    let mut order: Vec<String> = Vec::new();
    let mut best: HashMap<String, SourceLink> = HashMap::new();

    for hit in hits {
        let key = normalize_link(&hit.link);
        if key.is_empty() {
            continue;
        }
        let score = score_hit(title, &hit.title, &hit.snippet, &key);
        let candidate = SourceLink {
            title: hit.title,
            link: key.clone(),
            snippet: hit.snippet,
            score,
        };
        match best.get(&key) {
            Some(existing) if existing.score >= score => {}
            Some(_) => {
                best.insert(key, candidate);
            }
            None => {
                order.push(key.clone());
                best.insert(key, candidate);
            }
        }
    }

    let mut ranked: Vec<SourceLink> = order.into_iter().filter_map(|k| best.remove(&k)).collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked.truncate(MAX_LINKS);
    ranked
}

/// Google Custom Search backed [`SourceLinkFinder`].
pub struct GoogleLinkFinder {
    client: Client,
    config: GoogleSearchConfig,
}

impl GoogleLinkFinder {
    pub fn new(config: GoogleSearchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Request(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "jobs",
            component = "google",
            base_url = %config.base_url,
            "Initializing Google source-link finder"
        );

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(GoogleSearchConfig::from_env())
    }

    async fn run_query(
        &self,
        query: &LinkQuery,
        settings: &GoogleSettings,
    ) -> std::result::Result<Vec<SourceLink>, LinkLookupStatus> {
        let mut params = vec![
            ("key", settings.api_key.clone()),
            ("cx", settings.cx.clone()),
            ("q", query.q.clone()),
            ("num", RESULTS_PER_QUERY.to_string()),
        ];
        if let Some(exact) = &query.exact_terms {
            params.push(("exactTerms", exact.clone()));
        }
        if let Some(or_terms) = &query.or_terms {
            params.push(("orTerms", or_terms.clone()));
        }

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                warn!(subsystem = "jobs", component = "google", error = %e, "Search request failed");
                LinkLookupStatus::NetworkError
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                subsystem = "jobs",
                component = "google",
                status = status.as_u16(),
                "Search request rejected"
            );
            return Err(LinkLookupStatus::HttpError(status.as_u16()));
        }

        let body: SearchResponse = response.json().await.map_err(|e| {
            warn!(subsystem = "jobs", component = "google", error = %e, "Unreadable search response");
            LinkLookupStatus::NetworkError
        })?;

        Ok(body
            .items
            .into_iter()
            .map(|item| SourceLink {
                title: item.title,
                link: item.link,
                snippet: item.snippet,
                score: 0,
            })
            .collect())
    }
}

#[async_trait]
impl SourceLinkFinder for GoogleLinkFinder {
    #[instrument(
        skip(self, bookmark, settings),
        fields(subsystem = "jobs", component = "google", bookmark_id = %bookmark.id)
    )]
    async fn find_links(&self, bookmark: &Bookmark, settings: &GoogleSettings) -> LinkLookup {
        if !settings.is_configured() {
            return LinkLookup::empty(LinkLookupStatus::MissingSettings);
        }

        let queries = build_queries(bookmark);
        if queries.is_empty() {
            return LinkLookup::empty(LinkLookupStatus::MissingQuery);
        }

        let outcomes = join_all(queries.iter().map(|q| self.run_query(q, settings))).await;

        let mut hits = Vec::new();
        let mut first_error = None;
        let mut any_ok = false;
        for outcome in outcomes {
            match outcome {
                Ok(found) => {
                    any_ok = true;
                    hits.extend(found);
                }
                Err(status) => {
                    first_error.get_or_insert(status);
                }
            }
        }

        if !any_ok {
            return LinkLookup::empty(first_error.unwrap_or(LinkLookupStatus::NetworkError));
        }

        let links = rank_links(query_title(bookmark).unwrap_or_default(), hits);
        debug!(query_count = queries.len(), result_count = links.len(), "Source links ranked");
        LinkLookup {
            links,
            status: LinkLookupStatus::Ok,
        }
    }
}
