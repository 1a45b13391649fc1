//! Core data models for paperloft.
//!
//! JSON field names follow the persisted local format (`researchBookmarks`,
//! `researchProjects`, provider settings) so stored data stays readable by
//! older front ends.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// =============================================================================
// SEARCH RESULTS
// =============================================================================

/// A scholarly work as returned by the metadata search client, already
/// flattened into the fields a bookmark keeps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkSummary {
    /// Short work identifier (e.g. `W2741809807`).
    pub id: String,
    pub title: String,
    /// Up to six author display names joined with `", "`.
    pub authors: String,
    pub year: Option<i32>,
    pub publication_date: String,
    /// DOI without the `https://doi.org/` prefix.
    pub doi: String,
    pub cited_by_count: Option<i64>,
    /// Reconstructed abstract text (empty when unavailable).
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Venue display name of the primary location.
    pub source: String,
    /// Canonical OpenAlex URL of the work.
    #[serde(rename = "openAlexUrl")]
    pub open_alex_url: String,
}

// =============================================================================
// BOOKMARKS
// =============================================================================

/// A candidate source link found by web search for a bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLink {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub score: i32,
}

/// Outcome of the source-link lookup for one bookmark.
///
/// Persisted as the original status strings: `pending`, `ok`,
/// `missing_settings`, `missing_query`, `error_<http status>`, `error_network`.
/// An empty string (never looked up) maps to [`LinkLookupStatus::Unset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkLookupStatus {
    #[default]
    Unset,
    Pending,
    Ok,
    MissingSettings,
    MissingQuery,
    HttpError(u16),
    NetworkError,
}

impl LinkLookupStatus {
    /// Whether the lookup finished (successfully or not).
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Unset | Self::Pending)
    }
}

impl fmt::Display for LinkLookupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.write_str(""),
            Self::Pending => f.write_str("pending"),
            Self::Ok => f.write_str("ok"),
            Self::MissingSettings => f.write_str("missing_settings"),
            Self::MissingQuery => f.write_str("missing_query"),
            Self::HttpError(code) => write!(f, "error_{}", code),
            Self::NetworkError => f.write_str("error_network"),
        }
    }
}

impl FromStr for LinkLookupStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "pending" => Self::Pending,
            "ok" => Self::Ok,
            "missing_settings" => Self::MissingSettings,
            "missing_query" => Self::MissingQuery,
            "error_network" => Self::NetworkError,
            other => other
                .strip_prefix("error_")
                .and_then(|code| code.parse().ok())
                .map(Self::HttpError)
                .unwrap_or(Self::Unset),
        })
    }
}

impl Serialize for LinkLookupStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LinkLookupStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        Ok(raw.parse().unwrap_or_default())
    }
}

/// A saved paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: String,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub year: Option<i32>,
    #[serde(default)]
    pub publication_date: String,
    #[serde(default)]
    pub doi: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub cited_by_count: Option<i64>,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    #[serde(default)]
    pub source: String,
    #[serde(rename = "openAlexUrl", default)]
    pub open_alex_url: String,
    #[serde(default)]
    pub note: String,
    /// Creation time in epoch milliseconds.
    #[serde(rename = "createdAt", default)]
    pub created_at: i64,
    #[serde(rename = "googleLinks", default)]
    pub google_links: Vec<SourceLink>,
    #[serde(rename = "googleLinksStatus", default)]
    pub google_links_status: LinkLookupStatus,
    #[serde(rename = "aiSummary", default)]
    pub ai_summary: String,
    #[serde(rename = "aiAbstract", default)]
    pub ai_abstract: String,
    #[serde(rename = "aiAbstractGenerated", default)]
    pub ai_abstract_generated: bool,
}

impl Bookmark {
    /// Build a fresh bookmark from a search hit, enrichment marked pending.
    pub fn from_work(work: &WorkSummary, created_at: i64) -> Self {
        Self {
            id: work.id.clone(),
            title: work.title.clone(),
            authors: work.authors.clone(),
            year: work.year,
            publication_date: work.publication_date.clone(),
            doi: work.doi.clone(),
            cited_by_count: work.cited_by_count,
            abstract_text: work.abstract_text.clone(),
            source: work.source.clone(),
            open_alex_url: work.open_alex_url.clone(),
            note: String::new(),
            created_at,
            google_links: Vec::new(),
            google_links_status: LinkLookupStatus::Pending,
            ai_summary: String::new(),
            ai_abstract: String::new(),
            ai_abstract_generated: false,
        }
    }

    /// First listed author, if any.
    pub fn first_author(&self) -> Option<&str> {
        self.authors
            .split(',')
            .map(str::trim)
            .find(|a| !a.is_empty() && *a != "Unknown")
    }

    /// Link to the paper: DOI resolver when a DOI is known, else the OpenAlex page.
    pub fn canonical_url(&self) -> String {
        if self.doi.is_empty() {
            self.open_alex_url.clone()
        } else {
            format!("https://doi.org/{}", self.doi)
        }
    }
}

// =============================================================================
// PROJECTS
// =============================================================================

/// A named group of bookmarks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: i64,
    #[serde(rename = "paperIds", default)]
    pub paper_ids: Vec<String>,
    /// Extra instruction appended to AI prompts for papers in this project.
    #[serde(rename = "gptInstruction", default)]
    pub gpt_instruction: String,
}

impl Project {
    pub fn contains(&self, bookmark_id: &str) -> bool {
        self.paper_ids.iter().any(|id| id == bookmark_id)
    }
}

/// Partial update for a project. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "gptInstruction")]
    pub gpt_instruction: Option<String>,
}

// =============================================================================
// SETTINGS
// =============================================================================

/// Google Custom Search credentials.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub cx: String,
}

impl GoogleSettings {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.cx.trim().is_empty()
    }
}

impl fmt::Debug for GoogleSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleSettings")
            .field("api_key", &redact(&self.api_key))
            .field("cx", &self.cx)
            .finish()
    }
}

/// Default chat model for AI notes.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// OpenAI chat settings chosen by the user.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenAISettings {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Synthesize an abstract for new bookmarks that arrive without one.
    pub generate_abstractions: bool,
}

impl Default for OpenAISettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            temperature: 0.3,
            max_tokens: 500,
            generate_abstractions: false,
        }
    }
}

impl OpenAISettings {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl fmt::Debug for OpenAISettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAISettings")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("generate_abstractions", &self.generate_abstractions)
            .finish()
    }
}

/// The settings blob mirrored (encrypted) to the cloud.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrivateSettings {
    #[serde(default)]
    pub google: GoogleSettings,
    #[serde(default)]
    pub openai: OpenAISettings,
}

impl PrivateSettings {
    /// True when at least one provider API key is present.
    pub fn has_tokens(&self) -> bool {
        !self.google.api_key.is_empty() || !self.openai.api_key.is_empty()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "[REDACTED]"
    }
}

// =============================================================================
// LENIENT NUMBERS
// =============================================================================

/// Accepts a number, a numeric string, or anything else as `None`.
///
/// Older stored bookmarks carry `"Unknown"` or `""` for missing years.
fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_i32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
    Ok(lenient_i64(deserializer)?.and_then(|n| i32::try_from(n).ok()))
}
