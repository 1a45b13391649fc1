//! Wire types for the OpenAlex API.

use serde::Deserialize;
use serde_json::Value;

use paperloft_core::WorkSummary;

use crate::abstract_index::reconstruct_abstract;
use crate::query::normalize_openalex_id;

const DOI_PREFIX: &str = "https://doi.org/";
const MAX_LISTED_AUTHORS: usize = 6;

/// Page of `/works` results.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorksResponse {
    #[serde(default)]
    pub meta: ResponseMeta,
    #[serde(default)]
    pub results: Vec<Work>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMeta {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Work {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub publication_year: Option<i32>,
    #[serde(default)]
    pub publication_date: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
    /// Kept raw so a non-numeric value reads as unknown.
    #[serde(default)]
    pub cited_by_count: Value,
    #[serde(default)]
    pub authorships: Vec<Authorship>,
    #[serde(default)]
    pub abstract_inverted_index: Option<Value>,
    #[serde(default)]
    pub primary_location: Option<Location>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Authorship {
    #[serde(default)]
    pub author: Option<NamedEntity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub source: Option<NamedEntity>,
}

/// An author, source, or other named record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamedEntity {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// `/authors` or `/sources` search response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityResponse {
    #[serde(default)]
    pub results: Vec<NamedEntity>,
}

impl Work {
    /// Flatten into the fields a bookmark keeps.
    pub fn to_summary(&self) -> WorkSummary {
        let title = self
            .title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or("Untitled")
            .to_string();

        let names: Vec<&str> = self
            .authorships
            .iter()
            .take(MAX_LISTED_AUTHORS)
            .filter_map(|a| a.author.as_ref()?.display_name.as_deref())
            .filter(|n| !n.is_empty())
            .collect();
        let authors = if names.is_empty() {
            "Unknown".to_string()
        } else {
            names.join(", ")
        };

        let doi = self
            .doi
            .as_deref()
            .map(|d| d.replacen(DOI_PREFIX, "", 1))
            .unwrap_or_default();

        let abstract_text = self
            .abstract_inverted_index
            .as_ref()
            .map(reconstruct_abstract)
            .unwrap_or_default();

        let source = self
            .primary_location
            .as_ref()
            .and_then(|l| l.source.as_ref())
            .and_then(|s| s.display_name.clone())
            .unwrap_or_default();

        WorkSummary {
            id: normalize_openalex_id(&self.id),
            title,
            authors,
            year: self.publication_year,
            publication_date: self.publication_date.clone().unwrap_or_default(),
            doi,
            cited_by_count: self.cited_by_count.as_i64(),
            abstract_text,
            source,
            open_alex_url: self.id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_work_to_summary() {
        let work: Work = serde_json::from_value(json!({
            "id": "https://openalex.org/W2741809807",
            "title": "The state of OA",
            "publication_year": 2018,
            "publication_date": "2018-02-13",
            "doi": "https://doi.org/10.7717/peerj.4375",
            "cited_by_count": 812,
            "authorships": [
                {"author": {"id": "https://openalex.org/A1", "display_name": "Heather Piwowar"}},
                {"author": {"id": "https://openalex.org/A2", "display_name": "Jason Priem"}}
            ],
            "abstract_inverted_index": {"Despite": [0], "growing": [1]},
            "primary_location": {"source": {"display_name": "PeerJ"}}
        }))
        .unwrap();

        let summary = work.to_summary();
        assert_eq!(summary.id, "W2741809807");
        assert_eq!(summary.title, "The state of OA");
        assert_eq!(summary.authors, "Heather Piwowar, Jason Priem");
        assert_eq!(summary.year, Some(2018));
        assert_eq!(summary.doi, "10.7717/peerj.4375");
        assert_eq!(summary.cited_by_count, Some(812));
        assert_eq!(summary.abstract_text, "Despite growing");
        assert_eq!(summary.source, "PeerJ");
        assert_eq!(summary.open_alex_url, "https://openalex.org/W2741809807");
    }

    #[test]
    fn test_sparse_work_defaults() {
        let work: Work = serde_json::from_value(json!({
            "id": "https://openalex.org/W1",
            "title": null,
            "cited_by_count": "many",
            "authorships": [{"author": null}]
        }))
        .unwrap();

        let summary = work.to_summary();
        assert_eq!(summary.title, "Untitled");
        assert_eq!(summary.authors, "Unknown");
        assert_eq!(summary.year, None);
        assert_eq!(summary.doi, "");
        assert_eq!(summary.cited_by_count, None);
        assert_eq!(summary.abstract_text, "");
        assert_eq!(summary.source, "");
    }

    #[test]
    fn test_authors_capped_at_six() {
        let authorships: Vec<Value> = (1..=8)
            .map(|i| json!({"author": {"display_name": format!("Author {}", i)}}))
            .collect();
        let work: Work = serde_json::from_value(json!({
            "id": "W9",
            "authorships": authorships
        }))
        .unwrap();

        let summary = work.to_summary();
        assert_eq!(summary.authors.split(", ").count(), 6);
        assert!(summary.authors.ends_with("Author 6"));
    }

    #[test]
    fn test_meta_without_cursor() {
        let page: WorksResponse = serde_json::from_value(json!({
            "meta": {"count": 3, "next_cursor": null},
            "results": []
        }))
        .unwrap();
        assert_eq!(page.meta.count, Some(3));
        assert!(page.meta.next_cursor.is_none());
    }
}
