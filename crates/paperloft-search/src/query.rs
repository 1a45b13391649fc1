//! Query, filter and sort construction for the works endpoint.

use serde::{Deserialize, Serialize};

/// User-entered search form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    /// Free-text keywords.
    pub query: String,
    /// Phrase that must appear verbatim.
    pub exact_phrase: String,
    /// Restrict to titles containing this text.
    pub title_term: String,
    /// Restrict to abstracts containing this text.
    pub abstract_term: String,
    /// Author name, resolved to an author ID before searching.
    pub author_name: String,
    /// Journal/venue name, resolved to a source ID before searching.
    pub source_name: String,
    /// First publication year (inclusive), as typed.
    pub from_year: String,
    /// Last publication year (inclusive), as typed.
    pub to_year: String,
}

impl SearchFilters {
    /// Whether any field carries input.
    pub fn has_input(&self) -> bool {
        [
            &self.query,
            &self.exact_phrase,
            &self.title_term,
            &self.abstract_term,
            &self.author_name,
            &self.source_name,
            &self.from_year,
            &self.to_year,
        ]
        .iter()
        .any(|field| !field.trim().is_empty())
    }

    /// Keywords plus the quoted exact phrase, space-joined.
    pub fn combined_query(&self) -> String {
        let mut parts = Vec::new();
        let query = self.query.trim();
        if !query.is_empty() {
            parts.push(query.to_string());
        }
        let phrase = self.exact_phrase.trim();
        if !phrase.is_empty() {
            parts.push(format!("\"{}\"", phrase));
        }
        parts.join(" ")
    }
}

/// Result ordering. `None` at the call site means provider relevance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    DateDesc,
    DateAsc,
    CiteDesc,
    CiteAsc,
}

impl SortOrder {
    /// Provider `sort` parameter value.
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::DateDesc => "publication_date:desc",
            Self::DateAsc => "publication_date:asc",
            Self::CiteDesc => "cited_by_count:desc",
            Self::CiteAsc => "cited_by_count:asc",
        }
    }
}

/// An author or source name resolved to a provider ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEntity {
    /// Short ID (`A5023888391`, `S137773608`).
    pub id: String,
    /// `"Display Name (ID)"`, or the bare ID when unnamed.
    pub label: String,
}

/// Trailing path segment of a URL-form ID (`https://openalex.org/A1` → `A1`).
pub fn normalize_openalex_id(raw: &str) -> String {
    raw.rsplit('/').next().unwrap_or_default().to_string()
}

fn parse_year(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let digits_end = trimmed
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    trimmed[..digits_end].parse::<i64>().ok().filter(|y| *y >= 1)
}

/// `YYYY-01-01` for a valid positive year, else an empty string.
pub fn safe_year_to_date_start(raw: &str) -> String {
    parse_year(raw)
        .map(|y| format!("{:04}-01-01", y))
        .unwrap_or_default()
}

/// `YYYY-12-31` for a valid positive year, else an empty string.
pub fn safe_year_to_date_end(raw: &str) -> String {
    parse_year(raw)
        .map(|y| format!("{:04}-12-31", y))
        .unwrap_or_default()
}

/// Comma-joined `field:value` filter clauses.
pub fn build_filter(
    filters: &SearchFilters,
    author: Option<&ResolvedEntity>,
    source: Option<&ResolvedEntity>,
) -> String {
    let mut clauses = Vec::new();

    let title = filters.title_term.trim();
    if !title.is_empty() {
        clauses.push(format!("title.search:{}", title));
    }
    let abstract_term = filters.abstract_term.trim();
    if !abstract_term.is_empty() {
        clauses.push(format!("abstract.search:{}", abstract_term));
    }

    let from = safe_year_to_date_start(&filters.from_year);
    if !from.is_empty() {
        clauses.push(format!("from_publication_date:{}", from));
    }
    let to = safe_year_to_date_end(&filters.to_year);
    if !to.is_empty() {
        clauses.push(format!("to_publication_date:{}", to));
    }

    if let Some(author) = author {
        clauses.push(format!("authorships.author.id:{}", author.id));
    }
    if let Some(source) = source {
        clauses.push(format!("primary_location.source.id:{}", source.id));
    }

    clauses.join(",")
}

/// Human-readable description of the resolved filters.
pub fn describe_filters(
    filters: &SearchFilters,
    author: Option<&ResolvedEntity>,
    source: Option<&ResolvedEntity>,
) -> String {
    let mut parts = Vec::new();

    match author {
        Some(a) => parts.push(format!("Author: {}", a.label)),
        None if !filters.author_name.trim().is_empty() => {
            parts.push("Author: (no match)".to_string())
        }
        None => {}
    }
    match source {
        Some(s) => parts.push(format!("Source: {}", s.label)),
        None if !filters.source_name.trim().is_empty() => {
            parts.push("Source: (no match)".to_string())
        }
        None => {}
    }

    let from = safe_year_to_date_start(&filters.from_year);
    let to = safe_year_to_date_end(&filters.to_year);
    if !from.is_empty() || !to.is_empty() {
        let shown = |raw: &str| {
            let raw = raw.trim();
            if raw.is_empty() {
                "…".to_string()
            } else {
                raw.to_string()
            }
        };
        parts.push(format!(
            "Date range: {}–{}",
            shown(&filters.from_year),
            shown(&filters.to_year)
        ));
    }

    if parts.is_empty() {
        "Searching...".to_string()
    } else {
        parts.join(" • ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str, name: &str) -> ResolvedEntity {
        ResolvedEntity {
            id: id.to_string(),
            label: format!("{} ({})", name, id),
        }
    }

    #[test]
    fn test_year_bounds() {
        assert_eq!(safe_year_to_date_start("2020"), "2020-01-01");
        assert_eq!(safe_year_to_date_end("2020"), "2020-12-31");
        assert_eq!(safe_year_to_date_start("  999 "), "0999-01-01");
        assert_eq!(safe_year_to_date_end("0"), "");
        assert_eq!(safe_year_to_date_start("-5"), "");
        assert_eq!(safe_year_to_date_start("abc"), "");
        assert_eq!(safe_year_to_date_start(""), "");
    }

    #[test]
    fn test_year_leading_digits_like_parse_int() {
        assert_eq!(safe_year_to_date_start("2019abc"), "2019-01-01");
        assert_eq!(safe_year_to_date_start("2019.7"), "2019-01-01");
        assert_eq!(safe_year_to_date_start("+2001"), "2001-01-01");
    }

    #[test]
    fn test_combined_query() {
        let filters = SearchFilters {
            query: " graph neural ".to_string(),
            exact_phrase: "message passing".to_string(),
            ..Default::default()
        };
        assert_eq!(filters.combined_query(), "graph neural \"message passing\"");

        let only_phrase = SearchFilters {
            exact_phrase: "x".to_string(),
            ..Default::default()
        };
        assert_eq!(only_phrase.combined_query(), "\"x\"");
    }

    #[test]
    fn test_has_input() {
        assert!(!SearchFilters::default().has_input());
        let filters = SearchFilters {
            to_year: "2001".to_string(),
            ..Default::default()
        };
        assert!(filters.has_input());
    }

    #[test]
    fn test_build_filter_order_and_ids() {
        let filters = SearchFilters {
            title_term: "transformer".to_string(),
            abstract_term: "attention".to_string(),
            from_year: "2017".to_string(),
            to_year: "2019".to_string(),
            ..Default::default()
        };
        let author = entity("A1", "Ashish Vaswani");
        let source = entity("S2", "NeurIPS");
        assert_eq!(
            build_filter(&filters, Some(&author), Some(&source)),
            "title.search:transformer,abstract.search:attention,\
             from_publication_date:2017-01-01,to_publication_date:2019-12-31,\
             authorships.author.id:A1,primary_location.source.id:S2"
        );
    }

    #[test]
    fn test_build_filter_skips_invalid_years() {
        let filters = SearchFilters {
            from_year: "0".to_string(),
            to_year: "nope".to_string(),
            ..Default::default()
        };
        assert_eq!(build_filter(&filters, None, None), "");
    }

    #[test]
    fn test_sort_params() {
        assert_eq!(SortOrder::DateDesc.as_param(), "publication_date:desc");
        assert_eq!(SortOrder::CiteAsc.as_param(), "cited_by_count:asc");
        let parsed: SortOrder = serde_json::from_str("\"cite_desc\"").unwrap();
        assert_eq!(parsed, SortOrder::CiteDesc);
    }

    #[test]
    fn test_normalize_id() {
        assert_eq!(normalize_openalex_id("https://openalex.org/A5023888391"), "A5023888391");
        assert_eq!(normalize_openalex_id("S1"), "S1");
        assert_eq!(normalize_openalex_id(""), "");
    }

    #[test]
    fn test_describe_filters() {
        let filters = SearchFilters {
            author_name: "Nobody".to_string(),
            source_name: "Nature".to_string(),
            from_year: "2019".to_string(),
            ..Default::default()
        };
        let source = entity("S1", "Nature");
        assert_eq!(
            describe_filters(&filters, None, Some(&source)),
            "Author: (no match) • Source: Nature (S1) • Date range: 2019–…"
        );
        assert_eq!(
            describe_filters(&SearchFilters::default(), None, None),
            "Searching..."
        );
    }
}
