//! Filtering and ordering of bookmark lists for display.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::Bookmark;

/// Display order for a bookmark list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookmarkSort {
    /// Most recently saved first.
    #[default]
    RecentDesc,
    RecentAsc,
    TitleAsc,
    TitleDesc,
    /// Newest publication year first; missing years count as 0.
    YearDesc,
    YearAsc,
    /// Most cited first; missing counts as -1.
    CiteDesc,
    CiteAsc,
}

/// Case-insensitive substring filter over title, authors, year,
/// publication date, DOI and note. A blank term keeps everything.
pub fn filter_bookmarks<'a>(bookmarks: &'a [Bookmark], term: &str) -> Vec<&'a Bookmark> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return bookmarks.iter().collect();
    }
    bookmarks
        .iter()
        .filter(|b| matches_term(b, &needle))
        .collect()
}

fn matches_term(bookmark: &Bookmark, needle: &str) -> bool {
    let year = bookmark.year.map(|y| y.to_string()).unwrap_or_default();
    [
        bookmark.title.as_str(),
        bookmark.authors.as_str(),
        year.as_str(),
        bookmark.publication_date.as_str(),
        bookmark.doi.as_str(),
        bookmark.note.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

/// Stable in-place sort.
pub fn sort_bookmarks(bookmarks: &mut [&Bookmark], sort: BookmarkSort) {
    bookmarks.sort_by(|a, b| compare(a, b, sort));
}

fn compare(a: &Bookmark, b: &Bookmark, sort: BookmarkSort) -> Ordering {
    let year = |bm: &Bookmark| bm.year.unwrap_or(0);
    let cites = |bm: &Bookmark| bm.cited_by_count.unwrap_or(-1);
    match sort {
        BookmarkSort::RecentDesc => b.created_at.cmp(&a.created_at),
        BookmarkSort::RecentAsc => a.created_at.cmp(&b.created_at),
        BookmarkSort::TitleAsc => compare_text(&a.title, &b.title),
        BookmarkSort::TitleDesc => compare_text(&b.title, &a.title),
        BookmarkSort::YearDesc => year(b).cmp(&year(a)),
        BookmarkSort::YearAsc => year(a).cmp(&year(b)),
        BookmarkSort::CiteDesc => cites(b).cmp(&cites(a)),
        BookmarkSort::CiteAsc => cites(a).cmp(&cites(b)),
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Filter then sort, returning owned bookmarks ready to serialize.
pub fn arrange(bookmarks: &[Bookmark], term: &str, sort: BookmarkSort) -> Vec<Bookmark> {
    let mut visible = filter_bookmarks(bookmarks, term);
    sort_bookmarks(&mut visible, sort);
    visible.into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LinkLookupStatus;

    fn bookmark(id: &str, title: &str, year: Option<i32>, cites: Option<i64>) -> Bookmark {
        Bookmark {
            id: id.to_string(),
            title: title.to_string(),
            authors: "Grace Hopper".to_string(),
            year,
            publication_date: String::new(),
            doi: String::new(),
            cited_by_count: cites,
            abstract_text: String::new(),
            source: String::new(),
            open_alex_url: String::new(),
            note: String::new(),
            created_at: 0,
            google_links: vec![],
            google_links_status: LinkLookupStatus::Ok,
            ai_summary: String::new(),
            ai_abstract: String::new(),
            ai_abstract_generated: false,
        }
    }

    fn ids(list: &[Bookmark]) -> Vec<&str> {
        list.iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn test_year_desc_missing_last() {
        let list = vec![
            bookmark("a", "A", Some(2020), None),
            bookmark("b", "B", None, None),
            bookmark("c", "C", Some(2019), None),
        ];
        let sorted = arrange(&list, "", BookmarkSort::YearDesc);
        assert_eq!(ids(&sorted), vec!["a", "c", "b"]);

        let sorted = arrange(&list, "", BookmarkSort::YearAsc);
        assert_eq!(ids(&sorted), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_citations_missing_before_zero() {
        let list = vec![
            bookmark("zero", "Z", None, Some(0)),
            bookmark("none", "N", None, None),
            bookmark("ten", "T", None, Some(10)),
        ];
        let sorted = arrange(&list, "", BookmarkSort::CiteAsc);
        assert_eq!(ids(&sorted), vec!["none", "zero", "ten"]);
        let sorted = arrange(&list, "", BookmarkSort::CiteDesc);
        assert_eq!(ids(&sorted), vec!["ten", "zero", "none"]);
    }

    #[test]
    fn test_title_sort_case_insensitive_and_stable() {
        let list = vec![
            bookmark("1", "beta", None, None),
            bookmark("2", "Alpha", None, None),
            bookmark("3", "BETA", None, None),
        ];
        let sorted = arrange(&list, "", BookmarkSort::TitleAsc);
        assert_eq!(ids(&sorted), vec!["2", "1", "3"]);
        let sorted = arrange(&list, "", BookmarkSort::TitleDesc);
        assert_eq!(ids(&sorted), vec!["1", "3", "2"]);
    }

    #[test]
    fn test_recent_sorts() {
        let mut old = bookmark("old", "O", None, None);
        old.created_at = 1;
        let mut new = bookmark("new", "N", None, None);
        new.created_at = 2;
        let list = vec![old, new];
        assert_eq!(ids(&arrange(&list, "", BookmarkSort::default())), vec!["new", "old"]);
        assert_eq!(ids(&arrange(&list, "", BookmarkSort::RecentAsc)), vec!["old", "new"]);
    }

    #[test]
    fn test_filter_note_only_match() {
        let mut with_note = bookmark("n", "Compilers", None, None);
        with_note.note = "Revisit the LALR section".to_string();
        let list = vec![with_note, bookmark("x", "Compilers", None, None)];

        let found = filter_bookmarks(&list, "lalr");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "n");
    }

    #[test]
    fn test_filter_by_year_and_blank_term() {
        let list = vec![
            bookmark("a", "A", Some(2001), None),
            bookmark("b", "B", Some(1999), None),
        ];
        assert_eq!(filter_bookmarks(&list, "2001").len(), 1);
        assert_eq!(filter_bookmarks(&list, "   ").len(), 2);
    }

    #[test]
    fn test_sort_serde_names() {
        let sort: BookmarkSort = serde_json::from_str("\"cite_desc\"").unwrap();
        assert_eq!(sort, BookmarkSort::CiteDesc);
        assert_eq!(
            serde_json::to_string(&BookmarkSort::RecentAsc).unwrap(),
            "\"recent_asc\""
        );
    }
}
