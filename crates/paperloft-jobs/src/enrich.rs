//! Enrichment of a single bookmark.
//!
//! Runs after a bookmark is saved: finds candidate source links and, when the
//! user enabled it, synthesizes an abstract for papers that arrived without
//! one. Results are patched onto the stored bookmark; a bookmark removed in the
//! meantime is left alone.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, instrument};

use paperloft_core::{
    Bookmark, Library, LinkLookupStatus, OpenAISettings, Result, SourceLinkFinder,
};
use paperloft_inference::{AiNote, AiNoteMode, AiNoteStatus, NoteWriter};

/// Produces AI notes with a user's own OpenAI settings.
#[async_trait]
pub trait NoteService: Send + Sync {
    async fn write(
        &self,
        settings: &OpenAISettings,
        mode: AiNoteMode,
        bookmark: &Bookmark,
        project_instruction: Option<&str>,
    ) -> AiNote;
}

#[async_trait]
impl NoteService for NoteWriter {
    async fn write(
        &self,
        settings: &OpenAISettings,
        mode: AiNoteMode,
        bookmark: &Bookmark,
        project_instruction: Option<&str>,
    ) -> AiNote {
        NoteWriter::write(self, settings, mode, bookmark, project_instruction).await
    }
}

/// What enrichment did for one bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichmentOutcome {
    pub bookmark_id: String,
    pub links_status: LinkLookupStatus,
    pub link_count: usize,
    /// `None` when no abstract was attempted.
    pub abstract_status: Option<AiNoteStatus>,
    /// False when the bookmark disappeared before results were written.
    pub applied: bool,
}

/// Enriches bookmarks stored in a [`Library`].
#[derive(Clone)]
pub struct Enricher {
    library: Arc<Library>,
    links: Arc<dyn SourceLinkFinder>,
    notes: Arc<dyn NoteService>,
}

impl Enricher {
    pub fn new(
        library: Arc<Library>,
        links: Arc<dyn SourceLinkFinder>,
        notes: Arc<dyn NoteService>,
    ) -> Self {
        Self {
            library,
            links,
            notes,
        }
    }

    pub fn library(&self) -> &Arc<Library> {
        &self.library
    }

    pub fn notes(&self) -> &Arc<dyn NoteService> {
        &self.notes
    }

    /// Look up source links for a bookmark and store them.
    pub async fn refresh_links(&self, bookmark: &Bookmark) -> Result<(LinkLookupStatus, usize, bool)> {
        let settings = self.library.store().google_settings()?;
        let lookup = self.links.find_links(bookmark, &settings).await;
        let status = lookup.status;
        let count = lookup.links.len();

        let applied = self
            .library
            .patch_bookmark(&bookmark.id, |b| {
                b.google_links = lookup.links;
                b.google_links_status = lookup.status;
            })?
            .is_some();

        debug!(
            subsystem = "jobs",
            component = "enricher",
            bookmark_id = %bookmark.id,
            status = %status,
            result_count = count,
            "Source links stored"
        );
        Ok((status, count, applied))
    }

    /// Synthesize an abstract when the user opted in and none exists.
    async fn maybe_generate_abstract(&self, bookmark: &Bookmark) -> Result<Option<(AiNoteStatus, bool)>> {
        let settings = self.library.store().openai_settings()?;
        let wanted = settings.generate_abstractions
            && settings.is_configured()
            && bookmark.abstract_text.trim().is_empty()
            && bookmark.ai_abstract.trim().is_empty();
        if !wanted {
            return Ok(None);
        }

        let note = self
            .notes
            .write(&settings, AiNoteMode::SynthesizeAbstract, bookmark, None)
            .await;
        let applied = if note.status == AiNoteStatus::Ok {
            self.library
                .patch_bookmark(&bookmark.id, |b| note.apply_to(b))?
                .is_some()
        } else {
            false
        };
        Ok(Some((note.status, applied)))
    }

    /// Run every enrichment step for the bookmark with `bookmark_id`.
    ///
    /// Returns `Ok(None)` when the bookmark no longer exists.
    #[instrument(skip(self), fields(subsystem = "jobs", component = "enricher", op = "enrich"))]
    pub async fn enrich(&self, bookmark_id: &str) -> Result<Option<EnrichmentOutcome>> {
        let Some(bookmark) = self.library.bookmark(bookmark_id)? else {
            debug!("Bookmark gone before enrichment");
            return Ok(None);
        };

        let (links_status, link_count, links_applied) = self.refresh_links(&bookmark).await?;
        let abstract_result = self.maybe_generate_abstract(&bookmark).await?;

        let outcome = EnrichmentOutcome {
            bookmark_id: bookmark_id.to_string(),
            links_status,
            link_count,
            applied: links_applied,
            abstract_status: abstract_result.map(|(status, _)| status),
        };
        info!(
            links_status = %outcome.links_status,
            result_count = outcome.link_count,
            abstract_attempted = outcome.abstract_status.is_some(),
            "Bookmark enriched"
        );
        Ok(Some(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperloft_core::{GoogleSettings, LinkLookup, LocalStore, SourceLink, WorkSummary};
    use paperloft_inference::generate_note;
    use paperloft_inference::mock::MockGenerationBackend;

    struct FixedFinder;

    #[async_trait]
    impl SourceLinkFinder for FixedFinder {
        async fn find_links(&self, _bookmark: &Bookmark, settings: &GoogleSettings) -> LinkLookup {
            if !settings.is_configured() {
                return LinkLookup::empty(LinkLookupStatus::MissingSettings);
            }
            LinkLookup {
                links: vec![SourceLink {
                    title: "Publisher".to_string(),
                    link: "https://publisher.example/paper".to_string(),
                    snippet: String::new(),
                    score: 4,
                }],
                status: LinkLookupStatus::Ok,
            }
        }
    }

    struct MockNotes(MockGenerationBackend);

    #[async_trait]
    impl NoteService for MockNotes {
        async fn write(
            &self,
            _settings: &OpenAISettings,
            mode: AiNoteMode,
            bookmark: &Bookmark,
            project_instruction: Option<&str>,
        ) -> AiNote {
            generate_note(&self.0, mode, bookmark, project_instruction).await
        }
    }

    fn work(id: &str, abstract_text: &str) -> WorkSummary {
        WorkSummary {
            id: id.to_string(),
            title: "A Paper".to_string(),
            authors: "Ada Lovelace".to_string(),
            year: Some(1843),
            publication_date: String::new(),
            doi: String::new(),
            cited_by_count: None,
            abstract_text: abstract_text.to_string(),
            source: String::new(),
            open_alex_url: String::new(),
        }
    }

    fn setup(backend: MockGenerationBackend) -> Enricher {
        let library = Arc::new(Library::new(LocalStore::in_memory()));
        Enricher::new(library, Arc::new(FixedFinder), Arc::new(MockNotes(backend)))
    }

    #[tokio::test]
    async fn test_missing_settings_recorded_on_bookmark() {
        let enricher = setup(MockGenerationBackend::new());
        enricher.library().toggle_bookmark(&work("W1", "abs")).unwrap();

        let outcome = enricher.enrich("W1").await.unwrap().unwrap();
        assert_eq!(outcome.links_status, LinkLookupStatus::MissingSettings);
        assert!(outcome.abstract_status.is_none());

        let stored = enricher.library().bookmark("W1").unwrap().unwrap();
        assert_eq!(stored.google_links_status, LinkLookupStatus::MissingSettings);
    }

    #[tokio::test]
    async fn test_links_and_auto_abstract() {
        let backend = MockGenerationBackend::new().with_response("Synthesized abstract.");
        let enricher = setup(backend.clone());
        let store = enricher.library().store().clone();
        store
            .save_google_settings(&GoogleSettings {
                api_key: "k".to_string(),
                cx: "c".to_string(),
            })
            .unwrap();
        store
            .save_openai_settings(&OpenAISettings {
                api_key: "sk".to_string(),
                generate_abstractions: true,
                ..Default::default()
            })
            .unwrap();
        enricher.library().toggle_bookmark(&work("W2", "")).unwrap();

        let outcome = enricher.enrich("W2").await.unwrap().unwrap();
        assert_eq!(outcome.link_count, 1);
        assert_eq!(outcome.abstract_status, Some(AiNoteStatus::Ok));
        assert_eq!(backend.call_count(), 1);

        let stored = enricher.library().bookmark("W2").unwrap().unwrap();
        assert_eq!(stored.google_links.len(), 1);
        assert_eq!(stored.ai_abstract, "Synthesized abstract.");
        assert!(stored.ai_abstract_generated);
    }

    #[tokio::test]
    async fn test_existing_abstract_skips_generation() {
        let backend = MockGenerationBackend::new();
        let enricher = setup(backend.clone());
        enricher
            .library()
            .store()
            .save_openai_settings(&OpenAISettings {
                api_key: "sk".to_string(),
                generate_abstractions: true,
                ..Default::default()
            })
            .unwrap();
        enricher.library().toggle_bookmark(&work("W3", "Has one.")).unwrap();

        let outcome = enricher.enrich("W3").await.unwrap().unwrap();
        assert!(outcome.abstract_status.is_none());
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_bookmark_is_none() {
        let enricher = setup(MockGenerationBackend::new());
        assert!(enricher.enrich("nope").await.unwrap().is_none());
    }
}
