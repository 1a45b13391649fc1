//! AI-written notes and abstracts for bookmarks.
//!
//! Each request is a single chat completion. The prompt depends on the
//! [`AiNoteMode`]; an optional project instruction is appended to the system
//! message. Failures are reported as an [`AiNoteStatus`] and never retried.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use paperloft_core::{Bookmark, GenerationBackend, OpenAISettings};

use crate::openai::{OpenAIBackend, OpenAIConfig};

const SYSTEM_PROMPT: &str = "You are a research assistant helping a scholar keep notes on \
academic papers. Write in clear, precise prose. Do not invent results, numbers or \
citations that are not supported by the material you are given.";

/// What to generate for a bookmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiNoteMode {
    /// Rewrite the existing abstract in plainer language.
    RewriteAbstract,
    /// Write an abstract from bibliographic metadata alone.
    SynthesizeAbstract,
    /// One paragraph on the paper's key findings.
    FindingsSummary,
}

impl AiNoteMode {
    /// Whether the output is stored as the bookmark's AI abstract.
    pub fn writes_abstract(&self) -> bool {
        matches!(self, Self::RewriteAbstract | Self::SynthesizeAbstract)
    }
}

/// Outcome of one generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AiNoteStatus {
    Ok,
    /// No API key configured.
    MissingSettings,
    /// The bookmark lacks the text this mode needs.
    MissingInput,
    /// The request failed; `message` is shown inline.
    Error { message: String },
}

impl fmt::Display for AiNoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("ok"),
            Self::MissingSettings => f.write_str("Add your OpenAI API key in Settings first."),
            Self::MissingInput => f.write_str("This paper has no abstract to rewrite."),
            Self::Error { message } => write!(f, "AI request failed: {}", message),
        }
    }
}

/// Generated text plus status. `text` is empty unless `status` is `Ok`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiNote {
    pub mode: AiNoteMode,
    pub status: AiNoteStatus,
    pub text: String,
}

impl AiNote {
    fn failed(mode: AiNoteMode, status: AiNoteStatus) -> Self {
        Self {
            mode,
            status,
            text: String::new(),
        }
    }

    /// Write the generated text into the matching bookmark field.
    /// Does nothing unless generation succeeded.
    pub fn apply_to(&self, bookmark: &mut Bookmark) {
        if self.status != AiNoteStatus::Ok {
            return;
        }
        if self.mode.writes_abstract() {
            bookmark.ai_abstract = self.text.clone();
            bookmark.ai_abstract_generated = true;
        } else {
            bookmark.ai_summary = self.text.clone();
        }
    }
}

/// System and user messages for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotePrompt {
    pub system: String,
    pub user: String,
}

fn metadata_block(bookmark: &Bookmark) -> String {
    let mut lines = vec![format!("Title: {}", bookmark.title)];
    if !bookmark.authors.is_empty() {
        lines.push(format!("Authors: {}", bookmark.authors));
    }
    if let Some(year) = bookmark.year {
        lines.push(format!("Year: {}", year));
    }
    if !bookmark.source.is_empty() {
        lines.push(format!("Published in: {}", bookmark.source));
    }
    if !bookmark.doi.is_empty() {
        lines.push(format!("DOI: {}", bookmark.doi));
    }
    lines.join("\n")
}

/// Build the prompt for `mode`, or `None` when the bookmark lacks the input.
pub fn build_prompt(
    mode: AiNoteMode,
    bookmark: &Bookmark,
    project_instruction: Option<&str>,
) -> Option<NotePrompt> {
    let mut system = SYSTEM_PROMPT.to_string();
    if let Some(instruction) = project_instruction.map(str::trim).filter(|i| !i.is_empty()) {
        system.push_str("\n\nAdditional instructions for this project:\n");
        system.push_str(instruction);
    }

    let metadata = metadata_block(bookmark);
    let abstract_text = bookmark.abstract_text.trim();

    let user = match mode {
        AiNoteMode::RewriteAbstract => {
            if abstract_text.is_empty() {
                return None;
            }
            format!(
                "Rewrite the abstract below so a researcher outside the field can follow it. \
                 Keep every claim, drop jargon where possible, and stay under 200 words.\n\n\
                 {}\n\nAbstract:\n{}",
                metadata, abstract_text
            )
        }
        AiNoteMode::SynthesizeAbstract => {
            if bookmark.title.trim().is_empty() {
                return None;
            }
            format!(
                "No abstract is available for this paper. Based only on its bibliographic \
                 details, write a short, cautious abstract (at most 150 words) describing what \
                 the work most likely covers. Say so when something is uncertain.\n\n{}",
                metadata
            )
        }
        AiNoteMode::FindingsSummary => {
            let mut prompt = format!(
                "Write one paragraph summarizing the key findings and contributions of this \
                 paper for a literature review.\n\n{}",
                metadata
            );
            if !abstract_text.is_empty() {
                prompt.push_str("\n\nAbstract:\n");
                prompt.push_str(abstract_text);
            }
            prompt
        }
    };

    Some(NotePrompt { system, user })
}

/// Run one generation against an arbitrary backend.
pub async fn generate_note(
    backend: &dyn GenerationBackend,
    mode: AiNoteMode,
    bookmark: &Bookmark,
    project_instruction: Option<&str>,
) -> AiNote {
    let Some(prompt) = build_prompt(mode, bookmark, project_instruction) else {
        return AiNote::failed(mode, AiNoteStatus::MissingInput);
    };

    match backend.generate_with_system(&prompt.system, &prompt.user).await {
        Ok(text) if text.trim().is_empty() => AiNote::failed(
            mode,
            AiNoteStatus::Error {
                message: "empty response".to_string(),
            },
        ),
        Ok(text) => AiNote {
            mode,
            status: AiNoteStatus::Ok,
            text: text.trim().to_string(),
        },
        Err(e) => {
            warn!(
                subsystem = "inference",
                component = "notes",
                bookmark_id = %bookmark.id,
                ?mode,
                error = %e,
                "AI note generation failed"
            );
            AiNote::failed(
                mode,
                AiNoteStatus::Error {
                    message: e.to_string(),
                },
            )
        }
    }
}

/// Builds a per-user backend from endpoint settings and the user's key.
#[derive(Debug, Clone, Default)]
pub struct NoteWriter {
    endpoint: OpenAIConfig,
}

impl NoteWriter {
    pub fn new(endpoint: OpenAIConfig) -> Self {
        Self { endpoint }
    }

    pub fn from_env() -> Self {
        Self::new(OpenAIConfig::from_env())
    }

    /// Generate a note with the user's OpenAI settings.
    #[instrument(
        skip(self, settings, bookmark, project_instruction),
        fields(subsystem = "inference", component = "notes", bookmark_id = %bookmark.id)
    )]
    pub async fn write(
        &self,
        settings: &OpenAISettings,
        mode: AiNoteMode,
        bookmark: &Bookmark,
        project_instruction: Option<&str>,
    ) -> AiNote {
        if !settings.is_configured() {
            return AiNote::failed(mode, AiNoteStatus::MissingSettings);
        }

        let backend = match OpenAIBackend::new(self.endpoint.clone().with_settings(settings)) {
            Ok(backend) => backend,
            Err(e) => {
                return AiNote::failed(
                    mode,
                    AiNoteStatus::Error {
                        message: e.to_string(),
                    },
                )
            }
        };

        let note = generate_note(&backend, mode, bookmark, project_instruction).await;
        if note.status == AiNoteStatus::Ok {
            info!(?mode, text_len = note.text.len(), "AI note generated");
        }
        note
    }
}
