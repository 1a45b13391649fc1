//! # paperloft-inference
//!
//! AI note generation for paperloft bookmarks.
//!
//! This crate provides:
//! - An OpenAI-compatible chat backend ([`OpenAIBackend`])
//! - Prompt construction for rewritten abstracts, synthesized abstracts and
//!   findings summaries ([`build_prompt`], [`AiNoteMode`])
//! - [`NoteWriter`], which runs one request with a user's own settings and
//!   reports the outcome as an [`AiNoteStatus`]
//!
//! # Feature Flags
//!
//! - `mock`: expose [`mock::MockGenerationBackend`] outside this crate's tests

pub mod notes;
pub mod openai;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use notes::{build_prompt, generate_note, AiNote, AiNoteMode, AiNoteStatus, NotePrompt, NoteWriter};
pub use openai::{OpenAIBackend, OpenAIConfig};
