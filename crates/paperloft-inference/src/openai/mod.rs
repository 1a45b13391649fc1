//! OpenAI-compatible generation backend.
//!
//! Works with any endpoint speaking the `/chat/completions` protocol
//! (OpenAI, OpenRouter, Azure OpenAI, local servers).
//!
//! # Example
//!
//! ```rust,no_run
//! use paperloft_core::{GenerationBackend, OpenAISettings};
//! use paperloft_inference::openai::{OpenAIBackend, OpenAIConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = OpenAISettings {
//!         api_key: "sk-...".to_string(),
//!         ..Default::default()
//!     };
//!     let config = OpenAIConfig::from_env().with_settings(&settings);
//!     let backend = OpenAIBackend::new(config).unwrap();
//!     let text = backend.generate("Summarize attention in one line.").await.unwrap();
//!     println!("{}", text);
//! }
//! ```

mod backend;
mod error;
mod types;

pub use backend::{OpenAIBackend, OpenAIConfig, DEFAULT_OPENAI_URL, DEFAULT_TIMEOUT_SECS};
pub use error::{to_core_error, OpenAIErrorCode};
pub use types::*;
