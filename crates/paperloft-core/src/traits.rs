//! Core traits for paperloft abstractions.
//!
//! These traits define the seams between the library logic and concrete
//! storage, network and model backends, so each piece can be swapped for an
//! in-memory or mock implementation in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::artifact::{Artifact, PrivateSettingsDoc};
use crate::error::Result;
use crate::events::StoreChange;
use crate::models::{Bookmark, GoogleSettings, LinkLookupStatus, SourceLink};

// =============================================================================
// LOCAL STORAGE
// =============================================================================

/// Flat string key-value storage for local persistence.
///
/// Values are serialized JSON documents stored under fixed keys.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Missing keys are not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

// =============================================================================
// CLOUD DOCUMENT STORE
// =============================================================================

/// Remote document store with an `artifacts` collection (queried by owner)
/// and a `userPrivate` collection (one encrypted settings doc per user).
///
/// Writes are per-document upserts; the last writer wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert or replace an artifact by its ID.
    async fn put_artifact(&self, artifact: &Artifact) -> Result<()>;

    /// All artifacts whose `owner` equals `owner`.
    async fn list_artifacts(&self, owner: &str) -> Result<Vec<Artifact>>;

    /// Delete `owner`'s artifact `id`. Returns whether it existed.
    ///
    /// Artifacts belonging to another owner are left untouched.
    async fn delete_artifact(&self, owner: &str, id: &str) -> Result<bool>;

    /// Load the private settings document for a user.
    async fn get_private_settings(&self, user_id: &str) -> Result<Option<PrivateSettingsDoc>>;

    /// Store the private settings document for a user.
    async fn put_private_settings(&self, user_id: &str, doc: &PrivateSettingsDoc) -> Result<()>;

    /// Subscribe to changes written through this store.
    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}

// =============================================================================
// ENRICHMENT TRAITS
// =============================================================================

/// Backend for text generation (LLM).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text given a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate text with system context.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Result of a source-link lookup: scored links plus the status to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkLookup {
    pub links: Vec<SourceLink>,
    pub status: LinkLookupStatus,
}

impl LinkLookup {
    /// A lookup that produced no links, with the given status.
    pub fn empty(status: LinkLookupStatus) -> Self {
        Self {
            links: Vec::new(),
            status,
        }
    }
}

/// Finds candidate web sources (publisher pages, preprints) for a bookmark.
///
/// Implementations never fail: problems become a [`LinkLookupStatus`].
#[async_trait]
pub trait SourceLinkFinder: Send + Sync {
    async fn find_links(&self, bookmark: &Bookmark, settings: &GoogleSettings) -> LinkLookup;
}
