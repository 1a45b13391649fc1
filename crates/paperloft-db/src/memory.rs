//! In-process [`DocumentStore`] for tests and offline runs.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};

use paperloft_core::{
    Artifact, ChangeFeed, DocumentStore, PrivateSettingsDoc, Result, StoreChange,
};

/// Document store held entirely in memory.
///
/// Artifacts are kept ordered by ID, so listings come back in ULID (creation) order.
#[derive(Default)]
pub struct MemoryDocumentStore {
    artifacts: RwLock<BTreeMap<String, Artifact>>,
    private: RwLock<HashMap<String, PrivateSettingsDoc>>,
    feed: ChangeFeed,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts across all owners.
    pub async fn artifact_count(&self) -> usize {
        self.artifacts.read().await.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn put_artifact(&self, artifact: &Artifact) -> Result<()> {
        self.artifacts
            .write()
            .await
            .insert(artifact.id.clone(), artifact.clone());
        self.feed.emit(StoreChange::ArtifactUpserted {
            owner: artifact.owner.clone(),
            id: artifact.id.clone(),
        });
        Ok(())
    }

    async fn list_artifacts(&self, owner: &str) -> Result<Vec<Artifact>> {
        Ok(self
            .artifacts
            .read()
            .await
            .values()
            .filter(|a| a.owner == owner)
            .cloned()
            .collect())
    }

    async fn delete_artifact(&self, owner: &str, id: &str) -> Result<bool> {
        let mut artifacts = self.artifacts.write().await;
        if !artifacts.get(id).is_some_and(|a| a.owner == owner) {
            return Ok(false);
        }
        artifacts.remove(id);
        drop(artifacts);

        self.feed.emit(StoreChange::ArtifactDeleted {
            owner: Some(owner.to_string()),
            id: id.to_string(),
        });
        Ok(true)
    }

    async fn get_private_settings(&self, user_id: &str) -> Result<Option<PrivateSettingsDoc>> {
        Ok(self.private.read().await.get(user_id).cloned())
    }

    async fn put_private_settings(&self, user_id: &str, doc: &PrivateSettingsDoc) -> Result<()> {
        self.private
            .write()
            .await
            .insert(user_id.to_string(), doc.clone());
        self.feed.emit(StoreChange::PrivateSettingsUpdated {
            user_id: user_id.to_string(),
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.feed.subscribe()
    }
}
