//! Change feed for the cloud document store.
//!
//! Document stores publish a [`StoreChange`] after every write so live-sync
//! subscribers can reload the affected owner's data. The feed is a thin
//! wrapper around a tokio broadcast channel; each subscriber gets its own
//! stream and lagging subscribers simply miss events.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// A write observed on the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreChange {
    ArtifactUpserted { owner: String, id: String },
    ArtifactDeleted { owner: Option<String>, id: String },
    PrivateSettingsUpdated { user_id: String },
}

impl StoreChange {
    /// Owner affected by the change, when known.
    pub fn owner(&self) -> Option<&str> {
        match self {
            Self::ArtifactUpserted { owner, .. } => Some(owner),
            Self::ArtifactDeleted { owner, .. } => owner.as_deref(),
            Self::PrivateSettingsUpdated { user_id } => Some(user_id),
        }
    }

    /// Whether this change touches the artifact collection.
    pub fn is_artifact(&self) -> bool {
        !matches!(self, Self::PrivateSettingsUpdated { .. })
    }

    /// Whether a subscriber watching `owner`'s artifacts should react.
    ///
    /// Deletes with an unknown owner are treated as relevant.
    pub fn affects_artifacts_of(&self, owner: &str) -> bool {
        self.is_artifact() && self.owner().map_or(true, |o| o == owner)
    }
}

/// Broadcast hub for [`StoreChange`] events.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<StoreChange>,
}

impl ChangeFeed {
    /// Create a feed with the given buffer capacity (256 for production, 16 for tests).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish a change. Dropped silently when nobody is listening.
    pub fn emit(&self, change: StoreChange) {
        tracing::debug!(
            subsystem = "db",
            component = "change_feed",
            ?change,
            subscriber_count = self.tx.receiver_count(),
            "Store change emitted"
        );
        let _ = self.tx.send(change);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_reaches_all_subscribers() {
        let feed = ChangeFeed::new(16);
        let mut a = feed.subscribe();
        let mut b = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 2);

        feed.emit(StoreChange::ArtifactUpserted {
            owner: "u1".to_string(),
            id: "01A".to_string(),
        });

        assert_eq!(a.recv().await.unwrap().owner(), Some("u1"));
        assert_eq!(b.recv().await.unwrap().owner(), Some("u1"));
    }

    #[test]
    fn test_emit_without_subscribers_is_noop() {
        let feed = ChangeFeed::new(4);
        feed.emit(StoreChange::PrivateSettingsUpdated {
            user_id: "u1".to_string(),
        });
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn test_affects_artifacts_of() {
        let upsert = StoreChange::ArtifactUpserted {
            owner: "u1".to_string(),
            id: "x".to_string(),
        };
        assert!(upsert.affects_artifacts_of("u1"));
        assert!(!upsert.affects_artifacts_of("u2"));

        let anonymous_delete = StoreChange::ArtifactDeleted {
            owner: None,
            id: "x".to_string(),
        };
        assert!(anonymous_delete.affects_artifacts_of("u2"));

        let settings = StoreChange::PrivateSettingsUpdated {
            user_id: "u1".to_string(),
        };
        assert!(!settings.affects_artifacts_of("u1"));
    }

    #[test]
    fn test_serialize_tagged() {
        let value = serde_json::to_value(StoreChange::ArtifactDeleted {
            owner: Some("u1".to_string()),
            id: "x".to_string(),
        })
        .unwrap();
        assert_eq!(value["type"], "artifact_deleted");
        assert_eq!(value["owner"], "u1");
    }
}
