//! PostgreSQL-backed cloud document store.
//!
//! Artifacts and private settings are stored as JSONB documents. Every write
//! is published on the local [`ChangeFeed`] and broadcast to other processes
//! with `pg_notify`; [`PgDocumentStore::spawn_listener`] relays notifications
//! from other instances into the same feed.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgListener;
use sqlx::{PgPool, Row};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use paperloft_core::{
    Artifact, ChangeFeed, DocumentStore, Error, PrivateSettingsDoc, Result, StoreChange,
};

/// Postgres channel carrying change notifications.
pub const CHANGE_CHANNEL: &str = "paperloft_changes";

#[derive(Debug, Serialize, Deserialize)]
struct ChangeNotice {
    origin: Uuid,
    change: StoreChange,
}

/// Document store over the `artifact` and `user_private` tables.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    feed: ChangeFeed,
    instance_id: Uuid,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            feed: ChangeFeed::default(),
            instance_id: Uuid::new_v4(),
        }
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Listen for changes written by other instances and replay them locally.
    pub async fn spawn_listener(&self) -> Result<JoinHandle<()>> {
        let mut listener = PgListener::connect_with(&self.pool)
            .await
            .map_err(Error::Database)?;
        listener
            .listen(CHANGE_CHANNEL)
            .await
            .map_err(Error::Database)?;

        let feed = self.feed.clone();
        let own_id = self.instance_id;
        info!(
            subsystem = "db",
            component = "listener",
            channel = CHANGE_CHANNEL,
            "Listening for remote document changes"
        );

        Ok(tokio::spawn(async move {
            loop {
                let notification = match listener.recv().await {
                    Ok(n) => n,
                    Err(e) => {
                        warn!(
                            subsystem = "db",
                            component = "listener",
                            error = %e,
                            "Change listener stopped"
                        );
                        break;
                    }
                };
                match serde_json::from_str::<ChangeNotice>(notification.payload()) {
                    Ok(notice) if notice.origin == own_id => {}
                    Ok(notice) => feed.emit(notice.change),
                    Err(e) => debug!(
                        subsystem = "db",
                        component = "listener",
                        error = %e,
                        "Ignoring malformed change notice"
                    ),
                }
            }
        }))
    }

    async fn publish(&self, change: StoreChange) -> Result<()> {
        let payload = serde_json::to_string(&ChangeNotice {
            origin: self.instance_id,
            change: change.clone(),
        })?;
        sqlx::query("SELECT pg_notify($1, $2)")
            .bind(CHANGE_CHANNEL)
            .bind(payload)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        self.feed.emit(change);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn put_artifact(&self, artifact: &Artifact) -> Result<()> {
        let body = serde_json::to_value(artifact)?;
        sqlx::query(
            "INSERT INTO artifact (id, owner, artifact_type, body, updated_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (id) DO UPDATE
             SET owner = EXCLUDED.owner,
                 artifact_type = EXCLUDED.artifact_type,
                 body = EXCLUDED.body,
                 updated_at = EXCLUDED.updated_at",
        )
        .bind(&artifact.id)
        .bind(&artifact.owner)
        .bind(artifact.artifact_type.as_str())
        .bind(body)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        self.publish(StoreChange::ArtifactUpserted {
            owner: artifact.owner.clone(),
            id: artifact.id.clone(),
        })
        .await
    }

    async fn list_artifacts(&self, owner: &str) -> Result<Vec<Artifact>> {
        let rows = sqlx::query("SELECT id, body FROM artifact WHERE owner = $1 ORDER BY id")
            .bind(owner)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let mut artifacts = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get("id");
            let body: serde_json::Value = row.get("body");
            match serde_json::from_value::<Artifact>(body) {
                Ok(artifact) => artifacts.push(artifact),
                Err(e) => warn!(
                    subsystem = "db",
                    component = "documents",
                    artifact_id = %id,
                    error = %e,
                    "Skipping unreadable artifact"
                ),
            }
        }
        Ok(artifacts)
    }

    async fn delete_artifact(&self, owner: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM artifact WHERE id = $1 AND owner = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }
        self.publish(StoreChange::ArtifactDeleted {
            owner: Some(owner.to_string()),
            id: id.to_string(),
        })
        .await?;
        Ok(true)
    }

    async fn get_private_settings(&self, user_id: &str) -> Result<Option<PrivateSettingsDoc>> {
        let row = sqlx::query("SELECT body FROM user_private WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        match row {
            Some(row) => {
                let body: serde_json::Value = row.get("body");
                Ok(Some(serde_json::from_value(body)?))
            }
            None => Ok(None),
        }
    }

    async fn put_private_settings(&self, user_id: &str, doc: &PrivateSettingsDoc) -> Result<()> {
        sqlx::query(
            "INSERT INTO user_private (user_id, body, updated_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (user_id) DO UPDATE
             SET body = EXCLUDED.body, updated_at = EXCLUDED.updated_at",
        )
        .bind(user_id)
        .bind(serde_json::to_value(doc)?)
        .bind(doc.updated_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        self.publish(StoreChange::PrivateSettingsUpdated {
            user_id: user_id.to_string(),
        })
        .await
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.feed.subscribe()
    }
}
