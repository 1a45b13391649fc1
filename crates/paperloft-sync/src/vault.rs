//! Encrypted per-user storage of provider credentials.
//!
//! Settings are sealed with a key derived from the user ID and stored as a
//! single [`PrivateSettingsDoc`]. A document that cannot be decrypted reads as
//! absent rather than failing.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use paperloft_core::{
    DocumentStore, Error, LocalStore, PrivateSettings, PrivateSettingsDoc, Result,
    ARTIFACT_SCHEMA_VERSION,
};
use paperloft_crypto::{open_json, seal_json, CryptoError, DerivedKey, SessionKeyCache};

/// Outcome of [`SettingsVault::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsPushOutcome {
    Pushed,
    /// Neither provider has an API key; nothing was written.
    NothingToSync,
}

impl SettingsPushOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Pushed => "Tokens synced",
            Self::NothingToSync => "No tokens to sync",
        }
    }
}

fn crypto_error(e: CryptoError) -> Error {
    Error::Sync(e.to_string())
}

/// Reads and writes a user's encrypted settings document.
#[derive(Clone)]
pub struct SettingsVault {
    store: Arc<dyn DocumentStore>,
    keys: Arc<SessionKeyCache>,
}

impl SettingsVault {
    pub fn new(store: Arc<dyn DocumentStore>, keys: Arc<SessionKeyCache>) -> Self {
        Self { store, keys }
    }

    pub fn keys(&self) -> &Arc<SessionKeyCache> {
        &self.keys
    }

    async fn key_for(&self, user_id: &str) -> Result<DerivedKey> {
        let keys = Arc::clone(&self.keys);
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || keys.key_for(&user_id))
            .await
            .map_err(|e| Error::Internal(format!("key derivation task failed: {}", e)))?
            .map_err(crypto_error)
    }

    /// Encrypt and store `settings` when at least one provider has a key.
    #[instrument(skip(self, settings), fields(subsystem = "sync", component = "vault", op = "push"))]
    pub async fn push(&self, user_id: &str, settings: &PrivateSettings) -> Result<SettingsPushOutcome> {
        if !settings.has_tokens() {
            debug!("No provider keys set, skipping settings push");
            return Ok(SettingsPushOutcome::NothingToSync);
        }

        let key = self.key_for(user_id).await?;
        let encrypted_settings = seal_json(settings, &key).map_err(crypto_error)?;
        let doc = PrivateSettingsDoc {
            encrypted_settings,
            updated_at: Utc::now(),
            schema_version: ARTIFACT_SCHEMA_VERSION,
        };
        self.store.put_private_settings(user_id, &doc).await?;

        info!("Encrypted settings stored");
        Ok(SettingsPushOutcome::Pushed)
    }

    /// Fetch and decrypt the user's settings.
    ///
    /// `None` when no document exists or it cannot be decrypted.
    #[instrument(skip(self), fields(subsystem = "sync", component = "vault", op = "pull"))]
    pub async fn pull(&self, user_id: &str) -> Result<Option<PrivateSettings>> {
        let Some(doc) = self.store.get_private_settings(user_id).await? else {
            debug!("No settings document");
            return Ok(None);
        };

        let key = self.key_for(user_id).await?;
        let settings = open_json::<PrivateSettings>(&doc.encrypted_settings, &key);
        if settings.is_none() {
            warn!("Settings document could not be decrypted, ignoring");
        }
        Ok(settings)
    }

    /// Push the settings currently saved in `local`.
    pub async fn push_from_local(&self, user_id: &str, local: &LocalStore) -> Result<SettingsPushOutcome> {
        let settings = PrivateSettings {
            google: local.google_settings()?,
            openai: local.openai_settings()?,
        };
        self.push(user_id, &settings).await
    }

    /// Pull remote settings into `local`. Returns whether anything was applied.
    pub async fn pull_into_local(&self, user_id: &str, local: &LocalStore) -> Result<bool> {
        let Some(settings) = self.pull(user_id).await? else {
            return Ok(false);
        };
        local.save_google_settings(&settings.google)?;
        local.save_openai_settings(&settings.openai)?;
        info!(
            subsystem = "sync",
            component = "vault",
            google_configured = settings.google.is_configured(),
            openai_configured = settings.openai.is_configured(),
            "Remote settings applied locally"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_outcome_messages() {
        assert_eq!(SettingsPushOutcome::NothingToSync.message(), "No tokens to sync");
        assert_eq!(
            serde_json::to_string(&SettingsPushOutcome::NothingToSync).unwrap(),
            "\"nothing_to_sync\""
        );
    }

    #[test]
    fn test_crypto_error_maps_to_sync() {
        let err = crypto_error(CryptoError::Truncated(3));
        assert!(matches!(err, Error::Sync(_)));
    }
}
