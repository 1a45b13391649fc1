//! Signed-in user state: identity, derived key cache and live sync.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use paperloft_core::{DocumentStore, Error, Library, Result};
use paperloft_crypto::SessionKeyCache;

use crate::auth::{AuthError, AuthUser, IdentityClient};
use crate::engine::{LiveSyncHandle, LoadReport, SyncEngine, SyncReport};
use crate::vault::{SettingsPushOutcome, SettingsVault};

/// What happened during [`UserSession::sync_on_sign_in`].
///
/// Every step runs even when an earlier one fails; failures are listed in
/// `errors`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInReport {
    pub pushed: Option<SyncReport>,
    pub settings_push: Option<SettingsPushOutcome>,
    pub loaded: Option<LoadReport>,
    pub settings_loaded: bool,
    pub live: bool,
    pub errors: Vec<String>,
}

#[derive(Default)]
struct SessionState {
    user: Option<AuthUser>,
    live: Option<LiveSyncHandle>,
}

/// One user session. Holds at most one signed-in user at a time.
pub struct UserSession {
    identity: IdentityClient,
    engine: SyncEngine,
    vault: SettingsVault,
    keys: Arc<SessionKeyCache>,
    state: Mutex<SessionState>,
}

impl UserSession {
    pub fn new(identity: IdentityClient, store: Arc<dyn DocumentStore>, library: Arc<Library>) -> Self {
        let keys = Arc::new(SessionKeyCache::new());
        Self {
            identity,
            engine: SyncEngine::new(Arc::clone(&store), library),
            vault: SettingsVault::new(store, Arc::clone(&keys)),
            keys,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn vault(&self) -> &SettingsVault {
        &self.vault
    }

    pub async fn current_user(&self) -> Option<AuthUser> {
        self.state.lock().await.user.clone()
    }

    /// The signed-in user or [`Error::Unauthorized`].
    pub async fn require_user(&self) -> Result<AuthUser> {
        self.current_user()
            .await
            .ok_or_else(|| Error::Unauthorized("Not signed in".to_string()))
    }

    pub async fn is_live(&self) -> bool {
        self.state
            .lock()
            .await
            .live
            .as_ref()
            .is_some_and(LiveSyncHandle::is_running)
    }

    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
        captcha_token: Option<&str>,
    ) -> std::result::Result<AuthUser, AuthError> {
        let user = self.identity.sign_in(email, password, captcha_token).await?;
        self.establish(user.clone()).await;
        Ok(user)
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        captcha_token: Option<&str>,
    ) -> std::result::Result<AuthUser, AuthError> {
        let user = self.identity.sign_up(email, password, captcha_token).await?;
        self.establish(user.clone()).await;
        Ok(user)
    }

    async fn establish(&self, user: AuthUser) {
        let mut state = self.state.lock().await;
        let switched = state.user.as_ref().is_some_and(|u| u.uid != user.uid);
        if switched {
            if let Some(mut live) = state.live.take() {
                live.stop();
            }
            self.keys.invalidate();
        }
        info!(subsystem = "sync", component = "session", uid = %user.uid, switched, "User signed in");
        state.user = Some(user);
    }

    /// Forget the user, its derived key and any live subscription.
    pub async fn sign_out(&self) {
        let mut state = self.state.lock().await;
        if let Some(mut live) = state.live.take() {
            live.stop();
        }
        self.keys.invalidate();
        if let Some(user) = state.user.take() {
            info!(subsystem = "sync", component = "session", uid = %user.uid, "User signed out");
        }
    }

    pub async fn push_local(&self) -> Result<SyncReport> {
        let user = self.require_user().await?;
        self.engine.push_local(&user.uid).await
    }

    pub async fn load_remote(&self) -> Result<LoadReport> {
        let user = self.require_user().await?;
        self.engine.load_remote(&user.uid).await
    }

    pub async fn push_settings(&self) -> Result<SettingsPushOutcome> {
        let user = self.require_user().await?;
        self.vault
            .push_from_local(&user.uid, self.engine.library().store())
            .await
    }

    pub async fn pull_settings(&self) -> Result<bool> {
        let user = self.require_user().await?;
        self.vault
            .pull_into_local(&user.uid, self.engine.library().store())
            .await
    }

    /// Start (or restart) live sync for the signed-in user.
    pub async fn start_live(&self) -> Result<()> {
        let user = self.require_user().await?;
        let handle = self.engine.start_live(&user.uid).await?;
        self.install_live(handle).await
    }

    /// Keep `handle` only if its owner is still the signed-in user.
    async fn install_live(&self, mut handle: LiveSyncHandle) -> Result<()> {
        let mut state = self.state.lock().await;
        let current = state.user.as_ref().map(|u| u.uid.as_str());
        if current != Some(handle.owner()) {
            handle.stop();
            warn!(
                subsystem = "sync",
                component = "session",
                owner = handle.owner(),
                "Signed-in user changed while live sync was starting"
            );
            return Err(Error::Unauthorized(
                "Signed-in user changed before live sync started".to_string(),
            ));
        }
        if let Some(mut previous) = state.live.replace(handle) {
            previous.stop();
        }
        Ok(())
    }

    pub async fn stop_live(&self) {
        if let Some(mut live) = self.state.lock().await.live.take() {
            live.stop();
        }
    }

    /// Post sign-in routine: optionally push local data, push settings,
    /// load remote data, pull settings, then keep the library live.
    #[instrument(skip(self), fields(subsystem = "sync", component = "session", op = "sync_on_sign_in"))]
    pub async fn sync_on_sign_in(&self, push_local: bool) -> Result<SignInReport> {
        let user = self.require_user().await?;
        let uid = user.uid.as_str();
        let local = self.engine.library().store();
        let mut report = SignInReport::default();

        if push_local {
            match self.engine.push_local(uid).await {
                Ok(pushed) => report.pushed = Some(pushed),
                Err(e) => report.errors.push(format!("Push failed: {}", e)),
            }
        }

        match self.vault.push_from_local(uid, local).await {
            Ok(outcome) => report.settings_push = Some(outcome),
            Err(e) => report.errors.push(format!("Settings push failed: {}", e)),
        }

        match self.engine.load_remote(uid).await {
            Ok(loaded) => report.loaded = Some(loaded),
            Err(e) => report.errors.push(format!("Load failed: {}", e)),
        }

        match self.vault.pull_into_local(uid, local).await {
            Ok(applied) => report.settings_loaded = applied,
            Err(e) => report.errors.push(format!("Settings load failed: {}", e)),
        }

        match self.start_live().await {
            Ok(()) => report.live = true,
            Err(e) => report.errors.push(format!("Live sync failed: {}", e)),
        }

        if !report.errors.is_empty() {
            warn!(errors = ?report.errors, "Sign-in sync finished with errors");
        }
        Ok(report)
    }
}
