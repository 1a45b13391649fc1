//! Session-scoped cache of the derived settings key.
//!
//! Derivation runs 100k PBKDF2 rounds, so the key is computed once per signed-in
//! user. The cache is bound to exactly one user ID: asking for a different user
//! replaces the entry, and sign-out clears it.

use std::sync::Mutex;

use crate::error::{CryptoError, CryptoResult};
use crate::kdf::{derive_user_key, DerivedKey};

#[derive(Default)]
pub struct SessionKeyCache {
    entry: Mutex<Option<(String, DerivedKey)>>,
}

impl SessionKeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key for `user_id`, deriving (and caching) it on first use.
    pub fn key_for(&self, user_id: &str) -> CryptoResult<DerivedKey> {
        self.key_with(user_id, derive_user_key)
    }

    fn key_with<F>(&self, user_id: &str, derive: F) -> CryptoResult<DerivedKey>
    where
        F: FnOnce(&str) -> CryptoResult<DerivedKey>,
    {
        let mut entry = self
            .entry
            .lock()
            .map_err(|_| CryptoError::KeyDerivation("key cache lock poisoned".to_string()))?;

        if let Some((cached_user, key)) = entry.as_ref() {
            if cached_user == user_id {
                return Ok(key.clone());
            }
            tracing::debug!(
                subsystem = "crypto",
                component = "key_cache",
                "Cached key belongs to another user, rederiving"
            );
        }

        let key = derive(user_id)?;
        *entry = Some((user_id.to_string(), key.clone()));
        Ok(key)
    }

    /// Drop the cached key. Called on sign-out.
    pub fn invalidate(&self) {
        if let Ok(mut entry) = self.entry.lock() {
            *entry = None;
        }
    }

    /// User whose key is currently cached.
    pub fn cached_user(&self) -> Option<String> {
        self.entry
            .lock()
            .ok()
            .and_then(|entry| entry.as_ref().map(|(user, _)| user.clone()))
    }
}

impl std::fmt::Debug for SessionKeyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeyCache")
            .field("cached_user", &self.cached_user())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(counter: &AtomicUsize) -> impl FnOnce(&str) -> CryptoResult<DerivedKey> + '_ {
        move |user: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(DerivedKey::from_bytes([user.len() as u8; 32]))
        }
    }

    #[test]
    fn test_same_user_derives_once() {
        let cache = SessionKeyCache::new();
        let calls = AtomicUsize::new(0);
        cache.key_with("alice", counting(&calls)).unwrap();
        cache.key_with("alice", counting(&calls)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.cached_user().as_deref(), Some("alice"));
    }

    #[test]
    fn test_account_switch_rederives() {
        let cache = SessionKeyCache::new();
        let calls = AtomicUsize::new(0);
        let a = cache.key_with("alice", counting(&calls)).unwrap();
        let b = cache.key_with("bobby-tables", counting(&calls)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_ne!(a.as_bytes(), b.as_bytes());
        assert_eq!(cache.cached_user().as_deref(), Some("bobby-tables"));
    }

    #[test]
    fn test_invalidate_clears() {
        let cache = SessionKeyCache::new();
        let calls = AtomicUsize::new(0);
        cache.key_with("alice", counting(&calls)).unwrap();
        cache.invalidate();
        assert!(cache.cached_user().is_none());
        cache.key_with("alice", counting(&calls)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_key_for_matches_direct_derivation() {
        let cache = SessionKeyCache::new();
        let cached = cache.key_for("user-xyz").unwrap();
        let direct = derive_user_key("user-xyz").unwrap();
        assert_eq!(cached.as_bytes(), direct.as_bytes());
    }
}
