//! Per-user key derivation.
//!
//! The settings key is derived from the user's stable identifier with
//! PBKDF2-HMAC-SHA256 and a fixed application salt, so every device the user
//! signs in on rederives the same AES-256 key without exchanging secrets.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, CryptoResult};

/// Fixed application salt.
pub const SETTINGS_SALT: &[u8] = b"ourstuff-firebase-salt-v1";

/// PBKDF2 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Key wrapper with automatic zeroization on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; 32],
}

impl DerivedKey {
    /// Create a key from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { key: bytes }
    }

    /// Get the key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Derive the settings key for `user_id`.
pub fn derive_user_key(user_id: &str) -> CryptoResult<DerivedKey> {
    derive_key_with(user_id.as_bytes(), SETTINGS_SALT, PBKDF2_ITERATIONS)
}

/// PBKDF2-HMAC-SHA256 into a 256-bit key.
pub fn derive_key_with(password: &[u8], salt: &[u8], iterations: u32) -> CryptoResult<DerivedKey> {
    if password.is_empty() {
        return Err(CryptoError::KeyDerivation("empty user id".to_string()));
    }
    if iterations == 0 {
        return Err(CryptoError::KeyDerivation(
            "iteration count must be positive".to_string(),
        ));
    }

    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut key);
    Ok(DerivedKey { key })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let a = derive_key_with(b"user-1", SETTINGS_SALT, 1_000).unwrap();
        let b = derive_key_with(b"user-1", SETTINGS_SALT, 1_000).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_different_users_different_keys() {
        let a = derive_key_with(b"user-1", SETTINGS_SALT, 1_000).unwrap();
        let b = derive_key_with(b"user-2", SETTINGS_SALT, 1_000).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_rfc6070_style_vector() {
        // PBKDF2-HMAC-SHA256("password", "salt", 1), first 32 bytes.
        let key = derive_key_with(b"password", b"salt", 1).unwrap();
        let expected: [u8; 32] = [
            0x12, 0x0f, 0xb6, 0xcf, 0xfc, 0xf8, 0xb3, 0x2c, 0x43, 0xe7, 0x22, 0x52, 0x56, 0xc4,
            0xf8, 0x37, 0xa8, 0x65, 0x48, 0xc9, 0x2c, 0xcc, 0x35, 0x48, 0x08, 0x05, 0x98, 0x7c,
            0xb7, 0x0b, 0xe1, 0x7b,
        ];
        assert_eq!(key.as_bytes(), &expected);
    }

    #[test]
    fn test_empty_user_id_rejected() {
        assert!(matches!(
            derive_user_key(""),
            Err(CryptoError::KeyDerivation(_))
        ));
    }

    #[test]
    fn test_debug_redacts() {
        let key = DerivedKey::from_bytes([9u8; 32]);
        let debug = format!("{:?}", key);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains('9'));
    }
}
