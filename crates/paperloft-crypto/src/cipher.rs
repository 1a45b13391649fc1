//! AES-256-GCM with a random IV carried in front of the ciphertext.
//!
//! Sealed layout: `IV (12 bytes) || ciphertext || tag (16 bytes)`.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};
use crate::kdf::DerivedKey;

/// IV length in bytes (96 bits).
pub const IV_LEN: usize = 12;

/// Authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Generate cryptographically secure random bytes.
pub fn generate_random<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Fresh random IV for one encryption.
pub fn generate_iv() -> [u8; IV_LEN] {
    generate_random()
}

/// Encrypt `plaintext` under `key` with a fresh IV, returning `IV || ciphertext`.
pub fn seal_bytes(key: &DerivedKey, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let iv = generate_iv();
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|_| CryptoError::Encryption("AES-GCM encryption failed".into()))?;

    let mut sealed = Vec::with_capacity(IV_LEN + ciphertext.len());
    sealed.extend_from_slice(&iv);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Split the leading IV off `sealed` and decrypt the remainder.
pub fn open_bytes(key: &DerivedKey, sealed: &[u8]) -> CryptoResult<Vec<u8>> {
    if sealed.len() < IV_LEN + TAG_LEN {
        return Err(CryptoError::Truncated(sealed.len()));
    }
    let (iv, ciphertext) = sealed.split_at(IV_LEN);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| CryptoError::Decryption("Invalid key".to_string()))?;

    cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| CryptoError::Decryption("AES-GCM decryption failed".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> DerivedKey {
        DerivedKey::from_bytes([byte; 32])
    }

    #[test]
    fn test_generate_iv_is_random() {
        assert_ne!(generate_iv(), generate_iv());
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let sealed = seal_bytes(&key(42), b"Hello, World!").unwrap();
        let opened = open_bytes(&key(42), &sealed).unwrap();
        assert_eq!(opened, b"Hello, World!".to_vec());
    }

    #[test]
    fn test_sealed_layout_length() {
        let plaintext = b"settings";
        let sealed = seal_bytes(&key(1), plaintext).unwrap();
        assert_eq!(sealed.len(), IV_LEN + plaintext.len() + TAG_LEN);
    }

    #[test]
    fn test_each_seal_uses_fresh_iv() {
        let a = seal_bytes(&key(1), b"same").unwrap();
        let b = seal_bytes(&key(1), b"same").unwrap();
        assert_ne!(a[..IV_LEN], b[..IV_LEN]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_open_wrong_key() {
        let sealed = seal_bytes(&key(1), b"secret").unwrap();
        let result = open_bytes(&key(2), &sealed);
        assert!(matches!(result, Err(CryptoError::Decryption(_))));
    }

    #[test]
    fn test_open_tampered() {
        let mut sealed = seal_bytes(&key(1), b"secret").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0xFF;
        assert!(matches!(
            open_bytes(&key(1), &sealed),
            Err(CryptoError::Decryption(_))
        ));
    }

    #[test]
    fn test_open_truncated() {
        assert!(matches!(
            open_bytes(&key(1), &[0u8; 10]),
            Err(CryptoError::Truncated(10))
        ));
    }
}
