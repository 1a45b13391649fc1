//! JSON values sealed into base64 strings.
//!
//! [`open_json`] fails closed: any decoding, decryption or parsing problem is
//! logged and reported as `None`, which callers treat as "no settings".

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cipher::{open_bytes, seal_bytes};
use crate::error::CryptoResult;
use crate::format::{base64_decode, base64_encode};
use crate::kdf::DerivedKey;

/// Serialize `value` to JSON, encrypt it and base64 the `IV || ciphertext`.
pub fn seal_json<T: Serialize>(value: &T, key: &DerivedKey) -> CryptoResult<String> {
    let plaintext = serde_json::to_vec(value)?;
    let sealed = seal_bytes(key, &plaintext)?;
    Ok(base64_encode(&sealed))
}

/// Strict inverse of [`seal_json`].
pub fn try_open_json<T: DeserializeOwned>(encoded: &str, key: &DerivedKey) -> CryptoResult<T> {
    let sealed = base64_decode(encoded)?;
    let plaintext = open_bytes(key, &sealed)?;
    Ok(serde_json::from_slice(&plaintext)?)
}

/// Inverse of [`seal_json`] that never fails: errors become `None`.
pub fn open_json<T: DeserializeOwned>(encoded: &str, key: &DerivedKey) -> Option<T> {
    match try_open_json(encoded, key) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(
                subsystem = "crypto",
                component = "sealed",
                error = %e,
                "Failed to open sealed payload"
            );
            None
        }
    }
}
