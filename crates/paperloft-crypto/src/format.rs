//! Base64 wire encoding for sealed payloads.

use base64::Engine;

use crate::error::{CryptoError, CryptoResult};

/// Encode bytes as standard base64.
pub fn base64_encode(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Decode a standard base64 string to bytes.
pub fn base64_decode(data: &str) -> CryptoResult<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| CryptoError::InvalidFormat(format!("Invalid base64: {}", e)))
}
