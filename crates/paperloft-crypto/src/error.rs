//! Error types for cryptographic operations.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Key derivation failed.
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// Encryption failed.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed - wrong key or corrupted data.
    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// Sealed payload is shorter than IV plus tag.
    #[error("Sealed payload too short: {0} bytes")]
    Truncated(usize),

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid format.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_display() {
        let err = CryptoError::Truncated(5);
        assert!(err.to_string().contains("5 bytes"));
    }

    #[test]
    fn test_decryption_display() {
        let err = CryptoError::Decryption("AES-GCM decryption failed".to_string());
        assert_eq!(
            err.to_string(),
            "Decryption failed: AES-GCM decryption failed"
        );
    }

    #[test]
    fn test_json_error_from() {
        let json_err = serde_json::from_str::<u8>("x").unwrap_err();
        let crypto_err: CryptoError = json_err.into();
        assert!(matches!(crypto_err, CryptoError::Json(_)));
    }
}
