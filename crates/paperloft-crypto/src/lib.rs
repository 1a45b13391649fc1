//! # paperloft-crypto
//!
//! Client-side encryption for the private settings blob paperloft mirrors to
//! the cloud.
//!
//! ## Scheme
//!
//! - **Key derivation**: PBKDF2-HMAC-SHA256, 100 000 iterations, fixed
//!   application salt, user ID as password
//! - **Cipher**: AES-256-GCM with a fresh random 96-bit IV per message
//! - **Wire format**: `base64(IV || ciphertext || tag)`
//!
//! ## Example
//!
//! ```rust
//! use paperloft_crypto::{derive_user_key, open_json, seal_json};
//!
//! let key = derive_user_key("user-123").unwrap();
//! let sealed = seal_json(&serde_json::json!({"apiKey": "k"}), &key).unwrap();
//! let opened: Option<serde_json::Value> = open_json(&sealed, &key);
//! assert_eq!(opened.unwrap()["apiKey"], "k");
//! ```

pub mod cipher;
pub mod error;
pub mod format;
pub mod kdf;
pub mod key_cache;
pub mod sealed;

// Re-export commonly used types
pub use cipher::{generate_iv, open_bytes, seal_bytes, IV_LEN};
pub use error::{CryptoError, CryptoResult};
pub use format::{base64_decode, base64_encode};
pub use kdf::{derive_key_with, derive_user_key, DerivedKey, PBKDF2_ITERATIONS, SETTINGS_SALT};
pub use key_cache::SessionKeyCache;
pub use sealed::{open_json, seal_json, try_open_json};
