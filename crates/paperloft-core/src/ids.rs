//! Identifier and timestamp helpers.
//!
//! Projects get UUIDv7 identifiers (time-ordered, generated locally); cloud
//! artifacts get ULIDs so remote documents sort by creation time.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

/// New project identifier (UUIDv7, hyphenated).
pub fn new_project_id() -> String {
    Uuid::now_v7().to_string()
}

/// New artifact identifier (26-character Crockford base32 ULID).
pub fn new_artifact_id() -> String {
    ulid::Ulid::new().to_string()
}

/// Current time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert epoch milliseconds to a UTC timestamp. Out-of-range values yield `None`.
pub fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}
