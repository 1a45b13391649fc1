//! # paperloft-core
//!
//! Core types, traits, and local bookmark/project management for paperloft.
//!
//! This crate holds the data model shared by every other paperloft crate
//! (bookmarks, projects, provider settings, cloud artifacts), the storage and
//! backend traits they implement, and the local library manager.

pub mod artifact;
pub mod error;
pub mod events;
pub mod ids;
pub mod library;
pub mod local_store;
pub mod models;
pub mod traits;
pub mod view;

// Re-export commonly used types at crate root
pub use artifact::*;
pub use error::{Error, Result};
pub use events::{ChangeFeed, StoreChange};
pub use ids::{millis_to_datetime, new_artifact_id, new_project_id, now_millis};
pub use library::{Library, ToggleOutcome};
pub use local_store::{LocalStore, MemoryKeyValueStore};
pub use models::*;
pub use traits::*;
pub use view::{arrange, filter_bookmarks, sort_bookmarks, BookmarkSort};
