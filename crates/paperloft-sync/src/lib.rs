//! # paperloft-sync
//!
//! Cloud side of paperloft: conversion between local entities and artifacts,
//! push/load/live sync against a [`paperloft_core::DocumentStore`], encrypted
//! provider settings, and email/password sessions.
//!
//! ```rust,ignore
//! use paperloft_sync::{IdentityClient, UserSession};
//!
//! let session = UserSession::new(IdentityClient::from_env()?, store, library);
//! session.sign_in("me@example.org", "hunter22", Some(captcha)).await?;
//! let report = session.sync_on_sign_in(true).await?;
//! ```

pub mod auth;
pub mod convert;
pub mod engine;
pub mod session;
pub mod vault;

pub use auth::{AuthError, AuthUser, IdentityClient, IdentityConfig, DEFAULT_IDENTITY_URL};
pub use convert::{
    artifact_to_bookmark, artifact_to_project, bookmark_to_artifact, project_to_artifact,
};
pub use engine::{ItemError, LiveSyncHandle, LoadReport, SyncEngine, SyncReport};
pub use session::{SignInReport, UserSession};
pub use vault::{SettingsPushOutcome, SettingsVault};
