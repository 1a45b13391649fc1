//! Cloud artifact envelope.
//!
//! Every synced entity (bookmark or project) is stored remotely as an
//! [`Artifact`]: a generic envelope with ownership, ACL and lifecycle fields,
//! plus a `data` section split into a shared `core` part and an app-specific
//! `researchLoader` part. `data.core.meta.originalId` holds the local entity ID
//! and is the merge key for sync.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Current artifact schema version.
pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;

/// Kind of entity an artifact wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactType {
    Bookmark,
    Project,
}

impl ArtifactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bookmark => "bookmark",
            Self::Project => "project",
        }
    }
}

/// Access control lists by user ID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Acl {
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default)]
    pub editors: Vec<String>,
    #[serde(default)]
    pub viewers: Vec<String>,
}

impl Acl {
    pub fn owned_by(owner: &str) -> Self {
        Self {
            owners: vec![owner.to_string()],
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRefs {
    #[serde(default)]
    pub assets: Vec<JsonValue>,
    #[serde(default)]
    pub sources: Vec<JsonValue>,
    #[serde(default)]
    pub links: Vec<JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactContext {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub url: String,
}

/// Shared content section. `meta` is type-specific and always carries `originalId`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactCore {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub context: ArtifactContext,
    #[serde(rename = "assetIds", default)]
    pub asset_ids: Vec<String>,
    #[serde(default)]
    pub meta: JsonValue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactData {
    #[serde(default)]
    pub core: ArtifactCore,
    #[serde(rename = "researchLoader", default)]
    pub research_loader: JsonValue,
}

/// Reserved slots for future schema extensions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraAttributes {
    pub extra_attribute1: Option<JsonValue>,
    pub extra_attribute2: Option<JsonValue>,
    pub extra_attribute3: Option<JsonValue>,
    pub extra_attribute4: Option<JsonValue>,
    pub extra_attribute5: Option<JsonValue>,
}

/// Remote envelope for a bookmark or project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// ULID assigned when the artifact is first created.
    pub id: String,
    #[serde(rename = "type")]
    pub artifact_type: ArtifactType,
    pub title: String,
    pub owner: String,
    #[serde(default)]
    pub acl: Acl,
    #[serde(default = "default_visibility")]
    pub visibility: String,
    #[serde(default)]
    pub primary_project_id: Option<String>,
    #[serde(default)]
    pub project_ids: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub refs: ArtifactRefs,
    #[serde(default)]
    pub data: ArtifactData,
    #[serde(default)]
    pub extra_attributes: ExtraAttributes,
}

impl Artifact {
    /// Local entity ID stored in `data.core.meta.originalId`, if present.
    pub fn original_id(&self) -> Option<&str> {
        self.data
            .core
            .meta
            .get("originalId")
            .and_then(JsonValue::as_str)
            .filter(|id| !id.is_empty())
    }
}

fn default_visibility() -> String {
    "private".to_string()
}

fn default_status() -> String {
    "active".to_string()
}

fn default_schema_version() -> u32 {
    ARTIFACT_SCHEMA_VERSION
}

/// Encrypted settings document stored once per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateSettingsDoc {
    /// Base64 of `IV || AES-GCM ciphertext` of the JSON settings blob.
    pub encrypted_settings: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
}
