//! Mapping between local entities and cloud artifacts.
//!
//! `artifact_to_bookmark(bookmark_to_artifact(b))` returns `b` unchanged, and
//! likewise for projects, with two exceptions: an empty title comes back as
//! "Untitled Bookmark" / "Untitled Project", and a missing (`0`) creation
//! time comes back as the time of conversion. `data.core.meta.originalId`
//! carries the local ID.
//!
//! Reading is lenient per field: an unreadable value falls back to its
//! default without discarding its neighbours.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

use paperloft_core::{
    millis_to_datetime, new_artifact_id, Acl, Artifact, ArtifactContext, ArtifactCore,
    ArtifactData, ArtifactRefs, ArtifactType, Bookmark, ExtraAttributes, LinkLookupStatus,
    Project, SourceLink, ARTIFACT_SCHEMA_VERSION,
};

const DOI_RESOLVER: &str = "https://doi.org/";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BookmarkMeta {
    #[serde(deserialize_with = "lenient")]
    original_id: String,
    #[serde(deserialize_with = "lenient")]
    authors: String,
    year: Value,
    #[serde(deserialize_with = "lenient")]
    publication_date: String,
    #[serde(deserialize_with = "lenient")]
    doi: String,
    cited_by_count: Value,
    #[serde(deserialize_with = "lenient")]
    open_alex_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BookmarkResearchLoader {
    #[serde(deserialize_with = "lenient")]
    note: String,
    #[serde(deserialize_with = "lenient")]
    ai_summary: String,
    #[serde(deserialize_with = "lenient")]
    ai_abstract: String,
    #[serde(deserialize_with = "lenient")]
    ai_abstract_generated: bool,
    #[serde(deserialize_with = "lenient")]
    google_links: Vec<SourceLink>,
    #[serde(deserialize_with = "lenient")]
    google_links_status: LinkLookupStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ProjectMeta {
    #[serde(deserialize_with = "lenient")]
    original_id: String,
    #[serde(deserialize_with = "lenient")]
    paper_ids: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ProjectResearchLoader {
    #[serde(deserialize_with = "lenient")]
    gpt_instruction: String,
}

/// Field value, or its default when the stored JSON has the wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Read a typed view of a JSON section; a non-object section reads as empty.
fn section<T: for<'de> Deserialize<'de> + Default>(value: &Value) -> T {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

/// Number, numeric string, or nothing.
fn loose_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn created_or_now(created_at_ms: i64, now: DateTime<Utc>) -> DateTime<Utc> {
    if created_at_ms > 0 {
        millis_to_datetime(created_at_ms).unwrap_or(now)
    } else {
        now
    }
}

fn envelope(
    artifact_type: ArtifactType,
    title: String,
    owner: &str,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    data: ArtifactData,
) -> Artifact {
    Artifact {
        id: new_artifact_id(),
        artifact_type,
        title,
        owner: owner.to_string(),
        acl: Acl::owned_by(owner),
        visibility: "private".to_string(),
        primary_project_id: None,
        project_ids: Vec::new(),
        tags: Vec::new(),
        status: "active".to_string(),
        schema_version: ARTIFACT_SCHEMA_VERSION,
        created_at,
        updated_at: now,
        refs: ArtifactRefs::default(),
        data,
        extra_attributes: ExtraAttributes::default(),
    }
}

/// Wrap a bookmark in a fresh artifact owned by `owner`.
///
/// `projects` supplies the derived membership: `projectIds` lists every
/// project containing the bookmark and `primaryProjectId` is the first.
pub fn bookmark_to_artifact(bookmark: &Bookmark, owner: &str, projects: &[Project]) -> Artifact {
    let now = Utc::now();
    let project_ids: Vec<String> = projects
        .iter()
        .filter(|p| p.contains(&bookmark.id))
        .map(|p| p.id.clone())
        .collect();

    let url = if bookmark.doi.is_empty() {
        bookmark.open_alex_url.clone()
    } else {
        format!("{}{}", DOI_RESOLVER, bookmark.doi)
    };

    let research_loader = json!({
        "note": bookmark.note,
        "aiSummary": bookmark.ai_summary,
        "aiAbstract": bookmark.ai_abstract,
        "aiAbstractGenerated": bookmark.ai_abstract_generated,
        "googleLinks": bookmark.google_links,
        "googleLinksStatus": bookmark.google_links_status,
    });

    let data = ArtifactData {
        core: ArtifactCore {
            text: bookmark.abstract_text.clone(),
            context: ArtifactContext {
                source: bookmark.source.clone(),
                location: String::new(),
                url,
            },
            asset_ids: Vec::new(),
            meta: json!({
                "originalId": bookmark.id,
                "authors": bookmark.authors,
                "year": bookmark.year,
                "publicationDate": bookmark.publication_date,
                "doi": bookmark.doi,
                "citedByCount": bookmark.cited_by_count,
                "openAlexUrl": bookmark.open_alex_url,
            }),
        },
        research_loader,
    };

    let title = if bookmark.title.is_empty() {
        "Untitled Bookmark".to_string()
    } else {
        bookmark.title.clone()
    };

    let mut artifact = envelope(
        ArtifactType::Bookmark,
        title,
        owner,
        created_or_now(bookmark.created_at, now),
        now,
        data,
    );
    artifact.primary_project_id = project_ids.first().cloned();
    artifact.project_ids = project_ids;
    artifact
}

/// Wrap a project in a fresh artifact owned by `owner`.
pub fn project_to_artifact(project: &Project, owner: &str) -> Artifact {
    let now = Utc::now();
    let data = ArtifactData {
        core: ArtifactCore {
            text: project.description.clone(),
            context: ArtifactContext::default(),
            asset_ids: Vec::new(),
            meta: json!({
                "originalId": project.id,
                "paperIds": project.paper_ids,
            }),
        },
        research_loader: json!({ "gptInstruction": project.gpt_instruction }),
    };

    let title = if project.name.is_empty() {
        "Untitled Project".to_string()
    } else {
        project.name.clone()
    };

    envelope(
        ArtifactType::Project,
        title,
        owner,
        created_or_now(project.created_at, now),
        now,
        data,
    )
}

/// Local bookmark from an artifact; `None` for non-bookmark artifacts.
pub fn artifact_to_bookmark(artifact: &Artifact) -> Option<Bookmark> {
    if artifact.artifact_type != ArtifactType::Bookmark {
        return None;
    }
    let core = &artifact.data.core;
    let meta: BookmarkMeta = section(&core.meta);
    let loader: BookmarkResearchLoader = section(&artifact.data.research_loader);

    let id = if meta.original_id.is_empty() {
        artifact.id.clone()
    } else {
        meta.original_id
    };
    let open_alex_url = if meta.open_alex_url.is_empty() {
        core.context.url.clone()
    } else {
        meta.open_alex_url
    };

    Some(Bookmark {
        id,
        title: artifact.title.clone(),
        authors: meta.authors,
        year: loose_int(&meta.year).and_then(|y| i32::try_from(y).ok()),
        publication_date: meta.publication_date,
        doi: meta.doi,
        cited_by_count: loose_int(&meta.cited_by_count),
        abstract_text: core.text.clone(),
        source: core.context.source.clone(),
        open_alex_url,
        note: loader.note,
        created_at: artifact.created_at.timestamp_millis(),
        google_links: loader.google_links,
        google_links_status: loader.google_links_status,
        ai_summary: loader.ai_summary,
        ai_abstract: loader.ai_abstract,
        ai_abstract_generated: loader.ai_abstract_generated,
    })
}

/// Local project from an artifact; `None` for non-project artifacts.
pub fn artifact_to_project(artifact: &Artifact) -> Option<Project> {
    if artifact.artifact_type != ArtifactType::Project {
        return None;
    }
    let meta: ProjectMeta = section(&artifact.data.core.meta);
    let loader: ProjectResearchLoader = section(&artifact.data.research_loader);

    let id = if meta.original_id.is_empty() {
        artifact.id.clone()
    } else {
        meta.original_id
    };

    Some(Project {
        id,
        name: artifact.title.clone(),
        description: artifact.data.core.text.clone(),
        created_at: artifact.created_at.timestamp_millis(),
        paper_ids: meta.paper_ids,
        gpt_instruction: loader.gpt_instruction,
    })
}
