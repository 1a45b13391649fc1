//! Push, load and live sync of the local library against a [`DocumentStore`].

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use paperloft_core::{Artifact, ArtifactType, DocumentStore, Library, Result};

use crate::convert::{
    artifact_to_bookmark, artifact_to_project, bookmark_to_artifact, project_to_artifact,
};

/// A local item that could not be pushed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    /// Bookmark title or project name.
    pub label: String,
    pub error: String,
}

/// Outcome of [`SyncEngine::push_local`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub synced_bookmarks: usize,
    pub synced_projects: usize,
    pub bookmark_errors: Vec<ItemError>,
    pub project_errors: Vec<ItemError>,
}

impl SyncReport {
    pub fn has_errors(&self) -> bool {
        !self.bookmark_errors.is_empty() || !self.project_errors.is_empty()
    }

    /// Human-readable status line.
    pub fn summary(&self) -> String {
        let mut text = format!(
            "Synced {} bookmark(s) and {} project(s)",
            self.synced_bookmarks, self.synced_projects
        );
        if !self.bookmark_errors.is_empty() {
            text.push_str(&format!(
                "\n\nFailed bookmarks ({}):\n{}",
                self.bookmark_errors.len(),
                format_errors(&self.bookmark_errors)
            ));
        }
        if !self.project_errors.is_empty() {
            text.push_str(&format!(
                "\n\nFailed projects ({}):\n{}",
                self.project_errors.len(),
                format_errors(&self.project_errors)
            ));
        }
        text
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

fn format_errors(errors: &[ItemError]) -> String {
    errors
        .iter()
        .map(|e| format!("- {}: {}", e.label, e.error))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Outcome of [`SyncEngine::load_remote`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub bookmarks: usize,
    pub projects: usize,
}

/// Moves library data between local storage and the document store.
#[derive(Clone)]
pub struct SyncEngine {
    store: Arc<dyn DocumentStore>,
    library: Arc<Library>,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn DocumentStore>, library: Arc<Library>) -> Self {
        Self { store, library }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn library(&self) -> &Arc<Library> {
        &self.library
    }

    /// Upload every local bookmark and project not yet present remotely.
    ///
    /// Presence is decided by `originalId` per artifact type, so repeated
    /// pushes never create duplicates. Per-item write failures are collected
    /// in the report; failing to list remote artifacts aborts the push.
    #[instrument(skip(self), fields(subsystem = "sync", component = "engine", op = "push_local"))]
    pub async fn push_local(&self, owner: &str) -> Result<SyncReport> {
        let bookmarks = self.library.bookmarks()?;
        let projects = self.library.projects()?;
        let remote = self.store.list_artifacts(owner).await?;

        let existing_bookmarks = original_ids(&remote, ArtifactType::Bookmark);
        let existing_projects = original_ids(&remote, ArtifactType::Project);

        let mut report = SyncReport::default();

        for bookmark in bookmarks
            .iter()
            .filter(|b| !existing_bookmarks.contains(b.id.as_str()))
        {
            let artifact = bookmark_to_artifact(bookmark, owner, &projects);
            match self.store.put_artifact(&artifact).await {
                Ok(()) => report.synced_bookmarks += 1,
                Err(e) => {
                    warn!(bookmark_id = %bookmark.id, error = %e, "Bookmark push failed");
                    report.bookmark_errors.push(ItemError {
                        label: display_label(&bookmark.title, &bookmark.id),
                        error: e.to_string(),
                    });
                }
            }
        }

        for project in projects
            .iter()
            .filter(|p| !existing_projects.contains(p.id.as_str()))
        {
            let artifact = project_to_artifact(project, owner);
            match self.store.put_artifact(&artifact).await {
                Ok(()) => report.synced_projects += 1,
                Err(e) => {
                    warn!(project_id = %project.id, error = %e, "Project push failed");
                    report.project_errors.push(ItemError {
                        label: display_label(&project.name, &project.id),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            synced_bookmarks = report.synced_bookmarks,
            synced_projects = report.synced_projects,
            failed = report.bookmark_errors.len() + report.project_errors.len(),
            "Local data pushed"
        );
        Ok(report)
    }

    /// Replace local bookmarks and projects with the owner's remote artifacts.
    #[instrument(skip(self), fields(subsystem = "sync", component = "engine", op = "load_remote"))]
    pub async fn load_remote(&self, owner: &str) -> Result<LoadReport> {
        let artifacts = self.store.list_artifacts(owner).await?;
        let report = apply_artifacts(&self.library, &artifacts)?;
        info!(
            bookmarks = report.bookmarks,
            projects = report.projects,
            "Remote data loaded"
        );
        Ok(report)
    }

    /// Delete one of `owner`'s remote artifacts.
    pub async fn delete_artifact(&self, owner: &str, id: &str) -> Result<bool> {
        let existed = self.store.delete_artifact(owner, id).await?;
        debug!(
            subsystem = "sync",
            component = "engine",
            owner,
            artifact_id = id,
            existed,
            "Artifact deleted"
        );
        Ok(existed)
    }

    /// Load the owner's data now and again after every relevant remote write.
    ///
    /// The subscription is taken before the initial load so no write slips
    /// between the two. Stop with [`LiveSyncHandle::stop`] or by dropping the handle.
    pub async fn start_live(&self, owner: &str) -> Result<LiveSyncHandle> {
        let mut changes = self.store.subscribe();
        self.load_remote(owner).await?;

        let engine = self.clone();
        let owner = owner.to_string();
        let task_owner = owner.clone();
        let task = tokio::spawn(async move {
            let owner = task_owner;
            loop {
                match changes.recv().await {
                    Ok(change) if change.affects_artifacts_of(&owner) => {}
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(
                            subsystem = "sync",
                            component = "live",
                            skipped,
                            "Change feed lagged, reloading"
                        );
                    }
                    Err(RecvError::Closed) => break,
                }
                if let Err(e) = engine.load_remote(&owner).await {
                    warn!(
                        subsystem = "sync",
                        component = "live",
                        error = %e,
                        "Live reload failed"
                    );
                }
            }
            debug!(subsystem = "sync", component = "live", "Live sync loop exited");
        });

        info!(subsystem = "sync", component = "live", owner = %owner, "Live sync started");
        Ok(LiveSyncHandle {
            owner,
            task: Some(task),
        })
    }
}

/// Running live-sync subscription.
pub struct LiveSyncHandle {
    owner: String,
    task: Option<JoinHandle<()>>,
}

impl LiveSyncHandle {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Unsubscribe. Idempotent.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!(subsystem = "sync", component = "live", owner = %self.owner, "Live sync stopped");
        }
    }
}

impl Drop for LiveSyncHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for LiveSyncHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveSyncHandle")
            .field("owner", &self.owner)
            .field("running", &self.is_running())
            .finish()
    }
}

fn original_ids(artifacts: &[Artifact], kind: ArtifactType) -> HashSet<&str> {
    artifacts
        .iter()
        .filter(|a| a.artifact_type == kind)
        .filter_map(Artifact::original_id)
        .collect()
}

fn display_label(name: &str, id: &str) -> String {
    if name.is_empty() {
        id.to_string()
    } else {
        name.to_string()
    }
}

fn apply_artifacts(library: &Library, artifacts: &[Artifact]) -> Result<LoadReport> {
    let bookmarks: Vec<_> = artifacts.iter().filter_map(artifact_to_bookmark).collect();
    let projects: Vec<_> = artifacts.iter().filter_map(artifact_to_project).collect();
    library.replace_all(&bookmarks, &projects)?;
    Ok(LoadReport {
        bookmarks: bookmarks.len(),
        projects: projects.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_without_errors() {
        let report = SyncReport {
            synced_bookmarks: 3,
            synced_projects: 1,
            ..Default::default()
        };
        assert_eq!(report.summary(), "Synced 3 bookmark(s) and 1 project(s)");
        assert!(!report.has_errors());
    }

    #[test]
    fn test_summary_lists_failures() {
        let report = SyncReport {
            synced_bookmarks: 1,
            synced_projects: 0,
            bookmark_errors: vec![ItemError {
                label: "Deep nets".to_string(),
                error: "Sync error: quota".to_string(),
            }],
            project_errors: vec![],
        };
        let text = report.to_string();
        assert!(text.starts_with("Synced 1 bookmark(s) and 0 project(s)"));
        assert!(text.contains("Failed bookmarks (1):\n- Deep nets: Sync error: quota"));
        assert!(!text.contains("Failed projects"));
    }

    #[test]
    fn test_display_label_falls_back_to_id() {
        assert_eq!(display_label("", "W1"), "W1");
        assert_eq!(display_label("T", "W1"), "T");
    }
}
