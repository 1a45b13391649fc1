//! Bookmark and project management over the local store.
//!
//! Every mutation is a read-modify-write of the whole list under a process-wide
//! lock, so concurrent handlers in one process never lose each other's
//! writes. Project membership lives only in `Project::paper_ids`; removing a
//! bookmark also prunes it from every project.

use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::ids::{new_project_id, now_millis};
use crate::local_store::LocalStore;
use crate::models::{Bookmark, Project, ProjectUpdate, WorkSummary};

/// What happened when a work was toggled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// The work was saved; enrichment should follow.
    Added { bookmark: Bookmark },
    /// The work was already saved and has been removed.
    Removed { id: String },
}

/// Bookmark/project manager.
pub struct Library {
    store: LocalStore,
    write_lock: Mutex<()>,
}

impl Library {
    pub fn new(store: LocalStore) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Underlying typed store.
    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    // ─── Bookmarks ────────────────────────────────────────────────────────

    pub fn bookmarks(&self) -> Result<Vec<Bookmark>> {
        self.store.bookmarks()
    }

    pub fn bookmark(&self, id: &str) -> Result<Option<Bookmark>> {
        Ok(self.store.bookmarks()?.into_iter().find(|b| b.id == id))
    }

    pub fn is_bookmarked(&self, id: &str) -> Result<bool> {
        Ok(self.store.bookmarks()?.iter().any(|b| b.id == id))
    }

    /// Remove the work if it is bookmarked, else save it with enrichment pending.
    pub fn toggle_bookmark(&self, work: &WorkSummary) -> Result<ToggleOutcome> {
        if work.id.is_empty() {
            return Err(Error::InvalidInput("work id is required".to_string()));
        }

        let _guard = self.lock()?;
        let mut bookmarks = self.store.bookmarks()?;

        if bookmarks.iter().any(|b| b.id == work.id) {
            bookmarks.retain(|b| b.id != work.id);
            self.store.save_bookmarks(&bookmarks)?;
            self.prune_project_refs(&work.id)?;
            tracing::info!(
                subsystem = "core",
                component = "library",
                op = "toggle_bookmark",
                bookmark_id = %work.id,
                "Bookmark removed"
            );
            return Ok(ToggleOutcome::Removed {
                id: work.id.clone(),
            });
        }

        let bookmark = Bookmark::from_work(work, now_millis());
        bookmarks.push(bookmark.clone());
        self.store.save_bookmarks(&bookmarks)?;
        tracing::info!(
            subsystem = "core",
            component = "library",
            op = "toggle_bookmark",
            bookmark_id = %work.id,
            "Bookmark added"
        );
        Ok(ToggleOutcome::Added { bookmark })
    }

    /// Delete a bookmark and prune it from all projects. Returns whether it existed.
    pub fn remove_bookmark(&self, id: &str) -> Result<bool> {
        let _guard = self.lock()?;
        let mut bookmarks = self.store.bookmarks()?;
        let before = bookmarks.len();
        bookmarks.retain(|b| b.id != id);
        let removed = bookmarks.len() != before;
        if removed {
            self.store.save_bookmarks(&bookmarks)?;
        }
        self.prune_project_refs(id)?;
        Ok(removed)
    }

    pub fn update_note(&self, id: &str, note: &str) -> Result<Bookmark> {
        let note = note.to_string();
        self.patch_bookmark(id, |b| b.note = note)?
            .ok_or_else(|| Error::BookmarkNotFound(id.to_string()))
    }

    /// Apply `patch` to the bookmark with `id`, if it still exists.
    ///
    /// Enrichment results arrive asynchronously; a bookmark removed in the
    /// meantime stays removed and `Ok(None)` is returned.
    pub fn patch_bookmark<F>(&self, id: &str, patch: F) -> Result<Option<Bookmark>>
    where
        F: FnOnce(&mut Bookmark),
    {
        let _guard = self.lock()?;
        let mut bookmarks = self.store.bookmarks()?;
        let Some(bookmark) = bookmarks.iter_mut().find(|b| b.id == id) else {
            tracing::debug!(
                subsystem = "core",
                component = "library",
                bookmark_id = %id,
                "Patch skipped, bookmark no longer exists"
            );
            return Ok(None);
        };
        patch(bookmark);
        let updated = bookmark.clone();
        self.store.save_bookmarks(&bookmarks)?;
        Ok(Some(updated))
    }

    // ─── Projects ─────────────────────────────────────────────────────────

    pub fn projects(&self) -> Result<Vec<Project>> {
        self.store.projects()
    }

    pub fn project(&self, id: &str) -> Result<Project> {
        self.store
            .projects()?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::ProjectNotFound(id.to_string()))
    }

    pub fn create_project(&self, name: &str, description: &str) -> Result<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("project name is required".to_string()));
        }

        let project = Project {
            id: new_project_id(),
            name: name.to_string(),
            description: description.trim().to_string(),
            created_at: now_millis(),
            paper_ids: Vec::new(),
            gpt_instruction: String::new(),
        };

        let _guard = self.lock()?;
        let mut projects = self.store.projects()?;
        projects.push(project.clone());
        self.store.save_projects(&projects)?;
        tracing::info!(
            subsystem = "core",
            component = "library",
            op = "create_project",
            project_id = %project.id,
            "Project created"
        );
        Ok(project)
    }

    pub fn update_project(&self, id: &str, update: ProjectUpdate) -> Result<Project> {
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(Error::InvalidInput("project name is required".to_string()));
            }
        }
        self.modify_project(id, |project| {
            if let Some(name) = update.name {
                project.name = name.trim().to_string();
            }
            if let Some(description) = update.description {
                project.description = description.trim().to_string();
            }
            if let Some(instruction) = update.gpt_instruction {
                project.gpt_instruction = instruction;
            }
        })
    }

    /// Delete a project. Its bookmarks are kept. Returns whether it existed.
    pub fn delete_project(&self, id: &str) -> Result<bool> {
        let _guard = self.lock()?;
        let mut projects = self.store.projects()?;
        let before = projects.len();
        projects.retain(|p| p.id != id);
        if projects.len() == before {
            return Ok(false);
        }
        self.store.save_projects(&projects)?;
        Ok(true)
    }

    /// Add a saved bookmark to a project. Adding twice is a no-op.
    pub fn add_paper(&self, project_id: &str, bookmark_id: &str) -> Result<Project> {
        if !self.is_bookmarked(bookmark_id)? {
            return Err(Error::BookmarkNotFound(bookmark_id.to_string()));
        }
        self.modify_project(project_id, |project| {
            if !project.contains(bookmark_id) {
                project.paper_ids.push(bookmark_id.to_string());
            }
        })
    }

    pub fn remove_paper(&self, project_id: &str, bookmark_id: &str) -> Result<Project> {
        self.modify_project(project_id, |project| {
            project.paper_ids.retain(|id| id != bookmark_id);
        })
    }

    /// Bookmarks belonging to a project, in bookmark-list order.
    pub fn project_papers(&self, project_id: &str) -> Result<Vec<Bookmark>> {
        let project = self.project(project_id)?;
        Ok(self
            .store
            .bookmarks()?
            .into_iter()
            .filter(|b| project.contains(&b.id))
            .collect())
    }

    /// Projects that contain the given bookmark.
    pub fn projects_for_bookmark(&self, bookmark_id: &str) -> Result<Vec<Project>> {
        Ok(self
            .store
            .projects()?
            .into_iter()
            .filter(|p| p.contains(bookmark_id))
            .collect())
    }

    // ─── Bulk ─────────────────────────────────────────────────────────────

    /// Overwrite bookmarks and projects wholesale.
    pub fn replace_all(&self, bookmarks: &[Bookmark], projects: &[Project]) -> Result<()> {
        let _guard = self.lock()?;
        self.store.save_bookmarks(bookmarks)?;
        self.store.save_projects(projects)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        let _guard = self.lock()?;
        self.store.clear_library()
    }

    /// All bookmarks as pretty-printed JSON.
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.store.bookmarks()?)?)
    }

    // ─── Internals ────────────────────────────────────────────────────────

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| Error::Internal("library lock poisoned".to_string()))
    }

    fn modify_project<F>(&self, id: &str, change: F) -> Result<Project>
    where
        F: FnOnce(&mut Project),
    {
        let _guard = self.lock()?;
        let mut projects = self.store.projects()?;
        let project = projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::ProjectNotFound(id.to_string()))?;
        change(project);
        let updated = project.clone();
        self.store.save_projects(&projects)?;
        Ok(updated)
    }

    // Caller holds the write lock.
    fn prune_project_refs(&self, bookmark_id: &str) -> Result<()> {
        let mut projects = self.store.projects()?;
        let mut touched = false;
        for project in projects.iter_mut() {
            let before = project.paper_ids.len();
            project.paper_ids.retain(|id| id != bookmark_id);
            touched |= project.paper_ids.len() != before;
        }
        if touched {
            self.store.save_projects(&projects)?;
        }
        Ok(())
    }
}
