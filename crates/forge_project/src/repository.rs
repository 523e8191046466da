//! Project storage abstraction.
//!
//! The assistance core only reads through [`ProjectRepository`]. The
//! in-memory implementation here backs the CLI and the tests; any other
//! store can be plugged in by implementing the trait.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{ProjectError, ProjectResult};
use crate::models::{FileId, NewProject, Project, ProjectFile, ProjectId};

/// Read contract used by context gathering.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Look up a project. `Ok(None)` when no project has this id.
    async fn get_project(&self, id: ProjectId) -> ProjectResult<Option<Project>>;

    /// All files and directories of a project, no pagination.
    async fn list_files(&self, project_id: ProjectId) -> ProjectResult<Vec<ProjectFile>>;
}

/// Thread-safe in-memory project store.
#[derive(Debug)]
pub struct InMemoryProjectRepository {
    projects: RwLock<BTreeMap<ProjectId, Project>>,
    files: RwLock<BTreeMap<FileId, ProjectFile>>,
    next_project_id: AtomicU64,
    next_file_id: AtomicU64,
}

impl Default for InMemoryProjectRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProjectRepository {
    pub fn new() -> Self {
        Self {
            projects: RwLock::new(BTreeMap::new()),
            files: RwLock::new(BTreeMap::new()),
            next_project_id: AtomicU64::new(1),
            next_file_id: AtomicU64::new(1),
        }
    }

    /// Create a project and return the stored record.
    pub fn create_project(&self, new: NewProject) -> Project {
        let id = self.next_project_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let project = Project {
            id,
            name: new.name,
            description: new.description,
            language: new.language,
            framework: new.framework,
            created_at: now,
            updated_at: now,
        };
        self.projects.write().insert(id, project.clone());
        debug!(project_id = id, name = %project.name, "Created project");
        project
    }

    /// Add a leaf file to a project.
    pub fn add_file(
        &self,
        project_id: ProjectId,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> ProjectResult<ProjectFile> {
        self.insert_entry(project_id, path.into(), Some(content.into()), false)
    }

    /// Add a directory entry to a project.
    pub fn add_directory(
        &self,
        project_id: ProjectId,
        path: impl Into<String>,
    ) -> ProjectResult<ProjectFile> {
        self.insert_entry(project_id, path.into(), None, true)
    }

    /// Replace a file's content.
    pub fn update_file(&self, file_id: FileId, content: impl Into<String>) -> ProjectResult<ProjectFile> {
        let mut files = self.files.write();
        let file = files
            .get_mut(&file_id)
            .ok_or(ProjectError::FileNotFound(file_id))?;
        if file.is_directory {
            return Err(ProjectError::FileNotFound(file_id));
        }
        file.content = Some(content.into());
        file.updated_at = Utc::now();
        Ok(file.clone())
    }

    /// Remove a file or directory entry.
    pub fn delete_file(&self, file_id: FileId) -> ProjectResult<ProjectFile> {
        self.files
            .write()
            .remove(&file_id)
            .ok_or(ProjectError::FileNotFound(file_id))
    }

    /// Number of stored projects.
    pub fn project_count(&self) -> usize {
        self.projects.read().len()
    }

    fn insert_entry(
        &self,
        project_id: ProjectId,
        path: String,
        content: Option<String>,
        is_directory: bool,
    ) -> ProjectResult<ProjectFile> {
        if !self.projects.read().contains_key(&project_id) {
            return Err(ProjectError::NotFound(project_id));
        }

        let path = normalize_path(&path);
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        let id = self.next_file_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let file = ProjectFile {
            id,
            project_id,
            name,
            path,
            content,
            is_directory,
            created_at: now,
            updated_at: now,
        };
        self.files.write().insert(id, file.clone());

        if let Some(project) = self.projects.write().get_mut(&project_id) {
            project.updated_at = now;
        }

        Ok(file)
    }
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn get_project(&self, id: ProjectId) -> ProjectResult<Option<Project>> {
        Ok(self.projects.read().get(&id).cloned())
    }

    async fn list_files(&self, project_id: ProjectId) -> ProjectResult<Vec<ProjectFile>> {
        Ok(self
            .files
            .read()
            .values()
            .filter(|f| f.project_id == project_id)
            .cloned()
            .collect())
    }
}

/// Turn `./src\\app.js` style input into `src/app.js`.
fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}
