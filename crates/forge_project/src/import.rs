//! Load a directory on disk into the in-memory store.

use std::fs;
use std::path::Path;

use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::error::{ProjectError, ProjectResult};
use crate::models::{NewProject, Project};
use crate::repository::InMemoryProjectRepository;

/// Directory names never imported.
pub const SKIPPED_DIRS: &[&str] = &[".git", "node_modules", "target", "dist", ".forge"];

/// Files larger than this are skipped entirely.
pub const MAX_IMPORT_BYTES: u64 = 512 * 1024;

fn is_skipped(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| SKIPPED_DIRS.contains(&name))
            .unwrap_or(false)
}

impl InMemoryProjectRepository {
    /// Walk `root` and store it as a new project named after the directory.
    ///
    /// Non-UTF-8 files and files over [`MAX_IMPORT_BYTES`] are skipped.
    pub fn import_directory(&self, root: &Path) -> ProjectResult<Project> {
        if !root.is_dir() {
            return Err(ProjectError::Import {
                path: root.display().to_string(),
                message: "not a directory".to_string(),
            });
        }

        let name = root
            .canonicalize()?
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("project")
            .to_string();
        let project = self.create_project(NewProject::new(name));

        let mut imported = 0usize;
        for entry in WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_skipped(e))
            .filter_map(|e| e.ok())
        {
            let relative = match entry.path().strip_prefix(root) {
                Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
                Err(_) => continue,
            };

            if entry.file_type().is_dir() {
                self.add_directory(project.id, relative)?;
                continue;
            }

            let too_large = entry
                .metadata()
                .map(|m| m.len() > MAX_IMPORT_BYTES)
                .unwrap_or(true);
            if too_large {
                debug!("Skipping large file {}", relative);
                continue;
            }

            match fs::read_to_string(entry.path()) {
                Ok(content) => {
                    self.add_file(project.id, relative, content)?;
                    imported += 1;
                }
                Err(e) => debug!("Skipping unreadable file {}: {}", relative, e),
            }
        }

        info!(
            "Imported {} files from {:?} as project {}",
            imported, root, project.id
        );
        Ok(project)
    }
}
