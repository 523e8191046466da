//! Per-request project context.
//!
//! A [`ProjectContext`] is rebuilt from the repository on every assistance
//! request and dropped afterwards.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProjectError, ProjectResult};
use crate::models::{Project, ProjectFile, ProjectId};
use crate::repository::ProjectRepository;

/// Name of the only manifest dependencies are read from.
pub const MANIFEST_FILE: &str = "package.json";

/// Marker strings flagged by [`detect_issues`], with the note attached.
///
/// This is a weak signal, not a linter.
pub const ISSUE_MARKERS: &[(&str, &str)] = &[
    ("console.error", "logs errors to the console"),
    ("FIXME", "contains a FIXME marker"),
];

/// Summary of one leaf file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    /// Extension, or `file` when the name has none
    #[serde(rename = "type")]
    pub file_type: String,
    pub language: String,
    /// Content length in bytes
    pub size: usize,
    pub last_modified: DateTime<Utc>,
}

/// Lightweight structure of a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStructure {
    /// Directory paths, sorted
    pub directories: Vec<String>,
    /// Leaf files keyed by path
    pub files: BTreeMap<String, FileSummary>,
}

/// A file flagged by the marker scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetectedIssue {
    pub path: String,
    pub message: String,
}

/// Everything the prompt assembler knows about a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContext {
    pub project: Project,
    pub files: Vec<ProjectFile>,
    pub structure: ProjectStructure,
    pub dependencies: Vec<String>,
    pub issues: Vec<DetectedIssue>,
}

impl ProjectContext {
    /// Build a context from already loaded records.
    ///
    /// Files of other projects are dropped.
    pub fn from_parts(project: Project, files: Vec<ProjectFile>) -> Self {
        let files: Vec<ProjectFile> = files
            .into_iter()
            .filter(|f| f.project_id == project.id)
            .collect();

        let structure = build_structure(&files);
        let dependencies = extract_dependencies(&files);
        let issues = detect_issues(&files);

        Self {
            project,
            files,
            structure,
            dependencies,
            issues,
        }
    }

    pub fn project_id(&self) -> ProjectId {
        self.project.id
    }

    /// Leaf files only.
    pub fn leaf_files(&self) -> impl Iterator<Item = &ProjectFile> {
        self.files.iter().filter(|f| !f.is_directory)
    }

    pub fn file_count(&self) -> usize {
        self.leaf_files().count()
    }
}

/// Gathers [`ProjectContext`] values from a repository.
#[derive(Clone)]
pub struct ContextGatherer {
    repository: Arc<dyn ProjectRepository>,
}

impl ContextGatherer {
    pub fn new(repository: Arc<dyn ProjectRepository>) -> Self {
        Self { repository }
    }

    /// Load project metadata and all of its files.
    pub async fn gather_context(&self, project_id: ProjectId) -> ProjectResult<ProjectContext> {
        let project = self
            .repository
            .get_project(project_id)
            .await?
            .ok_or(ProjectError::NotFound(project_id))?;
        let files = self.repository.list_files(project_id).await?;

        let context = ProjectContext::from_parts(project, files);
        debug!(
            project_id,
            files = context.file_count(),
            dependencies = context.dependencies.len(),
            issues = context.issues.len(),
            "Gathered project context"
        );
        Ok(context)
    }
}

/// Language label for a file extension.
pub fn language_for_extension(ext: &str) -> &'static str {
    match ext {
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "ts" | "tsx" => "typescript",
        "py" => "python",
        "rs" => "rust",
        "go" => "go",
        "java" => "java",
        "rb" => "ruby",
        "php" => "php",
        "cs" => "csharp",
        "html" | "htm" => "html",
        "css" => "css",
        "scss" | "sass" => "scss",
        "json" => "json",
        "md" => "markdown",
        "yml" | "yaml" => "yaml",
        "toml" => "toml",
        "sql" => "sql",
        "sh" => "shell",
        "vue" => "vue",
        "svelte" => "svelte",
        _ => "plaintext",
    }
}

fn build_structure(files: &[ProjectFile]) -> ProjectStructure {
    let mut structure = ProjectStructure::default();

    for file in files {
        if file.is_directory {
            structure.directories.push(file.path.clone());
            continue;
        }
        let ext = file.extension();
        let language = ext
            .as_deref()
            .map(language_for_extension)
            .unwrap_or("plaintext");
        structure.files.insert(
            file.path.clone(),
            FileSummary {
                file_type: ext.clone().unwrap_or_else(|| "file".to_string()),
                language: language.to_string(),
                size: file.size(),
                last_modified: file.updated_at,
            },
        );
    }

    structure.directories.sort();
    structure.directories.dedup();
    structure
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageManifest {
    #[serde(default)]
    dependencies: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, serde_json::Value>,
}

/// Declared dependency names from every `package.json` in the file list.
///
/// Manifests that fail to parse contribute nothing.
pub fn extract_dependencies(files: &[ProjectFile]) -> Vec<String> {
    let mut deps: Vec<String> = files
        .iter()
        .filter(|f| !f.is_directory && f.name == MANIFEST_FILE)
        .filter_map(|f| f.content.as_deref())
        .filter_map(|content| serde_json::from_str::<PackageManifest>(content).ok())
        .flat_map(|m| m.dependencies.into_keys().chain(m.dev_dependencies.into_keys()))
        .collect();

    deps.sort();
    deps.dedup();
    deps
}

/// Flag files containing one of [`ISSUE_MARKERS`].
pub fn detect_issues(files: &[ProjectFile]) -> Vec<DetectedIssue> {
    let mut issues = Vec::new();
    for file in files.iter().filter(|f| !f.is_directory) {
        let Some(content) = file.content.as_deref() else {
            continue;
        };
        for (marker, note) in ISSUE_MARKERS {
            if content.contains(marker) {
                issues.push(DetectedIssue {
                    path: file.path.clone(),
                    message: format!("{} {}", file.path, note),
                });
            }
        }
    }
    issues
}
