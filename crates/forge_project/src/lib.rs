//! # forge_project
//!
//! Project context store for AppForge.
//!
//! Projects and their files are read through the [`ProjectRepository`]
//! trait. [`ContextGatherer`] turns those records into a per-request
//! [`ProjectContext`]: a structure summary, the dependencies declared in
//! `package.json`, and a shallow marker-based issue scan.

pub mod context;
pub mod error;
pub mod import;
pub mod models;
pub mod repository;

pub use context::{
    detect_issues, extract_dependencies, language_for_extension, ContextGatherer, DetectedIssue,
    FileSummary, ProjectContext, ProjectStructure, ISSUE_MARKERS, MANIFEST_FILE,
};
pub use error::{ProjectError, ProjectResult};
pub use import::{MAX_IMPORT_BYTES, SKIPPED_DIRS};
pub use models::{FileId, NewProject, Project, ProjectFile, ProjectId};
pub use repository::{InMemoryProjectRepository, ProjectRepository};
