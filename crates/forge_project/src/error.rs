//! Error types for the project store.

use thiserror::Error;

/// Result type alias for project store operations.
pub type ProjectResult<T> = Result<T, ProjectError>;

/// Errors that can occur while reading or importing projects.
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("Project not found: {0}")]
    NotFound(u64),

    #[error("File not found: {0}")]
    FileNotFound(u64),

    #[error("Cannot import {path}: {message}")]
    Import { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
