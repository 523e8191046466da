//! Project and file records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier for a project.
pub type ProjectId = u64;

/// Identifier for a file or directory inside a project.
pub type FileId = u64;

/// Project metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Primary language, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Framework in use, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A file or directory entry in a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    pub id: FileId,
    pub project_id: ProjectId,
    /// Base name, e.g. `package.json`
    pub name: String,
    /// Path relative to the project root, using `/` separators
    pub path: String,
    /// File body. Always `None` for directories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub is_directory: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectFile {
    /// Extension of the file name, lowercased, without the dot.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Content length in bytes. Directories report zero.
    pub fn size(&self) -> usize {
        self.content.as_ref().map(|c| c.len()).unwrap_or(0)
    }
}

/// Fields needed to create a new project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub framework: Option<String>,
}

impl NewProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = Some(framework.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> ProjectFile {
        ProjectFile {
            id: 1,
            project_id: 1,
            name: name.to_string(),
            path: name.to_string(),
            content: Some("abc".to_string()),
            is_directory: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_extension() {
        assert_eq!(file("App.TSX").extension().as_deref(), Some("tsx"));
        assert_eq!(file("archive.tar.gz").extension().as_deref(), Some("gz"));
        assert_eq!(file("Makefile").extension(), None);
        assert_eq!(file(".gitignore").extension(), None);
    }

    #[test]
    fn test_size() {
        let mut f = file("a.txt");
        assert_eq!(f.size(), 3);
        f.content = None;
        assert_eq!(f.size(), 0);
    }
}
