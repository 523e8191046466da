//! Error types for the assistance pipeline.

use std::time::Duration;

use thiserror::Error;

use forge_project::ProjectError;

use crate::conversation::{PlanId, PlanStatus};

/// Result type alias for chat operations.
pub type ChatResult<T> = Result<T, ChatError>;

/// Errors surfaced to callers of the assistant.
#[derive(Error, Debug)]
pub enum ChatError {
    /// The request named a project that could not be loaded
    #[error("Project context unavailable: {0}")]
    ContextUnavailable(#[from] ProjectError),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("Plan not found: {0}")]
    PlanNotFound(PlanId),

    #[error("Plan {plan_id} is {status}, only pending plans can be approved or discarded")]
    PlanNotPending { plan_id: PlanId, status: PlanStatus },

    /// The plan was approved but the file generator reported a failure
    #[error("The plan was approved but file generation failed: {0}")]
    BuildFailed(String),

    #[error("The plan was approved but file generation timed out after {0:?}")]
    BuildTimedOut(Duration),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures of the generation backend.
///
/// These never reach the user; the assistant logs them and falls back to
/// local heuristics.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Generation backend not configured. Set OPENAI_API_KEY or ANTHROPIC_API_KEY")]
    NotConfigured,

    #[error("Network error: {0}")]
    Network(String),

    #[error("{provider} API error {status}: {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Malformed backend response: {0}")]
    Malformed(String),

    #[error("Backend did not answer within {0:?}")]
    Timeout(Duration),
}

impl BackendError {
    /// Whether a retry might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Failures of the file-generation collaborator.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("{0}")]
    Failed(String),

    #[error("Refusing to write outside the output directory: {0}")]
    UnsafePath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(BackendError::Network("reset".into()).is_transient());
        assert!(BackendError::Api {
            provider: "OpenAI".into(),
            status: 503,
            body: String::new()
        }
        .is_transient());
        assert!(BackendError::Api {
            provider: "OpenAI".into(),
            status: 429,
            body: String::new()
        }
        .is_transient());
        assert!(!BackendError::Api {
            provider: "OpenAI".into(),
            status: 401,
            body: String::new()
        }
        .is_transient());
        assert!(!BackendError::NotConfigured.is_transient());
    }

    #[test]
    fn test_user_visible_messages_differ() {
        let build = ChatError::BuildFailed("disk full".into()).to_string();
        assert!(build.contains("file generation failed"));
        assert!(build.contains("disk full"));

        let context = ChatError::ContextUnavailable(ProjectError::NotFound(3)).to_string();
        assert!(context.contains("Project not found: 3"));
    }
}
