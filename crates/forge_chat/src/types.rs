//! Request and reply types for the assistant.

use serde::{Deserialize, Serialize};

use forge_intent::UserIntent;
use forge_project::ProjectId;

use crate::conversation::PlanId;

/// Inbound assistance request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssistRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl AssistRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>, language: Option<String>) -> Self {
        self.code = Some(code.into());
        self.language = language;
        self
    }
}

/// Prompts sent to the generation backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PromptPair {
    pub system_prompt: String,
    pub user_prompt: String,
}

/// Who produced the reply text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Backend,
    Local,
}

/// Result of one `assist` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistReply {
    pub intent: UserIntent,
    pub message: String,
    /// Set when the reply carries a plan waiting for approval
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<PlanId>,
    pub source: ReplySource,
}
