//! Conversation messages and plan lifecycle.
//!
//! Messages are a tagged union so a message either carries a plan or it
//! does not; there is no loose `isWaitingForApproval` flag. A plan message is
//! waiting for approval exactly when its status is [`PlanStatus::Pending`],
//! and a conversation holds at most one pending plan.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ChatError, ChatResult};
use crate::gate::{ApprovedPlan, BuildAttempt, BuildReport, GeneratedFile};
use crate::plan::ApplicationPlan;

/// Unique identifier for a conversation
pub type ConversationId = String;

/// Unique identifier for one plan instance
pub type PlanId = String;

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Message role in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    Assistant,
    User,
}

/// Lifecycle of a proposed plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    /// Shown to the user, waiting for a decision
    Pending,
    /// Approved; file generation was started
    Approved,
    /// The user asked to modify the plan
    Discarded,
    /// A newer request replaced it
    Superseded,
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Discarded => "discarded",
            Self::Superseded => "superseded",
        };
        f.write_str(label)
    }
}

/// A text message without attachments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlainMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// An assistant message carrying a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanMessage {
    pub id: String,
    pub plan_id: PlanId,
    pub content: String,
    pub plan: ApplicationPlan,
    pub status: PlanStatus,
    pub created_at: DateTime<Utc>,
}

impl PlanMessage {
    pub fn is_waiting_for_approval(&self) -> bool {
        self.status == PlanStatus::Pending
    }
}

/// Summary of one generated file, kept in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedFileSummary {
    pub path: String,
    pub language: String,
}

impl From<&GeneratedFile> for GeneratedFileSummary {
    fn from(file: &GeneratedFile) -> Self {
        Self {
            path: file.path.clone(),
            language: file.language.clone(),
        }
    }
}

/// Result of the post-approval build.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BuildOutcome {
    Succeeded { files: Vec<GeneratedFileSummary> },
    Failed { reason: String },
}

/// An assistant message reporting a build.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResultMessage {
    pub id: String,
    pub plan_id: PlanId,
    pub content: String,
    pub outcome: BuildOutcome,
    pub created_at: DateTime<Utc>,
}

/// Any message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversationMessage {
    Plain(PlainMessage),
    Plan(PlanMessage),
    BuildResult(BuildResultMessage),
}

impl ConversationMessage {
    pub fn id(&self) -> &str {
        match self {
            Self::Plain(m) => &m.id,
            Self::Plan(m) => &m.id,
            Self::BuildResult(m) => &m.id,
        }
    }

    pub fn role(&self) -> MessageRole {
        match self {
            Self::Plain(m) => m.role,
            Self::Plan(_) | Self::BuildResult(_) => MessageRole::Assistant,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Plain(m) => &m.content,
            Self::Plan(m) => &m.content,
            Self::BuildResult(m) => &m.content,
        }
    }

    pub fn is_waiting_for_approval(&self) -> bool {
        matches!(self, Self::Plan(m) if m.is_waiting_for_approval())
    }
}

/// Ordered message history of one thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    messages: Vec<ConversationMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&ConversationMessage> {
        self.messages.last()
    }

    /// Record a user message. Any pending plan is superseded.
    pub fn push_user(&mut self, content: impl Into<String>) -> &ConversationMessage {
        self.supersede_pending();
        self.push_plain(MessageRole::User, content.into())
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) -> &ConversationMessage {
        self.push_plain(MessageRole::Assistant, content.into())
    }

    pub fn push_system(&mut self, content: impl Into<String>) -> &ConversationMessage {
        self.push_plain(MessageRole::System, content.into())
    }

    /// Attach a new plan awaiting approval and return its id.
    ///
    /// An earlier pending plan is marked superseded first.
    pub fn propose_plan(&mut self, plan: ApplicationPlan, content: impl Into<String>) -> PlanId {
        self.supersede_pending();
        let plan_id = new_id();
        self.messages.push(ConversationMessage::Plan(PlanMessage {
            id: new_id(),
            plan_id: plan_id.clone(),
            content: content.into(),
            plan,
            status: PlanStatus::Pending,
            created_at: Utc::now(),
        }));
        self.touch();
        debug!(conversation = %self.id, plan_id = %plan_id, "Proposed plan");
        plan_id
    }

    /// The plan currently waiting for approval, if any.
    pub fn pending_plan(&self) -> Option<&PlanMessage> {
        self.plan_messages().find(|m| m.is_waiting_for_approval())
    }

    pub fn plan(&self, plan_id: &str) -> Option<&PlanMessage> {
        self.plan_messages().find(|m| m.plan_id == plan_id)
    }

    /// Reject a pending plan without generating anything.
    pub fn discard_plan(&mut self, plan_id: &str) -> ChatResult<()> {
        let message = self.pending_plan_mut(plan_id)?;
        message.status = PlanStatus::Discarded;
        self.touch();
        debug!(conversation = %self.id, plan_id, "Discarded plan");
        Ok(())
    }

    /// Move a pending plan to approved and hand out the build token.
    ///
    /// This is the only way to obtain an [`ApprovedPlan`].
    pub(crate) fn approve_plan(&mut self, plan_id: &str) -> ChatResult<ApprovedPlan> {
        let message = self.pending_plan_mut(plan_id)?;
        message.status = PlanStatus::Approved;
        let approved = ApprovedPlan::new(message.plan_id.clone(), message.plan.clone());
        self.touch();
        Ok(approved)
    }

    /// Append the result of a build and convert it for the caller.
    pub fn record_build(&mut self, attempt: BuildAttempt) -> ChatResult<BuildReport> {
        let BuildAttempt {
            plan_id,
            plan_name,
            result,
        } = attempt;

        let (outcome, content, reply) = match result {
            Ok(output) => {
                let files: Vec<GeneratedFileSummary> =
                    output.files.iter().map(GeneratedFileSummary::from).collect();
                let content = format!(
                    "Generated {} files for {}. They are ready in your project.",
                    files.len(),
                    plan_name
                );
                let report = BuildReport {
                    plan_id: plan_id.clone(),
                    files: output.files,
                };
                (BuildOutcome::Succeeded { files }, content, Ok(report))
            }
            Err(err) => {
                let reason = failure_reason(&err);
                let content = format!(
                    "I built a plan for {} but couldn't generate the files: {}. Nothing was changed; send a new request to try again.",
                    plan_name, reason
                );
                (
                    BuildOutcome::Failed { reason },
                    content,
                    Err(err),
                )
            }
        };

        self.messages
            .push(ConversationMessage::BuildResult(BuildResultMessage {
                id: new_id(),
                plan_id,
                content,
                outcome,
                created_at: Utc::now(),
            }));
        self.touch();
        reply
    }

    fn push_plain(&mut self, role: MessageRole, content: String) -> &ConversationMessage {
        let index = self.messages.len();
        self.messages.push(ConversationMessage::Plain(PlainMessage {
            id: new_id(),
            role,
            content,
            created_at: Utc::now(),
        }));
        self.touch();
        &self.messages[index]
    }

    fn plan_messages(&self) -> impl Iterator<Item = &PlanMessage> {
        self.messages.iter().filter_map(|m| match m {
            ConversationMessage::Plan(p) => Some(p),
            _ => None,
        })
    }

    fn pending_plan_mut(&mut self, plan_id: &str) -> ChatResult<&mut PlanMessage> {
        let message = self
            .messages
            .iter_mut()
            .find_map(|m| match m {
                ConversationMessage::Plan(p) if p.plan_id == plan_id => Some(p),
                _ => None,
            })
            .ok_or_else(|| ChatError::PlanNotFound(plan_id.to_string()))?;

        if message.status != PlanStatus::Pending {
            return Err(ChatError::PlanNotPending {
                plan_id: plan_id.to_string(),
                status: message.status,
            });
        }
        Ok(message)
    }

    fn supersede_pending(&mut self) {
        for message in self.messages.iter_mut() {
            if let ConversationMessage::Plan(p) = message {
                if p.status == PlanStatus::Pending {
                    p.status = PlanStatus::Superseded;
                    debug!(plan_id = %p.plan_id, "Superseded pending plan");
                }
            }
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn failure_reason(err: &ChatError) -> String {
    match err {
        ChatError::BuildFailed(reason) => reason.clone(),
        ChatError::BuildTimedOut(after) => format!("the generator timed out after {}s", after.as_secs()),
        other => other.to_string(),
    }
}
