//! The approval gate.
//!
//! Files are only ever generated from an [`ApprovedPlan`], and an
//! `ApprovedPlan` can only be produced by approving a pending plan in a
//! [`Conversation`]. The token is consumed by [`ApprovalGate::build`], so
//! one approval yields at most one generation call.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::conversation::{Conversation, PlanId};
use crate::error::{ChatError, ChatResult, GenerationError};
use crate::plan::ApplicationPlan;

/// Input to the file generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationRequest {
    pub description: String,
}

/// One generated file. `path` is relative to the output root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedFile {
    pub name: String,
    pub path: String,
    pub content: String,
    pub language: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationOutput {
    pub files: Vec<GeneratedFile>,
}

/// Turns an approved plan description into files.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest)
        -> Result<GenerationOutput, GenerationError>;
}

/// Proof that a specific pending plan was approved.
#[derive(Debug)]
pub struct ApprovedPlan {
    plan_id: PlanId,
    plan: ApplicationPlan,
}

impl ApprovedPlan {
    pub(crate) fn new(plan_id: PlanId, plan: ApplicationPlan) -> Self {
        Self { plan_id, plan }
    }

    pub fn plan_id(&self) -> &str {
        &self.plan_id
    }

    pub fn plan(&self) -> &ApplicationPlan {
        &self.plan
    }
}

/// Outcome of one generation call, before it is recorded.
#[derive(Debug)]
pub struct BuildAttempt {
    pub plan_id: PlanId,
    pub plan_name: String,
    pub result: Result<GenerationOutput, ChatError>,
}

/// Files produced for an approved plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    pub plan_id: PlanId,
    pub files: Vec<GeneratedFile>,
}

/// Runs the generator for approved plans.
#[derive(Clone)]
pub struct ApprovalGate {
    generator: Arc<dyn FileGenerator>,
    timeout: Duration,
}

impl ApprovalGate {
    pub fn new(generator: Arc<dyn FileGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// Generate files for an approved plan. Exactly one generator call, no
    /// retries.
    pub async fn build(&self, approved: ApprovedPlan) -> BuildAttempt {
        let ApprovedPlan { plan_id, plan } = approved;
        let request = GenerationRequest {
            description: plan.build_description(),
        };

        info!(plan_id = %plan_id, plan = %plan.name, "Building approved plan");

        let result = match timeout(self.timeout, self.generator.generate(&request)).await {
            Ok(Ok(output)) => {
                info!(plan_id = %plan_id, files = output.files.len(), "Build succeeded");
                Ok(output)
            }
            Ok(Err(e)) => {
                warn!(plan_id = %plan_id, error = %e, "Build failed");
                Err(ChatError::BuildFailed(e.to_string()))
            }
            Err(_) => {
                warn!(plan_id = %plan_id, timeout = ?self.timeout, "Build timed out");
                Err(ChatError::BuildTimedOut(self.timeout))
            }
        };

        BuildAttempt {
            plan_id,
            plan_name: plan.name,
            result,
        }
    }

    /// Approve a pending plan, build it and record the outcome.
    ///
    /// Holds `&mut Conversation` across the build; callers sharing
    /// conversations should go through [`crate::Assistant::approve`], which
    /// releases its lock while the build runs.
    pub async fn approve(
        &self,
        conversation: &mut Conversation,
        plan_id: &str,
    ) -> ChatResult<BuildReport> {
        let approved = conversation.approve_plan(plan_id)?;
        let attempt = self.build(approved).await;
        conversation.record_build(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{BuildOutcome, ConversationMessage, PlanStatus};
    use crate::plan::heuristic_plan;
    use forge_intent::classify;

    fn one_file() -> GenerationOutput {
        GenerationOutput {
            files: vec![GeneratedFile {
                name: "index.html".into(),
                path: "index.html".into(),
                content: "<!DOCTYPE html>".into(),
                language: "html".into(),
            }],
        }
    }

    fn conversation_with_plan() -> (Conversation, PlanId) {
        let mut conv = Conversation::new();
        conv.push_user("Build a todo app");
        let id = conv.propose_plan(heuristic_plan(&classify("Build a todo app")), "Here is a plan");
        (conv, id)
    }

    #[tokio::test]
    async fn test_no_generation_without_approval() {
        let mut generator = MockFileGenerator::new();
        generator.expect_generate().times(0);
        let gate = ApprovalGate::new(Arc::new(generator), Duration::from_secs(1));

        let (mut conv, id) = conversation_with_plan();
        conv.discard_plan(&id).unwrap();

        assert!(matches!(
            gate.approve(&mut conv, &id).await,
            Err(ChatError::PlanNotPending { .. })
        ));
        assert!(matches!(
            gate.approve(&mut conv, "unknown").await,
            Err(ChatError::PlanNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_one_approval_one_call() {
        let mut generator = MockFileGenerator::new();
        generator
            .expect_generate()
            .withf(|req| req.description.starts_with("TaskFlow Todo Manager"))
            .times(1)
            .returning(|_| Ok(one_file()));
        let gate = ApprovalGate::new(Arc::new(generator), Duration::from_secs(1));

        let (mut conv, id) = conversation_with_plan();
        let report = gate.approve(&mut conv, &id).await.unwrap();
        assert_eq!(report.plan_id, id);
        assert_eq!(report.files.len(), 1);
        assert_eq!(conv.plan(&id).unwrap().status, PlanStatus::Approved);

        // a second approval is rejected before reaching the generator
        assert!(gate.approve(&mut conv, &id).await.is_err());
    }

    #[tokio::test]
    async fn test_generator_failure_is_reported() {
        let mut generator = MockFileGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_| Err(GenerationError::Failed("template engine crashed".into())));
        let gate = ApprovalGate::new(Arc::new(generator), Duration::from_secs(1));

        let (mut conv, id) = conversation_with_plan();
        let err = gate.approve(&mut conv, &id).await.unwrap_err();
        assert!(matches!(err, ChatError::BuildFailed(ref r) if r == "template engine crashed"));

        match conv.last_message() {
            Some(ConversationMessage::BuildResult(m)) => {
                assert!(matches!(m.outcome, BuildOutcome::Failed { .. }));
                assert!(m.content.contains("template engine crashed"));
                assert!(m.content.contains("TaskFlow Todo Manager"));
            }
            other => panic!("expected build result, got {other:?}"),
        }
        // failure is final for this plan
        assert_eq!(conv.plan(&id).unwrap().status, PlanStatus::Approved);
    }

    struct SlowGenerator;

    #[async_trait]
    impl FileGenerator for SlowGenerator {
        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> Result<GenerationOutput, GenerationError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(GenerationOutput::default())
        }
    }

    #[tokio::test]
    async fn test_build_timeout() {
        let gate = ApprovalGate::new(Arc::new(SlowGenerator), Duration::from_millis(20));
        let (mut conv, id) = conversation_with_plan();

        let err = gate.approve(&mut conv, &id).await.unwrap_err();
        assert!(matches!(err, ChatError::BuildTimedOut(_)));
        assert!(matches!(
            conv.last_message(),
            Some(ConversationMessage::BuildResult(_))
        ));
    }
}
