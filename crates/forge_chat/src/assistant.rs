//! Assistant orchestrator.
//!
//! Ties classification, context gathering, prompt assembly, the generation
//! backend, plan synthesis and the approval gate together. Conversations are
//! held in memory; a lock is never held across an `.await`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use forge_intent::{IntentClassifier, IntentType, UserIntent};
use forge_project::{ContextGatherer, ProjectContext, ProjectRepository};

use crate::config::AssistantConfig;
use crate::conversation::{Conversation, ConversationId};
use crate::error::{ChatError, ChatResult};
use crate::gate::{ApprovalGate, BuildReport, FileGenerator};
use crate::generator::TemplateFileGenerator;
use crate::llm::{GenerationBackend, LlmAdapter};
use crate::plan::{synthesize_plan_with_source, ApplicationPlan, PlanSource};
use crate::prompt::PromptAssembler;
use crate::types::{AssistReply, AssistRequest, PromptPair, ReplySource};

/// Main entry point for assistance requests.
pub struct Assistant {
    config: AssistantConfig,
    classifier: IntentClassifier,
    gatherer: ContextGatherer,
    assembler: PromptAssembler,
    backend: Option<Arc<dyn GenerationBackend>>,
    gate: ApprovalGate,
    conversations: RwLock<HashMap<ConversationId, Conversation>>,
}

impl Assistant {
    pub fn new(
        config: AssistantConfig,
        repository: Arc<dyn ProjectRepository>,
        backend: Option<Arc<dyn GenerationBackend>>,
        generator: Arc<dyn FileGenerator>,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(),
            gatherer: ContextGatherer::new(repository),
            assembler: PromptAssembler::new(config.limits),
            backend,
            gate: ApprovalGate::new(generator, config.build_timeout),
            conversations: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Build an assistant with the HTTP backend (when configured) and the
    /// built-in template generator.
    pub fn from_config(config: AssistantConfig, repository: Arc<dyn ProjectRepository>) -> Self {
        let backend = config
            .backend
            .as_ref()
            .map(|b| Arc::new(LlmAdapter::from_config(b)) as Arc<dyn GenerationBackend>);
        Self::new(config, repository, backend, Arc::new(TemplateFileGenerator::new()))
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    pub fn start_conversation(&self) -> ConversationId {
        let conversation = Conversation::new();
        let id = conversation.id.clone();
        self.conversations.write().insert(id.clone(), conversation);
        debug!(conversation = %id, "Started conversation");
        id
    }

    /// Snapshot of a conversation.
    pub fn conversation(&self, id: &str) -> ChatResult<Conversation> {
        self.conversations
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| ChatError::ConversationNotFound(id.to_string()))
    }

    pub fn conversation_count(&self) -> usize {
        self.conversations.read().len()
    }

    /// Answer one user message.
    ///
    /// Creation requests attach a plan waiting for approval; every other
    /// intent gets a plain reply. Backend failures never surface here.
    pub async fn assist(
        &self,
        conversation_id: &str,
        request: AssistRequest,
    ) -> ChatResult<AssistReply> {
        self.with_conversation(conversation_id, |c| {
            c.push_user(request.message.clone());
        })?;

        let intent = self.classifier.classify(&request.message);
        info!(
            conversation = %conversation_id,
            intent = %intent.intent_type,
            "Handling assistance request"
        );

        let context = match request.project_id {
            Some(project_id) => Some(self.gatherer.gather_context(project_id).await?),
            None => None,
        };

        let prompts = self.prompts(&request, context.as_ref(), &intent);
        let raw = self.call_backend(&prompts).await;

        if intent.is_creation() {
            let (plan, source) = synthesize_plan_with_source(raw.as_deref().ok(), &intent);
            let fallback = match source {
                PlanSource::Backend => None,
                PlanSource::Heuristic => Some(raw.err().unwrap_or(Fallback::Unusable)),
            };
            let message = plan_message(&plan, fallback);
            let plan_id = self.with_conversation(conversation_id, |c| {
                c.propose_plan(plan, message.clone())
            })?;
            info!(conversation = %conversation_id, plan_id = %plan_id, ?source, "Plan ready for approval");

            return Ok(AssistReply {
                intent,
                message,
                plan_id: Some(plan_id),
                source: match source {
                    PlanSource::Backend => ReplySource::Backend,
                    PlanSource::Heuristic => ReplySource::Local,
                },
            });
        }

        let (message, source) = match raw {
            Ok(text) if !text.trim().is_empty() => (text, ReplySource::Backend),
            Ok(_) => (
                local_reply(&intent, context.as_ref(), Fallback::Unusable),
                ReplySource::Local,
            ),
            Err(fallback) => (
                local_reply(&intent, context.as_ref(), fallback),
                ReplySource::Local,
            ),
        };
        self.with_conversation(conversation_id, |c| {
            c.push_assistant(message.clone());
        })?;

        Ok(AssistReply {
            intent,
            message,
            plan_id: None,
            source,
        })
    }

    /// Approve a pending plan and generate its files.
    pub async fn approve(&self, conversation_id: &str, plan_id: &str) -> ChatResult<BuildReport> {
        let approved = self.with_conversation(conversation_id, |c| c.approve_plan(plan_id))??;
        info!(conversation = %conversation_id, plan_id, "Plan approved");

        let attempt = self.gate.build(approved).await;
        self.with_conversation(conversation_id, |c| c.record_build(attempt))?
    }

    /// Discard a pending plan ("modify plan").
    pub fn discard_plan(&self, conversation_id: &str, plan_id: &str) -> ChatResult<()> {
        self.with_conversation(conversation_id, |c| c.discard_plan(plan_id))??;
        self.with_conversation(conversation_id, |c| {
            c.push_assistant("No problem. Tell me what you'd like to change and I'll draft a new plan.");
        })
    }

    /// Prompts for a request, as they would be sent to the backend.
    pub fn prompts(
        &self,
        request: &AssistRequest,
        context: Option<&ProjectContext>,
        intent: &UserIntent,
    ) -> PromptPair {
        self.assembler.build_prompts(request, context, Some(intent))
    }

    async fn call_backend(&self, prompts: &PromptPair) -> Result<String, Fallback> {
        let backend = self.backend.as_ref().ok_or(Fallback::NoBackend)?;
        match timeout(self.config.backend_timeout, backend.generate(prompts)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => {
                warn!(error = %e, "Backend request failed, using local fallback");
                Err(Fallback::Unreachable)
            }
            Err(_) => {
                warn!(
                    timeout = ?self.config.backend_timeout,
                    "Backend request timed out, using local fallback"
                );
                Err(Fallback::Unreachable)
            }
        }
    }

    fn with_conversation<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Conversation) -> T,
    ) -> ChatResult<T> {
        let mut conversations = self.conversations.write();
        let conversation = conversations
            .get_mut(id)
            .ok_or_else(|| ChatError::ConversationNotFound(id.to_string()))?;
        Ok(f(conversation))
    }
}

/// Why a reply was produced locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fallback {
    /// No generation backend is configured.
    NoBackend,
    /// The backend errored or timed out.
    Unreachable,
    /// The backend answered, but with nothing usable.
    Unusable,
}

fn plan_message(plan: &ApplicationPlan, fallback: Option<Fallback>) -> String {
    let lead = match fallback {
        None => format!("Here's a plan for **{}**.", plan.name),
        Some(Fallback::NoBackend) => format!(
            "No AI backend is configured, so I drafted a plan for **{}** locally.",
            plan.name
        ),
        Some(Fallback::Unreachable) => format!(
            "I couldn't reach the AI assistant, so I drafted a plan for **{}** locally.",
            plan.name
        ),
        Some(Fallback::Unusable) => format!(
            "The AI assistant replied without a usable plan, so I drafted a plan for **{}** locally.",
            plan.name
        ),
    };
    format!(
        "{}\n\n{}\nApprove the plan to generate the files, or ask me to modify it.",
        lead,
        plan.to_markdown()
    )
}

/// Deterministic reply used when the backend gave nothing usable.
fn local_reply(intent: &UserIntent, context: Option<&ProjectContext>, fallback: Fallback) -> String {
    let mut reply = String::from(match fallback {
        Fallback::NoBackend => "No AI backend is configured, so here is a quick local answer.\n\n",
        Fallback::Unreachable => {
            "I couldn't reach the AI assistant right now, so here is a quick local answer.\n\n"
        }
        Fallback::Unusable => {
            "The AI assistant sent back an empty reply, so here is a quick local answer.\n\n"
        }
    });
    let hint = match intent.intent_type {
        IntentType::Debug => {
            "This looks like a debugging request. Check the browser console and server logs for the first error, reproduce it with the smallest input you can, and share the stack trace so we can narrow it down."
        }
        IntentType::Explain => {
            "This looks like a request for an explanation. Share the code you want explained and I'll walk through it step by step once the assistant is reachable."
        }
        IntentType::ModifyCode => {
            "This looks like a change request. Describe the exact change and point me at the file, and I'll propose the edit once the assistant is reachable."
        }
        IntentType::GenerateFeature => {
            "This looks like a new feature. Describe what it should do and where it belongs in your project, and I'll draft it once the assistant is reachable."
        }
        IntentType::CreateApp => "Describe the app you want and I'll draft a plan.",
    };
    reply.push_str(hint);

    if let Some(context) = context {
        if !context.issues.is_empty() {
            reply.push_str("\n\nThings I noticed in your project:");
            for issue in &context.issues {
                reply.push_str(&format!("\n- {}", issue.message));
            }
        }
    }
    reply
}
