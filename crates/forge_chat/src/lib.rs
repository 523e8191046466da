//! # forge_chat - Assistance pipeline for AppForge
//!
//! This crate turns a chat message into either a plain reply or an
//! application plan, and generates files once a plan is approved:
//! - Prompt assembly from the message, classified intent and project context
//! - Optional generation backend (OpenAI or Anthropic) with local fallback
//! - Plan synthesis that always yields a usable plan
//! - An approval gate: nothing is generated before explicit approval
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐    ┌──────────────┐    ┌──────────────┐
//! │   Intent    │───▶│    Prompt    │───▶│   Backend    │
//! │ Classifier  │    │  Assembler   │    │  (optional)  │
//! └─────────────┘    └──────────────┘    └──────┬───────┘
//!        ▲                  ▲                   ▼
//! ┌──────┴──────┐    ┌──────┴───────┐    ┌──────────────┐
//! │  Assistant  │───▶│   Context    │    │     Plan     │
//! │             │    │   Gatherer   │    │  Synthesizer │
//! └──────┬──────┘    └──────────────┘    └──────┬───────┘
//!        │                                      ▼
//!        │           ┌──────────────┐    ┌──────────────┐
//!        └──────────▶│   Approval   │◀───│ Conversation │
//!                    │     Gate     │    │  (pending)   │
//!                    └──────┬───────┘    └──────────────┘
//!                           ▼
//!                    ┌──────────────┐
//!                    │    File      │
//!                    │  Generator   │
//!                    └──────────────┘
//! ```

pub mod assistant;
pub mod config;
pub mod conversation;
pub mod error;
pub mod gate;
pub mod generator;
pub mod llm;
pub mod plan;
pub mod prompt;
pub mod types;

pub use assistant::Assistant;
pub use config::{
    AssistantConfig, BackendConfig, LlmProvider, PromptLimits, WorkspaceSettings,
};
pub use conversation::{
    BuildOutcome, BuildResultMessage, Conversation, ConversationId, ConversationMessage,
    GeneratedFileSummary, MessageRole, PlainMessage, PlanId, PlanMessage, PlanStatus,
};
pub use error::{BackendError, ChatError, ChatResult, GenerationError};
pub use gate::{
    ApprovalGate, ApprovedPlan, BuildAttempt, BuildReport, FileGenerator, GeneratedFile,
    GenerationOutput, GenerationRequest,
};
pub use generator::{write_files, TemplateFileGenerator};
pub use llm::{GenerationBackend, LlmAdapter};
pub use plan::{
    extract_plan, heuristic_plan, synthesize_plan, synthesize_plan_with_source, ApplicationPlan,
    PlanExtractionError, PlanPreview, PlanSource,
};
pub use prompt::{build_prompts, PromptAssembler, TRUNCATION_MARKER};
pub use types::{AssistReply, AssistRequest, PromptPair, ReplySource};
