//! CLI command definitions.
//!
//! Each subcommand maps to one step of the assistance pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use forge_chat::AssistantConfig;
use forge_project::{InMemoryProjectRepository, ProjectId};

pub mod build;
pub mod classify;
pub mod plan;
pub mod prompt;

/// AppForge - turn a chat message into an application plan
#[derive(Parser)]
#[command(name = "forge")]
#[command(version, about = "AppForge - turn a chat message into an application plan")]
#[command(long_about = r#"
AppForge classifies a request, assembles prompts with project context, asks a
generation backend (OpenAI or Anthropic, when a key is set) for a plan, and
generates files only after the plan is approved.

COMMANDS:
  classify  → Print the classified intent as JSON
  prompt    → Print the assembled system and user prompts
  plan      → Propose an application plan
  build     → Propose a plan, ask for approval, then write the files

ENVIRONMENT:
  OPENAI_API_KEY / ANTHROPIC_API_KEY   enable the generation backend
  FORGE_LLM_PROVIDER, FORGE_LLM_MODEL, FORGE_LLM_BASE_URL
  FORGE_BACKEND_TIMEOUT_SECS, FORGE_BUILD_TIMEOUT_SECS
  RUST_LOG                             log filter (default forge=info)

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or missing input
  3 - Build failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify a message and print the intent
    Classify(classify::ClassifyArgs),

    /// Print the prompts that would be sent to the backend
    Prompt(prompt::PromptArgs),

    /// Propose an application plan
    Plan(plan::PlanArgs),

    /// Propose, approve and generate an application
    Build(build::BuildArgs),
}

/// Where configuration and project files come from.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Workspace root holding `.forge/settings.json`
    #[arg(long, default_value = ".", env = "FORGE_WORKSPACE")]
    pub workspace: PathBuf,

    /// Project directory to import as context
    #[arg(long)]
    pub project_dir: Option<PathBuf>,

    /// Never call the generation backend
    #[arg(long)]
    pub offline: bool,
}

impl SourceArgs {
    /// Resolve configuration from the workspace settings and environment.
    pub fn config(&self) -> Result<AssistantConfig> {
        let config = AssistantConfig::from_settings(&self.workspace)
            .context("Failed to load workspace settings")?;
        Ok(if self.offline {
            config.without_backend()
        } else {
            config
        })
    }

    /// Repository holding the imported project, if one was given.
    pub fn repository(&self) -> Result<(Arc<InMemoryProjectRepository>, Option<ProjectId>)> {
        let repository = Arc::new(InMemoryProjectRepository::new());
        let project_id = match &self.project_dir {
            Some(dir) => Some(import_project(&repository, dir)?),
            None => None,
        };
        Ok((repository, project_id))
    }
}

fn import_project(repository: &InMemoryProjectRepository, dir: &Path) -> Result<ProjectId> {
    if !dir.is_dir() {
        anyhow::bail!("Project directory not found: {:?}", dir);
    }
    let project = repository
        .import_directory(dir)
        .with_context(|| format!("Failed to import project from {:?}", dir))?;
    Ok(project.id)
}
