//! Prompt command - Print assembled prompts.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use forge_chat::{AssistRequest, PromptAssembler};
use forge_intent::IntentClassifier;
use forge_project::ContextGatherer;

use super::SourceArgs;

#[derive(Args)]
pub struct PromptArgs {
    /// Message to build prompts for
    message: String,

    #[command(flatten)]
    source: SourceArgs,

    /// File whose contents are attached as a code block
    #[arg(long)]
    code_file: Option<PathBuf>,

    /// Language tag for the code block (defaults to the file extension)
    #[arg(long)]
    language: Option<String>,

    /// Print the prompt pair as JSON
    #[arg(long)]
    json: bool,
}

pub async fn execute(args: PromptArgs) -> Result<()> {
    let config = args.source.config()?;
    let (repository, project_id) = args.source.repository()?;

    let mut request = AssistRequest::new(&args.message);
    if let Some(path) = &args.code_file {
        let code = fs::read_to_string(path)
            .with_context(|| format!("Failed to read code file {:?}", path))?;
        let language = args.language.clone().or_else(|| {
            path.extension()
                .map(|e| e.to_string_lossy().to_lowercase())
        });
        request = request.with_code(code, language);
    }

    let context = match project_id {
        Some(id) => {
            let context = ContextGatherer::new(repository)
                .gather_context(id)
                .await
                .context("Failed to gather project context")?;
            info!("Loaded {} files from {}", context.file_count(), context.project.name);
            Some(context)
        }
        None => None,
    };

    let intent = IntentClassifier::new().classify(&request.message);
    let prompts = PromptAssembler::new(config.limits).build_prompts(
        &request,
        context.as_ref(),
        Some(&intent),
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&prompts)?);
    } else {
        println!("=== System prompt ===");
        println!("{}", prompts.system_prompt);
        println!();
        println!("=== User prompt ===");
        println!("{}", prompts.user_prompt);
    }
    Ok(())
}
