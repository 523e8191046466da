//! Build command - Propose a plan, ask for approval, generate the files.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use forge_chat::{write_files, AssistRequest, Assistant, GenerationOutput};

use super::SourceArgs;

#[derive(Args)]
pub struct BuildArgs {
    /// Description of the application
    message: String,

    #[command(flatten)]
    source: SourceArgs,

    /// Directory the generated files are written to
    #[arg(short, long)]
    output: PathBuf,

    /// Approve the plan without asking
    #[arg(short, long)]
    yes: bool,
}

pub async fn execute(args: BuildArgs) -> Result<()> {
    let config = args.source.config()?;
    let (repository, project_id) = args.source.repository()?;
    let assistant = Assistant::from_config(config, repository);

    let conversation_id = assistant.start_conversation();
    let mut request = AssistRequest::new(&args.message);
    request.project_id = project_id;

    let reply = assistant
        .assist(&conversation_id, request)
        .await
        .context("Failed to handle request")?;

    let Some(plan_id) = reply.plan_id else {
        println!("{}", reply.message);
        anyhow::bail!(
            "Not an app creation request (classified as {}), nothing to build",
            reply.intent.intent_type
        );
    };

    println!("{}", reply.message);

    if !args.yes && !confirm("Approve this plan and generate the files?")? {
        assistant.discard_plan(&conversation_id, &plan_id)?;
        println!("Plan discarded. Nothing was generated.");
        return Ok(());
    }

    let report = assistant
        .approve(&conversation_id, &plan_id)
        .await
        .context("Build failed")?;

    let output = GenerationOutput {
        files: report.files,
    };
    let written = write_files(&args.output, &output)
        .with_context(|| format!("Failed to write files to {:?}", args.output))?;
    info!("Wrote {} files", written.len());

    println!();
    println!("Generated {} files in {:?}:", written.len(), args.output);
    for path in &written {
        println!("  {}", path.display());
    }
    Ok(())
}

/// Ask a yes/no question on stdin. Anything but "y"/"yes" is a no.
fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("no"));
        assert!(!is_yes("yep"));
    }
}
