//! Plan command - Propose an application plan.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use forge_chat::{AssistRequest, Assistant};

use super::SourceArgs;

#[derive(Args)]
pub struct PlanArgs {
    /// Description of the application
    message: String,

    #[command(flatten)]
    source: SourceArgs,

    /// Print the plan as JSON
    #[arg(long)]
    json: bool,
}

pub async fn execute(args: PlanArgs) -> Result<()> {
    let config = args.source.config()?;
    let (repository, project_id) = args.source.repository()?;
    let assistant = Assistant::from_config(config, repository);

    if !assistant.has_backend() {
        info!("No backend configured, planning with local heuristics");
    }

    let conversation_id = assistant.start_conversation();
    let mut request = AssistRequest::new(&args.message);
    request.project_id = project_id;

    let reply = assistant
        .assist(&conversation_id, request)
        .await
        .context("Failed to handle request")?;

    let plan = reply.plan_id.as_deref().and_then(|plan_id| {
        assistant
            .conversation(&conversation_id)
            .ok()
            .and_then(|c| c.plan(plan_id).map(|m| m.plan.clone()))
    });

    match plan {
        Some(plan) if args.json => println!("{}", serde_json::to_string_pretty(&plan)?),
        Some(plan) => println!("{}", plan.to_markdown()),
        None => {
            // not a creation request; show the plain reply
            println!("{}", reply.message);
        }
    }
    Ok(())
}
