//! AppForge CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or missing input
//! - 3: Build failure

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use forge_chat::ChatError;
use forge_project::ProjectError;

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const BUILD_FAILURE: u8 = 3;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_directive = if cli.verbose {
        "forge=debug,warn"
    } else if cli.quiet {
        "warn"
    } else {
        "forge=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // Logs go to stderr so command output stays machine-readable
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let result = match cli.command {
        Commands::Classify(args) => commands::classify::execute(args).await,
        Commands::Prompt(args) => commands::prompt::execute(args).await,
        Commands::Plan(args) => commands::plan::execute(args).await,
        Commands::Build(args) => commands::build::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Map an error chain to an exit code.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(chat) = cause.downcast_ref::<ChatError>() {
            return match chat {
                ChatError::BuildFailed(_) | ChatError::BuildTimedOut(_) => ExitCodes::BUILD_FAILURE,
                ChatError::ContextUnavailable(_)
                | ChatError::ConversationNotFound(_)
                | ChatError::PlanNotFound(_)
                | ChatError::Config(_) => ExitCodes::INVALID_ARGS,
                _ => ExitCodes::GENERAL_ERROR,
            };
        }
        if let Some(project) = cause.downcast_ref::<ProjectError>() {
            return match project {
                ProjectError::Io(_) => ExitCodes::GENERAL_ERROR,
                _ => ExitCodes::INVALID_ARGS,
            };
        }
    }

    let msg = e.to_string().to_lowercase();
    if msg.contains("argument") || msg.contains("not found") || msg.contains("no such file") {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}
