//! Classify command - Print the intent for a message.

use anyhow::Result;
use clap::Args;

use forge_intent::IntentClassifier;

#[derive(Args)]
pub struct ClassifyArgs {
    /// Message to classify
    message: String,

    /// Print compact JSON
    #[arg(long)]
    compact: bool,
}

pub async fn execute(args: ClassifyArgs) -> Result<()> {
    let intent = IntentClassifier::new().classify(&args.message);
    let output = if args.compact {
        serde_json::to_string(&intent)?
    } else {
        serde_json::to_string_pretty(&intent)?
    };
    println!("{}", output);
    Ok(())
}
