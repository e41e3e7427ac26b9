//! Ask command handler.
//!
//! Answers a single question against the configured catalog.

use crate::commands::{load_matcher, print_json};
use clap::Args;
use qamatch_core::{config::AppConfig, AppResult};

/// Answer one question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question (words are joined with spaces)
    pub question: Vec<String>,

    /// Output as JSON, including the match distance
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command against catalog '{}'", config.catalog);

        let question = self.question.join(" ");
        let matcher = load_matcher(config).await?;
        let outcome = matcher.answer(&question).await?;

        if self.json {
            print_json(&serde_json::json!({
                "question": question,
                "answer": matcher.reply(&outcome),
                "match": outcome,
            }))?;
        } else {
            println!("{}", matcher.reply(&outcome));
        }

        Ok(())
    }
}
