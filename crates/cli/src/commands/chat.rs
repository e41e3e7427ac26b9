//! Chat command handler.
//!
//! Interactive loop reading one question per line from stdin.

use crate::commands::load_matcher;
use clap::Args;
use qamatch_core::{config::AppConfig, AppResult};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Ask questions interactively (one per line, Ctrl+D to quit)
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Print the match distance after each answer
    #[arg(long)]
    pub show_distance: bool,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command against catalog '{}'", config.catalog);

        let matcher = load_matcher(config).await?;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                println!();
                break;
            };

            if matches!(line.trim(), "exit" | "quit") {
                break;
            }

            // A provider outage fails this question only
            match matcher.answer(&line).await {
                Ok(outcome) => {
                    println!("{}", matcher.reply(&outcome));
                    if self.show_distance {
                        match outcome {
                            qamatch_knowledge::MatchOutcome::Answered { distance, .. }
                            | qamatch_knowledge::MatchOutcome::Unknown { distance, .. } => {
                                println!("  (distance {:.4})", distance)
                            }
                            qamatch_knowledge::MatchOutcome::EmptyInput => {}
                        }
                    }
                }
                Err(e) if e.is_per_request() => eprintln!("Error: {}", e),
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }
}
