//! Calibrate command handler.
//!
//! Reports how the acceptance threshold relates to the distances the
//! catalog produces. Never changes configuration.

use crate::commands::{load_matcher, print_json};
use clap::Args;
use qamatch_core::{config::AppConfig, AppResult};

/// Check the acceptance threshold against the catalog's own questions
#[derive(Args, Debug)]
pub struct CalibrateCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CalibrateCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing calibrate command for catalog '{}'", config.catalog);

        let matcher = load_matcher(config).await?;
        let report = qamatch_knowledge::calibrate(&matcher).await?;

        if self.json {
            return print_json(&report);
        }

        println!(
            "Catalog: {} ({} entries, metric {})",
            config.catalog, report.entries, report.metric
        );
        println!("  Threshold: {}", report.threshold);
        println!("  Worst self-match distance: {:.4}", report.max_self_distance);
        match report.min_cross_distance {
            Some(distance) => println!("  Closest pair of questions: {:.4}", distance),
            None => println!("  Closest pair of questions: (single entry)"),
        }
        match report.suggested_threshold {
            Some(threshold) => println!("  Suggested threshold: {:.4}", threshold),
            None => println!("  Suggested threshold: (no gap between questions)"),
        }

        if report.is_consistent() {
            println!("Every question returns its own answer.");
        } else {
            println!(
                "{} questions do not return their own answer:",
                report.failing_positions.len()
            );
            for position in &report.failing_positions {
                let question = matcher.catalog().question(*position).unwrap_or_default();
                println!("  [{}] {}", position, question);
            }
        }

        Ok(())
    }
}
