//! Stats command handler.

use crate::commands::print_json;
use clap::Args;
use qamatch_core::{config::AppConfig, AppResult};

/// Show catalog statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command for catalog '{}'", config.catalog);

        let stats = qamatch_knowledge::stats(&config.workspace, &config.catalog)?;

        if self.json {
            print_json(&stats)?;
        } else {
            println!("Catalog: {}", stats.catalog_name);
            println!("  Entries: {}", stats.entries);
            println!("  Provider: {} (model: {})", stats.provider, stats.model);
            println!("  Dimensions: {}", stats.dimensions);
            println!("  Metric: {}", stats.metric);
            println!("  Index size: {} bytes", stats.index_bytes);
            println!("  Catalog size: {} bytes", stats.catalog_bytes);
            println!("  Built at: {}", stats.built_at);
        }

        Ok(())
    }
}
