//! Build command handler.
//!
//! Embeds a question/answer source file into a catalog.

use crate::commands::print_json;
use clap::Args;
use qamatch_core::{config::AppConfig, AppResult};
use qamatch_knowledge::{BuildOptions, EmbeddingConfig, Metric};
use std::path::PathBuf;

/// Build a catalog from a JSON or YAML file of question/answer pairs
#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Source file (`[{question, answer}, ...]` or `{questions, answers}`)
    pub source: PathBuf,

    /// Distance metric (l2_squared, cosine); defaults to matcher.metric
    #[arg(long)]
    pub metric: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl BuildCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing build command for catalog '{}'", config.catalog);

        let metric: Metric = self
            .metric
            .as_deref()
            .unwrap_or(config.matcher.metric.as_str())
            .parse()?;

        if metric.as_str() != config.matcher.metric {
            tracing::warn!(
                "Building with metric {} while matcher.metric is {}; \
                 set matcher.metric and recalibrate the threshold before serving",
                metric,
                config.matcher.metric
            );
        }

        let options = BuildOptions {
            catalog_name: config.catalog.clone(),
            source: self.source.clone(),
            embedding: EmbeddingConfig::from(&config.embedding),
            metric,
        };

        let stats = qamatch_knowledge::build(&config.workspace, options).await?;

        if self.json {
            print_json(&stats)?;
        } else {
            println!(
                "Built catalog '{}': {} entries, {} dimensions, metric {} ({} bytes) in {:.2}s",
                stats.catalog_name,
                stats.entries,
                stats.dimensions,
                stats.metric,
                stats.index_bytes,
                stats.duration_secs
            );
        }

        Ok(())
    }
}
