//! Command handlers for the qamatch CLI.

pub mod ask;
pub mod build;
pub mod calibrate;
pub mod chat;
pub mod serve;
pub mod stats;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use build::BuildCommand;
pub use calibrate::CalibrateCommand;
pub use chat::ChatCommand;
pub use serve::ServeCommand;
pub use stats::StatsCommand;

use qamatch_core::{config::AppConfig, AppResult};
use qamatch_knowledge::{EmbeddingConfig, MatcherContext};
use serde::Serialize;

/// Load the configured catalog into a matcher.
///
/// The catalog is always queried with the provider it was built with; a
/// different provider in the current configuration is only reported.
pub async fn load_matcher(config: &AppConfig) -> AppResult<MatcherContext> {
    let built = qamatch_knowledge::config::load_config(&config.workspace, &config.catalog)?;

    let configured = EmbeddingConfig::from(&config.embedding);
    if let Err(e) = configured.validate_consistency(&built.embedding) {
        tracing::warn!(
            "Configured embedding settings differ from catalog '{}' ({}); using the catalog's provider '{}' (model: {})",
            config.catalog,
            e,
            built.embedding.provider,
            built.embedding.model
        );
    }

    MatcherContext::load(&config.workspace, &config.catalog, &config.matcher).await
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
