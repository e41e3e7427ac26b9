//! Question/answer catalogs and semantic matching.
//!
//! A catalog is built once from a source file: every question is embedded,
//! the vectors are stored in a flat index, and the questions and answers are
//! saved alongside it. At query time a [`MatcherContext`] embeds the user's
//! text, finds the closest stored question and returns its answer when the
//! distance is within the configured threshold.

pub mod calibrate;
pub mod catalog;
pub mod config;
pub mod embeddings;
pub mod index;
pub mod matcher;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use calibrate::{calibrate, CalibrationReport};
pub use catalog::Catalog;
pub use embeddings::{EmbeddingConfig, EmbeddingEngine, EmbeddingProvider};
pub use index::FlatIndex;
pub use matcher::{MatchOutcome, MatcherConfig, MatcherContext};
pub use types::{BuildOptions, BuildStats, CatalogConfig, CatalogStats, QaPair};
pub use vector_index::{Metric, Neighbor, VectorIndex};

use chrono::Utc;
use qamatch_core::{AppError, AppResult};
use std::path::Path;
use std::time::Instant;

/// Build a catalog from a source file and persist it in the workspace.
pub async fn build(workspace: &Path, options: BuildOptions) -> AppResult<BuildStats> {
    tracing::info!(
        "Starting build for catalog '{}' from {:?}",
        options.catalog_name,
        options.source
    );

    let catalog = Catalog::load_source(&options.source)?;
    let engine = EmbeddingEngine::from_config(&options.embedding).await?;

    build_with_engine(
        workspace,
        &options.catalog_name,
        &catalog,
        &engine,
        &options.embedding,
        options.metric,
    )
    .await
}

/// Embed `catalog` with `engine` and persist the result.
///
/// Writes the index first and the manifest last; a partially written
/// catalog is caught at load time by the fingerprint check.
pub async fn build_with_engine(
    workspace: &Path,
    catalog_name: &str,
    catalog: &Catalog,
    engine: &EmbeddingEngine,
    embedding: &EmbeddingConfig,
    metric: Metric,
) -> AppResult<BuildStats> {
    let start = Instant::now();

    if engine.dimensions() != embedding.dimensions {
        return Err(AppError::DimensionMismatch {
            expected: embedding.dimensions,
            actual: engine.dimensions(),
        });
    }

    // Record the model that actually produced the vectors
    let mut embedding = embedding.clone();
    let model = engine.provider().model_name();
    if model != embedding.model {
        tracing::warn!(
            "Provider '{}' embeds with model '{}', not '{}'; recording '{}'",
            embedding.provider,
            model,
            embedding.model,
            model
        );
        embedding.model = model.to_string();
    }

    let vectors = engine.embed_texts(catalog.questions()).await?;
    let index = FlatIndex::build(metric, &vectors)?;

    let index_path = config::get_index_path(workspace, catalog_name);
    index.save(&index_path, &catalog.fingerprint())?;
    catalog.save(&config::get_catalog_path(workspace, catalog_name))?;

    config::save_config(
        workspace,
        &CatalogConfig {
            name: catalog_name.to_string(),
            embedding,
            metric,
            entries: catalog.len(),
            built_at: Utc::now(),
        },
    )?;

    let index_bytes = file_size(&index_path);
    let duration = start.elapsed();

    tracing::info!(
        "Build completed: {} entries, {} dimensions, {} bytes in {:.2}s",
        catalog.len(),
        index.dimensions(),
        index_bytes,
        duration.as_secs_f64()
    );

    Ok(BuildStats {
        catalog_name: catalog_name.to_string(),
        entries: catalog.len(),
        dimensions: index.dimensions(),
        metric,
        index_bytes,
        duration_secs: duration.as_secs_f64(),
    })
}

/// Get statistics for a built catalog.
pub fn stats(workspace: &Path, catalog_name: &str) -> AppResult<CatalogStats> {
    tracing::info!("Getting stats for catalog '{}'", catalog_name);

    let catalog_config = config::load_config(workspace, catalog_name)?;

    let index_path = config::get_index_path(workspace, catalog_name);
    if !index_path.exists() {
        return Err(AppError::Knowledge(format!(
            "Catalog '{}' has no index. Run 'qamatch build' first.",
            catalog_name
        )));
    }

    Ok(CatalogStats {
        catalog_name: catalog_name.to_string(),
        entries: catalog_config.entries,
        dimensions: catalog_config.embedding.dimensions,
        metric: catalog_config.metric,
        provider: catalog_config.embedding.provider,
        model: catalog_config.embedding.model,
        index_bytes: file_size(&index_path),
        catalog_bytes: file_size(&config::get_catalog_path(workspace, catalog_name)),
        built_at: catalog_config.built_at,
    })
}

fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}
