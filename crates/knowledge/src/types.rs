//! Catalog system type definitions.

use crate::embeddings::EmbeddingConfig;
use crate::vector_index::Metric;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One question/answer pair of a catalog source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

impl QaPair {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Build manifest saved next to a catalog's index (`config.yaml`).
///
/// Records how the stored vectors were produced so that queries are
/// embedded the same way and distances stay comparable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogConfig {
    /// Name of the catalog
    pub name: String,

    /// Provider, model and dimensions of the stored vectors
    pub embedding: EmbeddingConfig,

    /// Metric the index measures distances with
    #[serde(default)]
    pub metric: Metric,

    /// Number of entries at build time
    pub entries: usize,

    /// When the index was built
    #[serde(rename = "builtAt")]
    pub built_at: DateTime<Utc>,
}

/// Options for the build operation.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Catalog name
    pub catalog_name: String,

    /// JSON or YAML file with question/answer pairs
    pub source: PathBuf,

    /// Provider used to embed the questions
    pub embedding: EmbeddingConfig,

    pub metric: Metric,
}

/// Statistics from a build operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStats {
    pub catalog_name: String,
    pub entries: usize,
    pub dimensions: usize,
    pub metric: Metric,
    pub index_bytes: u64,
    pub duration_secs: f64,
}

/// Statistics for a built catalog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub catalog_name: String,
    pub entries: usize,
    pub dimensions: usize,
    pub metric: Metric,
    pub provider: String,
    pub model: String,
    pub index_bytes: u64,
    pub catalog_bytes: u64,
    pub built_at: DateTime<Utc>,
}
