//! Embedding engine for catalogs.
//!
//! Provides provider-agnostic embedding generation with dimension checks.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};

use qamatch_core::{AppError, AppResult};
use std::sync::Arc;

/// Wraps a provider and guarantees every returned vector has the
/// provider's advertised dimension.
#[derive(Debug, Clone)]
pub struct EmbeddingEngine {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl EmbeddingEngine {
    /// Create a new embedding engine around a provider.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, batch_size: usize) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
        }
    }

    /// Create the provider described by `config` and wrap it.
    pub async fn from_config(config: &EmbeddingConfig) -> AppResult<Self> {
        tracing::debug!(
            "Creating embedding provider: provider={}, model={}, dimensions={}",
            config.provider,
            config.model,
            config.dimensions
        );

        let provider = create_provider(config).await?;
        if provider.dimensions() != config.dimensions {
            return Err(AppError::DimensionMismatch {
                expected: config.dimensions,
                actual: provider.dimensions(),
            });
        }

        Ok(Self::new(provider, config.batch_size))
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    /// Embed multiple texts, `batch_size` at a time, preserving order.
    pub async fn embed_texts(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::info!(
            "Embedding {} texts using provider '{}' (model: {})",
            texts.len(),
            self.provider.provider_name(),
            self.provider.model_name()
        );

        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let vectors = self.provider.embed_batch(batch).await?;
            if vectors.len() != batch.len() {
                return Err(AppError::ProviderUnavailable(format!(
                    "Provider returned {} embeddings for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }
            for vector in &vectors {
                self.check_dimensions(vector)?;
            }
            embeddings.extend(vectors);
        }

        tracing::debug!(
            "Generated {} embeddings of dimension {}",
            embeddings.len(),
            self.dimensions()
        );

        Ok(embeddings)
    }

    /// Embed a single query text.
    pub async fn embed_query(&self, text: &str) -> AppResult<Vec<f32>> {
        let vector = self.provider.embed(text).await?;
        self.check_dimensions(&vector)?;
        Ok(vector)
    }

    fn check_dimensions(&self, vector: &[f32]) -> AppResult<()> {
        if vector.len() != self.dimensions() {
            return Err(AppError::DimensionMismatch {
                expected: self.dimensions(),
                actual: vector.len(),
            });
        }
        Ok(())
    }
}
