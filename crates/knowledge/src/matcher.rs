//! Question matcher.
//!
//! [`MatcherContext`] owns everything a query needs: the catalog, its index,
//! the embedding engine that produced the index, and the acceptance
//! threshold. It is built once at startup and then only read, so a single
//! instance can be shared across request handlers behind an `Arc`.

use crate::catalog::Catalog;
use crate::config;
use crate::embeddings::EmbeddingEngine;
use crate::index::FlatIndex;
use crate::types::CatalogConfig;
use crate::vector_index::{Metric, Neighbor, VectorIndex};
use qamatch_core::{AppError, AppResult, MatcherSettings};
use serde::Serialize;
use std::path::Path;

/// Acceptance threshold and reply texts.
#[derive(Debug, Clone, PartialEq)]
pub struct MatcherConfig {
    /// Largest distance still accepted as a match, in units of `metric`.
    pub threshold: f32,

    /// Metric the threshold was calibrated with.
    pub metric: Metric,

    /// Reply for empty or whitespace-only input.
    pub prompt_reply: String,

    /// Reply when the nearest question is farther than `threshold`.
    pub unknown_reply: String,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        let settings = MatcherSettings::default();
        Self {
            threshold: settings.threshold,
            metric: Metric::default(),
            prompt_reply: settings.prompt_reply,
            unknown_reply: settings.unknown_reply,
        }
    }
}

impl TryFrom<&MatcherSettings> for MatcherConfig {
    type Error = AppError;

    fn try_from(settings: &MatcherSettings) -> AppResult<Self> {
        if !settings.threshold.is_finite() || settings.threshold < 0.0 {
            return Err(AppError::Config(format!(
                "Threshold must be a finite, non-negative distance, got {}",
                settings.threshold
            )));
        }

        Ok(Self {
            threshold: settings.threshold,
            metric: settings.metric.parse()?,
            prompt_reply: settings.prompt_reply.clone(),
            unknown_reply: settings.unknown_reply.clone(),
        })
    }
}

/// Result of matching one utterance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MatchOutcome {
    /// Input was blank; neither the provider nor the index was consulted.
    EmptyInput,

    /// The closest question was farther than the threshold.
    Unknown { distance: f32, nearest: usize },

    /// The closest question was within the threshold.
    Answered {
        position: usize,
        distance: f32,
        answer: String,
    },
}

impl MatchOutcome {
    pub fn is_answered(&self) -> bool {
        matches!(self, MatchOutcome::Answered { .. })
    }
}

/// Loaded catalog, index and provider, ready to answer questions.
#[derive(Debug)]
pub struct MatcherContext {
    catalog: Catalog,
    index: Box<dyn VectorIndex>,
    engine: EmbeddingEngine,
    config: MatcherConfig,
}

impl MatcherContext {
    /// Assemble a context from already-loaded parts.
    ///
    /// # Errors
    /// * `CatalogMismatch` - the index does not hold one vector per catalog entry
    /// * `DimensionMismatch` - the provider's vectors do not fit the index
    /// * `Config` - the index metric differs from the one the threshold was calibrated with
    pub fn new(
        catalog: Catalog,
        index: impl VectorIndex + 'static,
        engine: EmbeddingEngine,
        config: MatcherConfig,
    ) -> AppResult<Self> {
        if index.size() != catalog.len() {
            return Err(AppError::CatalogMismatch(format!(
                "index holds {} vectors but catalog has {} entries",
                index.size(),
                catalog.len()
            )));
        }

        if engine.dimensions() != index.dimensions() {
            return Err(AppError::DimensionMismatch {
                expected: index.dimensions(),
                actual: engine.dimensions(),
            });
        }

        if index.metric() != config.metric {
            return Err(AppError::Config(format!(
                "Index uses metric {} but the threshold is calibrated for {}; \
                 rebuild the catalog or recalibrate the threshold",
                index.metric(),
                config.metric
            )));
        }

        Ok(Self {
            catalog,
            index: Box::new(index),
            engine,
            config,
        })
    }

    /// Load a built catalog from the workspace.
    ///
    /// Reads the manifest, catalog and index together and checks that they
    /// belong to the same build before creating the embedding provider.
    /// Every failure is fatal: no partially loaded context is returned.
    pub async fn load(
        workspace: &Path,
        catalog_name: &str,
        settings: &MatcherSettings,
    ) -> AppResult<Self> {
        let matcher_config = MatcherConfig::try_from(settings)?;
        let catalog_config = config::load_config(workspace, catalog_name)?;

        let catalog = Catalog::load(&config::get_catalog_path(workspace, catalog_name))?;
        let (index, fingerprint) = FlatIndex::load(&config::get_index_path(workspace, catalog_name))?;

        verify_build(&catalog_config, &catalog, &index, &fingerprint)?;

        let engine = EmbeddingEngine::from_config(&catalog_config.embedding).await?;

        tracing::info!(
            "Loaded catalog '{}': {} entries, {} dimensions, metric {}, threshold {}",
            catalog_name,
            catalog.len(),
            index.dimensions(),
            index.metric(),
            matcher_config.threshold
        );

        Self::new(catalog, index, engine, matcher_config)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn index(&self) -> &dyn VectorIndex {
        self.index.as_ref()
    }

    pub fn engine(&self) -> &EmbeddingEngine {
        &self.engine
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Match one utterance against the catalog.
    #[tracing::instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn answer(&self, text: &str) -> AppResult<MatchOutcome> {
        // Pre-check: blank input never reaches the provider or the index
        if text.trim().is_empty() {
            tracing::debug!("Blank input, prompting for a question");
            return Ok(MatchOutcome::EmptyInput);
        }

        let vector = self.engine.embed_query(text).await?;
        let nearest = self.index.nearest(&vector)?.ok_or(AppError::EmptyCatalog)?;

        let outcome = self.decide(nearest);
        tracing::debug!(
            distance = nearest.distance,
            position = nearest.position,
            answered = outcome.is_answered(),
            "Matched query"
        );
        Ok(outcome)
    }

    /// Match one utterance and return the reply text.
    pub async fn answer_question(&self, question: &str) -> AppResult<String> {
        let outcome = self.answer(question).await?;
        Ok(self.reply(&outcome).to_string())
    }

    /// Apply the acceptance threshold to a search hit.
    pub fn decide(&self, nearest: Neighbor) -> MatchOutcome {
        // Written so that a NaN distance is rejected
        let accepted = nearest.distance <= self.config.threshold;

        match self.catalog.answer(nearest.position) {
            Some(answer) if accepted => MatchOutcome::Answered {
                position: nearest.position,
                distance: nearest.distance,
                answer: answer.to_string(),
            },
            _ => MatchOutcome::Unknown {
                distance: nearest.distance,
                nearest: nearest.position,
            },
        }
    }

    /// Reply text for an outcome.
    pub fn reply<'a>(&'a self, outcome: &'a MatchOutcome) -> &'a str {
        match outcome {
            MatchOutcome::EmptyInput => &self.config.prompt_reply,
            MatchOutcome::Unknown { .. } => &self.config.unknown_reply,
            MatchOutcome::Answered { answer, .. } => answer,
        }
    }
}

/// Check that a manifest, catalog and index come from the same build.
fn verify_build(
    catalog_config: &CatalogConfig,
    catalog: &Catalog,
    index: &FlatIndex,
    fingerprint: &[u8; 32],
) -> AppResult<()> {
    if index.size() != catalog.len() {
        return Err(AppError::CatalogMismatch(format!(
            "index holds {} vectors but catalog has {} entries",
            index.size(),
            catalog.len()
        )));
    }

    if catalog_config.entries != catalog.len() {
        return Err(AppError::CatalogMismatch(format!(
            "manifest records {} entries but catalog has {}; rebuild with 'qamatch build'",
            catalog_config.entries,
            catalog.len()
        )));
    }

    if *fingerprint != catalog.fingerprint() {
        return Err(AppError::CatalogMismatch(
            "index was built from a different catalog; rebuild with 'qamatch build'".to_string(),
        ));
    }

    if index.metric() != catalog_config.metric {
        return Err(AppError::CatalogMismatch(format!(
            "index metric {} differs from manifest metric {}",
            index.metric(),
            catalog_config.metric
        )));
    }

    if index.dimensions() != catalog_config.embedding.dimensions {
        return Err(AppError::DimensionMismatch {
            expected: catalog_config.embedding.dimensions,
            actual: index.dimensions(),
        });
    }

    Ok(())
}
