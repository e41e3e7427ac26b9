//! Scriptable embedding provider for tests.

use crate::embeddings::provider::EmbeddingProvider;
use crate::embeddings::providers::trigram::trigram_embedding;
use qamatch_core::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Mock provider for testing.
///
/// Returns scripted vectors for texts registered with [`MockProvider::set`]
/// and falls back to trigram embeddings for everything else. Counts calls so
/// tests can assert the provider was never reached, and can be switched into
/// a failing state to simulate an unavailable embedding service.
#[derive(Debug)]
pub struct MockProvider {
    dimensions: usize,
    scripted: Mutex<HashMap<String, Vec<f32>>>,
    batch_calls: AtomicUsize,
    texts_embedded: AtomicUsize,
    failing: AtomicBool,
}

impl MockProvider {
    /// Create a new mock provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            scripted: Mutex::new(HashMap::new()),
            batch_calls: AtomicUsize::new(0),
            texts_embedded: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    /// Return `vector` whenever exactly `text` is embedded.
    pub fn set(&self, text: &str, vector: Vec<f32>) {
        self.scripted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(text.to_string(), vector);
    }

    /// Make every following call fail with `ProviderUnavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `embed_batch` invocations so far.
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    /// Number of individual texts embedded so far.
    pub fn texts_embedded(&self) -> usize {
        self.texts_embedded.load(Ordering::SeqCst)
    }

    fn embedding_for(&self, text: &str) -> Vec<f32> {
        let scripted = self.scripted.lock().unwrap_or_else(|e| e.into_inner());
        match scripted.get(text) {
            Some(vector) => vector.clone(),
            None => trigram_embedding(text, self.dimensions),
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::ProviderUnavailable(
                "mock provider is switched off".to_string(),
            ));
        }

        self.texts_embedded.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|text| self.embedding_for(text)).collect())
    }
}
