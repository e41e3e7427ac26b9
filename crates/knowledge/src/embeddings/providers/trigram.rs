//! Trigram embedding provider using character trigram-based content-aware embeddings.

use crate::embeddings::provider::EmbeddingProvider;
use qamatch_core::AppResult;
use std::collections::BTreeMap;

const STOP_WORDS: [&str; 33] = [
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "do",
];

/// Trigram-based embedding provider for local, offline operation.
///
/// Generates deterministic embeddings based on text content using
/// character trigrams and word frequencies. While not semantically
/// accurate like neural embedding models, it produces consistent,
/// content-dependent vectors suitable for development and offline use.
/// Punctuation is a word boundary, so "what's your name" and
/// "What is your name?" embed identically.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    /// Create a new trigram provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

/// Compute the unit-length trigram embedding of `text`.
///
/// Text without any content word maps to the zero vector.
pub fn trigram_embedding(text: &str, dimensions: usize) -> Vec<f32> {
    let mut embedding = vec![0.0; dimensions];
    if dimensions == 0 {
        return embedding;
    }

    let lower = text.to_lowercase();

    // BTreeMap keeps the accumulation order, and therefore the float sums, stable
    let mut word_freq: BTreeMap<&str, u32> = BTreeMap::new();
    for word in lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
    {
        *word_freq.entry(word).or_insert(0) += 1;
    }

    for (word, freq) in &word_freq {
        let chars: Vec<char> = word.chars().collect();
        for window in chars.windows(3) {
            let trigram: String = window.iter().collect();
            let trigram_hash = trigram
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(37).wrapping_add(b as u64));

            let dim_idx = (trigram_hash % dimensions as u64) as usize;
            embedding[dim_idx] += (*freq as f32).sqrt();
        }

        // Also encode whole word
        let word_hash = word
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let base_dim = (word_hash % dimensions as u64) as usize;
        embedding[base_dim] += *freq as f32;
    }

    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut embedding {
            *v /= norm;
        }
    }

    embedding
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| trigram_embedding(text, self.dimensions))
            .collect())
    }
}
