//! Ollama Embedding Provider
//!
//! Provides sentence embeddings via Ollama's local API. The `all-minilm`
//! model is the 384-dimension MiniLM sentence encoder the default
//! acceptance threshold was tuned against.
//!
//! # Features
//! - Local-first (no API costs, privacy-preserving)
//! - Batched requests through `/api/embed`
//! - Automatic retry with exponential backoff
//!
//! # Example
//! ```no_run
//! use qamatch_knowledge::embeddings::{EmbeddingConfig, EmbeddingProvider};
//! use qamatch_knowledge::embeddings::providers::ollama::OllamaProvider;
//!
//! # async fn run() -> qamatch_core::AppResult<()> {
//! let config = EmbeddingConfig {
//!     provider: "ollama".to_string(),
//!     model: "all-minilm".to_string(),
//!     dimensions: 384,
//!     ..Default::default()
//! };
//!
//! let provider = OllamaProvider::new(config).await?;
//! let embedding = provider.embed("Hello world").await?;
//! assert_eq!(embedding.len(), 384);
//! # Ok(())
//! # }
//! ```

use crate::embeddings::EmbeddingConfig;
use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use qamatch_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

/// Ollama API endpoint for embeddings
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBED_ENDPOINT: &str = "/api/embed";

/// Maximum attempts for a failed request
const MAX_RETRIES: u32 = 3;

/// Initial backoff duration in milliseconds
const INITIAL_BACKOFF_MS: u64 = 100;

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Ollama embedding provider using local API
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    /// Ollama API base URL
    base_url: String,
    /// Model name (e.g., "all-minilm")
    model: String,
    /// Expected embedding dimensions
    dimensions: usize,
}

/// Request payload for Ollama embed API
#[derive(Debug, Clone, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// Response from Ollama embed API
#[derive(Debug, Clone, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Error response from Ollama API
#[derive(Debug, Clone, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaProvider {
    /// Create new Ollama provider with configuration.
    ///
    /// The base URL comes from `config.endpoint`, then `OLLAMA_URL`, then
    /// `http://localhost:11434`.
    ///
    /// # Errors
    /// * `AppError::ProviderUnavailable` - If Ollama is not reachable or the model is missing
    /// * `AppError::DimensionMismatch` - If the model's vectors have the wrong length
    pub async fn new(config: EmbeddingConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AppError::ProviderUnavailable(format!(
                    "Failed to create HTTP client for Ollama: {}",
                    e
                ))
            })?;

        let base_url = config
            .endpoint
            .clone()
            .or_else(|| std::env::var("OLLAMA_URL").ok())
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

        let provider = Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.model,
            dimensions: config.dimensions,
        };

        // Verify Ollama is running and model is available
        provider.verify_connection().await?;

        Ok(provider)
    }

    /// Verify Ollama connection and model availability
    #[instrument(skip(self), fields(model = %self.model))]
    async fn verify_connection(&self) -> AppResult<()> {
        debug!("Verifying Ollama connection at {}", self.base_url);

        let sample = ["test connection".to_string()];
        match self.embed_with_retries(&sample, MAX_RETRIES).await {
            Ok(_) => {
                debug!("Ollama connection verified, model '{}' ready", self.model);
                Ok(())
            }
            Err(e @ AppError::DimensionMismatch { .. }) => Err(e),
            Err(e) => {
                error!("Failed to connect to Ollama: {}", e);
                Err(AppError::ProviderUnavailable(format!(
                    "Ollama not available at {}. Ensure Ollama is running and model '{}' is installed. Run: ollama pull {}",
                    self.base_url, self.model, self.model
                )))
            }
        }
    }

    /// Embed texts with retry logic
    #[instrument(skip(self, texts), fields(batch_size = texts.len(), model = %self.model))]
    async fn embed_with_retries(&self, texts: &[String], retries: u32) -> AppResult<Vec<Vec<f32>>> {
        let mut attempt = 0;
        let mut last_error = None;

        while attempt < retries {
            match self.embed_once(texts).await {
                Ok(embeddings) => return Ok(embeddings),
                // A wrong vector length will not fix itself
                Err(e @ AppError::DimensionMismatch { .. }) => return Err(e),
                Err(e) => {
                    attempt += 1;
                    last_error = Some(e);

                    if attempt < retries {
                        let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt);
                        warn!(
                            "Embedding failed (attempt {}/{}), retrying in {}ms",
                            attempt, retries, backoff_ms
                        );
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AppError::ProviderUnavailable("Unknown embedding error".to_string())))
    }

    /// Embed texts (no retries)
    async fn embed_once(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let url = format!("{}{}", self.base_url, EMBED_ENDPOINT);

        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        debug!("Sending embedding request to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::ProviderUnavailable(format!("Failed to send request to Ollama: {}", e))
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            let message = match serde_json::from_str::<ErrorResponse>(&error_text) {
                Ok(error_response) => error_response.error,
                Err(_) => error_text,
            };

            return Err(AppError::ProviderUnavailable(format!(
                "Ollama API error ({}): {}",
                status, message
            )));
        }

        let body: EmbedResponse = response.json().await.map_err(|e| {
            AppError::ProviderUnavailable(format!("Failed to parse Ollama response: {}", e))
        })?;

        if body.embeddings.len() != texts.len() {
            return Err(AppError::ProviderUnavailable(format!(
                "Ollama returned {} embeddings for {} inputs",
                body.embeddings.len(),
                texts.len()
            )));
        }

        if let Some(bad) = body.embeddings.iter().find(|e| e.len() != self.dimensions) {
            return Err(AppError::DimensionMismatch {
                expected: self.dimensions,
                actual: bad.len(),
            });
        }

        Ok(body.embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    #[instrument(skip(self, texts), fields(batch_size = texts.len(), provider = "ollama", model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        self.embed_with_retries(texts, MAX_RETRIES).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
