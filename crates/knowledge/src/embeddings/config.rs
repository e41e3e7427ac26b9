//! Embedding configuration types.

use qamatch_core::{AppError, AppResult, EmbeddingSettings};
use serde::{Deserialize, Serialize};

/// Embedding configuration for a catalog.
///
/// Persisted with the catalog at build time; queries must be embedded with
/// the exact same provider, model and dimensions as the stored questions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "trigram", "mock", "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Provider endpoint, if the provider talks to a server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Maximum batch size for embedding requests
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    64
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
            batch_size: default_batch_size(),
        }
    }
}

impl From<&EmbeddingSettings> for EmbeddingConfig {
    fn from(settings: &EmbeddingSettings) -> Self {
        Self {
            provider: settings.provider.clone(),
            model: settings.model.clone(),
            dimensions: settings.dimensions,
            endpoint: settings.endpoint.clone(),
            batch_size: settings.batch_size.max(1),
        }
    }
}

impl EmbeddingConfig {
    /// Validate that another config produces vectors comparable with this one.
    pub fn validate_consistency(&self, other: &Self) -> AppResult<()> {
        if self.provider != other.provider {
            return Err(AppError::CatalogMismatch(format!(
                "Provider mismatch: expected '{}', got '{}'",
                self.provider, other.provider
            )));
        }

        if self.model != other.model {
            return Err(AppError::CatalogMismatch(format!(
                "Model mismatch: expected '{}', got '{}'",
                self.model, other.model
            )));
        }

        if self.dimensions != other.dimensions {
            return Err(AppError::DimensionMismatch {
                expected: self.dimensions,
                actual: other.dimensions,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, "trigram");
        assert_eq!(config.model, "trigram-v1");
        assert_eq!(config.dimensions, 384);
        assert_eq!(config.batch_size, 64);
    }

    #[test]
    fn test_from_settings() {
        let settings = EmbeddingSettings {
            provider: "ollama".to_string(),
            model: "all-minilm".to_string(),
            dimensions: 384,
            endpoint: Some("http://localhost:11434".to_string()),
            batch_size: 0,
        };

        let config = EmbeddingConfig::from(&settings);
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:11434"));
        assert_eq!(config.batch_size, 1);
    }

    #[test]
    fn test_yaml_roundtrip_skips_missing_endpoint() {
        let config = EmbeddingConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("endpoint"));

        let parsed: EmbeddingConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validate_consistency_success() {
        let config1 = EmbeddingConfig::default();
        let config2 = config1.clone();
        assert!(config1.validate_consistency(&config2).is_ok());
    }

    #[test]
    fn test_validate_consistency_model_mismatch() {
        let config1 = EmbeddingConfig::default();
        let config2 = EmbeddingConfig {
            model: "trigram-v2".to_string(),
            ..config1.clone()
        };

        let result = config1.validate_consistency(&config2);
        assert!(matches!(result, Err(AppError::CatalogMismatch(_))));
        assert!(result.unwrap_err().to_string().contains("Model mismatch"));
    }

    #[test]
    fn test_validate_consistency_dimension_mismatch() {
        let config1 = EmbeddingConfig::default();
        let config2 = EmbeddingConfig {
            dimensions: 768,
            ..config1.clone()
        };

        let result = config1.validate_consistency(&config2);
        assert!(matches!(
            result,
            Err(AppError::DimensionMismatch {
                expected: 384,
                actual: 768
            })
        ));
    }
}
