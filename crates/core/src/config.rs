//! Configuration management for qamatch.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Defaults
//! - Config file (.qamatch/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric, with built catalogs stored in `.qamatch/`.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Embedding providers the knowledge crate knows how to construct.
pub const KNOWN_PROVIDERS: [&str; 3] = ["trigram", "mock", "ollama"];

/// Distance metrics a catalog index can be built with.
pub const KNOWN_METRICS: [&str; 2] = ["l2_squared", "cosine"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .qamatch/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Name of the catalog to build or serve
    pub catalog: String,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON lines
    pub log_json: bool,

    pub embedding: EmbeddingSettings,

    pub matcher: MatcherSettings,

    pub server: ServerSettings,
}

/// Embedding provider settings used when a catalog is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Provider name: "trigram", "mock", "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Provider endpoint (Ollama base URL)
    pub endpoint: Option<String>,

    /// Maximum number of texts sent to the provider per request
    #[serde(rename = "batchSize")]
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
            batch_size: 64,
        }
    }
}

/// Acceptance threshold and reply settings.
///
/// `threshold` is a distance in the embedding space of the provider that
/// built the catalog, measured with `metric`. For `l2_squared` the unit is
/// squared Euclidean distance. It is calibrated per model and must be
/// re-derived (see `qamatch calibrate`) when the provider or model changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatcherSettings {
    pub threshold: f32,

    /// "l2_squared" or "cosine"
    pub metric: String,

    /// Reply for empty or whitespace-only input
    #[serde(rename = "promptReply")]
    pub prompt_reply: String,

    /// Reply when no catalog question is within the threshold
    #[serde(rename = "unknownReply")]
    pub unknown_reply: String,
}

impl Default for MatcherSettings {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            metric: "l2_squared".to_string(),
            prompt_reply: "Veuillez poser une question.".to_string(),
            unknown_reply: "Désolé, je ne connais pas la réponse.".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,

    pub port: u16,

    /// Allow any origin (the chat front-end is served from another port)
    pub cors: bool,

    /// Per-request timeout in seconds
    #[serde(rename = "timeoutSecs")]
    pub timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            cors: true,
            timeout_secs: 30,
        }
    }
}

impl ServerSettings {
    /// Parse host and port into a socket address.
    pub fn socket_addr(&self) -> AppResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                AppError::Config(format!(
                    "Invalid server address {}:{}: {}",
                    self.host, self.port, e
                ))
            })
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceConfig>,
    catalog: Option<String>,
    embedding: Option<EmbeddingSettings>,
    matcher: Option<MatcherSettings>,
    server: Option<ServerSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

/// Command-line overrides applied on top of file and environment settings.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub catalog: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub threshold: Option<f32>,
    pub log_level: Option<String>,
    pub verbose: bool,
    pub no_color: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            catalog: "default".to_string(),
            log_level: None,
            verbose: false,
            no_color: false,
            log_json: false,
            embedding: EmbeddingSettings::default(),
            matcher: MatcherSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `QAMATCH_WORKSPACE`: Override workspace path
    /// - `QAMATCH_CONFIG`: Path to config file
    /// - `QAMATCH_CATALOG`: Catalog name
    /// - `QAMATCH_PROVIDER`: Embedding provider
    /// - `QAMATCH_MODEL`: Embedding model identifier
    /// - `QAMATCH_THRESHOLD`: Acceptance threshold
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use qamatch_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Load configuration, with an explicit workspace and config file taking
    /// precedence over the environment.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace.or_else(|| env_path("QAMATCH_WORKSPACE")) {
            config.workspace = workspace;
        }

        config.config_file = config_file.or_else(|| env_path("QAMATCH_CONFIG"));

        // Validate workspace exists
        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        // Load from YAML config file if it exists
        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.qamatch_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        if let Ok(catalog) = std::env::var("QAMATCH_CATALOG") {
            config.catalog = catalog;
        }

        if let Ok(provider) = std::env::var("QAMATCH_PROVIDER") {
            config.embedding.provider = provider;
        }

        if let Ok(model) = std::env::var("QAMATCH_MODEL") {
            config.embedding.model = model;
        }

        if let Ok(threshold) = std::env::var("QAMATCH_THRESHOLD") {
            config.matcher.threshold = threshold.parse().map_err(|e| {
                AppError::Config(format!("Invalid QAMATCH_THRESHOLD '{}': {}", threshold, e))
            })?;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        // An empty file deserializes to unit, not to an empty mapping
        let config_file: ConfigFile = if contents.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(&contents).map_err(|e| {
                AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
            })?
        };

        let mut result = self.clone();

        if let Some(ws) = config_file.workspace {
            if let Some(path) = ws.path {
                result.workspace = PathBuf::from(path);
            }
        }

        if let Some(catalog) = config_file.catalog {
            result.catalog = catalog;
        }

        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }

        if let Some(matcher) = config_file.matcher {
            result.matcher = matcher;
        }

        if let Some(server) = config_file.server {
            result.server = server;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.log_json = json;
            }
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(catalog) = overrides.catalog {
            self.catalog = catalog;
        }

        if let Some(provider) = overrides.provider {
            self.embedding.provider = provider;
        }

        if let Some(model) = overrides.model {
            self.embedding.model = model;
        }

        if let Some(threshold) = overrides.threshold {
            self.matcher.threshold = threshold;
        }

        if let Some(log_level) = overrides.log_level {
            self.log_level = Some(log_level);
        }

        if overrides.verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if overrides.no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .qamatch directory.
    pub fn qamatch_dir(&self) -> PathBuf {
        self.workspace.join(".qamatch")
    }

    /// Ensure the .qamatch directory exists.
    pub fn ensure_qamatch_dir(&self) -> AppResult<()> {
        let dir = self.qamatch_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .qamatch directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.embedding.provider.as_str();
        if !KNOWN_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(AppError::Config(
                "Embedding batch size must be greater than zero".to_string(),
            ));
        }

        let metric = self.matcher.metric.as_str();
        if !KNOWN_METRICS.contains(&metric) {
            return Err(AppError::Config(format!(
                "Unknown distance metric: {}. Supported: {}",
                metric,
                KNOWN_METRICS.join(", ")
            )));
        }

        let threshold = self.matcher.threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(AppError::Config(format!(
                "Threshold must be a finite, non-negative distance, got {}",
                threshold
            )));
        }

        if self.catalog.trim().is_empty() || self.catalog.contains(['/', '\\']) {
            return Err(AppError::Config(format!(
                "Invalid catalog name: '{}'",
                self.catalog
            )));
        }

        Ok(())
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key).ok().map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.catalog, "default");
        assert_eq!(config.embedding.provider, "trigram");
        assert_eq!(config.embedding.dimensions, 384);
        assert_eq!(config.matcher.threshold, 0.5);
        assert_eq!(config.matcher.metric, "l2_squared");
        assert_ne!(config.matcher.prompt_reply, config.matcher.unknown_reply);
        assert!(!config.verbose);
        assert!(!config.no_color);
    }

    #[test]
    fn test_qamatch_dir() {
        let config = AppConfig::default();
        assert!(config.qamatch_dir().ends_with(".qamatch"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(ConfigOverrides {
            catalog: Some("faq".to_string()),
            provider: Some("ollama".to_string()),
            model: Some("all-minilm".to_string()),
            threshold: Some(0.8),
            verbose: true,
            ..Default::default()
        });

        assert_eq!(overridden.catalog, "faq");
        assert_eq!(overridden.embedding.provider, "ollama");
        assert_eq!(overridden.embedding.model, "all-minilm");
        assert_eq!(overridden.matcher.threshold, 0.8);
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml_sections() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
catalog: support
embedding:
  provider: ollama
  model: all-minilm
  dimensions: 384
matcher:
  threshold: 0.35
server:
  port: 8080
logging:
  level: warn
  color: false
"#,
        )
        .unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.catalog, "support");
        assert_eq!(merged.embedding.provider, "ollama");
        assert_eq!(merged.embedding.batch_size, 64);
        assert_eq!(merged.matcher.threshold, 0.35);
        assert_eq!(merged.matcher.metric, "l2_squared");
        assert_eq!(merged.server.port, 8080);
        assert_eq!(merged.server.host, "127.0.0.1");
        assert_eq!(merged.log_level, Some("warn".to_string()));
        assert!(merged.no_color);
    }

    #[test]
    fn test_merge_empty_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "").unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.matcher, MatcherSettings::default());
    }

    #[test]
    fn test_validate_default() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.embedding.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_threshold() {
        let mut config = AppConfig::default();
        config.matcher.threshold = -0.1;
        assert!(config.validate().is_err());

        config.matcher.threshold = f32::NAN;
        assert!(config.validate().is_err());

        config.matcher.threshold = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_unknown_metric() {
        let mut config = AppConfig::default();
        config.matcher.metric = "manhattan".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Unknown distance metric"));
    }

    #[test]
    fn test_socket_addr() {
        let settings = ServerSettings::default();
        let addr = settings.socket_addr().unwrap();
        assert_eq!(addr.port(), 5000);

        let bad = ServerSettings {
            host: "not a host".to_string(),
            ..Default::default()
        };
        assert!(bad.socket_addr().is_err());
    }
}
