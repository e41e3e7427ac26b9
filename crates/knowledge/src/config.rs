//! Catalog configuration and on-disk layout.
//!
//! Each catalog lives in `.qamatch/catalogs/<name>/` and holds three files
//! that are always written and read together:
//! - `config.yaml`: build manifest ([`CatalogConfig`])
//! - `catalog.json`: parallel `questions`/`answers` arrays
//! - `index.bin`: the vector index

use crate::types::CatalogConfig;
use qamatch_core::{AppError, AppResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Load a catalog's build manifest.
pub fn load_config(workspace: &Path, catalog_name: &str) -> AppResult<CatalogConfig> {
    let config_path = get_config_path(workspace, catalog_name);

    if !config_path.exists() {
        return Err(AppError::Knowledge(format!(
            "Catalog '{}' has not been built. Run 'qamatch build' first.",
            catalog_name
        )));
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        AppError::Knowledge(format!("Failed to read config at {:?}: {}", config_path, e))
    })?;

    let mut config: CatalogConfig = serde_yaml::from_str(&content).map_err(|e| {
        AppError::Knowledge(format!("Failed to parse config at {:?}: {}", config_path, e))
    })?;

    // Ensure name matches the directory
    config.name = catalog_name.to_string();

    tracing::debug!("Loaded catalog config for '{}'", catalog_name);
    Ok(config)
}

/// Save a catalog's build manifest.
pub fn save_config(workspace: &Path, config: &CatalogConfig) -> AppResult<()> {
    let config_path = get_config_path(workspace, &config.name);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Knowledge(format!("Failed to create config directory: {}", e))
        })?;
    }

    let yaml = serde_yaml::to_string(config)
        .map_err(|e| AppError::Knowledge(format!("Failed to serialize config: {}", e)))?;

    fs::write(&config_path, yaml).map_err(|e| {
        AppError::Knowledge(format!("Failed to write config to {:?}: {}", config_path, e))
    })?;

    tracing::debug!("Saved catalog config for '{}'", config.name);
    Ok(())
}

/// Get the directory holding a catalog's files.
pub fn get_catalog_dir(workspace: &Path, catalog_name: &str) -> PathBuf {
    workspace
        .join(".qamatch")
        .join("catalogs")
        .join(catalog_name)
}

/// Get the path to a catalog's build manifest.
pub fn get_config_path(workspace: &Path, catalog_name: &str) -> PathBuf {
    get_catalog_dir(workspace, catalog_name).join("config.yaml")
}

/// Get the path to a catalog's question/answer arrays.
pub fn get_catalog_path(workspace: &Path, catalog_name: &str) -> PathBuf {
    get_catalog_dir(workspace, catalog_name).join("catalog.json")
}

/// Get the path to a catalog's vector index.
pub fn get_index_path(workspace: &Path, catalog_name: &str) -> PathBuf {
    get_catalog_dir(workspace, catalog_name).join("index.bin")
}
