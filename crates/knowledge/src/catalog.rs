//! Question/answer catalog.
//!
//! Questions and answers are parallel arrays: position `i` of the index,
//! `questions[i]` and `answers[i]` all describe the same entry.

use crate::index::Fingerprint;
use crate::types::QaPair;
use qamatch_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Immutable, non-empty question/answer catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    questions: Vec<String>,
    answers: Vec<String>,
}

/// Accepted shapes of a catalog source or persisted catalog file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogSource {
    Pairs(Vec<QaPair>),
    Columns {
        questions: Vec<String>,
        answers: Vec<String>,
    },
}

impl Catalog {
    /// Create a catalog from parallel arrays.
    ///
    /// # Errors
    /// * `EmptyCatalog` - no entries
    /// * `CatalogMismatch` - arrays differ in length
    /// * `Knowledge` - a question is blank
    pub fn new(questions: Vec<String>, answers: Vec<String>) -> AppResult<Self> {
        if questions.len() != answers.len() {
            return Err(AppError::CatalogMismatch(format!(
                "{} questions but {} answers",
                questions.len(),
                answers.len()
            )));
        }

        if questions.is_empty() {
            return Err(AppError::EmptyCatalog);
        }

        if let Some(position) = questions.iter().position(|q| q.trim().is_empty()) {
            return Err(AppError::Knowledge(format!(
                "Question at position {} is blank",
                position
            )));
        }

        Ok(Self { questions, answers })
    }

    /// Create a catalog from ordered pairs.
    pub fn from_pairs(pairs: Vec<QaPair>) -> AppResult<Self> {
        let (questions, answers) = pairs.into_iter().map(|p| (p.question, p.answer)).unzip();
        Self::new(questions, answers)
    }

    /// Parse a catalog from JSON or YAML text.
    ///
    /// Accepts either a list of `{question, answer}` objects or an object
    /// with parallel `questions` and `answers` lists.
    pub fn parse(contents: &str, format: SourceFormat) -> AppResult<Self> {
        let source: CatalogSource = match format {
            SourceFormat::Json => serde_json::from_str(contents)?,
            SourceFormat::Yaml => serde_yaml::from_str(contents)?,
        };

        match source {
            CatalogSource::Pairs(pairs) => Self::from_pairs(pairs),
            CatalogSource::Columns { questions, answers } => Self::new(questions, answers),
        }
    }

    /// Read a catalog source file; the format follows the file extension.
    pub fn load_source(path: &Path) -> AppResult<Self> {
        let format = SourceFormat::from_path(path)?;
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Knowledge(format!("Failed to read catalog source {:?}: {}", path, e))
        })?;

        let catalog = Self::parse(&contents, format)?;
        tracing::debug!("Read {} entries from {:?}", catalog.len(), path);
        Ok(catalog)
    }

    /// Persist as JSON with parallel `questions`/`answers` arrays.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Knowledge(format!("Failed to create catalog directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| {
            AppError::Knowledge(format!("Failed to write catalog {:?}: {}", path, e))
        })?;
        Ok(())
    }

    /// Load a catalog persisted by [`Catalog::save`].
    pub fn load(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Knowledge(format!("Failed to read catalog {:?}: {}", path, e))
        })?;
        Self::parse(&contents, SourceFormat::Json)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    pub fn question(&self, position: usize) -> Option<&str> {
        self.questions.get(position).map(String::as_str)
    }

    pub fn answer(&self, position: usize) -> Option<&str> {
        self.answers.get(position).map(String::as_str)
    }

    /// SHA-256 over the entries in order.
    ///
    /// Each string is length-prefixed so that moving text between a
    /// question and its answer changes the fingerprint.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = Sha256::new();
        hasher.update((self.len() as u64).to_le_bytes());
        for (question, answer) in self.questions.iter().zip(&self.answers) {
            for text in [question, answer] {
                hasher.update((text.len() as u64).to_le_bytes());
                hasher.update(text.as_bytes());
            }
        }
        hasher.finalize().into()
    }
}

/// Catalog source file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Yaml,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(SourceFormat::Json),
            Some("yaml") | Some("yml") => Ok(SourceFormat::Yaml),
            _ => Err(AppError::Knowledge(format!(
                "Unsupported catalog source {:?}: expected a .json, .yaml or .yml file",
                path
            ))),
        }
    }
}
