//! Vector index abstraction for catalog questions.
//!
//! Defines a trait for nearest-neighbor lookup over an immutable set of
//! embeddings, and the metric the distances are measured in.

use qamatch_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Distance metric between two embeddings. Smaller is closer.
///
/// Acceptance thresholds are only meaningful for the metric they were
/// calibrated with; changing the metric of a catalog requires re-calibrating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Squared Euclidean distance on the raw vectors
    #[default]
    L2Squared,
    /// `1 - cosine similarity`, in `[0, 2]`
    Cosine,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::L2Squared => "l2_squared",
            Metric::Cosine => "cosine",
        }
    }

    /// Stable on-disk code.
    pub(crate) fn code(&self) -> u8 {
        match self {
            Metric::L2Squared => 0,
            Metric::Cosine => 1,
        }
    }

    pub(crate) fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Metric::L2Squared),
            1 => Some(Metric::Cosine),
            _ => None,
        }
    }

    /// Distance between two vectors of equal length.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len());
        match self {
            Metric::L2Squared => a
                .iter()
                .zip(b)
                .map(|(x, y)| {
                    let d = x - y;
                    d * d
                })
                .sum(),
            Metric::Cosine => {
                let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

                if norm_a == 0.0 || norm_b == 0.0 {
                    return 1.0;
                }

                1.0 - dot / (norm_a * norm_b)
            }
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "l2_squared" | "l2" => Ok(Metric::L2Squared),
            "cosine" => Ok(Metric::Cosine),
            other => Err(AppError::Config(format!(
                "Unknown distance metric: '{}'. Supported: l2_squared, cosine",
                other
            ))),
        }
    }
}

/// One search hit: how far the stored vector is and where it sits in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub distance: f32,
    pub position: usize,
}

/// Trait for nearest-neighbor index backends.
///
/// Implementations are immutable after construction and must be safe to
/// query from many threads at once.
pub trait VectorIndex: Send + Sync + fmt::Debug {
    /// Number of stored vectors.
    fn size(&self) -> usize;

    /// Dimension every stored and query vector must have.
    fn dimensions(&self) -> usize;

    fn metric(&self) -> Metric;

    /// Return up to `k` neighbors of `query`, closest first.
    ///
    /// Ties are broken by lower position. Fewer than `k` results are
    /// returned when the index holds fewer than `k` vectors.
    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<Neighbor>>;

    /// Single nearest neighbor.
    fn nearest(&self, query: &[f32]) -> AppResult<Option<Neighbor>> {
        Ok(self.search(query, 1)?.into_iter().next())
    }
}
