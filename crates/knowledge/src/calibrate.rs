//! Threshold calibration.
//!
//! Replays every catalog question through the loaded matcher and reports
//! how far the acceptance threshold sits from the distances the catalog
//! actually produces.

use crate::matcher::MatcherContext;
use crate::vector_index::Metric;
use qamatch_core::AppResult;
use serde::Serialize;

/// Distances observed when each catalog question is asked verbatim.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationReport {
    pub entries: usize,
    pub metric: Metric,
    pub threshold: f32,

    /// Largest distance between a question and its own stored vector.
    pub max_self_distance: f32,

    /// Smallest distance between two different questions, if there are two.
    pub min_cross_distance: Option<f32>,

    /// Positions whose own question does not come back with its own answer.
    pub failing_positions: Vec<usize>,

    /// Midpoint between `max_self_distance` and `min_cross_distance`.
    pub suggested_threshold: Option<f32>,
}

impl CalibrationReport {
    pub fn is_consistent(&self) -> bool {
        self.failing_positions.is_empty()
    }
}

/// Ask every catalog question and collect distance statistics.
pub async fn calibrate(ctx: &MatcherContext) -> AppResult<CalibrationReport> {
    let catalog = ctx.catalog();
    let index = ctx.index();
    let threshold = ctx.config().threshold;

    tracing::info!("Calibrating against {} catalog entries", catalog.len());

    let vectors = ctx.engine().embed_texts(catalog.questions()).await?;

    let mut max_self_distance = 0.0f32;
    let mut min_cross_distance: Option<f32> = None;
    let mut failing_positions = Vec::new();

    for (position, vector) in vectors.iter().enumerate() {
        let neighbors = index.search(vector, index.size())?;

        if let Some(own) = neighbors.iter().find(|n| n.position == position) {
            max_self_distance = max_self_distance.max(own.distance);
        }

        if let Some(other) = neighbors.iter().find(|n| n.position != position) {
            min_cross_distance = Some(match min_cross_distance {
                Some(current) => current.min(other.distance),
                None => other.distance,
            });
        }

        // Duplicate questions with the same answer still count as consistent
        let returns_own_answer = neighbors.first().is_some_and(|top| {
            top.distance <= threshold && catalog.answer(top.position) == catalog.answer(position)
        });
        if !returns_own_answer {
            tracing::debug!(position, "Question does not return its own answer");
            failing_positions.push(position);
        }
    }

    let suggested_threshold = min_cross_distance
        .filter(|cross| *cross > max_self_distance)
        .map(|cross| (max_self_distance + cross) / 2.0);

    Ok(CalibrationReport {
        entries: catalog.len(),
        metric: index.metric(),
        threshold,
        max_self_distance,
        min_cross_distance,
        failing_positions,
        suggested_threshold,
    })
}
