//! Bin-count sweep
//!
//! Trains one tree per candidate bin count and keeps the model with the best
//! training accuracy. The first model to reach the best score is kept; a
//! perfect score ends the sweep.

use id3_core::{Dataset, Id3Error, TrainedModel};
use serde::Serialize;
use std::ops::RangeInclusive;
use tracing::{debug, info};

use crate::trainer::{fit, TrainingParams};

/// Score of one sweep candidate
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SweepAttempt {
    pub bin_count: usize,
    pub accuracy: f64,
}

/// Outcome of a sweep
#[derive(Clone, Debug, Serialize)]
pub struct SweepReport {
    pub best_bin_count: usize,
    pub best_accuracy: f64,
    #[serde(skip)]
    pub model: TrainedModel,
    pub attempts: Vec<SweepAttempt>,
}

/// Train with every bin count in `bin_counts` and keep the most accurate model.
pub fn sweep_bin_counts(
    dataset: &Dataset,
    base: &TrainingParams,
    bin_counts: RangeInclusive<usize>,
) -> Result<SweepReport, Id3Error> {
    if bin_counts.is_empty() || *bin_counts.start() == 0 {
        return Err(Id3Error::Configuration(format!(
            "invalid bin count range {}..={}",
            bin_counts.start(),
            bin_counts.end()
        )));
    }

    info!(
        min = bin_counts.start(),
        max = bin_counts.end(),
        "sweeping bin counts"
    );

    let mut attempts = Vec::new();
    let mut best: Option<(usize, f64, TrainedModel)> = None;
    for bin_count in bin_counts {
        let params = base.clone().with_bin_count(Some(bin_count));
        let model = fit(dataset, &params)?;
        let accuracy = model.accuracy(dataset)?;
        debug!(bin_count, accuracy, "sweep attempt");
        attempts.push(SweepAttempt {
            bin_count,
            accuracy,
        });

        if best.as_ref().map_or(true, |(_, score, _)| accuracy > *score) {
            best = Some((bin_count, accuracy, model));
        }
        if accuracy >= 1.0 {
            break;
        }
    }

    let (best_bin_count, best_accuracy, model) =
        best.ok_or_else(|| Id3Error::Configuration("sweep trained no model".to_string()))?;
    info!(best_bin_count, best_accuracy, "sweep complete");

    Ok(SweepReport {
        best_bin_count,
        best_accuracy,
        model,
        attempts,
    })
}
