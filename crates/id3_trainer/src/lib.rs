//! ID3 Trainer - Deterministic offline decision tree trainer
//!
//! Grows ID3 decision trees over column-typed datasets loaded from CSV and
//! produces models whose canonical JSON and hash are reproducible run to run.

pub mod builder;
pub mod config;
pub mod csv_loader;
pub mod errors;
pub mod sweep;
pub mod trainer;

use id3_core::TrainedModel;
use std::path::Path;

pub use builder::TreeBuilder;
pub use config::{LoggingConfig, SweepConfig, TrainerConfig};
pub use csv_loader::{load_csv, CsvLoader, CsvSchema};
pub use errors::{CsvError, TrainerError};
pub use sweep::{sweep_bin_counts, SweepAttempt, SweepReport};
pub use trainer::{fit, Id3Trainer, TrainingParams};

/// Train a model directly from a labelled CSV file using the provided parameters.
pub fn train_model_from_csv(
    path: &Path,
    params: TrainingParams,
) -> Result<TrainedModel, TrainerError> {
    let dataset = load_csv(path)?;
    let trainer = Id3Trainer::new(params);
    Ok(trainer.train(&dataset)?)
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
