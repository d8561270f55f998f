//! Error types for the ID3 core

use thiserror::Error;

use crate::dataset::ColumnKind;

/// Errors raised while building datasets, training or predicting.
#[derive(Error, Debug)]
pub enum Id3Error {
    /// Missing or invalid discretization settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A prediction value matched none of the edges of the node it reached
    #[error("Row {row}: value {value} of feature `{feature}` matches no bin")]
    OutOfRange {
        row: usize,
        feature: String,
        value: String,
    },

    /// Training was invoked on a dataset without rows
    #[error("Training dataset has zero rows")]
    EmptyDataset,

    /// Malformed table (length mismatch, duplicate names, bad values)
    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    /// Referenced feature column does not exist
    #[error("Unknown feature `{0}`")]
    UnknownFeature(String),

    /// Prediction input column has a different kind than at training time
    #[error("Feature `{feature}` is {found}, model expects {expected}")]
    FeatureKindMismatch {
        feature: String,
        expected: ColumnKind,
        found: ColumnKind,
    },

    /// Operation needs a label column but the dataset has none
    #[error("Dataset has no label column")]
    MissingLabels,

    /// Structurally inconsistent model
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for ID3 core operations
pub type Result<T> = std::result::Result<T, Id3Error>;
