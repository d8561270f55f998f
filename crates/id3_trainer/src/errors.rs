use id3_core::Id3Error;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by the trainer.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("dataset error: {0}")]
    Dataset(#[from] CsvError),

    #[error("training error: {0}")]
    Training(#[from] Id3Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading a CSV table.
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV record: {0}")]
    Parse(#[from] csv::Error),

    #[error("row {row} has {got} columns, expected {expected}")]
    InconsistentRowLength {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("row {row}, column `{column}`: `{raw}` is not a finite number")]
    InvalidNumber {
        row: usize,
        column: String,
        raw: String,
    },

    #[error("CSV contains no data rows")]
    Empty,

    #[error("invalid column schema: {0}")]
    Schema(String),

    #[error(transparent)]
    Table(#[from] Id3Error),
}
