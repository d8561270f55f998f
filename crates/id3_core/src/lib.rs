//! ID3 decision tree core
//!
//! Provides the pieces shared by training and inference:
//!
//! Modules:
//! - `dataset`: Column-typed tabular dataset (categorical, nominal, continuous)
//! - `bins`: Feature discretization into categories and intervals
//! - `info_theory`: Entropy, information gain and majority label
//! - `tree`: Tagged decision tree nodes
//! - `model`: Trained model, prediction and canonical persistence
//! - `serde_canon`: Canonical JSON and BLAKE3 hashing

pub mod bins;
pub mod dataset;
pub mod errors;
pub mod info_theory;
pub mod model;
pub mod serde_canon;
pub mod tree;

pub use bins::{
    partition_rows, range_cut, subset_by_value, values_of, Bin, BinningStrategy, Bound,
    Discretization, Interval,
};
pub use dataset::{Column, ColumnData, ColumnKind, Dataset, Value};
pub use errors::{Id3Error, Result};
pub use info_theory::{entropy, gain_over_rows, info_gain, label_entropy, majority_label};
pub use model::{FeatureSchema, TrainedModel, TrainingSummary, MODEL_FORMAT_VERSION};
pub use tree::{Edge, TreeNode};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
