//! Trained ID3 model and prediction
//!
//! The model owns the tree together with the bins of every feature as
//! computed at training time. Prediction routes each row from the root,
//! taking the first edge whose bin matches the row's value; a value that
//! matches no edge is an error, never a silent default.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::bins::{Bin, BinningStrategy};
use crate::dataset::{Column, ColumnKind, Dataset};
use crate::errors::{Id3Error, Result};
use crate::serde_canon::{hash_canonical_hex, to_canonical_json};
use crate::tree::TreeNode;

/// Persisted model format version
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Name and kind of a training feature column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub name: String,
    pub kind: ColumnKind,
}

/// Settings and size of the training run that produced a model
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub rows: usize,
    pub depth_limit: Option<usize>,
    pub bin_count: Option<usize>,
    pub strategy: BinningStrategy,
    pub exterior_bins: bool,
}

/// Decision tree plus the per-feature bin cache it was built with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    /// Model format version
    pub version: u32,

    /// Feature columns in training order
    pub features: Vec<FeatureSchema>,

    /// Name of the label column
    pub label: String,

    /// Bins per feature, fixed at training time
    pub bins: BTreeMap<String, Vec<Bin>>,

    pub root: TreeNode,

    pub summary: TrainingSummary,
}

impl TrainedModel {
    pub fn new(
        features: Vec<FeatureSchema>,
        label: impl Into<String>,
        bins: BTreeMap<String, Vec<Bin>>,
        root: TreeNode,
        summary: TrainingSummary,
    ) -> Self {
        Self {
            version: MODEL_FORMAT_VERSION,
            features,
            label: label.into(),
            bins,
            root,
            summary,
        }
    }

    /// Check version, schema/bin consistency and that every internal node
    /// carries exactly the cached bins of its feature, in cached order.
    pub fn validate(&self) -> Result<()> {
        if self.version != MODEL_FORMAT_VERSION {
            return Err(Id3Error::InvalidModel(format!(
                "unsupported model version: {}",
                self.version
            )));
        }

        for feature in &self.features {
            if !self.bins.contains_key(&feature.name) {
                return Err(Id3Error::InvalidModel(format!(
                    "feature `{}` has no cached bins",
                    feature.name
                )));
            }
        }

        for node in self.root.nodes() {
            let TreeNode::Internal { feature, edges } = node else {
                continue;
            };
            let bins = self.bins.get(feature).ok_or_else(|| {
                Id3Error::InvalidModel(format!("split on unknown feature `{feature}`"))
            })?;
            if edges.len() != bins.len()
                || edges.iter().zip(bins).any(|(edge, bin)| &edge.bin != bin)
            {
                return Err(Id3Error::InvalidModel(format!(
                    "edges of split on `{feature}` do not match its bins"
                )));
            }
        }

        Ok(())
    }

    /// One label per row of `dataset`, in row order.
    pub fn predict(&self, dataset: &Dataset) -> Result<Vec<String>> {
        let columns = self.resolve_columns(dataset)?;
        (0..dataset.n_rows())
            .map(|row| self.route(&columns, row).map(str::to_owned))
            .collect()
    }

    /// Same output as [`predict`](Self::predict), rows evaluated on the rayon
    /// pool. On failure the error of the lowest failing row is returned.
    pub fn predict_par(&self, dataset: &Dataset) -> Result<Vec<String>> {
        let columns = self.resolve_columns(dataset)?;
        let routed: Vec<Result<String>> = (0..dataset.n_rows())
            .into_par_iter()
            .map(|row| self.route(&columns, row).map(str::to_owned))
            .collect();
        routed.into_iter().collect()
    }

    /// Fraction of rows of a labelled dataset predicted correctly
    pub fn accuracy(&self, dataset: &Dataset) -> Result<f64> {
        let labels = dataset.labels()?;
        if labels.is_empty() {
            return Err(Id3Error::EmptyDataset);
        }
        let predictions = self.predict(dataset)?;
        let correct = predictions
            .iter()
            .zip(labels)
            .filter(|(predicted, actual)| predicted == actual)
            .count();
        Ok(correct as f64 / labels.len() as f64)
    }

    fn resolve_columns<'d>(&self, dataset: &'d Dataset) -> Result<HashMap<&str, &'d Column>> {
        let mut columns = HashMap::with_capacity(self.features.len());
        for schema in &self.features {
            let column = dataset
                .feature(&schema.name)
                .ok_or_else(|| Id3Error::UnknownFeature(schema.name.clone()))?;
            if column.kind().is_text() != schema.kind.is_text() {
                return Err(Id3Error::FeatureKindMismatch {
                    feature: schema.name.clone(),
                    expected: schema.kind,
                    found: column.kind(),
                });
            }
            columns.insert(schema.name.as_str(), column);
        }
        debug!(rows = dataset.n_rows(), features = columns.len(), "resolved prediction columns");
        Ok(columns)
    }

    fn route(&self, columns: &HashMap<&str, &Column>, row: usize) -> Result<&str> {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { label } => return Ok(label.as_str()),
                TreeNode::Internal { feature, edges } => {
                    let value = columns
                        .get(feature.as_str())
                        .and_then(|column| column.value(row))
                        .ok_or_else(|| Id3Error::UnknownFeature(feature.clone()))?;
                    let edge = edges
                        .iter()
                        .find(|edge| edge.bin.matches(value))
                        .ok_or_else(|| Id3Error::OutOfRange {
                            row,
                            feature: feature.clone(),
                            value: value.to_string(),
                        })?;
                    node = &edge.child;
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub fn leaf_count(&self) -> usize {
        self.root.leaf_count()
    }

    /// Serialize model to canonical JSON (sorted keys, no whitespace)
    pub fn to_canonical_json(&self) -> Result<String> {
        Ok(to_canonical_json(self)?)
    }

    /// BLAKE3 hash of the canonical JSON as hex
    pub fn hash_hex(&self) -> Result<String> {
        Ok(hash_canonical_hex(self)?)
    }

    /// Save model to a canonical JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_canonical_json()?)?;
        Ok(())
    }

    /// Load and validate a model from JSON
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let model: TrainedModel = serde_json::from_str(&json)?;
        model.validate()?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bins::Interval;
    use crate::tree::Edge;

    fn interval_bins() -> Vec<Bin> {
        vec![
            Bin::Interval(Interval::closed(0.0, 5.0)),
            Bin::Interval(Interval::left_open(5.0, 10.0)),
        ]
    }

    fn create_test_model() -> TrainedModel {
        let root = TreeNode::internal(
            "x",
            interval_bins()
                .into_iter()
                .zip(["low", "high"])
                .map(|(bin, label)| Edge {
                    bin,
                    child: TreeNode::leaf(label),
                })
                .collect(),
        );
        TrainedModel::new(
            vec![FeatureSchema {
                name: "x".into(),
                kind: ColumnKind::Continuous,
            }],
            "y",
            BTreeMap::from([("x".to_string(), interval_bins())]),
            root,
            TrainingSummary {
                rows: 4,
                bin_count: Some(2),
                ..TrainingSummary::default()
            },
        )
    }

    fn queries(values: &[f64]) -> Dataset {
        Dataset::unlabeled(vec![Column::continuous("x", values.iter().copied())]).unwrap()
    }

    #[test]
    fn test_predict_routes_by_interval() {
        let model = create_test_model();
        let predictions = model.predict(&queries(&[0.0, 5.0, 5.5, 10.0])).unwrap();
        assert_eq!(predictions, vec!["low", "low", "high", "high"]);
    }

    #[test]
    fn test_out_of_range_names_row_and_feature() {
        let model = create_test_model();
        let err = model.predict(&queries(&[1.0, -1.0])).unwrap_err();
        match err {
            Id3Error::OutOfRange { row, feature, .. } => {
                assert_eq!(row, 1);
                assert_eq!(feature, "x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let model = create_test_model();
        let input = queries(&[0.5, 9.0, 4.0, 6.0, 10.0, 0.0]);
        assert_eq!(model.predict(&input).unwrap(), model.predict_par(&input).unwrap());

        let err = model.predict_par(&queries(&[1.0, 11.0, -3.0])).unwrap_err();
        assert!(matches!(err, Id3Error::OutOfRange { row: 1, .. }));
    }

    #[test]
    fn test_schema_checks() {
        let model = create_test_model();
        let missing = Dataset::unlabeled(vec![Column::continuous("z", [1.0])]).unwrap();
        assert!(matches!(model.predict(&missing), Err(Id3Error::UnknownFeature(_))));

        let text = Dataset::unlabeled(vec![Column::nominal("x", ["1.0"])]).unwrap();
        assert!(matches!(
            model.predict(&text),
            Err(Id3Error::FeatureKindMismatch { .. })
        ));
    }

    #[test]
    fn test_accuracy() {
        let model = create_test_model();
        let labelled = Dataset::new(vec![
            Column::continuous("x", [1.0, 7.0, 2.0, 8.0]),
            Column::nominal("y", ["low", "high", "high", "high"]),
        ])
        .unwrap();
        assert!((model.accuracy(&labelled).unwrap() - 0.75).abs() < 1e-12);
        assert!(matches!(
            model.accuracy(&queries(&[1.0])),
            Err(Id3Error::MissingLabels)
        ));
    }

    #[test]
    fn test_validation_detects_dropped_edge() {
        let mut model = create_test_model();
        assert!(model.validate().is_ok());

        if let TreeNode::Internal { edges, .. } = &mut model.root {
            edges.pop();
        }
        assert!(matches!(model.validate(), Err(Id3Error::InvalidModel(_))));

        let mut model = create_test_model();
        model.version = 99;
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_save_load_json_roundtrip() {
        let model = create_test_model();
        let file = tempfile::NamedTempFile::new().unwrap();

        model.save_json(file.path()).unwrap();
        let loaded = TrainedModel::load_json(file.path()).unwrap();

        assert_eq!(model, loaded);
        assert_eq!(model.hash_hex().unwrap(), loaded.hash_hex().unwrap());
    }

    #[test]
    fn test_canonical_json_is_compact() {
        let json = create_test_model().to_canonical_json().unwrap();
        assert!(!json.contains('\n'));
        assert!(json.starts_with(r#"{"bins":"#));
    }
}
