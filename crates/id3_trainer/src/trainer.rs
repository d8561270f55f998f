//! ID3 trainer
//!
//! Validates the training parameters against the dataset, computes and
//! caches the bins of every feature once, then grows the tree with
//! [`TreeBuilder`].

use id3_core::{
    values_of, Bin, BinningStrategy, ColumnKind, Dataset, Discretization, FeatureSchema,
    Id3Error, TrainedModel, TrainingSummary,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::builder::TreeBuilder;

/// ID3 training configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingParams {
    /// Maximum tree depth; `None` grows until the base cases stop it
    pub depth_limit: Option<usize>,
    /// Interval count for continuous features
    pub bin_count: Option<usize>,
    /// Quantile bins instead of equal-width bins
    pub equal_frequency_binning: bool,
    /// Append unbounded bins below the minimum and above the maximum
    pub exterior_bins: bool,
    /// Known legal `(min, max)` per continuous feature
    pub feature_ranges: BTreeMap<String, (f64, f64)>,
}

impl TrainingParams {
    #[must_use]
    pub fn with_depth_limit(mut self, depth_limit: Option<usize>) -> Self {
        self.depth_limit = depth_limit;
        self
    }

    #[must_use]
    pub fn with_bin_count(mut self, bin_count: Option<usize>) -> Self {
        self.bin_count = bin_count;
        self
    }

    #[must_use]
    pub fn with_equal_frequency_binning(mut self, enabled: bool) -> Self {
        self.equal_frequency_binning = enabled;
        self
    }

    #[must_use]
    pub fn with_exterior_bins(mut self, enabled: bool) -> Self {
        self.exterior_bins = enabled;
        self
    }

    #[must_use]
    pub fn with_feature_range(mut self, feature: impl Into<String>, min: f64, max: f64) -> Self {
        self.feature_ranges.insert(feature.into(), (min, max));
        self
    }

    pub fn strategy(&self) -> BinningStrategy {
        if self.equal_frequency_binning {
            BinningStrategy::EqualFrequency
        } else {
            BinningStrategy::EqualWidth
        }
    }

    /// Discretization settings for one feature
    pub fn discretization_for(&self, feature: &str) -> Discretization {
        Discretization::new(self.bin_count)
            .with_strategy(self.strategy())
            .with_exterior(self.exterior_bins)
            .with_range(self.feature_ranges.get(feature).copied())
    }

    /// Check the parameters against the columns of `dataset`
    pub fn validate(&self, dataset: &Dataset) -> Result<(), Id3Error> {
        if self.bin_count == Some(0) {
            return Err(Id3Error::Configuration(
                "bin count must be at least 1".to_string(),
            ));
        }

        let continuous: Vec<&str> = dataset
            .features()
            .iter()
            .filter(|c| c.kind() == ColumnKind::Continuous)
            .map(|c| c.name())
            .collect();
        if self.bin_count.is_none() {
            if let Some(name) = continuous.first() {
                return Err(Id3Error::Configuration(format!(
                    "continuous feature `{name}` requires a bin count"
                )));
            }
        }

        for name in self.feature_ranges.keys() {
            if !continuous.contains(&name.as_str()) {
                return Err(Id3Error::Configuration(format!(
                    "range given for `{name}`, which is not a continuous feature"
                )));
            }
        }

        Ok(())
    }
}

/// ID3 trainer
pub struct Id3Trainer {
    params: TrainingParams,
}

impl Id3Trainer {
    pub fn new(params: TrainingParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    /// Train a decision tree on the given labelled dataset
    pub fn train(&self, dataset: &Dataset) -> Result<TrainedModel, Id3Error> {
        let label = dataset.label_column().ok_or(Id3Error::MissingLabels)?;
        if dataset.is_empty() {
            return Err(Id3Error::EmptyDataset);
        }
        self.params.validate(dataset)?;

        info!(
            rows = dataset.n_rows(),
            features = dataset.n_features(),
            depth_limit = ?self.params.depth_limit,
            bin_count = ?self.params.bin_count,
            "training ID3 tree"
        );

        let bins = self.compute_bins(dataset)?;
        let root = {
            let per_feature: Vec<&[Bin]> = dataset
                .features()
                .iter()
                .map(|c| bins[c.name()].as_slice())
                .collect();
            TreeBuilder::new(dataset, per_feature)?.build(self.params.depth_limit)?
        };

        let features = dataset
            .features()
            .iter()
            .map(|c| FeatureSchema {
                name: c.name().to_string(),
                kind: c.kind(),
            })
            .collect();
        let summary = TrainingSummary {
            rows: dataset.n_rows(),
            depth_limit: self.params.depth_limit,
            bin_count: self.params.bin_count,
            strategy: self.params.strategy(),
            exterior_bins: self.params.exterior_bins,
        };
        let model = TrainedModel::new(features, label.name(), bins, root, summary);

        info!(
            depth = model.depth(),
            leaves = model.leaf_count(),
            "training complete"
        );
        Ok(model)
    }

    /// Bins of every feature, computed once over the full training table
    fn compute_bins(&self, dataset: &Dataset) -> Result<BTreeMap<String, Vec<Bin>>, Id3Error> {
        let mut cache = BTreeMap::new();
        for column in dataset.features() {
            let options = self.params.discretization_for(column.name());
            let bins = values_of(column, &options)?;

            // A supplied range must cover the training data unless the
            // exterior bins catch what falls outside.
            if let (Some((min, max)), false) = (options.range, options.exterior) {
                let outside = column
                    .numeric_values()
                    .and_then(|values| values.iter().find(|&&v| v < min || v > max));
                if let Some(value) = outside {
                    return Err(Id3Error::Configuration(format!(
                        "feature `{}` has value {} outside its range [{}, {}]",
                        column.name(),
                        value,
                        min,
                        max
                    )));
                }
            }

            debug!(feature = column.name(), bins = bins.len(), "cached bins");
            cache.insert(column.name().to_string(), bins);
        }
        Ok(cache)
    }
}

/// Train with the given parameters
pub fn fit(dataset: &Dataset, params: &TrainingParams) -> Result<TrainedModel, Id3Error> {
    Id3Trainer::new(params.clone()).train(dataset)
}
