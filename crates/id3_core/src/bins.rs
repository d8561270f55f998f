//! Feature discretization
//!
//! Turns a column into the ordered list of [`Bin`]s used as split edges.
//! Categorical columns yield their declared categories, nominal columns
//! their distinct values in first-seen order, and continuous columns a run
//! of contiguous intervals:
//!
//! ```text
//! [e0, e1] (e1, e2] ... (e(n-1), max]
//! ```
//!
//! The first interval is closed on both ends and every later one is closed
//! on the right only, so each value of `[min, max]` lands in exactly one
//! bin. The last right edge is the observed maximum itself rather than a
//! computed `min + n * width`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::dataset::{Column, ColumnData, Dataset, Value};
use crate::errors::{Id3Error, Result};

/// One end of an [`Interval`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Bound {
    Unbounded,
    Open(f64),
    Closed(f64),
}

/// Numeric interval with independently open/closed ends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lower: Bound,
    pub upper: Bound,
}

impl Interval {
    /// `[lower, upper]`
    pub fn closed(lower: f64, upper: f64) -> Self {
        Self {
            lower: Bound::Closed(lower),
            upper: Bound::Closed(upper),
        }
    }

    /// `(lower, upper]`
    pub fn left_open(lower: f64, upper: f64) -> Self {
        Self {
            lower: Bound::Open(lower),
            upper: Bound::Closed(upper),
        }
    }

    /// `(-inf, upper)`
    pub fn below(upper: f64) -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Open(upper),
        }
    }

    /// `(lower, +inf)`
    pub fn above(lower: f64) -> Self {
        Self {
            lower: Bound::Open(lower),
            upper: Bound::Unbounded,
        }
    }

    /// Membership honouring each end's open/closed flag. NaN is never inside.
    pub fn contains(&self, x: f64) -> bool {
        let above_lower = match self.lower {
            Bound::Unbounded => !x.is_nan(),
            Bound::Open(a) => x > a,
            Bound::Closed(a) => x >= a,
        };
        let below_upper = match self.upper {
            Bound::Unbounded => !x.is_nan(),
            Bound::Open(b) => x < b,
            Bound::Closed(b) => x <= b,
        };
        above_lower && below_upper
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lower {
            Bound::Unbounded => f.write_str("(-inf")?,
            Bound::Open(a) => write!(f, "({a}")?,
            Bound::Closed(a) => write!(f, "[{a}")?,
        }
        match self.upper {
            Bound::Unbounded => f.write_str(", +inf)"),
            Bound::Open(b) => write!(f, ", {b})"),
            Bound::Closed(b) => write!(f, ", {b}]"),
        }
    }
}

/// Split edge: a literal category or a numeric interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bin {
    Category(String),
    Interval(Interval),
}

impl Bin {
    /// Equality for categories, interval membership for numbers.
    /// Mixed kinds never match.
    pub fn matches(&self, value: Value<'_>) -> bool {
        match (self, value) {
            (Bin::Category(category), Value::Text(text)) => category == text,
            (Bin::Interval(interval), Value::Number(x)) => interval.contains(x),
            _ => false,
        }
    }
}

impl fmt::Display for Bin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bin::Category(category) => f.write_str(category),
            Bin::Interval(interval) => write!(f, "{interval}"),
        }
    }
}

/// How continuous columns are cut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinningStrategy {
    /// Equal-width intervals over `[min, max]`
    #[default]
    EqualWidth,
    /// Quantile edges, roughly equal row counts per interval
    EqualFrequency,
}

/// Discretization settings for a single column
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Discretization {
    /// Interval count; required for continuous columns
    pub bin_count: Option<usize>,
    pub strategy: BinningStrategy,
    /// Append `(-inf, min)` and `(max, +inf)` after the interior bins
    pub exterior: bool,
    /// Known legal range, used instead of the observed one
    pub range: Option<(f64, f64)>,
}

impl Discretization {
    pub fn new(bin_count: Option<usize>) -> Self {
        Self {
            bin_count,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: BinningStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_exterior(mut self, exterior: bool) -> Self {
        self.exterior = exterior;
        self
    }

    #[must_use]
    pub fn with_range(mut self, range: Option<(f64, f64)>) -> Self {
        self.range = range;
        self
    }
}

/// Ordered bins of `column`.
///
/// A supplied `range` always produces equal-width bins via [`range_cut`];
/// the quantile strategy only applies to observed values.
pub fn values_of(column: &Column, options: &Discretization) -> Result<Vec<Bin>> {
    match column.data() {
        ColumnData::Categorical { categories, .. } => {
            Ok(categories.iter().cloned().map(Bin::Category).collect())
        }
        ColumnData::Nominal(values) => {
            let mut seen = HashSet::new();
            Ok(values
                .iter()
                .filter(|v| seen.insert(v.as_str()))
                .cloned()
                .map(Bin::Category)
                .collect())
        }
        ColumnData::Continuous(values) => {
            let bin_count = options.bin_count.ok_or_else(|| {
                Id3Error::Configuration(format!(
                    "continuous feature `{}` requires a bin count",
                    column.name()
                ))
            })?;
            check_bin_count(bin_count)?;

            let (min, max, mut bins) = match options.range {
                Some((min, max)) => (min, max, range_cut(min, max, bin_count)?),
                None => {
                    let (min, max) = observed_range(values).ok_or(Id3Error::EmptyDataset)?;
                    let bins = match options.strategy {
                        BinningStrategy::EqualWidth => equal_width(min, max, bin_count),
                        BinningStrategy::EqualFrequency => equal_frequency(values, bin_count),
                    };
                    (min, max, bins)
                }
            };

            if options.exterior {
                bins.push(Bin::Interval(Interval::below(min)));
                bins.push(Bin::Interval(Interval::above(max)));
            }
            Ok(bins)
        }
    }
}

/// Equal-width bins over an explicitly supplied `[min, max]`.
pub fn range_cut(min: f64, max: f64, bin_count: usize) -> Result<Vec<Bin>> {
    check_bin_count(bin_count)?;
    if !min.is_finite() || !max.is_finite() || min > max {
        return Err(Id3Error::Configuration(format!(
            "invalid range [{min}, {max}]"
        )));
    }
    Ok(equal_width(min, max, bin_count))
}

/// Rows of `dataset` whose `feature` value falls in `bin`.
pub fn subset_by_value(dataset: &Dataset, feature: &str, bin: &Bin) -> Result<Dataset> {
    let column = dataset
        .feature(feature)
        .ok_or_else(|| Id3Error::UnknownFeature(feature.to_string()))?;
    let rows: Vec<usize> = (0..column.len())
        .filter(|&row| column.value(row).is_some_and(|v| bin.matches(v)))
        .collect();
    Ok(dataset.select_rows(&rows))
}

/// Split `rows` into one group per bin, first matching bin wins.
/// Rows matching no bin are left out.
pub fn partition_rows(column: &Column, rows: &[usize], bins: &[Bin]) -> Vec<Vec<usize>> {
    let mut groups = vec![Vec::new(); bins.len()];
    for &row in rows {
        let Some(value) = column.value(row) else {
            continue;
        };
        if let Some(idx) = bins.iter().position(|bin| bin.matches(value)) {
            groups[idx].push(row);
        }
    }
    groups
}

fn check_bin_count(bin_count: usize) -> Result<()> {
    if bin_count == 0 {
        return Err(Id3Error::Configuration(
            "bin count must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn observed_range(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((min, max)) => Some((min.min(v), max.max(v))),
    })
}

fn equal_width(min: f64, max: f64, bin_count: usize) -> Vec<Bin> {
    let width = (max - min) / bin_count as f64;
    let edges: Vec<f64> = (0..=bin_count)
        .map(|i| match i {
            0 => min,
            i if i == bin_count => max,
            i => min + width * i as f64,
        })
        .collect();
    intervals_from_edges(&edges)
}

fn equal_frequency(values: &[f64], bin_count: usize) -> Vec<Bin> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let last = sorted.len() - 1;
    let mut edges: Vec<f64> = (0..=bin_count)
        .map(|i| match i {
            0 => sorted[0],
            i if i == bin_count => sorted[last],
            i => {
                let position = last as f64 * i as f64 / bin_count as f64;
                let lo = position.floor() as usize;
                let hi = position.ceil() as usize;
                sorted[lo] + (sorted[hi] - sorted[lo]) * (position - lo as f64)
            }
        })
        .collect();
    // Repeated values collapse neighbouring quantiles onto one edge.
    edges.dedup();
    if edges.len() == 1 {
        edges.push(edges[0]);
    }
    intervals_from_edges(&edges)
}

fn intervals_from_edges(edges: &[f64]) -> Vec<Bin> {
    edges
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let interval = if i == 0 {
                Interval::closed(pair[0], pair[1])
            } else {
                Interval::left_open(pair[0], pair[1])
            };
            Bin::Interval(interval)
        })
        .collect()
}
