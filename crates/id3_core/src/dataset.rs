//! Column-typed tabular dataset
//!
//! Feature columns are stored column-major in their declared order. The
//! label column, when present, is kept apart from the features; it is the
//! last column handed to [`Dataset::new`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::errors::{Id3Error, Result};

/// Semantic kind of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Finite, declared set of categories
    Categorical,
    /// Free string values, treated as categories
    Nominal,
    /// Real values that must be discretized before splitting
    Continuous,
}

impl ColumnKind {
    /// Categorical and nominal columns both hold text
    pub fn is_text(self) -> bool {
        !matches!(self, ColumnKind::Continuous)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::Categorical => "categorical",
            ColumnKind::Nominal => "nominal",
            ColumnKind::Continuous => "continuous",
        };
        f.write_str(name)
    }
}

impl FromStr for ColumnKind {
    type Err = Id3Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "categorical" | "category" => Ok(ColumnKind::Categorical),
            "nominal" | "string" => Ok(ColumnKind::Nominal),
            "continuous" | "float" | "numeric" => Ok(ColumnKind::Continuous),
            other => Err(Id3Error::Configuration(format!(
                "unknown column kind `{other}`"
            ))),
        }
    }
}

/// Borrowed cell value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Text(&'a str),
    Number(f64),
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => write!(f, "`{text}`"),
            Value::Number(number) => write!(f, "{number}"),
        }
    }
}

/// Raw storage of a column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Categorical {
        categories: Vec<String>,
        values: Vec<String>,
    },
    Nominal(Vec<String>),
    Continuous(Vec<f64>),
}

/// Named, typed column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    /// Categorical column with its declared category set
    pub fn categorical<S: Into<String>>(
        name: impl Into<String>,
        categories: impl IntoIterator<Item = S>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Categorical {
                categories: categories.into_iter().map(Into::into).collect(),
                values: values.into_iter().map(Into::into).collect(),
            },
        }
    }

    /// Nominal (free string) column
    pub fn nominal<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Nominal(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Continuous column
    pub fn continuous(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Continuous(values.into_iter().collect()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn kind(&self) -> ColumnKind {
        match self.data {
            ColumnData::Categorical { .. } => ColumnKind::Categorical,
            ColumnData::Nominal(_) => ColumnKind::Nominal,
            ColumnData::Continuous(_) => ColumnKind::Continuous,
        }
    }

    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Categorical { values, .. } | ColumnData::Nominal(values) => values.len(),
            ColumnData::Continuous(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `row`, `None` past the end
    pub fn value(&self, row: usize) -> Option<Value<'_>> {
        match &self.data {
            ColumnData::Categorical { values, .. } | ColumnData::Nominal(values) => {
                values.get(row).map(|v| Value::Text(v.as_str()))
            }
            ColumnData::Continuous(values) => values.get(row).copied().map(Value::Number),
        }
    }

    /// Text cells of a categorical or nominal column
    pub fn text_values(&self) -> Option<&[String]> {
        match &self.data {
            ColumnData::Categorical { values, .. } | ColumnData::Nominal(values) => Some(values),
            ColumnData::Continuous(_) => None,
        }
    }

    /// Cells of a continuous column
    pub fn numeric_values(&self) -> Option<&[f64]> {
        match &self.data {
            ColumnData::Continuous(values) => Some(values),
            _ => None,
        }
    }

    /// Copy of the column restricted to `rows`, in the given order
    pub fn select(&self, rows: &[usize]) -> Self {
        let data = match &self.data {
            ColumnData::Categorical { categories, values } => ColumnData::Categorical {
                categories: categories.clone(),
                values: rows.iter().map(|&r| values[r].clone()).collect(),
            },
            ColumnData::Nominal(values) => {
                ColumnData::Nominal(rows.iter().map(|&r| values[r].clone()).collect())
            }
            ColumnData::Continuous(values) => {
                ColumnData::Continuous(rows.iter().map(|&r| values[r]).collect())
            }
        };
        Self {
            name: self.name.clone(),
            data,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Id3Error::InvalidDataset(
                "column names must not be empty".to_string(),
            ));
        }

        match &self.data {
            ColumnData::Categorical { categories, values } => {
                let known: HashSet<&str> = categories.iter().map(String::as_str).collect();
                if known.len() != categories.len() {
                    return Err(Id3Error::InvalidDataset(format!(
                        "column `{}` declares duplicate categories",
                        self.name
                    )));
                }
                if let Some((row, value)) = values
                    .iter()
                    .enumerate()
                    .find(|(_, v)| !known.contains(v.as_str()))
                {
                    return Err(Id3Error::InvalidDataset(format!(
                        "column `{}` row {}: `{}` is not a declared category",
                        self.name, row, value
                    )));
                }
            }
            ColumnData::Nominal(_) => {}
            ColumnData::Continuous(values) => {
                if let Some((row, value)) =
                    values.iter().enumerate().find(|(_, v)| !v.is_finite())
                {
                    return Err(Id3Error::InvalidDataset(format!(
                        "column `{}` row {}: non-finite value {}",
                        self.name, row, value
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Ordered feature columns plus an optional trailing label column
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Vec<Column>,
    labels: Option<Column>,
}

impl Dataset {
    /// Build a labelled dataset; the last column is the label.
    pub fn new(mut columns: Vec<Column>) -> Result<Self> {
        let labels = columns
            .pop()
            .ok_or_else(|| Id3Error::InvalidDataset("dataset has no columns".to_string()))?;
        if !labels.kind().is_text() {
            return Err(Id3Error::InvalidDataset(format!(
                "label column `{}` must be categorical or nominal",
                labels.name()
            )));
        }

        let dataset = Self {
            features: columns,
            labels: Some(labels),
        };
        dataset.validate()?;
        Ok(dataset)
    }

    /// Build a dataset of feature columns only, e.g. prediction input.
    pub fn unlabeled(columns: Vec<Column>) -> Result<Self> {
        if columns.is_empty() {
            return Err(Id3Error::InvalidDataset("dataset has no columns".to_string()));
        }
        let dataset = Self {
            features: columns,
            labels: None,
        };
        dataset.validate()?;
        Ok(dataset)
    }

    fn validate(&self) -> Result<()> {
        let rows = self.n_rows();
        let mut names = HashSet::new();

        for column in self.features.iter().chain(self.labels.iter()) {
            column.validate()?;
            if column.len() != rows {
                return Err(Id3Error::InvalidDataset(format!(
                    "column `{}` has {} rows, expected {}",
                    column.name(),
                    column.len(),
                    rows
                )));
            }
            if !names.insert(column.name()) {
                return Err(Id3Error::InvalidDataset(format!(
                    "duplicate column `{}`",
                    column.name()
                )));
            }
        }

        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        self.labels
            .as_ref()
            .or_else(|| self.features.first())
            .map_or(0, Column::len)
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub fn features(&self) -> &[Column] {
        &self.features
    }

    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    pub fn feature(&self, name: &str) -> Option<&Column> {
        self.features.iter().find(|c| c.name() == name)
    }

    pub fn feature_position(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|c| c.name() == name)
    }

    pub fn feature_names(&self) -> Vec<&str> {
        self.features.iter().map(Column::name).collect()
    }

    pub fn label_column(&self) -> Option<&Column> {
        self.labels.as_ref()
    }

    /// Label cells, or [`Id3Error::MissingLabels`] for unlabelled data
    pub fn labels(&self) -> Result<&[String]> {
        self.labels
            .as_ref()
            .and_then(Column::text_values)
            .ok_or(Id3Error::MissingLabels)
    }

    /// Copy without the named feature column
    pub fn drop_column(&self, name: &str) -> Result<Self> {
        let position = self
            .feature_position(name)
            .ok_or_else(|| Id3Error::UnknownFeature(name.to_string()))?;
        let mut features = self.features.clone();
        features.remove(position);
        Ok(Self {
            features,
            labels: self.labels.clone(),
        })
    }

    /// Copy restricted to `rows`, preserving their order
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            features: self.features.iter().map(|c| c.select(rows)).collect(),
            labels: self.labels.as_ref().map(|c| c.select(rows)),
        }
    }
}
