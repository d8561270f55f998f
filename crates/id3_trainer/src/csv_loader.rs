//! CSV dataset loading
//!
//! Reads a delimited table into a column-typed [`Dataset`]. Column kinds come
//! from an explicit [`CsvSchema`] or are inferred from the cells: a column
//! whose every cell is a finite number is continuous, anything else is
//! nominal. The label column (last) is always text.

use id3_core::{Column, ColumnKind, Dataset};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::errors::CsvError;

/// Column names and kinds, label column last
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvSchema {
    columns: Vec<(String, ColumnKind)>,
}

impl CsvSchema {
    pub fn new(columns: Vec<(String, ColumnKind)>) -> Self {
        Self { columns }
    }

    /// Parse `name:kind` pairs separated by commas, e.g.
    /// `outlook:categorical,temp:continuous,play:nominal`.
    pub fn parse(raw: &str) -> Result<Self, CsvError> {
        let mut columns = Vec::new();
        for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, kind) = pair
                .split_once(':')
                .ok_or_else(|| CsvError::Schema(format!("`{pair}` is not a name:kind pair")))?;
            let kind = kind
                .parse::<ColumnKind>()
                .map_err(|err| CsvError::Schema(err.to_string()))?;
            columns.push((name.trim().to_string(), kind));
        }
        if columns.is_empty() {
            return Err(CsvError::Schema("schema lists no columns".to_string()));
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[(String, ColumnKind)] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl FromStr for CsvSchema {
    type Err = CsvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Configurable CSV reader
#[derive(Clone, Debug)]
pub struct CsvLoader {
    has_headers: bool,
    labelled: bool,
    schema: Option<CsvSchema>,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self {
            has_headers: true,
            labelled: true,
            schema: None,
        }
    }
}

impl CsvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the first record holds column names
    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    pub fn with_schema(mut self, schema: Option<CsvSchema>) -> Self {
        self.schema = schema;
        self
    }

    /// Treat every column as a feature, e.g. for prediction input
    pub fn unlabeled(mut self) -> Self {
        self.labelled = false;
        self
    }

    /// Load a dataset from a file
    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> Result<Dataset, CsvError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CsvError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_reader(file)
    }

    /// Load a dataset from any reader
    pub fn load_reader<R: Read>(&self, reader: R) -> Result<Dataset, CsvError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(self.has_headers)
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .flexible(true)
            .from_reader(reader);

        let header: Option<Vec<String>> = if self.has_headers {
            Some(reader.headers()?.iter().map(str::to_string).collect())
        } else {
            None
        };

        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut lines: Vec<usize> = Vec::new();
        let mut width = header.as_ref().map(Vec::len);
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let line = record
                .position()
                .map_or(index + 1, |p| p.line() as usize);
            let expected = *width.get_or_insert(record.len());
            if record.len() != expected {
                return Err(CsvError::InconsistentRowLength {
                    row: line,
                    expected,
                    got: record.len(),
                });
            }
            rows.push(record.iter().map(str::to_string).collect());
            lines.push(line);
        }

        if rows.is_empty() {
            return Err(CsvError::Empty);
        }
        let width = width.unwrap_or_default();

        let schema = self.resolve_schema(header, &rows, width)?;
        debug!(
            rows = rows.len(),
            columns = schema.len(),
            "parsed CSV records"
        );

        let mut columns = Vec::with_capacity(width);
        for (position, (name, kind)) in schema.columns.iter().enumerate() {
            let cells = rows.iter().map(|row| row[position].as_str());
            let column = match kind {
                ColumnKind::Continuous => {
                    let mut values = Vec::with_capacity(rows.len());
                    for (cell, &line) in cells.zip(&lines) {
                        let value = parse_finite(cell).ok_or_else(|| CsvError::InvalidNumber {
                            row: line,
                            column: name.clone(),
                            raw: cell.to_string(),
                        })?;
                        values.push(value);
                    }
                    Column::continuous(name.clone(), values)
                }
                ColumnKind::Categorical => {
                    let values: Vec<&str> = cells.collect();
                    let mut categories: Vec<&str> = Vec::new();
                    for &value in &values {
                        if !categories.contains(&value) {
                            categories.push(value);
                        }
                    }
                    Column::categorical(name.clone(), categories, values)
                }
                ColumnKind::Nominal => Column::nominal(name.clone(), cells),
            };
            columns.push(column);
        }

        let dataset = if self.labelled {
            Dataset::new(columns)?
        } else {
            Dataset::unlabeled(columns)?
        };
        Ok(dataset)
    }

    fn resolve_schema(
        &self,
        header: Option<Vec<String>>,
        rows: &[Vec<String>],
        width: usize,
    ) -> Result<CsvSchema, CsvError> {
        if let Some(schema) = &self.schema {
            if schema.len() != width {
                return Err(CsvError::Schema(format!(
                    "schema lists {} columns, CSV has {}",
                    schema.len(),
                    width
                )));
            }
            if let Some(header) = &header {
                for ((name, _), found) in schema.columns.iter().zip(header) {
                    if name != found {
                        return Err(CsvError::Schema(format!(
                            "schema column `{name}` does not match header `{found}`"
                        )));
                    }
                }
            }
            return Ok(schema.clone());
        }

        let names = header.unwrap_or_else(|| (0..width).map(|i| format!("c{i}")).collect());
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(position, name)| {
                let is_label = self.labelled && position + 1 == width;
                let numeric = rows.iter().all(|row| parse_finite(&row[position]).is_some());
                let kind = if numeric && !is_label {
                    ColumnKind::Continuous
                } else {
                    ColumnKind::Nominal
                };
                (name, kind)
            })
            .collect();
        Ok(CsvSchema::new(columns))
    }
}

fn parse_finite(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Load a labelled CSV with a header row, inferring column kinds
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Dataset, CsvError> {
    CsvLoader::new().load_path(path)
}
