//! Column Statistics Computation

use crate::columns::normalize_column_name;
use crate::dataset::{Cell, ReferenceDataset};
use crate::FeatureError;
use serde::Serialize;
use tracing::debug;

/// Summary statistics for one numeric column
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnStatistics {
    /// Mean value
    pub mean: f64,
    /// Standard deviation (population)
    pub std_dev: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Number of non-missing values
    pub count: usize,
}

impl ColumnStatistics {
    /// Compute statistics from a slice of values
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let min = values.iter().cloned().fold(f64::MAX, f64::min);
        let max = values.iter().cloned().fold(f64::MIN, f64::max);

        let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;

        Self {
            mean,
            std_dev: variance.sqrt(),
            min,
            max,
            count: values.len(),
        }
    }
}

/// Whether a column can supply a default value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric(ColumnStatistics),
    NonNumeric,
}

/// A feature column and its default-value summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDefault {
    pub name: String,
    #[serde(skip)]
    pub(crate) key: String,
    #[serde(flatten)]
    pub kind: ColumnKind,
}

/// Per-column defaults for every feature column, in dataset order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnDefaults {
    columns: Vec<ColumnDefault>,
}

impl ColumnDefaults {
    /// Summarize each column. A column holding any text cell, or no number at
    /// all, is non-numeric. Missing cells are skipped.
    ///
    /// Two headers that normalize to the same key (`Horas` and `horas`) are
    /// `AmbiguousColumn`: lookups by name could not tell them apart.
    pub fn from_dataset(dataset: &ReferenceDataset) -> Result<Self, FeatureError> {
        let columns: Vec<ColumnDefault> = dataset
            .columns
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let mut values = Vec::with_capacity(dataset.len());
                let mut has_text = false;
                for cell in dataset.column(index) {
                    match cell {
                        Cell::Number(v) => values.push(*v),
                        Cell::Text(_) => has_text = true,
                        Cell::Missing => {}
                    }
                }

                let kind = if has_text || values.is_empty() {
                    debug!("Column '{}' is non-numeric", name);
                    ColumnKind::NonNumeric
                } else {
                    ColumnKind::Numeric(ColumnStatistics::compute(&values))
                };

                ColumnDefault {
                    name: name.clone(),
                    key: normalize_column_name(name),
                    kind,
                }
            })
            .collect();

        for (i, column) in columns.iter().enumerate() {
            let clashes: Vec<String> = columns[i..]
                .iter()
                .filter(|c| c.key == column.key)
                .map(|c| c.name.clone())
                .collect();
            if clashes.len() > 1 {
                return Err(FeatureError::AmbiguousColumn {
                    wanted: column.key.clone(),
                    candidates: clashes,
                });
            }
        }

        Ok(Self { columns })
    }

    /// Look a column up by normalized name. Keys are unique.
    pub fn find(&self, name: &str) -> Option<&ColumnDefault> {
        let key = normalize_column_name(name);
        self.columns.iter().find(|c| c.key == key)
    }

    /// Mean of a numeric column
    pub fn mean(&self, name: &str) -> Option<f64> {
        match &self.find(name)?.kind {
            ColumnKind::Numeric(stats) => Some(stats.mean),
            ColumnKind::NonNumeric => None,
        }
    }

    /// Column names in dataset order
    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnDefault> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
