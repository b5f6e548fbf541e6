//! Reference Dataset Loading
//!
//! Historical records used only to derive default feature values. Loaded from
//! CSV or from the first worksheet of a spreadsheet.

use crate::FeatureError;
use calamine::{open_workbook_auto, Data, Reader};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// A single dataset cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    /// Classify a raw text value. Blank and NaN values are missing.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_nan() => Cell::Missing,
            Ok(v) => Cell::Number(v),
            Err(_) => Cell::Text(trimmed.to_string()),
        }
    }

    fn from_sheet(data: &Data) -> Self {
        match data {
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) if f.is_nan() => Cell::Missing,
            Data::Float(f) => Cell::Number(*f),
            Data::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
            Data::String(s) => Cell::parse(s),
            Data::Empty | Data::Error(_) => Cell::Missing,
            other => Cell::Text(other.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }
}

/// Tabular reference data: a header and equally wide rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ReferenceDataset {
    /// Build a dataset, checking every row against the header width
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, FeatureError> {
        let dataset = Self { columns, rows };
        dataset.validate()?;
        Ok(dataset)
    }

    /// Check row widths (used after deserializing an embedded dataset)
    pub fn validate(&self) -> Result<(), FeatureError> {
        if self.columns.is_empty() {
            return Err(FeatureError::DatasetLoad("dataset has no columns".to_string()));
        }
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != self.columns.len() {
                return Err(FeatureError::DatasetLoad(format!(
                    "row {} has {} cells, expected {}",
                    i + 1,
                    row.len(),
                    self.columns.len()
                )));
            }
        }
        Ok(())
    }

    /// Load from a file, choosing the reader by extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FeatureError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let dataset = match extension.as_str() {
            "csv" => {
                let file = std::fs::File::open(path).map_err(|e| {
                    FeatureError::DatasetLoad(format!("{}: {}", path.display(), e))
                })?;
                Self::from_csv_reader(file)?
            }
            "xlsx" | "xlsm" | "xls" | "ods" => Self::from_workbook(path)?,
            other => {
                return Err(FeatureError::DatasetLoad(format!(
                    "{}: unsupported file type '{}'",
                    path.display(),
                    other
                )))
            }
        };

        info!(
            "Loaded reference dataset {}: {} columns, {} rows",
            path.display(),
            dataset.columns.len(),
            dataset.rows.len()
        );
        Ok(dataset)
    }

    /// Parse CSV with a header row
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, FeatureError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = rdr
            .headers()
            .map_err(|e| FeatureError::DatasetLoad(e.to_string()))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(|e| FeatureError::DatasetLoad(e.to_string()))?;
            rows.push(record.iter().map(Cell::parse).collect());
        }

        Self::new(columns, rows)
    }

    fn from_workbook(path: &Path) -> Result<Self, FeatureError> {
        let load_err = |e: String| FeatureError::DatasetLoad(format!("{}: {}", path.display(), e));

        let mut workbook = open_workbook_auto(path).map_err(|e| load_err(e.to_string()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| load_err("workbook has no worksheets".to_string()))?
            .map_err(|e| load_err(e.to_string()))?;

        let mut sheet_rows = range.rows();
        let header = sheet_rows
            .next()
            .ok_or_else(|| load_err("worksheet is empty".to_string()))?;
        let columns = header.iter().map(|c| c.to_string().trim().to_string()).collect();
        let rows = sheet_rows
            .map(|row| row.iter().map(Cell::from_sheet).collect())
            .collect();

        debug!("Read worksheet 0 from {}", path.display());
        Self::new(columns, rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cells of one column, top to bottom
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    /// Copy of the dataset with one column removed
    pub fn without_column(&self, index: usize) -> Self {
        let mut columns = self.columns.clone();
        if index < columns.len() {
            columns.remove(index);
        }
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(i, _)| *i != index)
                    .map(|(_, c)| c.clone())
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }
}
