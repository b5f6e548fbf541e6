//! Column Name Normalization and Resolution
//!
//! Spreadsheet headers drift between exports ("Estado Aprendiz",
//! "estado_aprendiz ", "ESTADO  APRENDIZ"). Names are compared after
//! normalization, and a lookup that matches more than one column is an error
//! instead of a silent first pick.

use crate::FeatureError;
use data_validator::ApprenticeInput;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Normalize a column name for comparison.
///
/// Strips a leading BOM and accents, folds case, and collapses runs of
/// whitespace and underscores into single spaces.
pub fn normalize_column_name(name: &str) -> String {
    let folded: String = name
        .trim_start_matches('\u{feff}')
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            '_' => ' ',
            c if c.is_whitespace() => ' ',
            c => c,
        })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Find the column matching `wanted`.
///
/// Normalized equality wins; otherwise a normalized substring match is tried.
/// More than one match at either stage is `AmbiguousColumn`.
pub fn locate_column(columns: &[String], wanted: &str) -> Result<Option<usize>, FeatureError> {
    let needle = normalize_column_name(wanted);
    if needle.is_empty() {
        return Ok(None);
    }
    let normalized: Vec<String> = columns.iter().map(|c| normalize_column_name(c)).collect();

    let exact: Vec<usize> = (0..columns.len()).filter(|&i| normalized[i] == needle).collect();
    let candidates = if exact.is_empty() {
        (0..columns.len())
            .filter(|&i| normalized[i].contains(&needle))
            .collect()
    } else {
        exact
    };

    match candidates.as_slice() {
        [] => Ok(None),
        [index] => {
            debug!("Column '{}' resolved to '{}'", wanted, columns[*index]);
            Ok(Some(*index))
        }
        many => Err(FeatureError::AmbiguousColumn {
            wanted: wanted.to_string(),
            candidates: many.iter().map(|&i| columns[i].clone()).collect(),
        }),
    }
}

/// Logical inputs supplied by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalFeature {
    Age,
    Complaints,
    Stratum,
}

impl LogicalFeature {
    pub const ALL: [LogicalFeature; 3] = [
        LogicalFeature::Age,
        LogicalFeature::Complaints,
        LogicalFeature::Stratum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalFeature::Age => "age",
            LogicalFeature::Complaints => "complaints",
            LogicalFeature::Stratum => "stratum",
        }
    }

    /// Pick this feature's value out of the user input
    pub fn value(&self, input: &ApprenticeInput) -> f64 {
        match self {
            LogicalFeature::Age => input.age as f64,
            LogicalFeature::Complaints => input.complaints as f64,
            LogicalFeature::Stratum => input.stratum as f64,
        }
    }
}

/// Configured dataset column name for each logical input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureMapping {
    pub age: String,
    pub complaints: String,
    pub stratum: String,
}

impl Default for FeatureMapping {
    fn default() -> Self {
        Self {
            age: "Edad".to_string(),
            complaints: "Cantidad de quejas".to_string(),
            stratum: "Estrato".to_string(),
        }
    }
}

impl FeatureMapping {
    pub fn column_for(&self, feature: LogicalFeature) -> &str {
        match feature {
            LogicalFeature::Age => &self.age,
            LogicalFeature::Complaints => &self.complaints,
            LogicalFeature::Stratum => &self.stratum,
        }
    }

    /// Resolve every logical input against the feature columns.
    ///
    /// An input with no matching column is dropped with a warning; an
    /// ambiguous match, or two inputs landing on one column, is an error.
    pub fn resolve(&self, columns: &[String]) -> Result<ResolvedMapping, FeatureError> {
        let mut entries: Vec<(LogicalFeature, String)> = Vec::with_capacity(3);

        for feature in LogicalFeature::ALL {
            let wanted = self.column_for(feature);
            match locate_column(columns, wanted)? {
                Some(index) => {
                    let column = columns[index].clone();
                    if let Some((other, _)) = entries.iter().find(|(_, c)| *c == column) {
                        return Err(FeatureError::ConflictingMapping {
                            column,
                            first: other.as_str(),
                            second: feature.as_str(),
                        });
                    }
                    entries.push((feature, column));
                }
                None => warn!(
                    "No column matches '{}' for input {}; its value will not be applied",
                    wanted,
                    feature.as_str()
                ),
            }
        }

        Ok(ResolvedMapping { entries })
    }
}

/// Logical inputs bound to actual dataset column names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedMapping {
    entries: Vec<(LogicalFeature, String)>,
}

impl ResolvedMapping {
    pub fn column(&self, feature: LogicalFeature) -> Option<&str> {
        self.entries
            .iter()
            .find(|(f, _)| *f == feature)
            .map(|(_, c)| c.as_str())
    }

    /// Normalized column name paired with the user value that replaces its mean
    pub fn overrides(&self, input: &ApprenticeInput) -> Vec<(String, f64)> {
        self.entries
            .iter()
            .map(|(feature, column)| (normalize_column_name(column), feature.value(input)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
