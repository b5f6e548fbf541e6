//! Feature Row Reconstruction

use crate::columns::{locate_column, normalize_column_name, FeatureMapping, ResolvedMapping};
use crate::dataset::ReferenceDataset;
use crate::statistics::{ColumnDefaults, ColumnKind};
use crate::FeatureError;
use data_validator::ApprenticeInput;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::{debug, info};

/// One classifier input row: names and values in the classifier's order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureRow {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value for an exact feature name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names.iter().map(String::as_str).zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for FeatureRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

/// Builds full feature rows from three user values plus dataset means
#[derive(Debug, Clone)]
pub struct FeatureReconstructor {
    target_column: String,
    defaults: ColumnDefaults,
    mapping: ResolvedMapping,
}

impl FeatureReconstructor {
    /// Prepare defaults from the reference dataset.
    ///
    /// Locates and drops the target column, computes column means, and binds
    /// the logical inputs to feature columns.
    pub fn from_dataset(
        dataset: &ReferenceDataset,
        target: &str,
        mapping: &FeatureMapping,
    ) -> Result<Self, FeatureError> {
        let target_index = locate_column(&dataset.columns, target)?.ok_or_else(|| {
            FeatureError::TargetColumnNotFound {
                target: target.to_string(),
                available: dataset.columns.clone(),
            }
        })?;
        let target_column = dataset.columns[target_index].clone();

        let features = dataset.without_column(target_index);
        let defaults = ColumnDefaults::from_dataset(&features)?;
        let mapping = mapping.resolve(&features.columns)?;

        info!(
            "Feature reconstructor ready: target='{}', {} feature columns, {} mapped inputs",
            target_column,
            defaults.len(),
            mapping.len()
        );

        Ok(Self {
            target_column,
            defaults,
            mapping,
        })
    }

    /// Feature names in dataset order, for artifacts that carry none
    pub fn feature_names(&self) -> Vec<String> {
        self.defaults.names()
    }

    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    pub fn defaults(&self) -> &ColumnDefaults {
        &self.defaults
    }

    pub fn mapping(&self) -> &ResolvedMapping {
        &self.mapping
    }

    /// Check that a row can be built for `expected` regardless of user values
    pub fn check_expected(&self, expected: &[String]) -> Result<(), FeatureError> {
        let placeholder = ApprenticeInput {
            age: 0,
            complaints: 0,
            stratum: 0,
        };
        self.reconstruct(&placeholder, expected).map(|_| ())
    }

    /// Build the row for `input`, ordered exactly as `expected`.
    ///
    /// Every expected column takes the user value when it is a mapped input,
    /// otherwise its dataset mean. Absent columns are reported together.
    pub fn reconstruct(
        &self,
        input: &ApprenticeInput,
        expected: &[String],
    ) -> Result<FeatureRow, FeatureError> {
        let overrides = self.mapping.overrides(input);

        let mut values = Vec::with_capacity(expected.len());
        let mut missing = Vec::new();
        let mut non_numeric: Option<&String> = None;

        for name in expected {
            let key = normalize_column_name(name);
            if let Some((_, value)) = overrides.iter().find(|(k, _)| *k == key) {
                values.push(*value);
                continue;
            }

            match self.defaults.find(name).map(|c| &c.kind) {
                Some(ColumnKind::Numeric(stats)) => values.push(stats.mean),
                Some(ColumnKind::NonNumeric) => {
                    non_numeric.get_or_insert(name);
                    values.push(f64::NAN);
                }
                None => missing.push(name.clone()),
            }
        }

        if !missing.is_empty() {
            return Err(FeatureError::FeatureColumnMismatch { missing });
        }
        if let Some(column) = non_numeric {
            return Err(FeatureError::NonNumericColumn(column.clone()));
        }

        debug!("Reconstructed feature row with {} columns", values.len());
        Ok(FeatureRow {
            names: expected.to_vec(),
            values,
        })
    }
}
