//! Feature Engineering Engine
//!
//! Loads the reference dataset and rebuilds a full feature row from the three
//! user-supplied values, filling every other column with its dataset mean.

mod columns;
mod dataset;
mod features;
mod statistics;

pub use columns::{locate_column, normalize_column_name, FeatureMapping, LogicalFeature, ResolvedMapping};
pub use dataset::{Cell, ReferenceDataset};
pub use features::{FeatureReconstructor, FeatureRow};
pub use statistics::{ColumnDefault, ColumnDefaults, ColumnKind, ColumnStatistics};

use thiserror::Error;

/// Errors while preparing or reconstructing features
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("Failed to load reference dataset: {0}")]
    DatasetLoad(String),
    #[error("No column matching target '{target}' (available: {})", .available.join(", "))]
    TargetColumnNotFound { target: String, available: Vec<String> },
    #[error("Column '{wanted}' is ambiguous, candidates: {}", .candidates.join(", "))]
    AmbiguousColumn { wanted: String, candidates: Vec<String> },
    #[error("Column '{column}' is mapped to both {first} and {second}")]
    ConflictingMapping {
        column: String,
        first: &'static str,
        second: &'static str,
    },
    #[error("Feature columns missing from reference dataset: {}", .missing.join(", "))]
    FeatureColumnMismatch { missing: Vec<String> },
    #[error("Column '{0}' has no numeric mean")]
    NonNumericColumn(String),
}
