//! Inference Engine
//!
//! Loads the serialized model artifact once per process and turns feature rows
//! into decoded apprentice status labels.

mod artifact;
mod engine;
mod model;

pub use artifact::{ArtifactCache, LabelDecoder, ModelArtifact, REQUIRED_KEYS};
pub use engine::{InferenceEngine, InferenceResult, Prediction};
pub use model::{Classifier, ClassifierModel, DecisionTree, LogisticRegression, RandomForest, TreeNode};

use thiserror::Error;

/// Errors during artifact loading or inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Failed to read model artifact {path}: {reason}")]
    ArtifactLoad { path: String, reason: String },
    #[error("Model artifact is missing required key '{0}'")]
    MissingKey(&'static str),
    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),
    #[error("Invalid input shape: expected {expected} features, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
}
