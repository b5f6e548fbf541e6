//! Prediction Service
//!
//! Ties the loaded artifact, the reference defaults and the input limits into
//! the single predict operation behind the form.

use crate::config::AppConfig;
use crate::error::ServiceError;
use data_validator::{ApprenticeInput, InputLimits, Validator};
use feature_engine::{FeatureMapping, FeatureReconstructor, FeatureRow, ReferenceDataset};
use inference_engine::{ArtifactCache, Classifier, InferenceEngine, InferenceError, ModelArtifact, Prediction};
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of one prediction request
#[derive(Debug, Clone)]
pub struct PredictionOutcome {
    pub prediction: Prediction,
    /// Echo of the submitted values
    pub inputs: ApprenticeInput,
    /// Row handed to the classifier
    pub features: FeatureRow,
    pub latency_ms: f64,
}

/// Read-only prediction pipeline, built once at startup
#[derive(Debug)]
pub struct PredictionService {
    engine: InferenceEngine,
    reconstructor: FeatureReconstructor,
    validator: Validator,
    expected: Vec<String>,
    reference_rows: usize,
}

impl PredictionService {
    /// Load the artifact (through the cache) and the reference dataset
    ///
    /// A configured `dataset.path` wins over a dataset embedded in the artifact.
    pub fn load(config: &AppConfig, cache: &ArtifactCache) -> Result<Self, ServiceError> {
        let artifact = cache.get_or_load(&config.artifact.path)?;

        let dataset = match (&config.dataset.path, &artifact.reference_dataset) {
            (Some(path), _) => ReferenceDataset::from_path(path)?,
            (None, Some(embedded)) => {
                info!("Using the reference dataset embedded in the artifact");
                embedded.clone()
            }
            (None, None) => {
                return Err(ServiceError::Config(
                    "no dataset.path configured and the artifact has no reference_dataset"
                        .to_string(),
                ))
            }
        };

        Self::from_parts(
            artifact,
            &dataset,
            &config.dataset.target_column,
            &config.features,
            config.input.clone(),
        )
    }

    /// Assemble the pipeline and check that the classifier's columns can be built
    pub fn from_parts(
        artifact: Arc<ModelArtifact>,
        dataset: &ReferenceDataset,
        target_column: &str,
        mapping: &FeatureMapping,
        limits: InputLimits,
    ) -> Result<Self, ServiceError> {
        limits.check()?;

        let reconstructor = FeatureReconstructor::from_dataset(dataset, target_column, mapping)?;
        let expected = artifact
            .feature_names
            .clone()
            .unwrap_or_else(|| reconstructor.feature_names());

        let n_features = artifact.classifier.n_features();
        if expected.len() != n_features {
            return Err(InferenceError::InvalidInputShape {
                expected: n_features,
                actual: expected.len(),
            }
            .into());
        }
        reconstructor.check_expected(&expected)?;

        info!(
            "Prediction service ready: {} features, {} reference rows",
            expected.len(),
            dataset.len()
        );

        Ok(Self {
            engine: InferenceEngine::new(artifact),
            reconstructor,
            validator: Validator::new(limits),
            expected,
            reference_rows: dataset.len(),
        })
    }

    /// Validate, reconstruct the feature row, classify and decode
    pub fn predict(&self, input: &ApprenticeInput) -> Result<PredictionOutcome, ServiceError> {
        self.validator.validate(input)?;
        let features = self.reconstructor.reconstruct(input, &self.expected)?;
        let result = self.engine.predict(&features)?;

        debug!(?input, label = %result.prediction.label, "Prediction served");
        Ok(PredictionOutcome {
            prediction: result.prediction,
            inputs: *input,
            features,
            latency_ms: result.latency_ms,
        })
    }

    pub fn limits(&self) -> &InputLimits {
        self.validator.limits()
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    pub fn reconstructor(&self) -> &FeatureReconstructor {
        &self.reconstructor
    }

    /// Feature names in classifier order
    pub fn expected_features(&self) -> &[String] {
        &self.expected
    }

    pub fn reference_rows(&self) -> usize {
        self.reference_rows
    }
}
