//! Inference Engine Implementation

use crate::artifact::ModelArtifact;
use crate::model::Classifier;
use crate::InferenceError;
use feature_engine::FeatureRow;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Decoded prediction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    /// Human-readable label, or the fallback when the code is unmapped
    pub label: String,
    /// Raw class code produced by the classifier
    pub encoded: i64,
    /// Whether `label` came from the label mapping
    pub decoded: bool,
}

impl Prediction {
    /// Label shown for a class code the mapping does not know
    pub fn fallback_label(encoded: i64) -> String {
        format!("Unknown ({})", encoded)
    }
}

/// Result of inference operation
#[derive(Debug, Clone)]
pub struct InferenceResult {
    /// The prediction
    pub prediction: Prediction,
    /// Inference latency in milliseconds
    pub latency_ms: f64,
}

/// Runs the artifact's classifier on reconstructed feature rows
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    artifact: Arc<ModelArtifact>,
}

impl InferenceEngine {
    /// Create a new inference engine
    pub fn new(artifact: Arc<ModelArtifact>) -> Self {
        info!(
            "Creating inference engine: model={}, features={}",
            artifact.classifier.kind(),
            artifact.classifier.n_features()
        );
        Self { artifact }
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    /// Feature names stored in the artifact, if any
    pub fn feature_names(&self) -> Option<&[String]> {
        self.artifact.feature_names.as_deref()
    }

    /// Classify one row and decode the result
    pub fn predict(&self, row: &FeatureRow) -> Result<InferenceResult, InferenceError> {
        let start = Instant::now();
        let classifier = &self.artifact.classifier;

        if row.len() != classifier.n_features() {
            return Err(InferenceError::InvalidInputShape {
                expected: classifier.n_features(),
                actual: row.len(),
            });
        }
        if let Some(expected) = self.feature_names() {
            if let Some((i, (want, got))) = expected
                .iter()
                .zip(row.names())
                .enumerate()
                .find(|(_, (want, got))| want != got)
            {
                return Err(InferenceError::InferenceFailed(format!(
                    "feature {} is '{}', model expects '{}'",
                    i, got, want
                )));
            }
        }

        let encoded = classifier
            .predict(&[row.values().to_vec()])?
            .first()
            .copied()
            .ok_or_else(|| InferenceError::InferenceFailed("classifier returned no prediction".to_string()))?;

        let prediction = self.decode(encoded);
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!(
            "Prediction: {} (code={}, latency={:.3}ms)",
            prediction.label, prediction.encoded, latency_ms
        );

        Ok(InferenceResult {
            prediction,
            latency_ms,
        })
    }

    /// Map a class code to its label, falling back to an echo of the code
    pub fn decode(&self, encoded: i64) -> Prediction {
        match self.artifact.labels.decode(encoded) {
            Some(label) => Prediction {
                label: label.to_string(),
                encoded,
                decoded: true,
            },
            None => {
                warn!("Class code {} has no label mapping", encoded);
                Prediction {
                    label: Prediction::fallback_label(encoded),
                    encoded,
                    decoded: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_validator::ApprenticeInput;
    use feature_engine::{FeatureMapping, FeatureReconstructor, ReferenceDataset};

    const DATASET: &str = "Edad,Cantidad de quejas,Estrato,Estado Aprendiz\n\
                           20,0,2,Activo\n\
                           40,4,4,Cancelado\n";

    // Complaints above 2.5 map to code 1; code 2 has no label
    fn artifact(leaf_high: i64, names: Option<&str>) -> Arc<ModelArtifact> {
        let names = names
            .map(|n| format!(r#", "feature_names": {}"#, n))
            .unwrap_or_default();
        let json = format!(
            r#"{{
                "model": {{
                    "type": "decision_tree",
                    "n_features": 3,
                    "nodes": [
                        {{"split": {{"feature": 1, "threshold": 2.5, "left": 1, "right": 2}}}},
                        {{"leaf": {{"class": 0}}}},
                        {{"leaf": {{"class": {}}}}}
                    ]
                }},
                "label_encoder_mapping": {{"0": "Activo", "1": "Cancelado"}}{}
            }}"#,
            leaf_high, names
        );
        Arc::new(ModelArtifact::from_json(&json).unwrap())
    }

    fn row(complaints: i64, expected: &[String]) -> FeatureRow {
        let dataset = ReferenceDataset::from_csv_reader(DATASET.as_bytes()).unwrap();
        let rec = FeatureReconstructor::from_dataset(&dataset, "Estado Aprendiz", &FeatureMapping::default())
            .unwrap();
        let input = ApprenticeInput {
            age: 25,
            complaints,
            stratum: 2,
        };
        rec.reconstruct(&input, expected).unwrap()
    }

    fn default_names() -> Vec<String> {
        vec!["Edad".into(), "Cantidad de quejas".into(), "Estrato".into()]
    }

    #[test]
    fn test_decoded_prediction() {
        let engine = InferenceEngine::new(artifact(1, None));

        let result = engine.predict(&row(0, &default_names())).unwrap();
        assert_eq!(result.prediction.label, "Activo");
        assert!(result.prediction.decoded);

        let result = engine.predict(&row(5, &default_names())).unwrap();
        assert_eq!(result.prediction.label, "Cancelado");
        assert_eq!(result.prediction.encoded, 1);
    }

    #[test]
    fn test_unmapped_code_falls_back() {
        let engine = InferenceEngine::new(artifact(2, None));
        let result = engine.predict(&row(5, &default_names())).unwrap();
        assert_eq!(result.prediction.label, "Unknown (2)");
        assert_eq!(result.prediction.encoded, 2);
        assert!(!result.prediction.decoded);
    }

    #[test]
    fn test_row_width_checked() {
        let engine = InferenceEngine::new(artifact(1, None));
        let short = row(0, &["Edad".to_string(), "Estrato".to_string()]);
        assert!(matches!(
            engine.predict(&short),
            Err(InferenceError::InvalidInputShape {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_feature_order_checked_against_artifact() {
        let engine = InferenceEngine::new(artifact(
            1,
            Some(r#"["Edad", "Cantidad de quejas", "Estrato"]"#),
        ));
        assert_eq!(engine.feature_names().map(<[String]>::len), Some(3));

        let swapped = vec!["Estrato".into(), "Cantidad de quejas".into(), "Edad".into()];
        assert!(matches!(
            engine.predict(&row(0, &swapped)),
            Err(InferenceError::InferenceFailed(_))
        ));
        assert!(engine.predict(&row(0, &default_names())).is_ok());
    }
}
