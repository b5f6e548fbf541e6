//! Prediction Routes

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use data_validator::ApprenticeInput;
use feature_engine::FeatureRow;
use metrics::{counter, histogram};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::error::ServiceError;
use crate::AppState;

/// Response for the predict endpoint
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    /// Decoded label, or "Unknown (<code>)"
    pub label: String,
    pub encoded: i64,
    pub decoded: bool,
    /// Values used for the prediction
    pub inputs: ApprenticeInput,
    /// Full row handed to the classifier, in model order
    pub features: FeatureRow,
    pub latency_ms: f64,
}

/// Predict the apprentice status for the submitted values
pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ApprenticeInput>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ServiceError> {
    let result = payload
        .map_err(ServiceError::from)
        .and_then(|Json(input)| state.service.predict(&input));

    match result {
        Ok(outcome) => {
            let outcome_label = if outcome.prediction.decoded {
                "ok"
            } else {
                "unknown_label"
            };
            counter!("predictions_total", "outcome" => outcome_label).increment(1);
            histogram!("prediction_latency_seconds").record(outcome.latency_ms / 1000.0);

            Ok(Json(PredictionResponse {
                label: outcome.prediction.label,
                encoded: outcome.prediction.encoded,
                decoded: outcome.prediction.decoded,
                inputs: outcome.inputs,
                features: outcome.features,
                latency_ms: outcome.latency_ms,
            }))
        }
        Err(e) => {
            warn!(kind = e.kind(), "Prediction failed: {}", e);
            counter!("predictions_total", "outcome" => e.kind()).increment(1);
            Err(e)
        }
    }
}
