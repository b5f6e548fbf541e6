//! Service Error Types

use axum::{extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse, Json};
use data_validator::ValidationError;
use feature_engine::FeatureError;
use inference_engine::InferenceError;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the prediction service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Malformed request body: {0}")]
    MalformedBody(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Feature(#[from] FeatureError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl ServiceError {
    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Config(_) => "configuration",
            ServiceError::Validation(_) | ServiceError::MalformedBody(_) => "invalid_input",
            ServiceError::Feature(FeatureError::DatasetLoad(_)) => "dataset_load",
            ServiceError::Feature(FeatureError::TargetColumnNotFound { .. }) => "target_column_not_found",
            ServiceError::Feature(FeatureError::AmbiguousColumn { .. })
            | ServiceError::Feature(FeatureError::ConflictingMapping { .. }) => "ambiguous_column",
            ServiceError::Feature(FeatureError::FeatureColumnMismatch { .. })
            | ServiceError::Feature(FeatureError::NonNumericColumn(_))
            | ServiceError::Inference(InferenceError::InvalidInputShape { .. }) => "feature_column_mismatch",
            ServiceError::Inference(InferenceError::ArtifactLoad { .. })
            | ServiceError::Inference(InferenceError::MissingKey(_))
            | ServiceError::Inference(InferenceError::InvalidArtifact(_)) => "artifact_load",
            ServiceError::Inference(InferenceError::InferenceFailed(_)) => "prediction_failed",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) | ServiceError::MalformedBody(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "The submitted values are outside the allowed ranges",
            ServiceError::MalformedBody(_) => "The request body is not a valid prediction input",
            _ => "Error making the prediction",
        }
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::MalformedBody(rejection.body_text())
    }
}

/// JSON body returned for failed requests
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: &'static str,
    pub detail: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let body = ErrorResponse {
            error: self.kind(),
            message: self.message(),
            detail: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_and_status() {
        let err = ServiceError::from(ValidationError::OutOfRange {
            field: "age",
            value: 5,
            min: 18,
            max: 100,
        });
        assert_eq!(err.kind(), "invalid_input");
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = ServiceError::from(FeatureError::FeatureColumnMismatch {
            missing: vec!["Sede".to_string()],
        });
        assert_eq!(err.kind(), "feature_column_mismatch");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("Sede"));

        let err = ServiceError::MalformedBody("age: invalid type".to_string());
        assert_eq!(err.kind(), "invalid_input");
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = ServiceError::from(InferenceError::MissingKey("label_encoder_mapping"));
        assert_eq!(err.kind(), "artifact_load");
    }
}
