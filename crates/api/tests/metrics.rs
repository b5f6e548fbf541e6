//! Prometheus exposition with the recorder installed
//!
//! Kept in its own test binary: the recorder is process-global.

use apprentice_api::rate_limit::RateLimitConfig;
use apprentice_api::{create_router, AppState, PredictionService};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use data_validator::InputLimits;
use feature_engine::{FeatureMapping, ReferenceDataset};
use inference_engine::ModelArtifact;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let artifact = json!({
        "model": {
            "type": "decision_tree",
            "n_features": 3,
            "nodes": [
                {"split": {"feature": 1, "threshold": 2.5, "left": 1, "right": 2}},
                {"leaf": {"class": 0}},
                {"leaf": {"class": 1}}
            ]
        },
        "label_encoder_mapping": {"0": "Activo", "1": "Cancelado"}
    });
    let dataset = ReferenceDataset::from_csv_reader(
        "Edad,Cantidad de quejas,Estrato,Estado Aprendiz\n20,0,2,Activo\n40,4,4,Cancelado\n".as_bytes(),
    )
    .unwrap();

    let service = PredictionService::from_parts(
        Arc::new(ModelArtifact::from_json(&artifact.to_string()).unwrap()),
        &dataset,
        "Estado Aprendiz",
        &FeatureMapping::default(),
        InputLimits::default(),
    )
    .unwrap();

    let handle = PrometheusBuilder::new().install_recorder().unwrap();
    let state = Arc::new(AppState::new(service, Some(handle)));
    create_router(state, &RateLimitConfig::default()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn predict_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/predict")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_metrics_record_predictions() {
    let app = app();

    let (status, _) = send(
        app.clone(),
        predict_request(json!({"age": 25, "complaints": 0, "stratum": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        app.clone(),
        predict_request(json!({"age": 5, "complaints": 0, "stratum": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, text) = send(
        app,
        Request::builder().uri("/metrics").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(text.contains(r#"predictions_total{outcome="ok"} 1"#));
    assert!(text.contains(r#"predictions_total{outcome="invalid_input"} 1"#));
    assert!(text.contains("prediction_latency_seconds"));
}
