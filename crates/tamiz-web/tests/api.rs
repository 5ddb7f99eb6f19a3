//! HTTP surface driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::Value;
use tamiz_common::config::RecommendationConfig;
use tamiz_llm::fallback::BENIGN_TEMPLATE;
use tamiz_llm::RecommendationGenerator;
use tamiz_pipeline::dataset::ReferenceDataset;
use tamiz_test_utils::{context_with, sample_context, write_dataset, MockClassifier, CANONICAL_COLUMNS};
use tamiz_web::router::build_router;
use tamiz_web::state::AppState;
use tower::ServiceExt;

fn app() -> Router {
    let generator = RecommendationGenerator::fallback_only(&RecommendationConfig::default());
    build_router(AppState::new(sample_context(), generator))
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.expect("request");
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("request")
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn benign_body() -> Value {
    serde_json::json!({
        "radius_mean": 11.5, "textura_media": 17.2, "perimeter_mean": 73.0,
        "area_mean": "410", "suavidad_media": 0.09, "simetria_media": 0.17,
        "error_estandar_radio": 0.25, "area_se": 18.0, "peor_radio": 12.6,
        "area_worst": 500.0
    })
}

#[tokio::test]
async fn health_reports_fallback_mode() {
    let (status, body) = call(app(), get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["generative_service"], false);
    assert_eq!(body["classifier"], "logistic_regression");
    assert_eq!(body["selected_features"], 7);
}

#[tokio::test]
async fn columns_lists_canonical_inputs() {
    let (status, body) = call(app(), get("/api/columns")).await;
    assert_eq!(status, StatusCode::OK);
    let columns: Vec<String> = serde_json::from_value(body["columns"].clone()).unwrap();
    assert_eq!(columns, CANONICAL_COLUMNS.iter().map(|s| s.to_string()).collect::<Vec<_>>());
}

#[tokio::test]
async fn predict_returns_prediction_and_fallback_recommendation() {
    let (status, body) = call(app(), post_json("/api/predict", benign_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"]["diagnosis"], "Benigno");
    let p = &body["prediction"]["probabilities"];
    let total = p["Benigno"].as_f64().unwrap() + p["Maligno"].as_f64().unwrap();
    assert!((total - 1.0).abs() < 1e-6);
    assert_eq!(body["recommendation"]["source"], "fallback");
    assert_eq!(body["recommendation"]["text"], BENIGN_TEMPLATE);
}

#[tokio::test]
async fn missing_columns_default_to_zero_at_the_boundary() {
    let (status, body) = call(app(), post_json("/api/predict", serde_json::json!({"radio_media": 12.0}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["prediction"]["confidence"].as_f64().unwrap() >= 50.0);
}

#[tokio::test]
async fn missing_columns_are_422_when_defaulting_is_off() {
    let generator = RecommendationGenerator::fallback_only(&RecommendationConfig::default());
    let app = build_router(AppState::new(sample_context(), generator).with_fill_missing_with_zero(false));

    let mut body = benign_body();
    body.as_object_mut().unwrap().remove("area_se");
    let (status, body) = call(app, post_json("/api/predict", body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Missing required columns: error_estandar_area");
    assert_eq!(body["missing"], serde_json::json!(["error_estandar_area"]));
}

#[tokio::test]
async fn classifier_failure_is_opaque_500() {
    let generator = RecommendationGenerator::fallback_only(&RecommendationConfig::default());
    let ctx = context_with(Arc::new(MockClassifier::failing("weights file truncated")));
    let app = build_router(AppState::new(ctx, generator));

    let (status, body) = call(app, post_json("/api/predict", benign_body())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal inference error");
    assert!(!body.to_string().contains("truncated"));
}

#[tokio::test]
async fn demo_patient_list_and_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dataset(dir.path()).unwrap();
    let dataset = ReferenceDataset::load(&path, "id_paciente", ';').unwrap();
    let generator = RecommendationGenerator::fallback_only(&RecommendationConfig::default());
    let app = build_router(AppState::new(sample_context(), generator).with_dataset(dataset));

    let (status, list) = call(app.clone(), get("/api/patients")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 100);
    assert_eq!(list[0]["id"], "10100");
    assert_eq!(list[0]["label"], "Datos de prueba 1");

    let (status, patient) = call(app.clone(), get("/api/patients/10101")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patient["radio_media"], 20.5);
    assert_eq!(patient["peor_area"], 0.0);
    assert_eq!(patient.as_object().unwrap().len(), CANONICAL_COLUMNS.len());

    let (status, _) = call(app, get("/api/patients/424242")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patient_lookup_without_dataset_is_404() {
    let (status, body) = call(app(), get("/api/patients/10100")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Unknown patient id '10100'");
}
