//! Health and input schema endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub generative_service: bool,
    pub model: Option<String>,
    pub classifier: String,
    pub selected_features: usize,
    pub dataset_rows: Option<usize>,
}

/// GET /api/health
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        generative_service: state.generator.is_generative(),
        model: state.generator.model_id().map(str::to_string),
        classifier: state.model.classifier().kind().to_string(),
        selected_features: state.model.whitelist().len(),
        dataset_rows: state.dataset.as_ref().map(|d| d.len()),
    })
}

#[derive(Debug, Serialize)]
pub struct ColumnsResponse {
    pub columns: Vec<String>,
}

/// GET /api/columns - canonical columns a caller must supply
pub async fn columns(State(state): State<SharedState>) -> Json<ColumnsResponse> {
    Json(ColumnsResponse { columns: state.model.required_columns().to_vec() })
}
