//! Axum router: maps all URL paths to handlers.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{
    patients::{list_patients, patient_detail},
    predict::predict,
    system::{columns, health},
};
use crate::state::{AppState, SharedState};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    Router::new()
        .route("/api/health",        get(health))
        .route("/api/columns",       get(columns))
        .route("/api/predict",       post(predict))
        .route("/api/patients",      get(list_patients))
        .route("/api/patients/{id}", get(patient_detail))

        // Middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
