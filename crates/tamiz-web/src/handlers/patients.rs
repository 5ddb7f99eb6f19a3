//! Demo patients from the reference dataset.

use axum::{
    extract::{Path, State},
    Json,
};
use tamiz_pipeline::dataset::{demo_patient_ids, DemoPatient};
use tamiz_pipeline::FeatureVector;

use crate::error::ApiError;
use crate::state::SharedState;

/// GET /api/patients
pub async fn list_patients() -> Json<Vec<DemoPatient>> {
    Json(demo_patient_ids())
}

/// GET /api/patients/{id} - canonical record, absent cells as 0.0
pub async fn patient_detail(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<FeatureVector>, ApiError> {
    state
        .dataset
        .as_ref()
        .and_then(|ds| ds.lookup(&id, state.model.normalizer()))
        .map(Json)
        .ok_or(ApiError::PatientNotFound(id))
}
