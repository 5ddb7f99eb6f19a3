//! Prediction endpoint: pipeline, then recommendation.

use axum::{extract::State, Json};
use serde::Serialize;
use tamiz_common::{PredictionResult, RawRecord, RawValue, Recommendation};
use tracing::debug;

use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: PredictionResult,
    pub recommendation: Recommendation,
}

/// POST /api/predict - body is a JSON object of column → value
pub async fn predict(
    State(state): State<SharedState>,
    Json(mut record): Json<RawRecord>,
) -> Result<Json<PredictResponse>, ApiError> {
    if state.fill_missing_with_zero {
        let missing = state.model.normalizer().missing_columns(&record);
        if !missing.is_empty() {
            debug!(?missing, "Defaulting absent input columns to 0");
        }
        for column in missing {
            record.insert(column, RawValue::Number(0.0));
        }
    }

    let prediction = tamiz_pipeline::predict(&state.model, &record)?;
    let recommendation = state.generator.recommend(&prediction).await;

    Ok(Json(PredictResponse { prediction, recommendation }))
}
