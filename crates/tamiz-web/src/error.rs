//! API error type and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tamiz_common::PipelineError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Unknown patient id '{0}'")]
    PatientNotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Pipeline(PipelineError::MissingColumns { ref missing }) => {
                let body = serde_json::json!({ "error": self.to_string(), "missing": missing });
                (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
            }
            ApiError::Pipeline(e) => {
                error!(error = %e, "Inference failed");
                let body = serde_json::json!({ "error": e.public_message() });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
            ApiError::PatientNotFound(_) => {
                let body = serde_json::json!({ "error": self.to_string() });
                (StatusCode::NOT_FOUND, Json(body)).into_response()
            }
        }
    }
}
