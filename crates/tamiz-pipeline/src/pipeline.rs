//! Pipeline entry points.

use serde::Serialize;
use tamiz_common::{PipelineError, PredictionResult, RawRecord};
use tracing::debug;

use crate::artifacts::ModelContext;
use crate::classifier::{classify, RawPrediction};
use crate::features::{
    CanonicalFeatureVector, DerivedFeatureVector, ImputedFeatureVector, SelectedFeatureVector,
};
use crate::formatter::format_prediction;

/// Every intermediate value of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineTrace {
    pub canonical: CanonicalFeatureVector,
    pub derived: DerivedFeatureVector,
    pub imputed: ImputedFeatureVector,
    pub selected: SelectedFeatureVector,
    #[serde(skip)]
    pub raw: RawPrediction,
    pub prediction: PredictionResult,
}

/// Run the full pipeline and keep the intermediate vectors.
pub fn predict_traced(ctx: &ModelContext, record: &RawRecord) -> Result<PipelineTrace, PipelineError> {
    let canonical = ctx.normalizer().normalize(record)?;
    let derived = ctx.engineer().transform(&canonical);
    let imputed = ctx.imputer().transform(&derived)?;
    let selected = ctx.whitelist().select(&imputed);
    let raw = classify(ctx.classifier(), &selected)?;
    let prediction = format_prediction(&raw, ctx.label_map())?;

    debug!(
        diagnosis = %prediction.diagnosis,
        confidence = prediction.confidence,
        "Prediction complete"
    );

    Ok(PipelineTrace { canonical, derived, imputed, selected, raw, prediction })
}

/// raw record → PredictionResult.
pub fn predict(ctx: &ModelContext, record: &RawRecord) -> Result<PredictionResult, PipelineError> {
    predict_traced(ctx, record).map(|trace| trace.prediction)
}
