//! Result formatter: raw label and probability vector → domain vocabulary.

use tamiz_common::{ClassProbabilities, Diagnosis, LabelIndexMap, PipelineError, PredictionResult};

use crate::classifier::RawPrediction;

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn format_prediction(
    raw: &RawPrediction,
    label_map: &LabelIndexMap,
) -> Result<PredictionResult, PipelineError> {
    let at = |diagnosis: Diagnosis| {
        let index = label_map.index_of(diagnosis);
        raw.probabilities.get(index).copied().ok_or_else(|| {
            PipelineError::MalformedPrediction(format!(
                "label map index {index} outside {} probabilities",
                raw.probabilities.len()
            ))
        })
    };

    let probabilities = ClassProbabilities {
        benigno: at(Diagnosis::Benigno)?,
        maligno: at(Diagnosis::Maligno)?,
    };
    let max = raw.probabilities.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Ok(PredictionResult {
        diagnosis: Diagnosis::from_raw_label(raw.label),
        probabilities,
        confidence: round_to(max * 100.0, 2),
    })
}
