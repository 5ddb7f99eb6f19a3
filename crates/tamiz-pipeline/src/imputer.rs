//! Imputer: fills missing and non-finite cells with per-column values
//! learned at training time.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tamiz_common::{ArtifactLoadError, PipelineError};
use tracing::debug;

use crate::features::{DerivedFeatureVector, FeatureVector, ImputedFeatureVector};

/// How the fill values were learned. Informational only; the values are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputationStrategy {
    #[default]
    Mean,
    Median,
    MostFrequent,
    Constant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    #[serde(default)]
    pub strategy: ImputationStrategy,
    columns: Vec<String>,
    fill_values: Vec<f64>,
}

impl Imputer {
    pub fn new(
        strategy: ImputationStrategy,
        columns: Vec<String>,
        fill_values: Vec<f64>,
    ) -> Result<Self, ArtifactLoadError> {
        let imputer = Self { strategy, columns, fill_values };
        imputer.validate()?;
        Ok(imputer)
    }

    /// Shape checks; run again after deserialisation.
    pub fn validate(&self) -> Result<(), ArtifactLoadError> {
        if self.columns.len() != self.fill_values.len() {
            return Err(ArtifactLoadError::invalid(
                "imputer",
                format!("{} columns but {} fill values", self.columns.len(), self.fill_values.len()),
            ));
        }
        if let Some(i) = self.fill_values.iter().position(|v| !v.is_finite()) {
            return Err(ArtifactLoadError::invalid(
                "imputer",
                format!("fill value for '{}' is not finite", self.columns[i]),
            ));
        }
        let unique: BTreeSet<&str> = self.columns.iter().map(String::as_str).collect();
        if unique.len() != self.columns.len() {
            return Err(ArtifactLoadError::invalid("imputer", "duplicate column names"));
        }
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn fill_value(&self, column: &str) -> Option<f64> {
        self.columns.iter().position(|c| c == column).map(|i| self.fill_values[i])
    }

    /// Describes how `names` differs from the fitted column set, if it does.
    pub fn column_mismatch(&self, names: &[String]) -> Option<String> {
        let fitted: BTreeSet<&str> = self.columns.iter().map(String::as_str).collect();
        let given: BTreeSet<&str> = names.iter().map(String::as_str).collect();
        if fitted == given && names.len() == self.columns.len() {
            return None;
        }
        let missing: Vec<&str> = fitted.difference(&given).copied().collect();
        let unexpected: Vec<&str> = given.difference(&fitted).copied().collect();
        Some(format!("missing {missing:?}, unexpected {unexpected:?}"))
    }

    /// ±inf → 0.0 first, then NaN → the column's fill value.
    pub fn transform(&self, input: &DerivedFeatureVector) -> Result<ImputedFeatureVector, PipelineError> {
        if let Some(reason) = self.column_mismatch(input.names()) {
            return Err(PipelineError::ColumnMismatch(reason));
        }

        let mut out = FeatureVector::with_capacity(input.len());
        let mut filled = 0usize;
        for (name, value) in input.iter() {
            let mut v = if value.is_infinite() { 0.0 } else { value };
            if v.is_nan() {
                filled += 1;
                // Column sets were checked above.
                v = self.fill_value(name).unwrap_or(0.0);
            }
            out.push(name, v);
        }
        if filled > 0 {
            debug!(filled, strategy = ?self.strategy, "Imputed missing cells");
        }

        Ok(ImputedFeatureVector::from_inner(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tamiz_common::RawRecord;
    use crate::engineering::FeatureEngineer;
    use crate::normalizer::ColumnNormalizer;

    const COLUMNS: [&str; 10] = [
        "radio_media", "textura_media", "perimetro_media", "area_media",
        "suavidad_media", "simetria_media", "error_estandar_radio",
        "error_estandar_area", "peor_radio", "peor_area",
    ];

    fn engineer() -> FeatureEngineer {
        FeatureEngineer::new(COLUMNS.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    fn imputer_for(fe: &FeatureEngineer) -> Imputer {
        let fills = (0..fe.output_columns().len()).map(|i| i as f64 + 0.5).collect();
        Imputer::new(ImputationStrategy::Median, fe.output_columns().to_vec(), fills).unwrap()
    }

    fn derived(overrides: &[(&str, f64)]) -> DerivedFeatureVector {
        let fe = engineer();
        let normalizer =
            ColumnNormalizer::new(Default::default(), vec![], fe.input_columns().to_vec()).unwrap();
        let mut record: RawRecord = COLUMNS.iter().map(|c| (*c, 1.0)).collect();
        for (k, v) in overrides {
            record.insert(*k, *v);
        }
        fe.transform(&normalizer.normalize(&record).unwrap())
    }

    #[test]
    fn test_nan_filled_with_column_value() {
        let fe = engineer();
        let imputer = imputer_for(&fe);
        let out = imputer.transform(&derived(&[("textura_media", f64::NAN)])).unwrap();
        assert_eq!(out.get("textura_media"), Some(1.5));
        assert!(out.is_finite());
    }

    #[test]
    fn test_infinity_becomes_zero_not_fill_value() {
        let fe = engineer();
        let imputer = imputer_for(&fe);
        let out = imputer
            .transform(&derived(&[("peor_radio", f64::INFINITY), ("peor_area", f64::NEG_INFINITY)]))
            .unwrap();
        assert_eq!(out.get("peor_radio"), Some(0.0));
        assert_eq!(out.get("peor_area"), Some(0.0));
        assert!(out.is_finite());
    }

    #[test]
    fn test_non_numeric_input_propagates_then_fills() {
        let fe = engineer();
        let imputer = imputer_for(&fe);
        // NaN area poisons every ratio over it; all must come out finite.
        let out = imputer.transform(&derived(&[("area_media", f64::NAN)])).unwrap();
        assert!(out.is_finite());
        assert_eq!(out.names(), fe.output_columns());
    }

    #[test]
    fn test_column_mismatch_is_configuration_error() {
        let fe = engineer();
        let mut cols = fe.output_columns().to_vec();
        cols.pop();
        cols.push("extra".to_string());
        let fills = vec![0.0; cols.len()];
        let imputer = Imputer::new(ImputationStrategy::Mean, cols, fills).unwrap();
        let err = imputer.transform(&derived(&[])).unwrap_err();
        assert!(matches!(err, PipelineError::ColumnMismatch(_)));
        assert!(!err.is_user_facing());
    }

    #[test]
    fn test_non_finite_fill_value_rejected() {
        let result = Imputer::new(ImputationStrategy::Mean, vec!["a".into()], vec![f64::NAN]);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialises_artifact_shape() {
        let json = r#"{"strategy": "median", "columns": ["a", "b"], "fill_values": [1.0, 2.0]}"#;
        let imputer: Imputer = serde_json::from_str(json).unwrap();
        imputer.validate().unwrap();
        assert_eq!(imputer.strategy, ImputationStrategy::Median);
        assert_eq!(imputer.fill_value("b"), Some(2.0));
    }
}
