//! Feature engineering: derived ratios, differences and products.
//!
//! Ratios use safe division: a zero denominator yields exactly 0.0, never
//! NaN or ±inf.

use serde::{Deserialize, Serialize};
use tamiz_common::ArtifactLoadError;
use tracing::debug;

use crate::features::{CanonicalFeatureVector, DerivedFeatureVector, FeatureVector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedKind {
    SafeRatio,
    Difference,
    Product,
}

/// One derived column: `left (op) right` over canonical columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedFeature {
    pub name: &'static str,
    pub kind: DerivedKind,
    pub left: &'static str,
    pub right: &'static str,
}

impl DerivedFeature {
    const fn new(name: &'static str, kind: DerivedKind, left: &'static str, right: &'static str) -> Self {
        Self { name, kind, left, right }
    }

    pub fn compute(&self, left: f64, right: f64) -> f64 {
        match self.kind {
            DerivedKind::SafeRatio  => safe_divide(left, right),
            DerivedKind::Difference => left - right,
            DerivedKind::Product    => left * right,
        }
    }
}

/// Derived columns, appended after the canonical ones in this order.
pub const DERIVED_FEATURES: [DerivedFeature; 9] = [
    DerivedFeature::new("ratio_perimetro_area",  DerivedKind::SafeRatio,  "perimetro_media",      "area_media"),
    DerivedFeature::new("ratio_radio_area",      DerivedKind::SafeRatio,  "radio_media",          "area_media"),
    DerivedFeature::new("ratio_peor_media_area", DerivedKind::SafeRatio,  "peor_area",            "area_media"),
    DerivedFeature::new("rel_error_area",        DerivedKind::SafeRatio,  "error_estandar_area",  "area_media"),
    DerivedFeature::new("rel_error_radio",       DerivedKind::SafeRatio,  "error_estandar_radio", "radio_media"),
    DerivedFeature::new("dif_peor_media_area",   DerivedKind::Difference, "peor_area",            "area_media"),
    DerivedFeature::new("dif_peor_media_radio",  DerivedKind::Difference, "peor_radio",           "radio_media"),
    DerivedFeature::new("area_x_perimetro",      DerivedKind::Product,    "area_media",           "perimetro_media"),
    DerivedFeature::new("suavidad_x_simetria",   DerivedKind::Product,    "suavidad_media",       "simetria_media"),
];

/// `a / b`, or exactly 0.0 when `b == 0`.
pub fn safe_divide(a: f64, b: f64) -> f64 {
    if b == 0.0 { 0.0 } else { a / b }
}

/// Serialised form of the fitted transformer: the canonical column order seen at fit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformerArtifact {
    pub feature_names: Vec<String>,
}

/// Fitted feature-engineering transformer.
///
/// Remembers both its canonical input order and its full output order
/// (canonical + derived) from load time, so later stages never re-derive
/// column names.
#[derive(Debug, Clone)]
pub struct FeatureEngineer {
    input_columns: Vec<String>,
    output_columns: Vec<String>,
}

impl FeatureEngineer {
    pub fn new(input_columns: Vec<String>) -> Result<Self, ArtifactLoadError> {
        for (i, col) in input_columns.iter().enumerate() {
            if input_columns[..i].contains(col) {
                return Err(ArtifactLoadError::invalid(
                    "feature_engineering_transformer",
                    format!("duplicate input column '{col}'"),
                ));
            }
        }

        for feature in &DERIVED_FEATURES {
            for operand in [feature.left, feature.right] {
                if !input_columns.iter().any(|c| c == operand) {
                    return Err(ArtifactLoadError::invalid(
                        "feature_engineering_transformer",
                        format!("derived column '{}' needs missing input '{operand}'", feature.name),
                    ));
                }
            }
            if input_columns.iter().any(|c| c == feature.name) {
                return Err(ArtifactLoadError::invalid(
                    "feature_engineering_transformer",
                    format!("input column '{}' collides with a derived column", feature.name),
                ));
            }
        }

        let output_columns = input_columns
            .iter()
            .cloned()
            .chain(DERIVED_FEATURES.iter().map(|f| f.name.to_string()))
            .collect();

        Ok(Self { input_columns, output_columns })
    }

    pub fn from_artifact(artifact: TransformerArtifact) -> Result<Self, ArtifactLoadError> {
        Self::new(artifact.feature_names)
    }

    pub fn input_columns(&self) -> &[String] {
        &self.input_columns
    }

    pub fn output_columns(&self) -> &[String] {
        &self.output_columns
    }

    /// Canonical columns plus every derived column, in `output_columns` order.
    pub fn transform(&self, canonical: &CanonicalFeatureVector) -> DerivedFeatureVector {
        let mut out = FeatureVector::with_capacity(self.output_columns.len());
        for col in &self.input_columns {
            out.push(col.clone(), canonical.get(col).unwrap_or(f64::NAN));
        }

        for feature in &DERIVED_FEATURES {
            let left = canonical.get(feature.left).unwrap_or(f64::NAN);
            let right = canonical.get(feature.right).unwrap_or(f64::NAN);
            if feature.kind == DerivedKind::SafeRatio && right == 0.0 {
                debug!(column = feature.name, denominator = feature.right, "Zero denominator, ratio set to 0");
            }
            out.push(feature.name, feature.compute(left, right));
        }

        DerivedFeatureVector::from_inner(out)
    }
}
