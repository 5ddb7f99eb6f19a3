//! Feature selector: projection onto the trained feature whitelist.

use serde::{Deserialize, Serialize};
use tamiz_common::ArtifactLoadError;
use tracing::debug;

use crate::features::{FeatureVector, ImputedFeatureVector, SelectedFeatureVector};

/// Ordered list of the features the classifier was fitted on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureWhitelist(Vec<String>);

impl FeatureWhitelist {
    pub fn new(names: Vec<String>) -> Result<Self, ArtifactLoadError> {
        let whitelist = Self(names);
        whitelist.validate()?;
        Ok(whitelist)
    }

    pub fn validate(&self) -> Result<(), ArtifactLoadError> {
        if self.0.is_empty() {
            return Err(ArtifactLoadError::invalid("selected_features", "whitelist is empty"));
        }
        for (i, name) in self.0.iter().enumerate() {
            if self.0[..i].contains(name) {
                return Err(ArtifactLoadError::invalid(
                    "selected_features",
                    format!("duplicate feature '{name}'"),
                ));
            }
        }
        Ok(())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Exactly the whitelist, in whitelist order; absent features are synthesised as 0.0.
    pub fn select(&self, input: &ImputedFeatureVector) -> SelectedFeatureVector {
        let mut out = FeatureVector::with_capacity(self.0.len());
        let mut synthesised = Vec::new();
        for name in &self.0 {
            let value = match input.get(name) {
                Some(v) => v,
                None => {
                    synthesised.push(name.as_str());
                    0.0
                }
            };
            out.push(name.clone(), value);
        }
        if !synthesised.is_empty() {
            debug!(?synthesised, "Whitelisted features absent upstream, set to 0");
        }
        SelectedFeatureVector::from_inner(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imputer::{ImputationStrategy, Imputer};
    use crate::engineering::FeatureEngineer;
    use crate::normalizer::ColumnNormalizer;
    use tamiz_common::RawRecord;

    const COLUMNS: [&str; 10] = [
        "radio_media", "textura_media", "perimetro_media", "area_media",
        "suavidad_media", "simetria_media", "error_estandar_radio",
        "error_estandar_area", "peor_radio", "peor_area",
    ];

    fn imputed() -> ImputedFeatureVector {
        let fe = FeatureEngineer::new(COLUMNS.iter().map(|s| s.to_string()).collect()).unwrap();
        let normalizer =
            ColumnNormalizer::new(Default::default(), vec![], fe.input_columns().to_vec()).unwrap();
        let record: RawRecord = COLUMNS.iter().enumerate().map(|(i, c)| (*c, i as f64 + 1.0)).collect();
        let imputer = Imputer::new(
            ImputationStrategy::Mean,
            fe.output_columns().to_vec(),
            vec![0.0; fe.output_columns().len()],
        )
        .unwrap();
        imputer.transform(&fe.transform(&normalizer.normalize(&record).unwrap())).unwrap()
    }

    #[test]
    fn test_projects_in_whitelist_order() {
        let wl = FeatureWhitelist::new(vec![
            "peor_area".into(),
            "ratio_radio_area".into(),
            "radio_media".into(),
        ])
        .unwrap();
        let out = wl.select(&imputed());
        assert_eq!(out.names(), wl.names());
        assert_eq!(out.values()[0], 10.0);
        assert_eq!(out.values()[1], 1.0 / 4.0);
        assert_eq!(out.values()[2], 1.0);
    }

    #[test]
    fn test_absent_feature_synthesised_as_zero() {
        let wl = FeatureWhitelist::new(vec!["radio_media".into(), "concavidad_media".into()]).unwrap();
        let out = wl.select(&imputed());
        assert_eq!(out.len(), 2);
        assert_eq!(out.get("concavidad_media"), Some(0.0));
    }

    #[test]
    fn test_invalid_whitelists_rejected() {
        assert!(FeatureWhitelist::new(vec![]).is_err());
        assert!(FeatureWhitelist::new(vec!["a".into(), "a".into()]).is_err());
    }
}
