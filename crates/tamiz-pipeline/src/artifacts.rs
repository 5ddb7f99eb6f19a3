//! Artifact bundle loading and the immutable model context.
//!
//! Every artifact is read once at start-up; any failure here is fatal and the
//! service must not start serving requests.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tamiz_common::config::ArtifactsConfig;
use tamiz_common::{ArtifactLoadError, Diagnosis, LabelIndexMap};
use tracing::info;

use crate::classifier::{Classifier, ModelArtifact};
use crate::engineering::{FeatureEngineer, TransformerArtifact};
use crate::imputer::Imputer;
use crate::normalizer::ColumnNormalizer;
use crate::selector::FeatureWhitelist;

/// Raw label each domain class must map to in the classifier's class list.
const RAW_LABEL_BENIGN: u8 = 0;
const RAW_LABEL_MALIGNANT: u8 = 1;

/// Unvalidated pieces of a model context, as deserialised or built in tests.
#[derive(Debug, Clone)]
pub struct ModelParts {
    pub rename_map: BTreeMap<String, String>,
    pub drop_columns: Vec<String>,
    pub label_map: LabelIndexMap,
    pub transformer: TransformerArtifact,
    pub imputer: Imputer,
    pub whitelist: FeatureWhitelist,
    pub classifier: Arc<dyn Classifier>,
}

/// Everything the pipeline reads, loaded once and shared read-only.
#[derive(Debug, Clone)]
pub struct ModelContext {
    normalizer: ColumnNormalizer,
    engineer: FeatureEngineer,
    imputer: Imputer,
    whitelist: FeatureWhitelist,
    label_map: LabelIndexMap,
    classifier: Arc<dyn Classifier>,
}

impl ModelContext {
    /// Assemble a context, running every cross-artifact consistency check.
    pub fn from_parts(parts: ModelParts) -> Result<Self, ArtifactLoadError> {
        let engineer = FeatureEngineer::from_artifact(parts.transformer)?;
        let normalizer = ColumnNormalizer::new(
            parts.rename_map,
            parts.drop_columns,
            engineer.input_columns().to_vec(),
        )?;

        parts.imputer.validate()?;
        if let Some(reason) = parts.imputer.column_mismatch(engineer.output_columns()) {
            return Err(ArtifactLoadError::invalid(
                "imputer",
                format!("fitted columns differ from transformer output: {reason}"),
            ));
        }

        parts.whitelist.validate()?;
        let classifier = parts.classifier;
        if classifier.n_features() != parts.whitelist.len() {
            return Err(ArtifactLoadError::invalid(
                "final_model",
                format!(
                    "model expects {} features, whitelist has {}",
                    classifier.n_features(),
                    parts.whitelist.len()
                ),
            ));
        }
        if let Some(names) = classifier.feature_names() {
            if names != parts.whitelist.names() {
                return Err(ArtifactLoadError::invalid(
                    "final_model",
                    "model feature order differs from the selected features",
                ));
            }
        }

        check_label_map(&parts.label_map, classifier.classes())?;

        Ok(Self {
            normalizer,
            engineer,
            imputer: parts.imputer,
            whitelist: parts.whitelist,
            label_map: parts.label_map,
            classifier,
        })
    }

    /// Load the bundle from the directory and file names in `config`.
    pub fn load(config: &ArtifactsConfig) -> Result<Self, ArtifactLoadError> {
        let model: ModelArtifact = read_json(&config.path_of(&config.model))?;
        let parts = ModelParts {
            rename_map: read_json(&config.path_of(&config.rename_map))?,
            drop_columns: read_json(&config.path_of(&config.drop_columns))?,
            label_map: read_json(&config.path_of(&config.label_map))?,
            transformer: read_json(&config.path_of(&config.transformer))?,
            imputer: read_json(&config.path_of(&config.imputer))?,
            whitelist: read_json(&config.path_of(&config.selected_features))?,
            classifier: model.into_classifier()?,
        };

        let context = Self::from_parts(parts)?;
        info!(
            canonical = context.engineer.input_columns().len(),
            derived = context.engineer.output_columns().len(),
            selected = context.whitelist.len(),
            classifier = context.classifier.kind(),
            "Model context ready"
        );
        Ok(context)
    }

    pub fn normalizer(&self) -> &ColumnNormalizer {
        &self.normalizer
    }

    pub fn engineer(&self) -> &FeatureEngineer {
        &self.engineer
    }

    pub fn imputer(&self) -> &Imputer {
        &self.imputer
    }

    pub fn whitelist(&self) -> &FeatureWhitelist {
        &self.whitelist
    }

    pub fn label_map(&self) -> &LabelIndexMap {
        &self.label_map
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    /// Canonical columns a caller must supply.
    pub fn required_columns(&self) -> &[String] {
        self.normalizer.required_columns()
    }
}

fn check_label_map(map: &LabelIndexMap, classes: &[u8]) -> Result<(), ArtifactLoadError> {
    if map.benign == map.malignant {
        return Err(ArtifactLoadError::invalid("target_encoder", "B and M share an index"));
    }
    for (diagnosis, expected) in [
        (Diagnosis::Benigno, RAW_LABEL_BENIGN),
        (Diagnosis::Maligno, RAW_LABEL_MALIGNANT),
    ] {
        let index = map.index_of(diagnosis);
        match classes.get(index) {
            None => {
                return Err(ArtifactLoadError::invalid(
                    "target_encoder",
                    format!("index {index} for {diagnosis} outside {} classes", classes.len()),
                ))
            }
            Some(&label) if label != expected => {
                return Err(ArtifactLoadError::invalid(
                    "target_encoder",
                    format!("{diagnosis} maps to raw label {label}, expected {expected}"),
                ))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactLoadError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| ArtifactLoadError::Io { path: path.to_path_buf(), source })?;
    let value = serde_json::from_str(&content)
        .map_err(|source| ArtifactLoadError::Parse { path: path.to_path_buf(), source })?;
    info!(path = %path.display(), "Loaded artifact");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_map_must_be_distinct() {
        let map = LabelIndexMap { benign: 0, malignant: 0 };
        assert!(check_label_map(&map, &[0, 1]).is_err());
    }

    #[test]
    fn test_label_map_within_class_count() {
        let map = LabelIndexMap { benign: 0, malignant: 2 };
        assert!(check_label_map(&map, &[0, 1]).is_err());
    }

    #[test]
    fn test_raw_label_convention_enforced() {
        assert!(check_label_map(&LabelIndexMap { benign: 0, malignant: 1 }, &[0, 1]).is_ok());
        assert!(check_label_map(&LabelIndexMap { benign: 1, malignant: 0 }, &[1, 0]).is_ok());
        // B pointing at the raw-1 class would silently invert diagnoses.
        assert!(check_label_map(&LabelIndexMap { benign: 1, malignant: 0 }, &[0, 1]).is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelContext::load(&ArtifactsConfig::in_dir(dir.path())).unwrap_err();
        assert!(matches!(err, ArtifactLoadError::Io { .. }));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = read_json::<Vec<String>>(&path).unwrap_err();
        assert!(matches!(err, ArtifactLoadError::Parse { .. }));
    }
}
