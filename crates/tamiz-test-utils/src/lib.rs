//! Shared fixtures for tamiz integration tests: a complete in-memory model
//! context, sample records, a scripted classifier and on-disk writers.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tamiz_common::config::ArtifactsConfig;
use tamiz_common::{LabelIndexMap, RawRecord};
use tamiz_pipeline::classifier::{ClassifierError, ModelArtifact, StandardScaler};
use tamiz_pipeline::engineering::TransformerArtifact;
use tamiz_pipeline::imputer::{ImputationStrategy, Imputer};
use tamiz_pipeline::selector::FeatureWhitelist;
use tamiz_pipeline::{Classifier, LogisticRegression, ModelContext, ModelParts, RawPrediction};

/// Canonical measurement columns, in transformer input order.
pub const CANONICAL_COLUMNS: [&str; 10] = [
    "radio_media",
    "textura_media",
    "perimetro_media",
    "area_media",
    "suavidad_media",
    "simetria_media",
    "error_estandar_radio",
    "error_estandar_area",
    "peor_radio",
    "peor_area",
];

/// Features the sample model was fitted on. `puntos_concavos_media` is never
/// produced upstream and is synthesised by the selector.
pub const SELECTED_FEATURES: [&str; 7] = [
    "radio_media",
    "area_media",
    "peor_area",
    "ratio_radio_area",
    "dif_peor_media_area",
    "suavidad_x_simetria",
    "puntos_concavos_media",
];

pub fn rename_map() -> BTreeMap<String, String> {
    [
        ("radius_mean", "radio_media"),
        ("texture_mean", "textura_media"),
        ("perimeter_mean", "perimetro_media"),
        ("area_mean", "area_media"),
        ("smoothness_mean", "suavidad_media"),
        ("symmetry_mean", "simetria_media"),
        ("radius_se", "error_estandar_radio"),
        ("area_se", "error_estandar_area"),
        ("radius_worst", "peor_radio"),
        ("area_worst", "peor_area"),
    ]
    .into_iter()
    .map(|(raw, canonical)| (raw.to_string(), canonical.to_string()))
    .collect()
}

pub fn drop_columns() -> Vec<String> {
    vec!["id_paciente".to_string(), "diagnostico".to_string()]
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ── Records ───────────────────────────────────────────────────────────────────

/// A benign-looking record using a mix of raw and canonical column names.
pub fn benign_record() -> RawRecord {
    RawRecord::new()
        .with("id_paciente", "10100")
        .with("radius_mean", 11.5)
        .with("textura_media", 17.2)
        .with("perimeter_mean", 73.0)
        .with("area_mean", 410.0)
        .with("suavidad_media", 0.09)
        .with("simetria_media", 0.17)
        .with("error_estandar_radio", 0.25)
        .with("area_se", 18.0)
        .with("peor_radio", 12.6)
        .with("area_worst", "500")
}

/// A malignant-looking record, canonical names only.
pub fn malignant_record() -> RawRecord {
    RawRecord::new()
        .with("radio_media", 20.5)
        .with("textura_media", 24.0)
        .with("perimetro_media", 135.0)
        .with("area_media", 1300.0)
        .with("suavidad_media", 0.11)
        .with("simetria_media", 0.21)
        .with("error_estandar_radio", 0.9)
        .with("error_estandar_area", 110.0)
        .with("peor_radio", 25.0)
        .with("peor_area", 2000.0)
}

// ── Model ─────────────────────────────────────────────────────────────────────

pub fn sample_model() -> LogisticRegression {
    LogisticRegression {
        feature_names: strings(&SELECTED_FEATURES),
        scaler: Some(StandardScaler {
            mean: vec![14.0, 650.0, 880.0, 0.025, 230.0, 0.018, 0.0],
            scale: vec![3.5, 350.0, 570.0, 0.01, 250.0, 0.005, 0.0],
        }),
        coefficients: vec![1.2, 1.5, 1.8, -0.6, 0.9, 0.4, 0.0],
        intercept: -0.3,
        classes: [0, 1],
    }
}

/// Imputer fitted on the transformer output of [`CANONICAL_COLUMNS`].
pub fn sample_imputer() -> Imputer {
    let mut columns = strings(&CANONICAL_COLUMNS);
    let mut fill_values = vec![14.0, 19.0, 92.0, 650.0, 0.096, 0.18, 0.4, 40.0, 16.0, 880.0];
    for (name, fill) in [
        ("ratio_perimetro_area", 0.14),
        ("ratio_radio_area", 0.025),
        ("ratio_peor_media_area", 1.35),
        ("rel_error_area", 0.06),
        ("rel_error_radio", 0.03),
        ("dif_peor_media_area", 230.0),
        ("dif_peor_media_radio", 2.0),
        ("area_x_perimetro", 60_000.0),
        ("suavidad_x_simetria", 0.018),
    ] {
        columns.push(name.to_string());
        fill_values.push(fill);
    }
    Imputer::new(ImputationStrategy::Mean, columns, fill_values).expect("sample imputer is valid")
}

pub fn sample_parts(classifier: Arc<dyn Classifier>) -> ModelParts {
    ModelParts {
        rename_map: rename_map(),
        drop_columns: drop_columns(),
        label_map: LabelIndexMap { benign: 0, malignant: 1 },
        transformer: TransformerArtifact { feature_names: strings(&CANONICAL_COLUMNS) },
        imputer: sample_imputer(),
        whitelist: FeatureWhitelist::new(strings(&SELECTED_FEATURES)).expect("sample whitelist is valid"),
        classifier,
    }
}

/// Context with the shipped logistic-regression sample model.
pub fn sample_context() -> ModelContext {
    context_with(Arc::new(sample_model()))
}

/// Context around any classifier expecting [`SELECTED_FEATURES`].
pub fn context_with(classifier: Arc<dyn Classifier>) -> ModelContext {
    ModelContext::from_parts(sample_parts(classifier)).expect("sample context is consistent")
}

// ── Scripted classifier ───────────────────────────────────────────────────────

/// Classifier that returns a fixed outcome regardless of input.
#[derive(Debug, Clone)]
pub struct MockClassifier {
    pub classes: Vec<u8>,
    pub n_features: usize,
    pub outcome: Result<RawPrediction, String>,
}

impl MockClassifier {
    pub fn returning(label: u8, probabilities: Vec<f64>) -> Self {
        Self {
            classes: vec![0, 1],
            n_features: SELECTED_FEATURES.len(),
            outcome: Ok(RawPrediction { label, probabilities }),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            classes: vec![0, 1],
            n_features: SELECTED_FEATURES.len(),
            outcome: Err(message.into()),
        }
    }

    pub fn with_classes(mut self, classes: Vec<u8>) -> Self {
        self.classes = classes;
        self
    }
}

impl Classifier for MockClassifier {
    fn kind(&self) -> &str {
        "mock"
    }

    fn classes(&self) -> &[u8] {
        &self.classes
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> Result<RawPrediction, ClassifierError> {
        if features.len() != self.n_features {
            return Err(ClassifierError::FeatureCount { expected: self.n_features, found: features.len() });
        }
        self.outcome.clone().map_err(ClassifierError::Evaluation)
    }
}

// ── On-disk fixtures ──────────────────────────────────────────────────────────

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Write the sample artifact bundle into `dir` under the default file names.
pub fn write_artifacts(dir: &Path) -> Result<ArtifactsConfig> {
    let config = ArtifactsConfig::in_dir(dir);
    write_json(&config.path_of(&config.rename_map), &rename_map())?;
    write_json(&config.path_of(&config.drop_columns), &drop_columns())?;
    write_json(&config.path_of(&config.label_map), &LabelIndexMap { benign: 0, malignant: 1 })?;
    write_json(
        &config.path_of(&config.transformer),
        &TransformerArtifact { feature_names: strings(&CANONICAL_COLUMNS) },
    )?;
    write_json(&config.path_of(&config.imputer), &sample_imputer())?;
    write_json(&config.path_of(&config.selected_features), &SELECTED_FEATURES)?;
    write_json(&config.path_of(&config.model), &ModelArtifact::LogisticRegression(sample_model()))?;
    Ok(config)
}

/// Write a two-patient reference dataset (`10100` benign, `10101` malignant).
pub fn write_dataset(dir: &Path) -> Result<PathBuf> {
    let path = dir.join("breast_cancer_dataset_peru.csv");
    let content = "\
id_paciente;radius_mean;textura_media;perimeter_mean;area_mean;suavidad_media;simetria_media;error_estandar_radio;area_se;peor_radio;area_worst;diagnostico
10100;11.5;17.2;73.0;410.0;0.09;0.17;0.25;18.0;12.6;500;B
10101;20.5;24.0;135.0;1300.0;0.11;0.21;0.9;110.0;25.0;;M
";
    std::fs::write(&path, content)?;
    Ok(path)
}
