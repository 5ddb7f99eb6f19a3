//! Column normalizer: raw column names → canonical feature names.

use std::collections::{BTreeMap, BTreeSet};

use tamiz_common::{ArtifactLoadError, PipelineError, RawRecord, RawValue};
use tracing::debug;

use crate::features::{CanonicalFeatureVector, FeatureVector};

#[derive(Debug, Clone)]
pub struct ColumnNormalizer {
    rename_map: BTreeMap<String, String>,
    drop_columns: Vec<String>,
    required: Vec<String>,
}

impl ColumnNormalizer {
    /// `required` is the canonical input list the feature-engineering stage was fitted on.
    pub fn new(
        rename_map: BTreeMap<String, String>,
        drop_columns: Vec<String>,
        required: Vec<String>,
    ) -> Result<Self, ArtifactLoadError> {
        if let Some(col) = required.iter().find(|c| drop_columns.contains(c)) {
            return Err(ArtifactLoadError::invalid(
                "columnas_a_eliminar",
                format!("required column '{col}' is also in the drop list"),
            ));
        }
        Ok(Self { rename_map, drop_columns, required })
    }

    pub fn required_columns(&self) -> &[String] {
        &self.required
    }

    pub fn rename_map(&self) -> &BTreeMap<String, String> {
        &self.rename_map
    }

    pub fn drop_columns(&self) -> &[String] {
        &self.drop_columns
    }

    /// Rename, drop, then validate that every required canonical column is present.
    pub fn normalize(&self, record: &RawRecord) -> Result<CanonicalFeatureVector, PipelineError> {
        let resolved = self.resolve(record);

        let missing: BTreeSet<String> = self
            .required
            .iter()
            .filter(|c| !resolved.contains_key(c.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::MissingColumns { missing });
        }

        let mut out = FeatureVector::with_capacity(self.required.len());
        let mut unparsed = 0usize;
        for col in &self.required {
            let value = match resolved[col.as_str()].as_f64() {
                Some(v) => v,
                None => {
                    unparsed += 1;
                    f64::NAN
                }
            };
            out.push(col.clone(), value);
        }
        if unparsed > 0 {
            debug!(unparsed, "Non-numeric input cells left for imputation");
        }

        Ok(CanonicalFeatureVector::from_inner(out))
    }

    /// Required columns the record cannot supply, even after renaming.
    pub fn missing_columns(&self, record: &RawRecord) -> BTreeSet<String> {
        let resolved = self.resolve(record);
        self.required
            .iter()
            .filter(|c| !resolved.contains_key(c.as_str()))
            .cloned()
            .collect()
    }

    /// Lenient projection used for sample data: absent or unparseable cells become 0.0.
    pub fn project_lenient(&self, record: &RawRecord) -> FeatureVector {
        let resolved = self.resolve(record);
        self.required
            .iter()
            .map(|col| {
                let value = resolved
                    .get(col.as_str())
                    .and_then(|v| v.as_f64())
                    .filter(|v| v.is_finite())
                    .unwrap_or(0.0);
                (col.as_str(), value)
            })
            .collect()
    }

    /// Apply renames and drops. A canonical name supplied directly wins over a
    /// raw column renamed onto it.
    fn resolve<'a>(&'a self, record: &'a RawRecord) -> BTreeMap<&'a str, &'a RawValue> {
        let mut resolved: BTreeMap<&'a str, &'a RawValue> = BTreeMap::new();
        let mut renamed = 0usize;

        for (column, value) in record.iter() {
            match self.rename_map.get(column.as_str()) {
                Some(target) if !record.contains(target) => {
                    renamed += 1;
                    resolved.entry(target.as_str()).or_insert(value);
                }
                Some(_) => {}
                None => {
                    resolved.insert(column.as_str(), value);
                }
            }
        }

        let before = resolved.len();
        for col in &self.drop_columns {
            resolved.remove(col.as_str());
        }
        debug!(renamed, dropped = before - resolved.len(), "Columns normalised");

        resolved
    }
}
