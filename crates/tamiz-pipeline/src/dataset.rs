//! Reference dataset: sample patient rows used to prefill demo requests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use tamiz_common::RawRecord;

use crate::features::FeatureVector;
use crate::normalizer::ColumnNormalizer;

pub const DEMO_FIRST_ID: u32 = 10100;
pub const DEMO_PATIENT_COUNT: u32 = 100;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read dataset {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Dataset {path:?} has no '{column}' column")]
    MissingIdColumn { path: PathBuf, column: String },

    #[error("Delimiter {0:?} is not a single-byte character")]
    Delimiter(char),
}

/// A demo identifier and its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoPatient {
    pub id: String,
    pub label: String,
}

/// The fixed list of demo identifiers offered to callers.
pub fn demo_patient_ids() -> Vec<DemoPatient> {
    (0..DEMO_PATIENT_COUNT)
        .map(|i| DemoPatient {
            id: (DEMO_FIRST_ID + i).to_string(),
            label: format!("Datos de prueba {}", i + 1),
        })
        .collect()
}

/// Rows of the reference file, keyed by patient identifier.
#[derive(Debug, Clone, Default)]
pub struct ReferenceDataset {
    rows: HashMap<String, RawRecord>,
}

impl ReferenceDataset {
    pub fn load(path: impl AsRef<Path>, id_column: &str, delimiter: char) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let delimiter = u8::try_from(delimiter).map_err(|_| DatasetError::Delimiter(delimiter))?;
        let csv_err = |source: csv::Error| DatasetError::Csv { path: path.to_path_buf(), source };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_path(path)
            .map_err(csv_err)?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let id_index = headers.iter().position(|h| h == id_column).ok_or_else(|| {
            DatasetError::MissingIdColumn { path: path.to_path_buf(), column: id_column.to_string() }
        })?;

        let mut rows = HashMap::new();
        for result in reader.records() {
            let record = result.map_err(csv_err)?;
            let Some(id) = record.get(id_index).map(str::trim).filter(|id| !id.is_empty()) else {
                continue;
            };
            let row: RawRecord = headers
                .iter()
                .zip(record.iter())
                .filter(|(_, cell)| !cell.trim().is_empty())
                .map(|(header, cell)| (header.as_str(), cell))
                .collect();
            // First occurrence of an id wins.
            rows.entry(id.to_string()).or_insert(row);
        }

        info!(path = %path.display(), rows = rows.len(), "Loaded reference dataset");
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn raw(&self, id: &str) -> Option<&RawRecord> {
        self.rows.get(id.trim())
    }

    /// Canonical record for `id`, absent or unparseable cells set to 0.0.
    pub fn lookup(&self, id: &str, normalizer: &ColumnNormalizer) -> Option<FeatureVector> {
        let row = self.raw(id);
        if row.is_none() {
            debug!(id, "Unknown patient id");
        }
        row.map(|r| normalizer.project_lenient(r))
    }
}
