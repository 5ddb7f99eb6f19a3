//! Domain types exchanged between the inference pipeline, the recommendation
//! layer and whatever calling layer presents the result.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Raw input record
// ---------------------------------------------------------------------------

/// A single scalar cell of an inbound record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Missing,
}

impl RawValue {
    /// Numeric reading of the cell; `None` when absent or unparseable.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Number(v) => Some(*v),
            RawValue::Text(s)   => s.trim().parse::<f64>().ok(),
            RawValue::Missing   => None,
        }
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

/// Raw column name → value, one per diagnostic request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(BTreeMap<String, RawValue>);

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<RawValue>) {
        self.0.insert(column.into(), value.into());
    }

    /// Builder-style insert, handy for fixtures.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&RawValue> {
        self.0.get(column)
    }

    pub fn remove(&mut self, column: &str) -> Option<RawValue> {
        self.0.remove(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RawValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ---------------------------------------------------------------------------
// Diagnosis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Diagnosis {
    Benigno,
    Maligno,
}

impl Diagnosis {
    /// Raw label convention fixed by training: 0 is benign, anything else malignant.
    pub fn from_raw_label(label: u8) -> Self {
        if label == 0 { Diagnosis::Benigno } else { Diagnosis::Maligno }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Diagnosis::Benigno => "Benigno",
            Diagnosis::Maligno => "Maligno",
        }
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target encoder captured at training time: class code → position in the
/// classifier's probability vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelIndexMap {
    #[serde(rename = "B")]
    pub benign: usize,
    #[serde(rename = "M")]
    pub malignant: usize,
}

impl LabelIndexMap {
    pub fn index_of(&self, diagnosis: Diagnosis) -> usize {
        match diagnosis {
            Diagnosis::Benigno => self.benign,
            Diagnosis::Maligno => self.malignant,
        }
    }
}

// ---------------------------------------------------------------------------
// Prediction result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    #[serde(rename = "Benigno")]
    pub benigno: f64,
    #[serde(rename = "Maligno")]
    pub maligno: f64,
}

impl ClassProbabilities {
    pub fn total(&self) -> f64 {
        self.benigno + self.maligno
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub diagnosis: Diagnosis,
    pub probabilities: ClassProbabilities,
    /// Probability of the predicted class as a percentage, two decimals.
    pub confidence: f64,
}

// ---------------------------------------------------------------------------
// Recommendation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Generated,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub text: String,
    pub source: RecommendationSource,
}

impl Recommendation {
    pub fn fallback(text: impl Into<String>) -> Self {
        Self { text: text.into(), source: RecommendationSource::Fallback }
    }

    pub fn generated(text: impl Into<String>) -> Self {
        Self { text: text.into(), source: RecommendationSource::Generated }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == RecommendationSource::Fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_value_parsing() {
        assert_eq!(RawValue::from(12.5).as_f64(), Some(12.5));
        assert_eq!(RawValue::from(" 7.25 ").as_f64(), Some(7.25));
        assert_eq!(RawValue::from("n/a").as_f64(), None);
        assert_eq!(RawValue::Missing.as_f64(), None);
    }

    #[test]
    fn test_raw_record_from_json() {
        let record: RawRecord =
            serde_json::from_str(r#"{"radio_media": 14.2, "area_media": "600", "textura": null}"#)
                .unwrap();
        assert_eq!(record.len(), 3);
        assert_eq!(record.get("radio_media"), Some(&RawValue::Number(14.2)));
        assert_eq!(record.get("area_media").and_then(RawValue::as_f64), Some(600.0));
        assert_eq!(record.get("textura"), Some(&RawValue::Missing));
    }

    #[test]
    fn test_raw_label_convention() {
        assert_eq!(Diagnosis::from_raw_label(0), Diagnosis::Benigno);
        assert_eq!(Diagnosis::from_raw_label(1), Diagnosis::Maligno);
    }

    #[test]
    fn test_label_map_uses_target_encoder_keys() {
        let map: LabelIndexMap = serde_json::from_str(r#"{"B": 1, "M": 0}"#).unwrap();
        assert_eq!(map.index_of(Diagnosis::Benigno), 1);
        assert_eq!(map.index_of(Diagnosis::Maligno), 0);
    }

    #[test]
    fn test_prediction_serialises_domain_vocabulary() {
        let result = PredictionResult {
            diagnosis: Diagnosis::Maligno,
            probabilities: ClassProbabilities { benigno: 0.25, maligno: 0.75 },
            confidence: 75.0,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["diagnosis"], "Maligno");
        assert_eq!(json["probabilities"]["Benigno"], 0.25);
        assert_eq!(json["probabilities"]["Maligno"], 0.75);
    }

    #[test]
    fn test_recommendation_source_tag() {
        let rec = Recommendation::fallback("texto");
        assert!(rec.is_fallback());
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["source"], "fallback");
    }
}
