//! Ordered, named feature vectors.
//!
//! Column order is part of the contract between stages (the classifier is
//! order-sensitive), so vectors carry names and values side by side instead
//! of a name-keyed map. Each stage's output is a distinct newtype that only
//! that stage can construct.

use std::ops::Deref;

use serde::ser::{Serialize, SerializeMap, Serializer};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { names: Vec::with_capacity(capacity), values: Vec::with_capacity(capacity) }
    }

    /// Appends a column, or overwrites it in place if the name already exists.
    pub fn push(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.position(&name) {
            Some(i) => self.values[i] = value,
            None => {
                self.names.push(name);
                self.values.push(value);
            }
        }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.position(name).map(|i| self.values[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names.iter().map(String::as_str).zip(self.values.iter().copied())
    }

    /// True when every value is a finite number.
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for FeatureVector {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut out = FeatureVector::new();
        for (name, value) in iter {
            out.push(name, value);
        }
        out
    }
}

/// Serialised as a JSON object whose keys keep column order.
impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

macro_rules! stage_vector {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name(FeatureVector);

        impl $name {
            pub(crate) fn from_inner(inner: FeatureVector) -> Self {
                Self(inner)
            }
        }

        impl Deref for $name {
            type Target = FeatureVector;

            fn deref(&self) -> &FeatureVector {
                &self.0
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                self.0.serialize(serializer)
            }
        }
    };
}

stage_vector! {
    /// Exactly the canonical input columns, in transformer input order.
    CanonicalFeatureVector
}

stage_vector! {
    /// Canonical columns followed by the derived ratio/difference/product columns.
    DerivedFeatureVector
}

stage_vector! {
    /// Derived vector with every missing or non-finite cell filled.
    ImputedFeatureVector
}

stage_vector! {
    /// Projection onto the trained feature whitelist, in whitelist order.
    SelectedFeatureVector
}
