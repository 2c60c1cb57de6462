use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::Value as JsonValue;

// ---------------------------------------------------------------------------
// MetadataValue – a single cell in a metadata column
// ---------------------------------------------------------------------------

/// A dynamically-typed metadata value (class label, batch, replicate id, ...).
/// Used as a `BTreeSet` key downstream, so it must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl Eq for MetadataValue {}

impl PartialOrd for MetadataValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MetadataValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use MetadataValue::*;
        fn rank(v: &MetadataValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{v}"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Null => write!(f, "<null>"),
        }
    }
}

impl MetadataValue {
    /// Infer the narrowest type for a textual cell (CSV field, CLI argument).
    pub fn infer(s: &str) -> Self {
        if s.is_empty() {
            return MetadataValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return MetadataValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return MetadataValue::Float(f);
        }
        if s == "true" || s == "false" {
            return MetadataValue::Bool(s == "true");
        }
        MetadataValue::String(s.to_string())
    }

    pub fn from_json(val: &JsonValue) -> Self {
        match val {
            JsonValue::String(s) => MetadataValue::String(s.clone()),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    MetadataValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    MetadataValue::Float(f)
                } else {
                    MetadataValue::String(n.to_string())
                }
            }
            JsonValue::Bool(b) => MetadataValue::Bool(*b),
            JsonValue::Null => MetadataValue::Null,
            other => MetadataValue::String(other.to_string()),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            MetadataValue::String(s) => JsonValue::String(s.clone()),
            MetadataValue::Integer(i) => JsonValue::from(*i),
            MetadataValue::Float(v) => serde_json::Number::from_f64(*v)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            MetadataValue::Bool(b) => JsonValue::Bool(*b),
            MetadataValue::Null => JsonValue::Null,
        }
    }
}

// ---------------------------------------------------------------------------
// Spectrum – one measured (or synthesized) sample
// ---------------------------------------------------------------------------

/// A single spectrum with its metadata.
#[derive(Debug, Clone)]
pub struct Spectrum {
    /// Wavenumber axis (x).
    pub x: Vec<f64>,
    /// Intensity axis (y) – same length as `x`.
    pub y: Vec<f64>,
    /// Dynamic metadata columns: column_name → value.
    pub metadata: BTreeMap<String, MetadataValue>,
}

// ---------------------------------------------------------------------------
// SpectralDataset – a loaded collection of spectra
// ---------------------------------------------------------------------------

/// A collection of spectra with pre-computed metadata column indices.
#[derive(Debug, Clone, Default)]
pub struct SpectralDataset {
    /// All spectra (rows).
    pub spectra: Vec<Spectrum>,
    /// Ordered list of metadata column names (excludes x, y).
    pub column_names: Vec<String>,
    /// For each metadata column the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<MetadataValue>>,
}

impl SpectralDataset {
    /// Build column indices from the spectra.
    pub fn from_spectra(spectra: Vec<Spectrum>) -> Self {
        let mut unique_values: BTreeMap<String, BTreeSet<MetadataValue>> = BTreeMap::new();
        for sp in &spectra {
            for (col, val) in &sp.metadata {
                unique_values
                    .entry(col.clone())
                    .or_default()
                    .insert(val.clone());
            }
        }
        SpectralDataset {
            column_names: unique_values.keys().cloned().collect(),
            spectra,
            unique_values,
        }
    }

    /// Concatenate several datasets (e.g. partitions of one acquisition run).
    pub fn concat(parts: impl IntoIterator<Item = SpectralDataset>) -> Self {
        let spectra = parts.into_iter().flat_map(|part| part.spectra).collect();
        Self::from_spectra(spectra)
    }

    /// Number of spectra.
    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }
}
