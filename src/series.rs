//! Tabular query results: a [`Series`] is a named table of equally long [`Field`] columns.
//!
//! Fields carry an explicit [`FieldKind`] which says what role the column plays in a
//! baseline/selection comparison. Everything else (attribute name, value key, ...) lives in the
//! free-form label map.

use std::collections::BTreeMap;

use anyhow::{bail, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FieldType {
    String,
    Number,
    Boolean,
}

/// Role of a field in a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FieldKind {
    /// Attribute values, one per row
    Value,
    /// Per-value count in the baseline population
    Baseline,
    /// Size of the whole baseline population
    BaselineTotal,
    /// Per-value count in the selection population
    Selection,
    /// Size of the whole selection population
    SelectionTotal,
    /// No comparison role
    Other,
}

/// One of the two compared populations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaType {
    Baseline,
    Selection,
}

impl MetaType {
    /// Kind of the per-value breakdown fields for this population.
    pub fn value_kind(self) -> FieldKind {
        match self {
            MetaType::Baseline => FieldKind::Baseline,
            MetaType::Selection => FieldKind::Selection,
        }
    }

    /// Kind of the population total field.
    pub fn total_kind(self) -> FieldKind {
        match self {
            MetaType::Baseline => FieldKind::BaselineTotal,
            MetaType::Selection => FieldKind::SelectionTotal,
        }
    }
}

impl std::fmt::Display for MetaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetaType::Baseline => write!(f, "baseline"),
            MetaType::Selection => write!(f, "selection"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum FieldValue {
    Null,
    String(String),
    Number(f64),
    Bool(bool),
}

impl FieldValue {
    /// Null, empty strings, zero, NaN and `false` are all "empty" values.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::String(s) => !s.is_empty(),
            FieldValue::Number(n) => *n != 0.0 && !n.is_nan(),
            FieldValue::Bool(b) => *b,
        }
    }

    /// Numeric view of the value. Strings are parsed, anything unparseable is `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if !n.is_nan() => Some(*n),
            FieldValue::String(s) => s.trim().parse::<f64>().ok().filter(|n| !n.is_nan()),
            _ => None,
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::String(s) => s.clone(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Bool(b) => b.to_string(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub kind: FieldKind,
    pub values: Vec<FieldValue>,
    pub labels: BTreeMap<String, String>,
}

impl Field {
    pub fn new(
        name: impl Into<String>,
        field_type: FieldType,
        kind: FieldKind,
        values: Vec<FieldValue>,
    ) -> Field {
        Field {
            name: name.into(),
            field_type,
            kind,
            values,
            labels: BTreeMap::new(),
        }
    }

    pub fn strings(name: impl Into<String>, kind: FieldKind, values: &[&str]) -> Field {
        let values = values.iter().map(|v| FieldValue::from(*v)).collect();
        Field::new(name, FieldType::String, kind, values)
    }

    pub fn numbers(name: impl Into<String>, kind: FieldKind, values: &[f64]) -> Field {
        let values = values.iter().map(|v| FieldValue::Number(*v)).collect();
        Field::new(name, FieldType::Number, kind, values)
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Field {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index`, `Null` when out of range.
    pub fn value(&self, index: usize) -> &FieldValue {
        self.values.get(index).unwrap_or(&FieldValue::Null)
    }

    /// First value as a number, 0 when absent or not numeric.
    pub fn first_number(&self) -> f64 {
        self.values
            .first()
            .and_then(FieldValue::as_number)
            .unwrap_or(0.0)
    }

    /// Largest numeric value in the field. Non-numeric values are skipped, 0 if there are none.
    pub fn max_number(&self) -> f64 {
        self.values
            .iter()
            .filter_map(FieldValue::as_number)
            .reduce(f64::max)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub fields: Vec<Field>,
    row_count: usize,
}

impl Series {
    /// Build a series, all fields must have the same length.
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Result<Series> {
        let name = name.into();
        let row_count = fields.first().map_or(0, Field::len);
        if let Some(bad) = fields.iter().find(|f| f.len() != row_count) {
            bail!(
                "Field '{}' in series '{}' has {} values, expected {}",
                bad.name,
                name,
                bad.len(),
                row_count
            );
        }
        Ok(Series {
            name,
            fields,
            row_count,
        })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// First field with the given kind.
    pub fn field_by_kind(&self, kind: FieldKind) -> Option<&Field> {
        self.fields.iter().find(|f| f.kind == kind)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}
