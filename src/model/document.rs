//! Output documents.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

/// Value of a single document field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(Arc<str>),
    Int(i64),
    Float(f64),
    Bool(bool),
    TextList(Vec<Arc<str>>),
    IntList(Vec<i64>),
}

impl From<Arc<str>> for FieldValue {
    fn from(value: Arc<str>) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(Arc::from(value))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(Arc::from(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<Arc<str>>> for FieldValue {
    fn from(value: Vec<Arc<str>>) -> Self {
        Self::TextList(value)
    }
}

impl From<Vec<i64>> for FieldValue {
    fn from(value: Vec<i64>) -> Self {
        Self::IntList(value)
    }
}

/// A flat, searchable record
///
/// Documents are built once by an assembler and never modified after they are
/// handed to a buffer. Fields are kept in name order so serialized output is
/// stable across runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    id: Arc<str>,
    #[serde(flatten)]
    fields: BTreeMap<&'static str, FieldValue>,
}

impl Document {
    /// Create an empty document with the given unique key
    #[must_use]
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Unique key of the document
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Set a field, replacing any previous value
    pub fn set(&mut self, name: &'static str, value: impl Into<FieldValue>) {
        self.fields.insert(name, value.into());
    }

    /// Set a field only when a value is present
    pub fn set_opt<V: Into<FieldValue>>(&mut self, name: &'static str, value: Option<V>) {
        if let Some(value) = value {
            self.set(name, value);
        }
    }

    /// Set a multi-valued text field, omitting it when there are no values
    pub fn set_list(&mut self, name: &'static str, values: Vec<Arc<str>>) {
        if !values.is_empty() {
            self.fields.insert(name, FieldValue::TextList(values));
        }
    }

    /// Value of a field, if set
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Text value of a field, if set and textual
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(FieldValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    /// Values of a multi-valued text field, empty when unset
    #[must_use]
    pub fn list(&self, name: &str) -> &[Arc<str>] {
        match self.fields.get(name) {
            Some(FieldValue::TextList(values)) => values,
            _ => &[],
        }
    }

    /// Number of fields set, excluding the unique key
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
