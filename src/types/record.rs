//! Patient input records as submitted, validated and ordered

use crate::error::FieldIssue;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Raw submission: feature name to whatever the client sent.
///
/// Values may be JSON numbers, `true`/`false` flags or text from a form
/// field. Nothing is checked until validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputRecord {
    values: HashMap<String, Value>,
}

impl InputRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from urlencoded form fields
    pub fn from_form(fields: HashMap<String, String>) -> Self {
        Self {
            values: fields
                .into_iter()
                .map(|(name, raw)| (name, Value::String(raw)))
                .collect(),
        }
    }

    /// Set a field, replacing any previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder form of [`InputRecord::insert`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Drop a field
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a field as it should be echoed back into a form input
    pub fn display_value(&self, name: &str) -> Option<String> {
        match self.values.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Bool(flag) => Some(if *flag { "1" } else { "0" }.to_string()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Interpret a field as a finite number.
    pub fn numeric(&self, name: &str) -> Result<f64, FieldIssue> {
        match self.values.get(name) {
            None | Some(Value::Null) => Err(FieldIssue::Missing),
            Some(Value::Number(n)) => n
                .as_f64()
                .filter(|v| v.is_finite())
                .ok_or(FieldIssue::NotNumeric),
            Some(Value::Bool(flag)) => Ok(if *flag { 1.0 } else { 0.0 }),
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(FieldIssue::Missing);
                }
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or(FieldIssue::NotNumeric)
            }
            Some(_) => Err(FieldIssue::NotNumeric),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for InputRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Record whose required fields are all present and numeric.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRecord {
    values: HashMap<String, f64>,
}

impl ValidRecord {
    pub(crate) fn new(values: HashMap<String, f64>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Feature values in model column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}
