//! Raw record representation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, TypeError};
use crate::value::Value;

/// A raw record: field name → value, as exchanged with datasources.
///
/// Records are the storage/wire shape of an instance — what a datasource
/// returns from a lookup and what it receives on save, after coercion.
/// Field order is deterministic (sorted by name).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    values: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Number of fields in this record.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if this record holds no fields.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a value by field name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Check if a field is present.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Set a field value, returning the previous one if any.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(name.into(), value.into())
    }

    /// Remove a field, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    /// Iterate over (field, value) pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Builder-style insertion, for literal records in call sites and tests.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Convert to a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }

    /// Build a record from a JSON object.
    ///
    /// Fails with a type error when the JSON value is not an object or a
    /// member cannot be represented as a [`Value`].
    pub fn from_json(json: &serde_json::Value) -> Result<Self, Error> {
        let serde_json::Value::Object(map) = json else {
            return Err(Error::Type(TypeError {
                expected: "JSON object",
                actual: json_kind(json).to_string(),
                field: None,
            }));
        };
        let mut record = Record::new();
        for (key, member) in map {
            let value = Value::from_json(member).map_err(|e| match e {
                Error::Type(mut te) => {
                    te.field = Some(key.clone());
                    Error::Type(te)
                }
                e => e,
            })?;
            record.insert(key.clone(), value);
        }
        Ok(record)
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
