//! Dynamic field values.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{Error, TypeError};

/// The declared type of a schema field.
///
/// Every field in a [`Schema`](crate::schema::Schema) names exactly one of
/// these; the `type` validation rule and the coercion table are keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Boolean flag
    Bool,
    /// 64-bit signed integer
    Integer,
    /// 64-bit floating point
    Float,
    /// Text string
    Text,
    /// Timestamp (microseconds since epoch)
    Timestamp,
    /// Ordered list of values (e.g. a multi-valued select)
    Array,
}

impl FieldType {
    /// Get the lowercase name of this type, as it appears in rule names
    /// and error messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Text => "text",
            FieldType::Timestamp => "timestamp",
            FieldType::Array => "array",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A dynamically-typed field value.
///
/// Instances hold one `Value` per schema field; datasources exchange them
/// inside [`Record`](crate::record::Record)s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Absent / unset value
    Null,

    /// Boolean value
    Bool(bool),

    /// 64-bit signed integer
    Integer(i64),

    /// 64-bit floating point
    Float(f64),

    /// Text string
    Text(String),

    /// Timestamp (microseconds since epoch)
    Timestamp(i64),

    /// Array of values
    Array(Vec<Value>),
}

impl Value {
    /// Check if this value is null.
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Classify this value, or `None` for `Null`.
    ///
    /// Null carries no type of its own; whether a field may be null is
    /// governed by the `required` rule, not the `type` rule.
    #[must_use]
    pub const fn field_type(&self) -> Option<FieldType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(FieldType::Bool),
            Value::Integer(_) => Some(FieldType::Integer),
            Value::Float(_) => Some(FieldType::Float),
            Value::Text(_) => Some(FieldType::Text),
            Value::Timestamp(_) => Some(FieldType::Timestamp),
            Value::Array(_) => Some(FieldType::Array),
        }
    }

    /// Get the type name of this value.
    pub const fn type_name(&self) -> &'static str {
        match self.field_type() {
            None => "null",
            Some(t) => t.name(),
        }
    }

    /// Try to read this value as a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            Value::Integer(v) => Some(*v != 0),
            _ => None,
        }
    }

    /// Try to read this value as an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) | Value::Timestamp(v) => Some(*v),
            Value::Bool(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Try to read this value as an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(v) | Value::Timestamp(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Length of a `Text` (in characters) or `Array` value.
    ///
    /// Scalar values have no length; the `max_length`/`min_length` rules
    /// skip them.
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Text(s) => Some(s.chars().count()),
            Value::Array(items) => Some(items.len()),
            _ => None,
        }
    }

    /// Compare two values the way the query operators and the `between`
    /// rule do.
    ///
    /// Numbers (`Integer`, `Float`) compare numerically across variants,
    /// timestamps with timestamps, text lexicographically, bools as
    /// false < true. Everything else, and any comparison involving `Null`,
    /// is unordered.
    #[must_use]
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Convert to the JSON representation used on the wire and in dumps.
    ///
    /// Timestamps encode as plain integers; [`Value::from_json`] cannot
    /// distinguish them on the way back, which is what the coercion table
    /// is for.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(v) => serde_json::Value::Bool(*v),
            Value::Integer(v) | Value::Timestamp(v) => serde_json::Value::from(*v),
            Value::Float(v) => serde_json::Number::from_f64(*v)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
        }
    }

    /// Build a value from its JSON representation.
    ///
    /// JSON objects have no `Value` counterpart and come back as an error;
    /// records are mapped at the [`Record`](crate::record::Record) level.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, Error> {
        match json {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(v) => Ok(Value::Bool(*v)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Float(f))
                } else {
                    Err(Error::Type(TypeError {
                        expected: "representable number",
                        actual: n.to_string(),
                        field: None,
                    }))
                }
            }
            serde_json::Value::String(s) => Ok(Value::Text(s.clone())),
            serde_json::Value::Array(items) => {
                let values = items.iter().map(Value::from_json).collect::<Result<_, _>>()?;
                Ok(Value::Array(values))
            }
            serde_json::Value::Object(_) => Err(Error::Type(TypeError {
                expected: "scalar or array",
                actual: "object".to_string(),
                field: None,
            })),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Integer(v) | Value::Timestamp(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

// Conversion implementations

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::Array(v.into_iter().map(Value::Text).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl TryFrom<Value> for bool {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bool(v) => Ok(v),
            Value::Integer(v) => Ok(v != 0),
            other => Err(Error::Type(TypeError {
                expected: "bool",
                actual: other.type_name().to_string(),
                field: None,
            })),
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Integer(v) | Value::Timestamp(v) => Ok(v),
            Value::Bool(v) => Ok(i64::from(v)),
            other => Err(Error::Type(TypeError {
                expected: "i64",
                actual: other.type_name().to_string(),
                field: None,
            })),
        }
    }
}

impl TryFrom<Value> for f64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Integer(v) => Ok(v as f64),
            other => Err(Error::Type(TypeError {
                expected: "f64",
                actual: other.type_name().to_string(),
                field: None,
            })),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Text(v) => Ok(v),
            other => Err(Error::Type(TypeError {
                expected: "String",
                actual: other.type_name().to_string(),
                field: None,
            })),
        }
    }
}

impl TryFrom<Value> for Vec<Value> {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Array(v) => Ok(v),
            other => Err(Error::Type(TypeError {
                expected: "array",
                actual: other.type_name().to_string(),
                field: None,
            })),
        }
    }
}

/// `TryFrom` for `Option<T>` - returns `None` for `Null`, converts otherwise.
impl<T> TryFrom<Value> for Option<T>
where
    T: TryFrom<Value, Error = Error>,
{
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(None),
            v => T::try_from(v).map(Some),
        }
    }
}
