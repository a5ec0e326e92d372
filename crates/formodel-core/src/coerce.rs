//! Bidirectional value coercion.
//!
//! A [`Coercion`] pair converts between the instance representation of a
//! value and its storage/wire representation, keyed by the field's declared
//! type. Types without a registered pair pass through unchanged.

use std::collections::HashMap;
use std::rc::Rc;

use crate::value::{FieldType, Value};

type CoerceFn = Rc<dyn Fn(Value) -> Value>;

/// A pair of conversion functions for one field type.
#[derive(Clone)]
pub struct Coercion {
    to_attribute: CoerceFn,
    to_instance: CoerceFn,
}

impl Coercion {
    /// Build a coercion from the two directions.
    ///
    /// `to_attribute` runs before values are handed to a datasource on
    /// save; `to_instance` runs on raw values read back from it.
    pub fn new(
        to_attribute: impl Fn(Value) -> Value + 'static,
        to_instance: impl Fn(Value) -> Value + 'static,
    ) -> Self {
        Self {
            to_attribute: Rc::new(to_attribute),
            to_instance: Rc::new(to_instance),
        }
    }

    /// Convert an instance value to its storage representation.
    pub fn to_attribute(&self, value: Value) -> Value {
        (self.to_attribute)(value)
    }

    /// Convert a storage value to its instance representation.
    pub fn to_instance(&self, value: Value) -> Value {
        (self.to_instance)(value)
    }
}

impl std::fmt::Debug for Coercion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coercion").finish_non_exhaustive()
    }
}

/// Coercions registered on a model, keyed by declared field type.
///
/// Empty by default; unregistered types get identity coercion.
#[derive(Debug, Clone, Default)]
pub struct CoercionTable {
    entries: HashMap<FieldType, Coercion>,
}

impl CoercionTable {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register (or replace) the coercion for a field type.
    pub fn register(&mut self, field_type: FieldType, coercion: Coercion) {
        self.entries.insert(field_type, coercion);
    }

    /// Look up the coercion for a field type.
    pub fn get(&self, field_type: FieldType) -> Option<&Coercion> {
        self.entries.get(&field_type)
    }

    /// Apply the storage-direction coercion, or identity.
    pub fn apply_to_attribute(&self, field_type: FieldType, value: Value) -> Value {
        match self.entries.get(&field_type) {
            Some(coercion) => coercion.to_attribute(value),
            None => value,
        }
    }

    /// Apply the instance-direction coercion, or identity.
    pub fn apply_to_instance(&self, field_type: FieldType, value: Value) -> Value {
        match self.entries.get(&field_type) {
            Some(coercion) => coercion.to_instance(value),
            None => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Timestamps stored as integer micros on the wire.
    fn timestamp_coercion() -> Coercion {
        Coercion::new(
            |v| match v {
                Value::Timestamp(us) => Value::Integer(us),
                other => other,
            },
            |v| match v {
                Value::Integer(us) => Value::Timestamp(us),
                other => other,
            },
        )
    }

    #[test]
    fn registered_type_round_trips() {
        let mut table = CoercionTable::new();
        table.register(FieldType::Timestamp, timestamp_coercion());

        let stored = table.apply_to_attribute(FieldType::Timestamp, Value::Timestamp(42));
        assert_eq!(stored, Value::Integer(42));

        let live = table.apply_to_instance(FieldType::Timestamp, stored);
        assert_eq!(live, Value::Timestamp(42));
    }

    #[test]
    fn unregistered_type_is_identity() {
        let table = CoercionTable::new();
        let v = Value::Text("unchanged".to_string());
        assert_eq!(table.apply_to_attribute(FieldType::Text, v.clone()), v);
        assert_eq!(table.apply_to_instance(FieldType::Text, v.clone()), v);
    }

    #[test]
    fn null_passes_through_registered_coercion() {
        let mut table = CoercionTable::new();
        table.register(FieldType::Timestamp, timestamp_coercion());
        assert_eq!(
            table.apply_to_attribute(FieldType::Timestamp, Value::Null),
            Value::Null
        );
    }
}
