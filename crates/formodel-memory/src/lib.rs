//! In-memory datasource for Formodel.
//!
//! [`MemoryDatasource`] keeps one store of records behind the
//! [`Datasource`] trait, with auto-assigned integer primary keys and full
//! query-filter support. It is the reference backend for tests, demos, and
//! anything that does not need persistence.
//!
//! # Example
//!
//! ```rust,ignore
//! use formodel_core::{FieldDef, FieldType, Model, Record, Schema};
//! use formodel_memory::MemoryDatasource;
//!
//! let schema = Schema::builder()
//!     .field("id", FieldDef::new(FieldType::Integer).primary_key())
//!     .field("name", FieldDef::new(FieldType::Text).required())
//!     .build()?;
//! let people = Model::new("person", schema, MemoryDatasource::new("people"));
//! let ann = people.create(Record::new().with("name", "Ann"))?;
//! # Ok::<(), formodel_core::Error>(())
//! ```

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use formodel_core::{Datasource, Query, Record, RecordNotFound, Result, Value};

/// An in-memory record store.
///
/// Primary keys are integers assigned on first save, starting at 0 and
/// incrementing per new record; saving a record that already carries an
/// integer primary key overwrites in place. One `MemoryDatasource` holds
/// one store — attach one per model.
#[derive(Debug)]
pub struct MemoryDatasource {
    name: String,
    records: RefCell<BTreeMap<i64, Record>>,
    next_pk: Cell<i64>,
}

impl MemoryDatasource {
    /// Create an empty store.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: RefCell::new(BTreeMap::new()),
            next_pk: Cell::new(0),
        }
    }

    /// Start assigning primary keys from a custom value.
    pub fn with_starting_pk(self, pk: i64) -> Self {
        self.next_pk.set(pk);
        self
    }

    /// The store name this datasource was created with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Serialize the whole store to a JSON object keyed by primary key.
    pub fn dump(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .records
            .borrow()
            .iter()
            .map(|(pk, record)| (pk.to_string(), record.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl Datasource for MemoryDatasource {
    fn get_record(&self, model: &str, pk: &Value) -> Result<Record> {
        pk.as_i64()
            .and_then(|key| self.records.borrow().get(&key).cloned())
            .ok_or_else(|| RecordNotFound::new(model, pk.clone()).into())
    }

    fn find_records(&self, _model: &str, query: &Query) -> Result<Vec<Record>> {
        Ok(self
            .records
            .borrow()
            .values()
            .filter(|record| query.matches(record))
            .cloned()
            .collect())
    }

    fn save_record(&self, model: &str, pk_field: &str, mut attrs: Record) -> Result<Value> {
        let pk = match attrs.get(pk_field).and_then(Value::as_i64) {
            Some(existing) => existing,
            None => {
                let assigned = self.next_pk.get();
                self.next_pk.set(assigned + 1);
                assigned
            }
        };
        attrs.insert(pk_field, pk);
        self.records.borrow_mut().insert(pk, attrs);
        tracing::debug!(store = %self.name, model, pk, "record stored");
        Ok(Value::Integer(pk))
    }

    fn destroy_record(&self, model: &str, pk: &Value) -> Result<bool> {
        let removed = pk
            .as_i64()
            .is_some_and(|key| self.records.borrow_mut().remove(&key).is_some());
        tracing::debug!(store = %self.name, model, pk = %pk, removed, "record destroyed");
        Ok(removed)
    }
}
