//! Live per-row state.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::{Result, SchemaError};
use crate::model::{Model, Outcome};
use crate::notify::{InstanceDelegate, InstanceEvent, InstanceObserver, Observers};
use crate::record::Record;
use crate::value::Value;

static NULL: Value = Value::Null;

/// Lifecycle state of an instance.
///
/// `New` until the first successful save assigns a primary key, then
/// `Persisted`; `Destroyed` is terminal and rejects further operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// No primary key assigned yet.
    New,
    /// Primary key assigned by the datasource.
    Persisted,
    /// Removed from the datasource; terminal.
    Destroyed,
}

/// One row's live state: current field values, a dirty-tracking snapshot,
/// and CRUD operations that route through the owning [`Model`].
pub struct Instance {
    model: Rc<Model>,
    values: BTreeMap<String, Value>,
    snapshot: BTreeMap<String, Value>,
    state: InstanceState,
    delegate: Option<Rc<dyn InstanceDelegate>>,
    observers: Observers<InstanceEvent, InstanceObserver>,
}

impl Instance {
    /// Assemble an instance around prepared field values.
    ///
    /// Called by the owning model; the state is derived from the primary
    /// key slot and the first snapshot is the initial values.
    pub(crate) fn build(model: Rc<Model>, values: BTreeMap<String, Value>) -> Self {
        let pk_field = model.schema().primary_key_field();
        let state = match values.get(pk_field) {
            None | Some(Value::Null) => InstanceState::New,
            Some(_) => InstanceState::Persisted,
        };
        let snapshot = values.clone();
        Self {
            model,
            values,
            snapshot,
            state,
            delegate: None,
            observers: Observers::new(),
        }
    }

    /// The owning model.
    pub fn model(&self) -> &Rc<Model> {
        &self.model
    }

    /// Current lifecycle state.
    pub fn state(&self) -> InstanceState {
        self.state
    }

    /// Whether this instance has not been saved yet.
    pub fn is_new(&self) -> bool {
        self.state == InstanceState::New
    }

    /// Whether this instance has been destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.state == InstanceState::Destroyed
    }

    /// Get a field's current value. `None` for undeclared fields.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Set a field's value.
    ///
    /// Undeclared fields are rejected. With
    /// `ModelOptions::validate_assignment` enabled, the field's rules run
    /// against the new value before it is stored.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        if !self.model.schema().contains(field) {
            return Err(SchemaError::unknown_field(field).into());
        }
        if self.model.options().validate_assignment {
            self.model.check_field(field, &value, self.is_new())?;
        }
        self.values.insert(field.to_string(), value);
        Ok(())
    }

    /// Bulk-apply attributes; keys not declared in the schema are ignored.
    ///
    /// Applies values verbatim, without per-assignment validation — the
    /// save pipeline validates the whole instance anyway.
    pub fn apply_attributes(&mut self, attrs: Record) {
        for (field, value) in attrs {
            if self.model.schema().contains(&field) {
                self.values.insert(field, value);
            }
        }
    }

    /// Current field values as an (uncoerced) record.
    pub fn attributes(&self) -> Record {
        self.values.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Name of the primary-key field.
    pub fn primary_key_field(&self) -> &str {
        self.model.schema().primary_key_field()
    }

    /// Current primary key; `Value::Null` while unassigned.
    pub fn primary_key(&self) -> &Value {
        self.values
            .get(self.model.schema().primary_key_field())
            .unwrap_or(&NULL)
    }

    /// Store the datasource-assigned primary key and mark persisted.
    ///
    /// A successful save is a commit: the dirty snapshot resets here.
    pub(crate) fn assign_primary_key(&mut self, pk: Value) {
        let field = self.model.schema().primary_key_field().to_string();
        self.values.insert(field, pk);
        self.state = InstanceState::Persisted;
        self.snapshot = self.values.clone();
    }

    pub(crate) fn mark_destroyed(&mut self) {
        self.state = InstanceState::Destroyed;
    }

    /// Replace all field values (refresh path) and reset the snapshot.
    pub(crate) fn replace_values(&mut self, values: BTreeMap<String, Value>) {
        self.values = values;
        self.snapshot = self.values.clone();
        self.state = InstanceState::Persisted;
    }

    /// Fields whose current value differs from the last-committed snapshot,
    /// in schema declaration order.
    pub fn modified_fields(&self) -> Vec<String> {
        self.model
            .schema()
            .field_names()
            .filter(|name| {
                let current = self.values.get(*name).unwrap_or(&NULL);
                let committed = self.snapshot.get(*name).unwrap_or(&NULL);
                current != committed
            })
            .map(ToString::to_string)
            .collect()
    }

    /// Commit in-memory changes: when fields changed since the last
    /// snapshot, notify `ValuesDidUpdate` observers and the delegate, then
    /// take a new snapshot. Returns the changed field names.
    pub fn commit(&mut self) -> Vec<String> {
        let changed = self.modified_fields();
        if changed.is_empty() {
            return changed;
        }
        let observers = self.observers.snapshot(InstanceEvent::ValuesDidUpdate);
        let delegate = self.delegate.clone();
        for observer in observers {
            (*observer)(&*self, &changed);
        }
        if let Some(delegate) = delegate {
            delegate.values_did_update(&*self, &changed);
        }
        self.snapshot = self.values.clone();
        changed
    }

    /// Register an observer for an instance event.
    pub fn add_observer(
        &mut self,
        event: InstanceEvent,
        observer: impl Fn(&Instance, &[String]) + 'static,
    ) {
        self.observers.add(event, Rc::new(observer));
    }

    /// Set (or replace) the single delegate.
    pub fn set_delegate(&mut self, delegate: Rc<dyn InstanceDelegate>) {
        self.delegate = Some(delegate);
    }

    /// Remove the delegate.
    pub fn clear_delegate(&mut self) {
        self.delegate = None;
    }

    /// Validate and persist through the owning model.
    pub fn save(&mut self) -> Result<Outcome<Value>> {
        let model = Rc::clone(&self.model);
        model.save(self)
    }

    /// Remove from the datasource through the owning model.
    pub fn destroy(&mut self) -> Result<Outcome<bool>> {
        let model = Rc::clone(&self.model);
        model.destroy(self)
    }

    /// Re-read this record from the datasource by primary key.
    pub fn refresh(&mut self) -> Result<()> {
        let model = Rc::clone(&self.model);
        model.refresh(self)
    }

    /// Current field values as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        self.attributes().to_json()
    }
}

impl std::fmt::Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}:instance -> {}:{}]",
            self.model.name(),
            self.primary_key_field(),
            self.primary_key()
        )
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("model", &self.model.name())
            .field("state", &self.state)
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}
