//! The model: schema owner, validation engine, and persistence orchestrator.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::coerce::{Coercion, CoercionTable};
use crate::datasource::Datasource;
use crate::error::{Error, LifecycleError, Result, SchemaError, ValidationFailure};
use crate::instance::Instance;
use crate::notify::{ModelDelegate, ModelEvent, ModelObserver, Observers};
use crate::query::Query;
use crate::record::Record;
use crate::rule::Rule;
use crate::schema::Schema;
use crate::value::{FieldType, Value};

/// Result of a state-changing operation that the delegate may veto.
///
/// A veto is a normal control path, not an error: the operation was
/// permitted to not happen.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The operation ran; carries the datasource's result.
    Completed(T),
    /// The delegate declined; nothing reached the datasource.
    Vetoed,
}

impl<T> Outcome<T> {
    /// Whether the delegate vetoed the operation.
    pub fn is_vetoed(&self) -> bool {
        matches!(self, Outcome::Vetoed)
    }

    /// The completed result, if the operation ran.
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Vetoed => None,
        }
    }
}

/// Model-level behavior switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelOptions {
    /// Run a field's rules on every `Instance::set` assignment.
    /// Off by default; the save pipeline always validates regardless.
    pub validate_assignment: bool,
}

impl ModelOptions {
    pub const fn new() -> Self {
        Self {
            validate_assignment: false,
        }
    }
}

/// A model: one schema, one datasource, and the save/destroy/find pipeline
/// connecting them, with delegate and observer notifications around each
/// lifecycle transition.
///
/// Models are built once via [`Model::builder`] and shared as `Rc<Model>`;
/// instances hold a non-owning clone of that `Rc`. The schema, rule table,
/// and coercion table are fixed after construction.
pub struct Model {
    name: String,
    schema: Schema,
    rules: Vec<(String, Vec<Rule>)>,
    coercions: CoercionTable,
    options: ModelOptions,
    datasource: Box<dyn Datasource>,
    delegate: RefCell<Option<Rc<dyn ModelDelegate>>>,
    observers: RefCell<Observers<ModelEvent, ModelObserver>>,
}

impl Model {
    /// Start building a model.
    pub fn builder(
        name: impl Into<String>,
        schema: Schema,
        datasource: impl Datasource + 'static,
    ) -> ModelBuilder {
        ModelBuilder {
            name: name.into(),
            schema,
            datasource: Box::new(datasource),
            coercions: CoercionTable::new(),
            options: ModelOptions::new(),
        }
    }

    /// Build a model with default options and no coercions.
    pub fn new(
        name: impl Into<String>,
        schema: Schema,
        datasource: impl Datasource + 'static,
    ) -> Rc<Self> {
        Self::builder(name, schema, datasource).build()
    }

    /// The model name (datasource store/resource name).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The schema this model validates against.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The behavior switches this model was built with.
    pub fn options(&self) -> ModelOptions {
        self.options
    }

    /// The attached datasource.
    pub fn datasource(&self) -> &dyn Datasource {
        self.datasource.as_ref()
    }

    /// Set (or replace) the single delegate.
    pub fn set_delegate(&self, delegate: Rc<dyn ModelDelegate>) {
        *self.delegate.borrow_mut() = Some(delegate);
    }

    /// Remove the delegate; operations run unvetoed afterwards.
    pub fn clear_delegate(&self) {
        *self.delegate.borrow_mut() = None;
    }

    /// Register an observer for a model event.
    pub fn add_observer(
        &self,
        event: ModelEvent,
        observer: impl Fn(&Model, &Instance) + 'static,
    ) {
        self.observers.borrow_mut().add(event, Rc::new(observer));
    }

    fn notify_observers(&self, event: ModelEvent, instance: &Instance) {
        let observers = self.observers.borrow().snapshot(event);
        for observer in observers {
            (*observer)(self, instance);
        }
    }

    fn current_delegate(&self) -> Option<Rc<dyn ModelDelegate>> {
        self.delegate.borrow().clone()
    }

    // ==================== Validation ====================

    /// Validate every field of an instance against its compiled rules.
    ///
    /// The primary-key field skips all validation while the instance is
    /// new — the datasource has not assigned a key yet. Fails with the
    /// aggregated per-field rule failures; runs before every save.
    pub fn ensure_valid(&self, instance: &Instance) -> Result<()> {
        let pk_field = self.schema.primary_key_field();
        let null = Value::Null;
        let mut failure = ValidationFailure::new();

        for (field, rules) in &self.rules {
            if field == pk_field && instance.is_new() {
                continue;
            }
            let value = instance.get(field).unwrap_or(&null);
            for rule in rules {
                if rule.is_violated(value) {
                    failure.add(field.clone(), rule.name(), rule.message(value));
                }
            }
        }

        failure.into_result().map_err(Error::from)
    }

    /// Validate a single candidate value against one field's rules.
    ///
    /// Used by `Instance::set` when `validate_assignment` is on.
    pub(crate) fn check_field(&self, field: &str, value: &Value, is_new: bool) -> Result<()> {
        let Some((_, rules)) = self.rules.iter().find(|(name, _)| name == field) else {
            return Err(SchemaError::unknown_field(field).into());
        };
        if field == self.schema.primary_key_field() && is_new {
            return Ok(());
        }
        let mut failure = ValidationFailure::new();
        for rule in rules {
            if rule.is_violated(value) {
                failure.add(field, rule.name(), rule.message(value));
            }
        }
        failure.into_result().map_err(Error::from)
    }

    // ==================== Coercion ====================

    /// Convert an instance's values to their storage representation.
    pub fn coerce_to_attributes(&self, instance: &Instance) -> Record {
        let null = Value::Null;
        self.schema
            .fields()
            .map(|(name, def)| {
                let value = instance.get(name).unwrap_or(&null).clone();
                (
                    name.to_string(),
                    self.coercions.apply_to_attribute(def.field_type(), value),
                )
            })
            .collect()
    }

    /// Convert a raw record to a fully-formed instance.
    ///
    /// Record fields absent from the schema are dropped; schema fields
    /// absent from the record fall back to their defaults.
    pub fn coerce_to_instance(self: &Rc<Self>, record: Record) -> Instance {
        let values = self.instance_values_from(record);
        Instance::build(Rc::clone(self), values)
    }

    fn instance_values_from(&self, record: Record) -> BTreeMap<String, Value> {
        let mut values = self.default_values();
        for (name, def) in self.schema.fields() {
            if let Some(raw) = record.get(name) {
                values.insert(
                    name.to_string(),
                    self.coercions.apply_to_instance(def.field_type(), raw.clone()),
                );
            }
        }
        values
    }

    fn default_values(&self) -> BTreeMap<String, Value> {
        self.schema
            .fields()
            .map(|(name, def)| (name.to_string(), def.default_or_null()))
            .collect()
    }

    // ==================== Lifecycle operations ====================

    /// Construct an unsaved instance: schema defaults overlaid with the
    /// given attributes (undeclared keys ignored, no coercion).
    pub fn new_instance(self: &Rc<Self>, attrs: Record) -> Instance {
        let mut values = self.default_values();
        for (field, value) in attrs {
            if self.schema.contains(&field) {
                values.insert(field, value);
            }
        }
        Instance::build(Rc::clone(self), values)
    }

    /// Construct an instance and save it.
    ///
    /// Validation failures and datasource errors propagate; a delegate
    /// veto leaves the returned instance in the `New` state.
    pub fn create(self: &Rc<Self>, attrs: Record) -> Result<Instance> {
        let mut instance = self.new_instance(attrs);
        self.save(&mut instance)?;
        Ok(instance)
    }

    /// Validate and persist an instance.
    ///
    /// Fails closed: a validation failure aborts the whole operation and
    /// nothing reaches the datasource. The delegate is then asked for
    /// permission; a veto returns [`Outcome::Vetoed`] with no notifications
    /// and no datasource call. Otherwise `WillSave` observers fire, the
    /// datasource persists the coerced attributes and assigns the primary
    /// key, the instance transitions to `Persisted`, and the delegate and
    /// `DidSave` observers are notified in that order.
    pub fn save(&self, instance: &mut Instance) -> Result<Outcome<Value>> {
        if instance.is_destroyed() {
            return Err(LifecycleError::new("save", "instance is destroyed").into());
        }
        self.ensure_valid(instance)?;

        let delegate = self.current_delegate();
        if let Some(delegate) = &delegate {
            if !delegate.will_save(self, instance) {
                tracing::debug!(model = %self.name, "save vetoed by delegate");
                return Ok(Outcome::Vetoed);
            }
        }

        self.notify_observers(ModelEvent::WillSave, instance);

        let attrs = self.coerce_to_attributes(instance);
        let pk = self
            .datasource
            .save_record(&self.name, self.schema.primary_key_field(), attrs)?;
        instance.assign_primary_key(pk.clone());
        tracing::debug!(model = %self.name, pk = %pk, "record saved");

        if let Some(delegate) = &delegate {
            delegate.did_save(self, instance);
        }
        self.notify_observers(ModelEvent::DidSave, instance);

        Ok(Outcome::Completed(pk))
    }

    /// Remove an instance's record from the datasource.
    ///
    /// Mirrors [`save`](Model::save): destroyed instances and instances
    /// without a primary key are rejected, the delegate may veto, and on
    /// completion the instance transitions to the terminal `Destroyed`
    /// state before the delegate and `DidDestroy` observers are notified.
    /// The completed value reports whether the datasource actually removed
    /// a record.
    pub fn destroy(&self, instance: &mut Instance) -> Result<Outcome<bool>> {
        if instance.is_destroyed() {
            return Err(LifecycleError::new("destroy", "instance is destroyed").into());
        }
        let pk = instance.primary_key().clone();
        if pk.is_null() {
            return Err(LifecycleError::new("destroy", "instance has no primary key").into());
        }

        let delegate = self.current_delegate();
        if let Some(delegate) = &delegate {
            if !delegate.will_destroy(self, instance) {
                tracing::debug!(model = %self.name, pk = %pk, "destroy vetoed by delegate");
                return Ok(Outcome::Vetoed);
            }
        }

        self.notify_observers(ModelEvent::WillDestroy, instance);

        let removed = self.datasource.destroy_record(&self.name, &pk)?;
        instance.mark_destroyed();
        tracing::debug!(model = %self.name, pk = %pk, removed, "record destroyed");

        if let Some(delegate) = &delegate {
            delegate.did_destroy(self, &pk);
        }
        self.notify_observers(ModelEvent::DidDestroy, instance);

        Ok(Outcome::Completed(removed))
    }

    /// Fetch one record by primary key as a fully-formed instance.
    pub fn get(self: &Rc<Self>, pk: &Value) -> Result<Instance> {
        let record = self.datasource.get_record(&self.name, pk)?;
        Ok(self.coerce_to_instance(record))
    }

    /// Fetch all records matching the query as fully-formed instances.
    pub fn find(self: &Rc<Self>, query: &Query) -> Result<Vec<Instance>> {
        let records = self.datasource.find_records(&self.name, query)?;
        tracing::debug!(model = %self.name, count = records.len(), "find returned records");
        Ok(records
            .into_iter()
            .map(|record| self.coerce_to_instance(record))
            .collect())
    }

    /// Fetch every record of this model.
    pub fn all(self: &Rc<Self>) -> Result<Vec<Instance>> {
        self.find(&Query::new())
    }

    /// Re-read an instance's record by primary key, replacing its values
    /// and dirty snapshot.
    pub fn refresh(&self, instance: &mut Instance) -> Result<()> {
        if instance.is_destroyed() {
            return Err(LifecycleError::new("refresh", "instance is destroyed").into());
        }
        let pk = instance.primary_key().clone();
        if pk.is_null() {
            return Err(LifecycleError::new("refresh", "instance has no primary key").into());
        }
        let record = self.datasource.get_record(&self.name, &pk)?;
        instance.replace_values(self.instance_values_from(record));
        Ok(())
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:model]", self.name)
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Model`].
pub struct ModelBuilder {
    name: String,
    schema: Schema,
    datasource: Box<dyn Datasource>,
    coercions: CoercionTable,
    options: ModelOptions,
}

impl ModelBuilder {
    /// Register a coercion pair for a field type.
    pub fn coercion(mut self, field_type: FieldType, coercion: Coercion) -> Self {
        self.coercions.register(field_type, coercion);
        self
    }

    /// Override the behavior switches.
    pub fn options(mut self, options: ModelOptions) -> Self {
        self.options = options;
        self
    }

    /// Enable per-assignment validation on `Instance::set`.
    pub fn validate_assignment(mut self) -> Self {
        self.options.validate_assignment = true;
        self
    }

    /// Compile the rule table and produce the shared model.
    pub fn build(self) -> Rc<Model> {
        let rules = self
            .schema
            .fields()
            .map(|(name, def)| (name.to_string(), Rule::compile(def)))
            .collect();
        Rc::new(Model {
            name: self.name,
            schema: self.schema,
            rules,
            coercions: self.coercions,
            options: self.options,
            datasource: self.datasource,
            delegate: RefCell::new(None),
            observers: RefCell::new(Observers::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordNotFound;
    use crate::schema::FieldDef;
    use std::cell::RefCell;

    /// Scripted in-process datasource recording every call.
    #[derive(Default)]
    struct ScriptedStore {
        records: RefCell<BTreeMap<i64, Record>>,
        next_pk: RefCell<i64>,
        saves: RefCell<usize>,
        destroys: RefCell<usize>,
    }

    impl Datasource for ScriptedStore {
        fn get_record(&self, model: &str, pk: &Value) -> Result<Record> {
            let key = pk.as_i64().ok_or_else(|| {
                Error::NotFound(RecordNotFound::new(model, pk.clone()))
            })?;
            self.records
                .borrow()
                .get(&key)
                .cloned()
                .ok_or_else(|| Error::NotFound(RecordNotFound::new(model, pk.clone())))
        }

        fn find_records(&self, _model: &str, query: &Query) -> Result<Vec<Record>> {
            Ok(self
                .records
                .borrow()
                .values()
                .filter(|r| query.matches(r))
                .cloned()
                .collect())
        }

        fn save_record(&self, _model: &str, pk_field: &str, mut attrs: Record) -> Result<Value> {
            *self.saves.borrow_mut() += 1;
            let pk = match attrs.get(pk_field) {
                Some(Value::Integer(existing)) => *existing,
                _ => {
                    let mut next = self.next_pk.borrow_mut();
                    let assigned = *next;
                    *next += 1;
                    assigned
                }
            };
            attrs.insert(pk_field, pk);
            self.records.borrow_mut().insert(pk, attrs);
            Ok(Value::Integer(pk))
        }

        fn destroy_record(&self, _model: &str, pk: &Value) -> Result<bool> {
            *self.destroys.borrow_mut() += 1;
            let Some(key) = pk.as_i64() else {
                return Ok(false);
            };
            Ok(self.records.borrow_mut().remove(&key).is_some())
        }
    }

    fn person_schema() -> Schema {
        Schema::builder()
            .field("id", FieldDef::new(FieldType::Integer).primary_key())
            .field("name", FieldDef::new(FieldType::Text).required())
            .field("age", FieldDef::new(FieldType::Integer).between(0i64, 200i64))
            .build()
            .unwrap()
    }

    fn person_model() -> Rc<Model> {
        Model::new("person", person_schema(), ScriptedStore::default())
    }

    #[test]
    fn create_assigns_incrementing_primary_keys() {
        let model = person_model();

        let alice = model.create(Record::new().with("name", "Alice")).unwrap();
        assert!(!alice.is_new());
        assert_eq!(alice.primary_key(), &Value::Integer(0));

        let bob = model.create(Record::new().with("name", "Bob")).unwrap();
        assert_eq!(bob.primary_key(), &Value::Integer(1));
    }

    #[test]
    fn invalid_create_writes_nothing() {
        let model = person_model();

        let err = model.create(Record::new()).unwrap_err();
        match err {
            Error::Validation(failure) => {
                assert_eq!(failure.rules_for("name"), vec!["required"]);
            }
            other => panic!("expected validation failure, got {other}"),
        }
        assert!(model.all().unwrap().is_empty());
    }

    #[test]
    fn primary_key_validation_skipped_only_while_new() {
        let schema = Schema::builder()
            .field(
                "id",
                FieldDef::new(FieldType::Integer).primary_key().required(),
            )
            .field("name", FieldDef::new(FieldType::Text).required())
            .build()
            .unwrap();
        let model = Model::new("person", schema, ScriptedStore::default());

        // New instance: required pk is exempt.
        let instance = model.new_instance(Record::new().with("name", "Ann"));
        assert!(model.ensure_valid(&instance).is_ok());

        // Persisted instance with the pk knocked back to null: validated.
        let mut instance = model.create(Record::new().with("name", "Ann")).unwrap();
        instance.set("id", Value::Null).unwrap();
        let err = model.ensure_valid(&instance).unwrap_err();
        match err {
            Error::Validation(failure) => {
                assert_eq!(failure.rules_for("id"), vec!["required"]);
            }
            other => panic!("expected validation failure, got {other}"),
        }
    }

    #[test]
    fn validation_failures_aggregate_across_fields() {
        let model = person_model();
        let instance = model.new_instance(Record::new().with("age", 500i64));

        let err = model.ensure_valid(&instance).unwrap_err();
        match err {
            Error::Validation(failure) => {
                let by_field = failure.by_field();
                assert_eq!(by_field["name"], vec!["required"]);
                assert_eq!(by_field["age"], vec!["between"]);
            }
            other => panic!("expected validation failure, got {other}"),
        }
    }

    struct Refuser {
        consulted: RefCell<usize>,
    }

    impl ModelDelegate for Refuser {
        fn will_save(&self, _model: &Model, _instance: &Instance) -> bool {
            *self.consulted.borrow_mut() += 1;
            false
        }

        fn will_destroy(&self, _model: &Model, _instance: &Instance) -> bool {
            false
        }
    }

    #[test]
    fn delegate_veto_reaches_no_datasource_and_fires_nothing() {
        let model = person_model();
        let refuser = Rc::new(Refuser {
            consulted: RefCell::new(0),
        });
        model.set_delegate(Rc::clone(&refuser) as Rc<dyn ModelDelegate>);

        let fired = Rc::new(RefCell::new(Vec::new()));
        for event in [ModelEvent::WillSave, ModelEvent::DidSave] {
            let fired = Rc::clone(&fired);
            model.add_observer(event, move |_, _| fired.borrow_mut().push(event));
        }

        let mut instance = model.new_instance(Record::new().with("name", "Ann"));
        let outcome = model.save(&mut instance).unwrap();

        assert!(outcome.is_vetoed());
        assert!(instance.is_new());
        assert_eq!(*refuser.consulted.borrow(), 1);
        assert!(fired.borrow().is_empty());
        assert!(model.all().unwrap().is_empty());
    }

    #[test]
    fn permissive_delegate_lets_save_proceed() {
        struct Permitter;
        impl ModelDelegate for Permitter {}

        let model = person_model();
        model.set_delegate(Rc::new(Permitter));

        let instance = model.create(Record::new().with("name", "Ann")).unwrap();
        assert!(!instance.is_new());
    }

    #[test]
    fn save_notification_order_is_will_store_did() {
        let model = person_model();
        let log = Rc::new(RefCell::new(Vec::new()));

        struct Logger(Rc<RefCell<Vec<&'static str>>>);
        impl ModelDelegate for Logger {
            fn will_save(&self, _m: &Model, _i: &Instance) -> bool {
                self.0.borrow_mut().push("delegate:will_save");
                true
            }
            fn did_save(&self, _m: &Model, _i: &Instance) {
                self.0.borrow_mut().push("delegate:did_save");
            }
        }

        model.set_delegate(Rc::new(Logger(Rc::clone(&log))));
        {
            let log = Rc::clone(&log);
            model.add_observer(ModelEvent::WillSave, move |_, _| {
                log.borrow_mut().push("observer:will_save");
            });
        }
        {
            let log = Rc::clone(&log);
            model.add_observer(ModelEvent::DidSave, move |_, instance| {
                assert!(!instance.is_new());
                log.borrow_mut().push("observer:did_save");
            });
        }

        model.create(Record::new().with("name", "Ann")).unwrap();
        assert_eq!(
            log.borrow().as_slice(),
            [
                "delegate:will_save",
                "observer:will_save",
                "delegate:did_save",
                "observer:did_save",
            ]
        );
    }

    #[test]
    fn destroy_transitions_to_terminal_state() {
        let model = person_model();
        let mut instance = model.create(Record::new().with("name", "Ann")).unwrap();
        let pk = instance.primary_key().clone();

        let outcome = model.destroy(&mut instance).unwrap();
        assert_eq!(outcome, Outcome::Completed(true));
        assert!(instance.is_destroyed());
        assert!(matches!(model.get(&pk), Err(Error::NotFound(_))));

        // Terminal: a second destroy is a lifecycle error.
        assert!(matches!(
            model.destroy(&mut instance),
            Err(Error::Lifecycle(_))
        ));
        assert!(matches!(model.save(&mut instance), Err(Error::Lifecycle(_))));
    }

    #[test]
    fn destroy_requires_a_primary_key() {
        let model = person_model();
        let mut instance = model.new_instance(Record::new().with("name", "Ann"));
        assert!(matches!(
            model.destroy(&mut instance),
            Err(Error::Lifecycle(_))
        ));
    }

    #[test]
    fn destroy_notifies_delegate_with_pk() {
        struct PkCapture(Rc<RefCell<Option<Value>>>);
        impl ModelDelegate for PkCapture {
            fn did_destroy(&self, _model: &Model, pk: &Value) {
                *self.0.borrow_mut() = Some(pk.clone());
            }
        }

        let model = person_model();
        let captured = Rc::new(RefCell::new(None));
        model.set_delegate(Rc::new(PkCapture(Rc::clone(&captured))));

        let mut instance = model.create(Record::new().with("name", "Ann")).unwrap();
        model.destroy(&mut instance).unwrap();
        assert_eq!(*captured.borrow(), Some(Value::Integer(0)));
    }

    #[test]
    fn coercion_applies_at_the_datasource_boundary() {
        let schema = Schema::builder()
            .field("id", FieldDef::new(FieldType::Integer).primary_key())
            .field("seen_at", FieldDef::new(FieldType::Timestamp))
            .build()
            .unwrap();
        let model = Model::builder("event", schema, ScriptedStore::default())
            .coercion(
                FieldType::Timestamp,
                Coercion::new(
                    |v| match v {
                        Value::Timestamp(us) => Value::Integer(us),
                        other => other,
                    },
                    |v| match v {
                        Value::Integer(us) => Value::Timestamp(us),
                        other => other,
                    },
                ),
            )
            .build();

        let mut instance = model.new_instance(Record::new());
        instance.set("seen_at", Value::Timestamp(1_234)).unwrap();
        let pk = model.save(&mut instance).unwrap().completed().unwrap();

        // Stored shape is the coerced attribute.
        let raw = model.datasource().get_record("event", &pk).unwrap();
        assert_eq!(raw.get("seen_at"), Some(&Value::Integer(1_234)));

        // Reading back restores the instance shape.
        let reloaded = model.get(&pk).unwrap();
        assert_eq!(reloaded.get("seen_at"), Some(&Value::Timestamp(1_234)));
    }

    #[test]
    fn coerce_to_instance_drops_undeclared_fields() {
        let model = person_model();
        let record = Record::new()
            .with("id", 9i64)
            .with("name", "Ann")
            .with("stray", "dropped");
        let instance = model.coerce_to_instance(record);
        assert_eq!(instance.get("stray"), None);
        assert_eq!(instance.get("name"), Some(&Value::Text("Ann".to_string())));
        assert!(!instance.is_new());
    }

    #[test]
    fn find_coerces_every_result() {
        let model = person_model();
        model.create(Record::new().with("name", "Ann").with("age", 35i64)).unwrap();
        model.create(Record::new().with("name", "bob").with("age", 22i64)).unwrap();

        let query = Query::new().filter_key("name__iexact", "ANN").unwrap();
        let found = model.find(&query).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("name"), Some(&Value::Text("Ann".to_string())));

        let query = Query::new().filter_key("age__gte", 30i64).unwrap();
        let found = model.find(&query).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("age"), Some(&Value::Integer(35)));

        assert_eq!(model.all().unwrap().len(), 2);
    }

    #[test]
    fn refresh_rereads_from_the_datasource() {
        let model = person_model();
        let mut instance = model.create(Record::new().with("name", "Ann")).unwrap();

        instance.set("name", "Renamed").unwrap();
        assert_eq!(instance.modified_fields(), vec!["name"]);

        model.refresh(&mut instance).unwrap();
        assert_eq!(instance.get("name"), Some(&Value::Text("Ann".to_string())));
        assert!(instance.modified_fields().is_empty());
    }

    #[test]
    fn validate_assignment_rejects_bad_sets() {
        let model = Model::builder("person", person_schema(), ScriptedStore::default())
            .validate_assignment()
            .build();
        let mut instance = model.new_instance(Record::new().with("name", "Ann"));

        assert!(instance.set("age", 30i64).is_ok());
        assert!(matches!(
            instance.set("age", 500i64),
            Err(Error::Validation(_))
        ));
        // Rejected assignment leaves the previous value in place.
        assert_eq!(instance.get("age"), Some(&Value::Integer(30)));
    }

    #[test]
    fn display_formats() {
        let model = person_model();
        assert_eq!(model.to_string(), "[person:model]");
        let instance = model.create(Record::new().with("name", "Ann")).unwrap();
        assert_eq!(instance.to_string(), "[person:instance -> id:0]");
    }
}
