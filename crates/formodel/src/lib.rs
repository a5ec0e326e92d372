//! Formodel - schema-driven record models with pluggable datasources.
//!
//! Formodel is a small client-side ORM layer: declare a schema, attach a
//! datasource, and get validated create/save/find/destroy operations with
//! observer and delegate notifications around every lifecycle transition.
//!
//! - **Schema-driven validation**: per-field type and constraint rules,
//!   aggregated into one failure per save attempt
//! - **Pluggable datasources**: an in-memory store and a REST-backed store
//!   behind one capability trait
//! - **Observers and delegates**: informational callbacks plus a single
//!   typed delegate whose `will_*` hooks can veto saves and destroys
//! - **Coercion**: per-type value conversion at the datasource boundary
//!
//! # Quick Start
//!
//! ```
//! use formodel::prelude::*;
//! use std::rc::Rc;
//!
//! fn main() -> formodel::Result<()> {
//!     let schema = Schema::builder()
//!         .field("id", FieldDef::new(FieldType::Integer).primary_key())
//!         .field("name", FieldDef::new(FieldType::Text).required())
//!         .field("age", FieldDef::new(FieldType::Integer))
//!         .build()?;
//!     let people = Model::new("person", schema, MemoryDatasource::new("people"));
//!
//!     // The registry is explicit: owned here, not process-global.
//!     let mut registry = ModelRegistry::new();
//!     registry.register(Rc::clone(&people))?;
//!
//!     let mut ann = people.create(Record::new().with("name", "Ann").with("age", 35))?;
//!     assert_eq!(ann.primary_key(), &Value::Integer(0));
//!
//!     ann.set("age", 36)?;
//!     ann.save()?;
//!
//!     let found = people.find(&Query::new().filter_key("name__iexact", "ANN")?)?;
//!     assert_eq!(found.len(), 1);
//!     Ok(())
//! }
//! ```

// Re-export all public types from sub-crates
pub use formodel_core::{
    Coercion,
    CoercionTable,
    CustomRule,
    Datasource,
    Error,
    FieldDef,
    FieldError,
    FieldType,
    Filter,
    FilterOp,
    Instance,
    InstanceDelegate,
    InstanceEvent,
    InstanceState,
    LifecycleError,
    Model,
    ModelBuilder,
    ModelDelegate,
    ModelEvent,
    ModelOptions,
    Observers,
    OperationalError,
    OperationalErrorKind,
    Outcome,
    Query,
    Record,
    RecordNotFound,
    RegistryError,
    Result,
    Rule,
    Schema,
    SchemaBuilder,
    SchemaError,
    SchemaErrorKind,
    TypeError,
    ValidationFailure,
    Value,
};

pub use formodel_memory::MemoryDatasource;

pub use formodel_rest::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, RestDatasource, RestOptions,
};

pub mod registry;
pub use registry::ModelRegistry;

/// Commonly used types, importable in one line.
pub mod prelude {
    pub use crate::registry::ModelRegistry;
    pub use formodel_core::{
        Coercion, Datasource, Error, FieldDef, FieldType, FilterOp, Instance, InstanceDelegate,
        InstanceEvent, InstanceState, Model, ModelDelegate, ModelEvent, ModelOptions, Outcome,
        Query, Record, Result, Schema, ValidationFailure, Value,
    };
    pub use formodel_memory::MemoryDatasource;
    pub use formodel_rest::{HttpTransport, RestDatasource, RestOptions};
}
