//! Core types and traits for Formodel.
//!
//! This crate provides the foundational abstractions for schema-driven
//! record models:
//!
//! - `Schema`/`FieldDef` for declarative field definitions
//! - `Model`/`Instance` for the validation + persistence + notification
//!   pipeline
//! - `Datasource` trait for pluggable storage backends
//! - `Observers` and the delegate traits for lifecycle notification
//! - `Value`/`Record` as the dynamic value model

pub mod coerce;
pub mod datasource;
pub mod error;
pub mod instance;
pub mod model;
pub mod notify;
pub mod query;
pub mod record;
pub mod rule;
pub mod schema;
pub mod value;

pub use coerce::{Coercion, CoercionTable};
pub use datasource::Datasource;
pub use error::{
    Error, FieldError, LifecycleError, OperationalError, OperationalErrorKind, RecordNotFound,
    RegistryError, Result, SchemaError, SchemaErrorKind, TypeError, ValidationFailure,
};
pub use instance::{Instance, InstanceState};
pub use model::{Model, ModelBuilder, ModelOptions, Outcome};
pub use notify::{
    InstanceDelegate, InstanceEvent, InstanceObserver, ModelDelegate, ModelEvent, ModelObserver,
    Observers,
};
pub use query::{Filter, FilterOp, Query};
pub use record::Record;
pub use rule::{Rule, matches_pattern};
pub use schema::{CustomRule, FieldDef, Schema, SchemaBuilder};
pub use value::{FieldType, Value};
