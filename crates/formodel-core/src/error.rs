//! Error types for Formodel operations.

use std::collections::BTreeMap;
use std::fmt;

use crate::value::Value;

/// The primary error type for all Formodel operations.
#[derive(Debug)]
pub enum Error {
    /// Malformed schema or schema-violating assignment
    Schema(SchemaError),
    /// One or more field validation rules failed
    Validation(ValidationFailure),
    /// A datasource was asked for a primary key it does not hold
    NotFound(RecordNotFound),
    /// Datasource-level failure (transport, protocol, decoding)
    Operational(OperationalError),
    /// Value conversion errors
    Type(TypeError),
    /// Operation attempted against an instance in an ineligible state
    Lifecycle(LifecycleError),
    /// Model registry errors
    Registry(RegistryError),
}

#[derive(Debug)]
pub struct SchemaError {
    pub kind: SchemaErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorKind {
    /// Schema declares no fields
    Empty,
    /// Two fields share a name
    DuplicateField,
    /// No field is marked as the primary key
    NoPrimaryKey,
    /// More than one field is marked as the primary key
    DuplicatePrimaryKey,
    /// A field name not present in the schema
    UnknownField,
}

impl SchemaError {
    pub fn new(kind: SchemaErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Convenience constructor for assignments to undeclared fields.
    pub fn unknown_field(field: &str) -> Self {
        Self::new(
            SchemaErrorKind::UnknownField,
            format!("field '{field}' is not declared in the schema"),
        )
    }
}

/// Aggregated validation failure for an instance.
///
/// Carries every failing rule, grouped per field via [`by_field`].
/// Produced by `Model::ensure_valid` before anything reaches a datasource.
///
/// [`by_field`]: ValidationFailure::by_field
#[derive(Debug, Clone, Default)]
pub struct ValidationFailure {
    /// The failing rules, in schema field order
    pub errors: Vec<FieldError>,
}

/// A single failing validation rule on a field.
#[derive(Debug, Clone)]
pub struct FieldError {
    /// The field that failed validation
    pub field: String,
    /// The name of the rule that failed (e.g. "required", "max_length")
    pub rule: String,
    /// Human-readable error message
    pub message: String,
}

impl ValidationFailure {
    /// Create a new empty failure container.
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Check if there are any failing rules.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add a failing rule.
    pub fn add(
        &mut self,
        field: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.errors.push(FieldError {
            field: field.into(),
            rule: rule.into(),
            message: message.into(),
        });
    }

    /// Group the failing rule names per field.
    pub fn by_field(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut map: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for err in &self.errors {
            map.entry(err.field.as_str()).or_default().push(err.rule.as_str());
        }
        map
    }

    /// Failing rule names for one field, if any.
    pub fn rules_for(&self, field: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.rule.as_str())
            .collect()
    }

    /// Convert to Result, returning `Ok(())` if no rules failed.
    pub fn into_result(self) -> std::result::Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

#[derive(Debug)]
pub struct RecordNotFound {
    /// Name of the model whose store was queried
    pub model: String,
    /// The primary key that was looked up
    pub pk: Value,
}

impl RecordNotFound {
    pub fn new(model: impl Into<String>, pk: Value) -> Self {
        Self {
            model: model.into(),
            pk,
        }
    }
}

#[derive(Debug)]
pub struct OperationalError {
    pub kind: OperationalErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + 'static>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationalErrorKind {
    /// The transport failed to complete the request
    Transport,
    /// The remote answered outside the expected protocol (e.g. HTTP 500)
    Protocol,
    /// The payload could not be decoded into records
    Decode,
}

impl OperationalError {
    pub fn new(kind: OperationalErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        kind: OperationalErrorKind,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + 'static>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(source),
        }
    }
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub field: Option<String>,
}

#[derive(Debug)]
pub struct LifecycleError {
    /// The operation that was attempted (e.g. "save", "destroy")
    pub operation: &'static str,
    /// Why the instance was ineligible
    pub message: String,
}

impl LifecycleError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub struct RegistryError {
    /// The model name that was already taken
    pub name: String,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Schema(e) => write!(f, "Schema error: {}", e.message),
            Error::Validation(e) => write!(f, "Validation failure: {}", e),
            Error::NotFound(e) => write!(f, "{}", e),
            Error::Operational(e) => write!(f, "Datasource error: {}", e.message),
            Error::Type(e) => write!(f, "Type error: {}", e),
            Error::Lifecycle(e) => {
                write!(f, "Lifecycle error: cannot {}: {}", e.operation, e.message)
            }
            Error::Registry(e) => {
                write!(f, "Registry error: model '{}' is already registered", e.name)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Operational(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            write!(f, "validation passed")
        } else if self.errors.len() == 1 {
            let err = &self.errors[0];
            write!(f, "'{}' {}", err.field, err.message)
        } else {
            writeln!(f, "{} rules failed:", self.errors.len())?;
            for err in &self.errors {
                writeln!(f, "  - {}: {}", err.field, err.message)?;
            }
            Ok(())
        }
    }
}

impl fmt::Display for RecordNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no record with pk {} in '{}'", self.pk, self.model)
    }
}

impl fmt::Display for OperationalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(field) = &self.field {
            write!(
                f,
                "expected {} for field '{}', found {}",
                self.expected, field, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot {}: {}", self.operation, self.message)
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model '{}' is already registered", self.name)
    }
}

impl std::error::Error for ValidationFailure {}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        Error::Schema(err)
    }
}

impl From<ValidationFailure> for Error {
    fn from(err: ValidationFailure) -> Self {
        Error::Validation(err)
    }
}

impl From<RecordNotFound> for Error {
    fn from(err: RecordNotFound) -> Self {
        Error::NotFound(err)
    }
}

impl From<OperationalError> for Error {
    fn from(err: OperationalError) -> Self {
        Error::Operational(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<LifecycleError> for Error {
    fn from(err: LifecycleError) -> Self {
        Error::Lifecycle(err)
    }
}

impl From<RegistryError> for Error {
    fn from(err: RegistryError) -> Self {
        Error::Registry(err)
    }
}

/// Result type alias for Formodel operations.
pub type Result<T> = std::result::Result<T, Error>;
