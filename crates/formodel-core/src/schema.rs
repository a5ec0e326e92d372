//! Schema and field definitions.
//!
//! A [`Schema`] is the static, declarative description of a model's fields:
//! each field names a [`FieldType`] and any constraints that the validation
//! engine should enforce. Schemas are built once, checked at build time, and
//! immutable afterwards.

use std::rc::Rc;

use crate::error::{SchemaError, SchemaErrorKind};
use crate::value::{FieldType, Value};

/// A user-supplied, named validation check attached to one field.
///
/// The check reports `true` when the value is *invalid*, matching the
/// built-in rules' convention.
#[derive(Clone)]
pub struct CustomRule {
    name: String,
    check: Rc<dyn Fn(&Value) -> bool>,
}

impl CustomRule {
    pub fn new(name: impl Into<String>, check: impl Fn(&Value) -> bool + 'static) -> Self {
        Self {
            name: name.into(),
            check: Rc::new(check),
        }
    }

    /// The rule name reported in validation failures.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the check; `true` means the value violates the rule.
    pub fn is_violated(&self, value: &Value) -> bool {
        (self.check)(value)
    }
}

impl std::fmt::Debug for CustomRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomRule")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Declaration of a single schema field: its type plus constraints.
#[derive(Debug, Clone)]
pub struct FieldDef {
    field_type: FieldType,
    primary_key: bool,
    required: bool,
    default: Option<Value>,
    max_length: Option<usize>,
    min_length: Option<usize>,
    between: Option<(Value, Value)>,
    one_of: Option<Vec<Value>>,
    pattern: Option<String>,
    custom: Vec<CustomRule>,
}

impl FieldDef {
    /// Declare a field of the given type with no constraints.
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            primary_key: false,
            required: false,
            default: None,
            max_length: None,
            min_length: None,
            between: None,
            one_of: None,
            pattern: None,
            custom: Vec::new(),
        }
    }

    /// Mark this field as the primary key.
    ///
    /// A schema must mark exactly one field. Primary-key fields skip all
    /// validation while their instance has not yet been saved.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Require a non-null value before every save.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Default value applied to fresh instances.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Maximum length for text (characters) or array (elements) values.
    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    /// Minimum length for text (characters) or array (elements) values.
    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    /// Require `lo < value < hi` (exclusive on both ends).
    pub fn between(mut self, lo: impl Into<Value>, hi: impl Into<Value>) -> Self {
        self.between = Some((lo.into(), hi.into()));
        self
    }

    /// Restrict values to a fixed option set.
    pub fn one_of(mut self, options: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        self.one_of = Some(options.into_iter().map(Into::into).collect());
        self
    }

    /// Require text values to match a regex pattern.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Attach a named custom rule.
    pub fn rule(mut self, name: impl Into<String>, check: impl Fn(&Value) -> bool + 'static) -> Self {
        self.custom.push(CustomRule::new(name, check));
        self
    }

    /// The declared type of this field.
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Whether this field is the primary key.
    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    /// Whether a non-null value is required.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Default value for fresh instances, or `Value::Null`.
    pub fn default_or_null(&self) -> Value {
        self.default.clone().unwrap_or(Value::Null)
    }

    pub(crate) fn max_length_opt(&self) -> Option<usize> {
        self.max_length
    }

    pub(crate) fn min_length_opt(&self) -> Option<usize> {
        self.min_length
    }

    pub(crate) fn between_opt(&self) -> Option<&(Value, Value)> {
        self.between.as_ref()
    }

    pub(crate) fn one_of_opt(&self) -> Option<&[Value]> {
        self.one_of.as_deref()
    }

    pub(crate) fn pattern_opt(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub(crate) fn custom_rules(&self) -> &[CustomRule] {
        &self.custom
    }
}

/// An immutable, validated collection of field definitions.
///
/// Built via [`Schema::builder`]; the build step enforces the schema
/// invariants (non-empty, unique field names, exactly one primary key).
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<(String, FieldDef)>,
    primary_key: String,
}

impl Schema {
    /// Start building a schema.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Iterate the fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldDef)> {
        self.fields.iter().map(|(name, def)| (name.as_str(), def))
    }

    /// Iterate the field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Look up one field's definition.
    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, def)| def)
    }

    /// Check whether a field is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Name of the primary-key field.
    pub fn primary_key_field(&self) -> &str {
        &self.primary_key
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema declares no fields. Never true for a built schema.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<(String, FieldDef)>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Declare a field. Declaration order is preserved.
    pub fn field(mut self, name: impl Into<String>, def: FieldDef) -> Self {
        self.fields.push((name.into(), def));
        self
    }

    /// Validate the collected declarations and produce the schema.
    pub fn build(self) -> Result<Schema, SchemaError> {
        if self.fields.is_empty() {
            return Err(SchemaError::new(
                SchemaErrorKind::Empty,
                "schema declares no fields",
            ));
        }

        for (i, (name, _)) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|(other, _)| other == name) {
                return Err(SchemaError::new(
                    SchemaErrorKind::DuplicateField,
                    format!("field '{name}' is declared twice"),
                ));
            }
        }

        let mut pk_fields = self
            .fields
            .iter()
            .filter(|(_, def)| def.is_primary_key())
            .map(|(name, _)| name.clone());

        let Some(primary_key) = pk_fields.next() else {
            return Err(SchemaError::new(
                SchemaErrorKind::NoPrimaryKey,
                "no field is marked primary_key",
            ));
        };
        if let Some(second) = pk_fields.next() {
            return Err(SchemaError::new(
                SchemaErrorKind::DuplicatePrimaryKey,
                format!("both '{primary_key}' and '{second}' are marked primary_key"),
            ));
        }

        Ok(Schema {
            fields: self.fields,
            primary_key,
        })
    }
}
