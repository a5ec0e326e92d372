//! Field validation rules.
//!
//! Rules are a closed set of variants compiled from each field's
//! [`FieldDef`](crate::schema::FieldDef) at model construction, plus a
//! named custom-rule slot for user-supplied checks. A rule reports `true`
//! when the value is *invalid*.

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use regex::Regex;

use crate::schema::{CustomRule, FieldDef};
use crate::value::{FieldType, Value};

/// Cache of compiled regex patterns.
///
/// Patterns are compiled lazily on first use and kept for the lifetime of
/// the process, so repeated validation of the same field does not recompile.
struct RegexCache {
    cache: RwLock<HashMap<String, Regex>>,
}

impl RegexCache {
    fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn get_or_compile(&self, pattern: &str) -> Result<Regex, regex::Error> {
        // Fast path: already cached.
        // Recover from a poisoned lock (another thread panicked mid-write).
        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(regex) = cache.get(pattern) {
                return Ok(regex.clone());
            }
        }

        let regex = Regex::new(pattern)?;
        {
            let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
            cache.insert(pattern.to_string(), regex.clone());
        }
        Ok(regex)
    }
}

fn regex_cache() -> &'static RegexCache {
    static CACHE: OnceLock<RegexCache> = OnceLock::new();
    CACHE.get_or_init(RegexCache::new)
}

/// Check if a string matches a regex pattern.
///
/// Invalid patterns log a warning and count as a non-match; validation
/// should be resilient, not panic.
pub fn matches_pattern(value: &str, pattern: &str) -> bool {
    match regex_cache().get_or_compile(pattern) {
        Ok(regex) => regex.is_match(value),
        Err(e) => {
            tracing::warn!(
                pattern = pattern,
                error = %e,
                "invalid regex pattern in validation, treating as non-match"
            );
            false
        }
    }
}

/// One validation rule attached to a field.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Value, when present, must be of the declared type.
    Type(FieldType),
    /// Value must be non-null.
    Required,
    /// Text/array length must not exceed the limit.
    MaxLength(usize),
    /// Text/array length must not fall short of the limit.
    MinLength(usize),
    /// Value must sit strictly between the bounds.
    Between(Value, Value),
    /// Value must be a member of the option set.
    OneOf(Vec<Value>),
    /// Text value must match the regex pattern.
    Pattern(String),
    /// User-supplied named check.
    Custom(CustomRule),
}

impl Rule {
    /// Compile the rule list for one field definition.
    ///
    /// The `type` rule is always present (every field declares a type);
    /// the rest appear only when the definition carries the matching
    /// constraint. `primary_key` and `default` are metadata, not rules.
    pub fn compile(def: &FieldDef) -> Vec<Rule> {
        let mut rules = vec![Rule::Type(def.field_type())];
        if def.is_required() {
            rules.push(Rule::Required);
        }
        if let Some(n) = def.max_length_opt() {
            rules.push(Rule::MaxLength(n));
        }
        if let Some(n) = def.min_length_opt() {
            rules.push(Rule::MinLength(n));
        }
        if let Some((lo, hi)) = def.between_opt() {
            rules.push(Rule::Between(lo.clone(), hi.clone()));
        }
        if let Some(options) = def.one_of_opt() {
            rules.push(Rule::OneOf(options.to_vec()));
        }
        if let Some(pattern) = def.pattern_opt() {
            rules.push(Rule::Pattern(pattern.to_string()));
        }
        for custom in def.custom_rules() {
            rules.push(Rule::Custom(custom.clone()));
        }
        rules
    }

    /// The rule name reported in validation failures.
    pub fn name(&self) -> &str {
        match self {
            Rule::Type(_) => "type",
            Rule::Required => "required",
            Rule::MaxLength(_) => "max_length",
            Rule::MinLength(_) => "min_length",
            Rule::Between(_, _) => "between",
            Rule::OneOf(_) => "one_of",
            Rule::Pattern(_) => "pattern",
            Rule::Custom(rule) => rule.name(),
        }
    }

    /// Run the check; `true` means the value violates this rule.
    ///
    /// Null values fail only `required`: nullability is governed by that
    /// rule alone, so every other check skips absent values.
    pub fn is_violated(&self, value: &Value) -> bool {
        match self {
            Rule::Type(declared) => value
                .field_type()
                .is_some_and(|actual| actual != *declared),
            Rule::Required => value.is_null(),
            Rule::MaxLength(n) => value.len().is_some_and(|len| len > *n),
            Rule::MinLength(n) => value.len().is_some_and(|len| len < *n),
            Rule::Between(lo, hi) => {
                if value.is_null() {
                    return false;
                }
                let above = value.compare(lo).is_some_and(std::cmp::Ordering::is_gt);
                let below = value.compare(hi).is_some_and(std::cmp::Ordering::is_lt);
                !(above && below)
            }
            Rule::OneOf(options) => !value.is_null() && !options.contains(value),
            Rule::Pattern(pattern) => value
                .as_str()
                .is_some_and(|text| !matches_pattern(text, pattern)),
            Rule::Custom(rule) => rule.is_violated(value),
        }
    }

    /// Human-readable message for a violation of this rule.
    pub fn message(&self, value: &Value) -> String {
        match self {
            Rule::Type(declared) => {
                format!("must be {}, got {}", declared, value.type_name())
            }
            Rule::Required => "is required".to_string(),
            Rule::MaxLength(n) => format!(
                "must be at most {n} long, got {}",
                value.len().unwrap_or(0)
            ),
            Rule::MinLength(n) => format!(
                "must be at least {n} long, got {}",
                value.len().unwrap_or(0)
            ),
            Rule::Between(lo, hi) => {
                format!("must be between {lo} and {hi} exclusive, got {value}")
            }
            Rule::OneOf(_) => format!("'{value}' is not an allowed option"),
            Rule::Pattern(pattern) => format!("must match pattern '{pattern}'"),
            Rule::Custom(rule) => format!("failed rule '{}'", rule.name()),
        }
    }
}
