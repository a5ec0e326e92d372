//! Query filters.
//!
//! Datasource lookups take a [`Query`]: a conjunction of field filters.
//! Filters can be built in typed form (`filter("age", FilterOp::Gte, 30)`)
//! or parsed from the `field__operator` key convention used by form and
//! URL parameters (`filter_key("age__gte", 30)`); an omitted operator means
//! `exact`.

use crate::error::{Error, TypeError};
use crate::record::Record;
use crate::value::Value;

/// Comparison operator for a single filter condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Equal
    Exact,
    /// Equal, case-insensitive (text)
    IExact,
    /// Text starts with the match
    StartsWith,
    /// Text starts with the match, case-insensitive
    IStartsWith,
    /// Text ends with the match
    EndsWith,
    /// Text ends with the match, case-insensitive
    IEndsWith,
    /// Greater than
    Gt,
    /// Less than
    Lt,
    /// Greater than or equal
    Gte,
    /// Less than or equal
    Lte,
    /// Text contains the match
    Contains,
    /// Text contains the match, case-insensitive
    IContains,
}

impl FilterOp {
    /// The operator suffix used in `field__operator` keys.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Exact => "exact",
            FilterOp::IExact => "iexact",
            FilterOp::StartsWith => "startswith",
            FilterOp::IStartsWith => "istartswith",
            FilterOp::EndsWith => "endswith",
            FilterOp::IEndsWith => "iendswith",
            FilterOp::Gt => "gt",
            FilterOp::Lt => "lt",
            FilterOp::Gte => "gte",
            FilterOp::Lte => "lte",
            FilterOp::Contains => "contains",
            FilterOp::IContains => "icontains",
        }
    }

    /// Parse an operator suffix.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "exact" => Some(FilterOp::Exact),
            "iexact" => Some(FilterOp::IExact),
            "startswith" => Some(FilterOp::StartsWith),
            "istartswith" => Some(FilterOp::IStartsWith),
            "endswith" => Some(FilterOp::EndsWith),
            "iendswith" => Some(FilterOp::IEndsWith),
            "gt" => Some(FilterOp::Gt),
            "lt" => Some(FilterOp::Lt),
            "gte" => Some(FilterOp::Gte),
            "lte" => Some(FilterOp::Lte),
            "contains" => Some(FilterOp::Contains),
            "icontains" => Some(FilterOp::IContains),
            _ => None,
        }
    }

    /// Evaluate the operator against a record value and the filter target.
    ///
    /// Text operators apply to text values only; ordering operators use
    /// SQL-style comparison and treat incomparable pairs (including null)
    /// as non-matching.
    #[must_use]
    pub fn matches(&self, value: &Value, target: &Value) -> bool {
        use std::cmp::Ordering;

        let text_pair = || match (value.as_str(), target.as_str()) {
            (Some(v), Some(t)) => Some((v.to_string(), t.to_string())),
            _ => None,
        };
        let itext_pair = || text_pair().map(|(v, t)| (v.to_lowercase(), t.to_lowercase()));

        match self {
            FilterOp::Exact => match value.compare(target) {
                Some(ord) => ord == Ordering::Equal,
                None => value == target,
            },
            FilterOp::IExact => itext_pair().is_some_and(|(v, t)| v == t),
            FilterOp::StartsWith => text_pair().is_some_and(|(v, t)| v.starts_with(&t)),
            FilterOp::IStartsWith => itext_pair().is_some_and(|(v, t)| v.starts_with(&t)),
            FilterOp::EndsWith => text_pair().is_some_and(|(v, t)| v.ends_with(&t)),
            FilterOp::IEndsWith => itext_pair().is_some_and(|(v, t)| v.ends_with(&t)),
            FilterOp::Gt => value.compare(target).is_some_and(Ordering::is_gt),
            FilterOp::Lt => value.compare(target).is_some_and(Ordering::is_lt),
            FilterOp::Gte => value.compare(target).is_some_and(Ordering::is_ge),
            FilterOp::Lte => value.compare(target).is_some_and(Ordering::is_le),
            FilterOp::Contains => text_pair().is_some_and(|(v, t)| v.contains(&t)),
            FilterOp::IContains => itext_pair().is_some_and(|(v, t)| v.contains(&t)),
        }
    }
}

/// One filter condition: `field <op> value`.
#[derive(Debug, Clone)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Parse a `field` or `field__operator` key.
    pub fn from_key(key: &str, value: impl Into<Value>) -> Result<Self, Error> {
        let (field, op) = match key.split_once("__") {
            Some((field, suffix)) => {
                let op = FilterOp::parse(suffix).ok_or_else(|| {
                    Error::Type(TypeError {
                        expected: "known filter operator",
                        actual: format!("'{suffix}' in key '{key}'"),
                        field: None,
                    })
                })?;
                (field, op)
            }
            None => (key, FilterOp::Exact),
        };
        Ok(Self::new(field, op, value))
    }

    /// Evaluate this filter against a record. Missing fields are null.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        let value = record.get(&self.field).unwrap_or(&Value::Null);
        self.op.matches(value, &self.value)
    }

    /// Render as a `field__operator` key (`exact` stays bare).
    #[must_use]
    pub fn to_key(&self) -> String {
        match self.op {
            FilterOp::Exact => self.field.clone(),
            op => format!("{}__{}", self.field, op.as_str()),
        }
    }
}

/// A conjunction of filters. An empty query matches every record.
#[derive(Debug, Clone, Default)]
pub struct Query {
    filters: Vec<Filter>,
}

impl Query {
    /// The match-all query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a typed filter condition.
    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::new(field, op, value));
        self
    }

    /// Add a condition from a `field__operator` key.
    pub fn filter_key(mut self, key: &str, value: impl Into<Value>) -> Result<Self, Error> {
        self.filters.push(Filter::from_key(key, value)?);
        Ok(self)
    }

    /// Build a query from `(key, value)` pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Result<Self, Error>
    where
        K: AsRef<str>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut query = Query::new();
        for (key, value) in pairs {
            query = query.filter_key(key.as_ref(), value)?;
        }
        Ok(query)
    }

    /// The filter conditions, in insertion order.
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Whether this query has no conditions.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Evaluate all conditions against a record (ANDed).
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.filters.iter().all(|f| f.matches(record))
    }

    /// Render as a URL query string (`name__iexact=ann&age__gte=30`).
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut out = String::new();
        for (i, filter) in self.filters.iter().enumerate() {
            if i > 0 {
                out.push('&');
            }
            out.push_str(&percent_encode(&filter.to_key()));
            out.push('=');
            out.push_str(&percent_encode(&filter.value.to_string()));
        }
        out
    }
}

/// Percent-encode a query-string component (RFC 3986 unreserved set).
fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann() -> Record {
        Record::new().with("name", "Ann").with("age", 35i64)
    }

    fn bob() -> Record {
        Record::new().with("name", "bob").with("age", 22i64)
    }

    #[test]
    fn key_parsing() {
        let f = Filter::from_key("name", "Ann").unwrap();
        assert_eq!(f.op, FilterOp::Exact);
        assert_eq!(f.field, "name");

        let f = Filter::from_key("age__gte", 30i64).unwrap();
        assert_eq!(f.op, FilterOp::Gte);
        assert_eq!(f.field, "age");

        assert!(Filter::from_key("age__unknown", 30i64).is_err());
    }

    #[test]
    fn iexact_matches_case_insensitively() {
        let query = Query::new().filter_key("name__iexact", "ANN").unwrap();
        assert!(query.matches(&ann()));
        assert!(!query.matches(&bob()));
    }

    #[test]
    fn ordering_operators() {
        let query = Query::new().filter("age", FilterOp::Gte, 30i64);
        assert!(query.matches(&ann()));
        assert!(!query.matches(&bob()));

        let query = Query::new().filter("age", FilterOp::Lt, 30i64);
        assert!(!query.matches(&ann()));
        assert!(query.matches(&bob()));
    }

    #[test]
    fn text_operators() {
        let rec = Record::new().with("name", "Annabel");
        assert!(Filter::new("name", FilterOp::StartsWith, "Ann").matches(&rec));
        assert!(!Filter::new("name", FilterOp::StartsWith, "ann").matches(&rec));
        assert!(Filter::new("name", FilterOp::IStartsWith, "ann").matches(&rec));
        assert!(Filter::new("name", FilterOp::EndsWith, "bel").matches(&rec));
        assert!(Filter::new("name", FilterOp::IContains, "NAB").matches(&rec));
    }

    #[test]
    fn text_operators_skip_non_text() {
        let rec = Record::new().with("age", 30i64);
        assert!(!Filter::new("age", FilterOp::Contains, "3").matches(&rec));
        assert!(!Filter::new("age", FilterOp::IExact, "30").matches(&rec));
    }

    #[test]
    fn conditions_are_anded() {
        let query = Query::new()
            .filter("name", FilterOp::IExact, "ann")
            .filter("age", FilterOp::Gte, 30i64);
        assert!(query.matches(&ann()));

        let young_ann = Record::new().with("name", "Ann").with("age", 20i64);
        assert!(!query.matches(&young_ann));
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(Query::new().matches(&ann()));
        assert!(Query::new().matches(&Record::new()));
    }

    #[test]
    fn missing_field_is_null() {
        let query = Query::new().filter("email", FilterOp::Exact, "x@y");
        assert!(!query.matches(&ann()));

        let null_query = Query::new().filter("email", FilterOp::Exact, Value::Null);
        assert!(null_query.matches(&ann()));
    }

    #[test]
    fn exact_compares_numerically_across_variants() {
        let rec = Record::new().with("score", Value::Float(3.0));
        assert!(Filter::new("score", FilterOp::Exact, 3i64).matches(&rec));
    }

    #[test]
    fn query_string_rendering() {
        let query = Query::new()
            .filter("name", FilterOp::IExact, "Ann Lee")
            .filter("age", FilterOp::Gte, 30i64);
        assert_eq!(
            query.to_query_string(),
            "name__iexact=Ann%20Lee&age__gte=30"
        );
        assert_eq!(Query::new().to_query_string(), "");
    }

    #[test]
    fn from_pairs_collects_all() {
        let query =
            Query::from_pairs([("name__iexact", Value::from("ann")), ("age", Value::from(30i64))])
                .unwrap();
        assert_eq!(query.filters().len(), 2);
        assert!(Query::from_pairs([("x__nope", Value::from(1i64))]).is_err());
    }
}
