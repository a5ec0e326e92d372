//! The datasource capability trait.

use crate::error::Result;
use crate::query::Query;
use crate::record::Record;
use crate::value::Value;

/// Storage/transport abstraction a [`Model`](crate::model::Model) persists
/// through.
///
/// Implementations exchange raw [`Record`]s; the model applies validation
/// and coercion on its side of the seam. All operations are synchronous: a
/// collaborator that is naturally synchronous (an in-memory store) completes
/// immediately, one that is not (a remote backend) blocks inside its own
/// transport and surfaces failures as [`Error`](crate::error::Error) values.
///
/// Contract per operation:
///
/// - `get_record` resolves one record by primary key, failing with
///   `Error::NotFound` when the key is absent.
/// - `find_records` returns every record matching the query's ANDed
///   conditions; an empty query matches all records.
/// - `save_record` persists the coerced attributes and returns the record's
///   primary key, assigning one when `attrs` has a null primary key.
/// - `destroy_record` removes a record, reporting whether anything was
///   actually removed.
pub trait Datasource {
    /// Fetch a single record by primary key.
    fn get_record(&self, model: &str, pk: &Value) -> Result<Record>;

    /// Fetch all records matching the query.
    fn find_records(&self, model: &str, query: &Query) -> Result<Vec<Record>>;

    /// Persist a record and return its (possibly newly assigned) primary key.
    fn save_record(&self, model: &str, pk_field: &str, attrs: Record) -> Result<Value>;

    /// Remove a record by primary key; `Ok(true)` iff something was removed.
    fn destroy_record(&self, model: &str, pk: &Value) -> Result<bool>;
}
