//! Record storage trait definitions.

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::Result;
use crate::models::{ModelId, Record, RecordId, RecordPage, RecordQuery};

/// Trait for record storage backends.
///
/// Payloads arrive as JSON objects keyed by field name; values are validated
/// against the model's field definitions before any write happens.
/// Implementations must be thread-safe (`Send + Sync`).
pub trait RecordBackend: Send + Sync {
    /// Creates a record from a payload.
    ///
    /// Every required field must be present and non-null. Fields absent from
    /// the payload are stored as null.
    fn create_record(&self, model_id: ModelId, values: &JsonMap<String, JsonValue>)
    -> Result<RecordId>;

    /// Gets a record by id.
    fn get_record(&self, model_id: ModelId, record_id: RecordId) -> Result<Record>;

    /// Applies a partial update. Fields absent from the payload keep their
    /// values; an explicit JSON null clears an optional field.
    fn update_record(
        &self,
        model_id: ModelId,
        record_id: RecordId,
        values: &JsonMap<String, JsonValue>,
    ) -> Result<Record>;

    /// Deletes a record and every record link attached to it.
    fn delete_record(&self, model_id: ModelId, record_id: RecordId) -> Result<()>;

    /// Counts the model's records.
    fn count_records(&self, model_id: ModelId) -> Result<u64>;

    /// Runs a filtered, sorted, paged search over the model's records.
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` or `InvalidFilter` for unresolvable filters,
    /// and `InvalidPageSize` when the page limit falls outside the accepted
    /// range.
    fn search_records(&self, model_id: ModelId, query: &RecordQuery) -> Result<RecordPage>;
}
