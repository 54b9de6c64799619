//! Record storage service.
//!
//! Records are JSON payloads keyed by field name, validated against their
//! model's live field list before any write. Values are stored keyed by
//! field id, so field renames never touch record data.
//!
//! # Features
//!
//! - **Validated writes**: unknown fields, type mismatches, and missing
//!   required values are rejected before anything is stored
//! - **Partial updates**: only supplied fields change; JSON `null` clears
//!   an optional field
//! - **Clean deletes**: removing a record also removes every record link
//!   it participates in
//!
//! # Permissions
//!
//! Pair with [`PermissionService`](super::PermissionService) in the API
//! layer:
//!
//! | Operation | Required right |
//! |-----------|----------------|
//! | `create_record` | `add_records` |
//! | `update_record` | `edit_records` |
//! | `delete_record` | `delete_records` |
//! | `get_record`, `count_records` | `view_records` |
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//!
//! let payload = json!({ "number": "INV-0001", "total": 125.0 });
//! let record_id = service.create_record(invoice_id, payload.as_object().unwrap())?;
//! let record = service.get_record(invoice_id, record_id)?;
//! ```

use std::sync::Arc;

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::Result;
use crate::models::{ModelId, Record, RecordId};
use crate::storage::RecordBackend;

/// Service for record CRUD against runtime-defined models.
///
/// Uses a [`RecordBackend`] for persistence.
pub struct RecordService {
    backend: Arc<dyn RecordBackend>,
}

impl RecordService {
    /// Creates a new record service with the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn RecordBackend>) -> Self {
        Self { backend }
    }

    /// Creates a record from a JSON payload.
    ///
    /// Every key must name a current field of the model; every required
    /// field must be present and non-null. Omitted optional fields are
    /// stored as null.
    ///
    /// # Arguments
    ///
    /// * `model_id` - Model to create the record under
    /// * `values` - Payload keyed by field name
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A key does not name a field of the model
    /// - A value does not convert to its field's type
    /// - A required field is absent or null
    /// - The model does not exist
    /// - Storage cannot be accessed
    pub fn create_record(
        &self,
        model_id: ModelId,
        values: &JsonMap<String, JsonValue>,
    ) -> Result<RecordId> {
        let record_id = self.backend.create_record(model_id, values)?;

        tracing::info!(
            model_id = %model_id,
            record_id = %record_id,
            "Record created"
        );

        Ok(record_id)
    }

    /// Gets a record by id.
    ///
    /// # Errors
    ///
    /// Returns `RecordNotFound` when the record is absent or belongs to a
    /// different model.
    pub fn get_record(&self, model_id: ModelId, record_id: RecordId) -> Result<Record> {
        self.backend.get_record(model_id, record_id)
    }

    /// Applies a partial update and returns the updated record.
    ///
    /// Fields absent from the payload keep their values. An explicit JSON
    /// `null` clears an optional field; for a required field it is an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The payload fails validation (unknown field, bad value, cleared
    ///   required field)
    /// - The record is absent or belongs to a different model
    /// - Storage cannot be accessed
    pub fn update_record(
        &self,
        model_id: ModelId,
        record_id: RecordId,
        values: &JsonMap<String, JsonValue>,
    ) -> Result<Record> {
        let record = self.backend.update_record(model_id, record_id, values)?;

        tracing::info!(
            model_id = %model_id,
            record_id = %record_id,
            "Record updated"
        );

        Ok(record)
    }

    /// Deletes a record and every record link attached to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the record does not exist or storage cannot be
    /// accessed.
    pub fn delete_record(&self, model_id: ModelId, record_id: RecordId) -> Result<()> {
        self.backend.delete_record(model_id, record_id)?;

        tracing::info!(
            model_id = %model_id,
            record_id = %record_id,
            "Record deleted"
        );

        Ok(())
    }

    /// Counts the model's records.
    ///
    /// # Errors
    ///
    /// Returns `ModelNotFound` if no model has the id.
    pub fn count_records(&self, model_id: ModelId) -> Result<u64> {
        self.backend.count_records(model_id)
    }
}
