//! Records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ids::{ModelId, RecordId};
use super::value::FieldValue;

/// A stored row of a model, with values keyed by field name.
///
/// Fields without a value are absent from the map. The map is ordered so
/// that serialized output is stable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Unique identifier.
    pub id: RecordId,
    /// Model this record belongs to.
    pub model_id: ModelId,
    /// Present field values, keyed by field name.
    pub values: BTreeMap<String, FieldValue>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Returns the value of the named field, if set.
    #[must_use]
    pub fn value(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }
}
