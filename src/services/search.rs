//! Record search service.
//!
//! Searches run against one model at a time: a conjunction of typed field
//! filters, one sort key, and an offset/limit page. Every page carries the
//! exact filtered total, computed under the same lock as the page itself,
//! so callers can render pagination without a second query.
//!
//! # Filters
//!
//! Conditions are typed per operator family and checked against the target
//! field's type before any SQL is built:
//!
//! | Family | Conditions | Field types |
//! |--------|------------|-------------|
//! | Text | `TextContains`, `TextEquals`, `TextStartsWith`, `TextEndsWith`, `TextNotContains`, `TextNotEquals` | single-line, multi-line, email |
//! | Number | `NumberEquals`, `NumberGreaterThan`, `NumberLessThan` | number |
//! | Boolean | `BooleanEquals` | boolean |
//! | Temporal | `DateOn`, `DateBefore`, `DateAfter`, `DateBetween` | date, datetime |
//!
//! Needles are matched literally; `%` and `_` carry no wildcard meaning.
//! Records without a value never match a positive condition and always
//! match the negated text conditions.
//!
//! # Example
//!
//! ```rust,ignore
//! use tabula::{FilterCondition, RecordQuery, SortKey, SortOrder};
//!
//! let query = RecordQuery::new()
//!     .with_filter("status", FilterCondition::TextEquals("open".into()))
//!     .with_sort(SortKey::Field("total".into()), SortOrder::Descending)
//!     .with_page(0, 25);
//!
//! let page = service.search(invoice_id, &query)?;
//! println!("showing {} of {}", page.records.len(), page.total);
//! ```

use std::sync::Arc;

use crate::Result;
use crate::models::{ModelId, RecordPage, RecordQuery};
use crate::storage::RecordBackend;

/// Service for filtered, sorted, paged record search.
///
/// Reads through a [`RecordBackend`]; an API layer should gate calls with
/// the `view_records` permission.
pub struct SearchService {
    backend: Arc<dyn RecordBackend>,
}

impl SearchService {
    /// Creates a new search service with the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn RecordBackend>) -> Self {
        Self { backend }
    }

    /// Runs a search and returns one page of results with the filtered
    /// total.
    ///
    /// # Arguments
    ///
    /// * `model_id` - Model whose records to search
    /// * `query` - Filters, sort, and page request
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A filter or sort names a field the model does not have
    /// - A condition's operator family does not fit its field's type
    /// - The page limit is zero or above the maximum
    /// - The model does not exist
    /// - Storage cannot be accessed
    pub fn search(&self, model_id: ModelId, query: &RecordQuery) -> Result<RecordPage> {
        let page = self.backend.search_records(model_id, query)?;

        tracing::debug!(
            model_id = %model_id,
            filters = query.filters.len(),
            returned = page.records.len(),
            total = page.total,
            "Search executed"
        );

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map as JsonMap, Value as JsonValue, json};

    use crate::Error;
    use crate::models::{FieldSpec, FieldType, FilterCondition, SortKey, SortOrder, UserId};
    use crate::storage::{SchemaBackend, SqliteStore};

    fn payload(value: JsonValue) -> JsonMap<String, JsonValue> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn service_with_invoices() -> (SearchService, ModelId) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let model = store.create_model("Invoice", "", UserId::new()).unwrap();
        store
            .add_field(model.id, &FieldSpec::new("number", FieldType::SingleLineText))
            .unwrap();
        store
            .add_field(model.id, &FieldSpec::new("total", FieldType::Number))
            .unwrap();
        for (number, total) in [("INV-1", 10.0), ("INV-2", 20.0), ("DRAFT", 30.0)] {
            store
                .create_record(model.id, &payload(json!({ "number": number, "total": total })))
                .unwrap();
        }
        (SearchService::new(store), model.id)
    }

    #[test]
    fn test_filtered_search_with_total() {
        let (service, model_id) = service_with_invoices();

        let query = RecordQuery::new()
            .with_filter("number", FilterCondition::TextStartsWith("INV-".into()))
            .with_sort(SortKey::Field("total".into()), SortOrder::Descending);
        let page = service.search(model_id, &query).unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.records.len(), 2);
        assert_eq!(
            page.records[0].values["number"],
            crate::models::FieldValue::Text("INV-2".into())
        );
    }

    #[test]
    fn test_unknown_filter_field_rejected() {
        let (service, model_id) = service_with_invoices();

        let query =
            RecordQuery::new().with_filter("serial", FilterCondition::TextEquals("x".into()));
        let err = service.search(model_id, &query).unwrap_err();
        assert!(matches!(err, Error::UnknownField { .. }));
    }

    #[test]
    fn test_page_limit_bounds_enforced() {
        let (service, model_id) = service_with_invoices();

        for limit in [0, 101] {
            let query = RecordQuery::new().with_page(0, limit);
            let err = service.search(model_id, &query).unwrap_err();
            assert!(matches!(err, Error::InvalidPageSize { .. }), "limit {limit}");
        }
    }
}
