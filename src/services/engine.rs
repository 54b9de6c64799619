//! Engine facade.
//!
//! [`Engine`] wires one shared [`SqliteStore`] into the five services and
//! hands out references to them. It is the crate's intended entry point;
//! the services stay individually constructible for callers that bring
//! their own backends.

use std::sync::Arc;

use crate::Result;
use crate::config::EngineConfig;
use crate::storage::SqliteStore;

use super::{LinkService, PermissionService, RecordService, SchemaService, SearchService};

/// One engine over one database: every service, sharing one store.
///
/// # Example
///
/// ```rust,ignore
/// use tabula::{Engine, EngineConfig, FieldSpec, FieldType, UserId};
///
/// let engine = Engine::open(&EngineConfig::at_path("data/tabula.db"))?;
///
/// let invoice = engine.schema().create_model("Invoice", "Billing documents", UserId::new())?;
/// engine.schema().add_field(
///     invoice.id,
///     &FieldSpec::new("number", FieldType::SingleLineText).required(),
/// )?;
/// ```
pub struct Engine {
    schema: SchemaService,
    records: RecordService,
    links: LinkService,
    permissions: PermissionService,
    search: SearchService,
}

impl Engine {
    /// Opens an engine as described by the config.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or its catalog
    /// initialized.
    pub fn open(config: &EngineConfig) -> Result<Self> {
        Ok(Self::with_store(Arc::new(SqliteStore::open(config)?)))
    }

    /// Opens an engine on a private in-memory database, mainly for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        Self::open(&EngineConfig::in_memory())
    }

    /// Builds an engine over an existing store.
    #[must_use]
    pub fn with_store(store: Arc<SqliteStore>) -> Self {
        Self {
            schema: SchemaService::new(store.clone()),
            records: RecordService::new(store.clone()),
            links: LinkService::new(store.clone()),
            permissions: PermissionService::new(store.clone()),
            search: SearchService::new(store),
        }
    }

    /// The model and field management service.
    #[must_use]
    pub const fn schema(&self) -> &SchemaService {
        &self.schema
    }

    /// The record storage service.
    #[must_use]
    pub const fn records(&self) -> &RecordService {
        &self.records
    }

    /// The record linking service.
    #[must_use]
    pub const fn links(&self) -> &LinkService {
        &self.links
    }

    /// The permission gate.
    #[must_use]
    pub const fn permissions(&self) -> &PermissionService {
        &self.permissions
    }

    /// The record search service.
    #[must_use]
    pub const fn search(&self) -> &SearchService {
        &self.search
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map as JsonMap, Value as JsonValue, json};

    use crate::models::{FieldSpec, FieldType, FieldValue, RecordQuery, UserId};

    fn payload(value: JsonValue) -> JsonMap<String, JsonValue> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_services_share_one_store() {
        let engine = Engine::in_memory().unwrap();

        let invoice = engine
            .schema()
            .create_model("Invoice", "", UserId::new())
            .unwrap();
        engine
            .schema()
            .add_field(
                invoice.id,
                &FieldSpec::new("number", FieldType::SingleLineText).required(),
            )
            .unwrap();

        let record_id = engine
            .records()
            .create_record(invoice.id, &payload(json!({ "number": "INV-1" })))
            .unwrap();
        let record = engine.records().get_record(invoice.id, record_id).unwrap();
        assert_eq!(record.values["number"], FieldValue::Text("INV-1".into()));

        let page = engine.search().search(invoice.id, &RecordQuery::new()).unwrap();
        assert_eq!(page.total, 1);
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = EngineConfig::at_path(dir.path().join("engine.db"));

        let engine = Engine::open(&config).unwrap();
        engine
            .schema()
            .create_model("Invoice", "", UserId::new())
            .unwrap();
        assert_eq!(engine.schema().list_models().unwrap().len(), 1);
    }
}
