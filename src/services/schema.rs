//! Model and field management service.
//!
//! Models are record types defined at runtime; fields are their typed
//! attributes. Every change flows through to physical storage in the same
//! transaction: creating a model creates its record table, adding a field
//! adds a column, deleting a model drops everything it owns.
//!
//! # Features
//!
//! - **Model lifecycle**: create, update metadata, list, delete with cascade
//! - **Field lifecycle**: add, rename, retype, toggle flags, delete
//! - **Data safety**: changes that would lose or invalidate stored values
//!   are rejected rather than coerced
//!
//! # Permissions
//!
//! The engine leaves identity at the door. Pair these operations with
//! [`PermissionService`](super::PermissionService) checks in the API layer:
//!
//! | Operation | Required right |
//! |-----------|----------------|
//! | `create_model` | `can_create_models` account flag |
//! | `update_model`, `delete_model` | admin caller (no grant covers them) |
//! | `add_field`, `update_field` | `add_fields` |
//! | `delete_field` | `remove_fields` |
//! | `get_model`, `list_models`, `fields`, `get_field` | any authenticated caller |
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tabula::{FieldSpec, FieldType, SchemaService, SqliteStore, UserId};
//!
//! let store = Arc::new(SqliteStore::in_memory()?);
//! let service = SchemaService::new(store);
//!
//! let invoice = service.create_model("Invoice", "Billing documents", UserId::new())?;
//! service.add_field(
//!     invoice.id,
//!     &FieldSpec::new("number", FieldType::SingleLineText).required(),
//! )?;
//! ```

use std::sync::Arc;

use crate::models::{Field, FieldId, FieldSpec, FieldUpdate, Model, ModelId, ModelUpdate, UserId};
use crate::storage::SchemaBackend;
use crate::{Error, Result};

/// Service for model and field management.
///
/// Uses a [`SchemaBackend`] for the catalog and the record tables that
/// shadow it.
pub struct SchemaService {
    backend: Arc<dyn SchemaBackend>,
}

impl SchemaService {
    /// Creates a new schema service with the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn SchemaBackend>) -> Self {
        Self { backend }
    }

    // =========================================================================
    // Model Operations
    // =========================================================================

    /// Creates a model and its empty record table.
    ///
    /// # Arguments
    ///
    /// * `name` - Model name; blank names are rejected, duplicates are allowed
    /// * `description` - Free-form description
    /// * `owner` - User recorded as the model's creator
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The name is empty or entirely whitespace
    /// - Storage cannot be accessed
    pub fn create_model(&self, name: &str, description: &str, owner: UserId) -> Result<Model> {
        validate_name(name, "model name")?;

        let model = self.backend.create_model(name, description, owner)?;

        tracing::info!(
            model_id = %model.id,
            model_name = %name,
            owner = %owner,
            "Model created"
        );

        Ok(model)
    }

    /// Gets a model by id.
    ///
    /// # Errors
    ///
    /// Returns `ModelNotFound` if no model has the id.
    pub fn get_model(&self, model_id: ModelId) -> Result<Model> {
        self.backend.get_model(model_id)
    }

    /// Lists all models in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    pub fn list_models(&self) -> Result<Vec<Model>> {
        self.backend.list_models()
    }

    /// Updates a model's name and description. Record data is untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The new name is empty or entirely whitespace
    /// - The model does not exist
    /// - Storage cannot be accessed
    pub fn update_model(&self, model_id: ModelId, update: &ModelUpdate) -> Result<Model> {
        if let Some(name) = &update.name {
            validate_name(name, "model name")?;
        }

        let model = self.backend.update_model(model_id, update)?;

        tracing::info!(model_id = %model_id, "Model updated");

        Ok(model)
    }

    /// Deletes a model with everything it owns: fields, records, links
    /// touching the model (including their record links), and permission
    /// grants.
    ///
    /// # Errors
    ///
    /// Returns an error if the model does not exist or storage cannot be
    /// accessed.
    pub fn delete_model(&self, model_id: ModelId) -> Result<()> {
        self.backend.delete_model(model_id)?;

        tracing::info!(model_id = %model_id, "Model deleted");

        Ok(())
    }

    // =========================================================================
    // Field Operations
    // =========================================================================

    /// Lists a model's fields in creation order.
    ///
    /// # Errors
    ///
    /// Returns `ModelNotFound` if no model has the id.
    pub fn fields(&self, model_id: ModelId) -> Result<Vec<Field>> {
        self.backend.fields(model_id)
    }

    /// Gets a field by id.
    ///
    /// # Errors
    ///
    /// Returns `FieldNotFound` if no field has the id.
    pub fn get_field(&self, field_id: FieldId) -> Result<Field> {
        self.backend.get_field(field_id)
    }

    /// Adds a field to a model. Existing records get a null value for it.
    ///
    /// # Arguments
    ///
    /// * `model_id` - Model receiving the field
    /// * `spec` - Name, type, and flags of the new field
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The name is blank or collides with a sibling field
    /// - The field is required while the model already has records
    /// - The model does not exist
    /// - Storage cannot be accessed
    pub fn add_field(&self, model_id: ModelId, spec: &FieldSpec) -> Result<Field> {
        validate_name(&spec.name, "field name")?;

        let field = self.backend.add_field(model_id, spec)?;

        tracing::info!(
            model_id = %model_id,
            field_id = %field.id,
            field_name = %field.name,
            field_type = %field.field_type,
            "Field added"
        );

        Ok(field)
    }

    /// Updates a field's metadata, type, or flags.
    ///
    /// Renames never touch stored values. Type changes are applied only when
    /// every stored value survives the conversion; making a field required
    /// is applied only when no record lacks a value.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The new name is blank or collides with a sibling field
    /// - The type change is lossy for the field or any stored value
    /// - Records lack values for a field becoming required
    /// - The field does not exist
    /// - Storage cannot be accessed
    pub fn update_field(&self, field_id: FieldId, update: &FieldUpdate) -> Result<Field> {
        if let Some(name) = &update.name {
            validate_name(name, "field name")?;
        }

        let field = self.backend.update_field(field_id, update)?;

        tracing::info!(field_id = %field_id, "Field updated");

        Ok(field)
    }

    /// Removes a field, discarding every stored value for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the field does not exist or storage cannot be
    /// accessed.
    pub fn delete_field(&self, field_id: FieldId) -> Result<()> {
        self.backend.delete_field(field_id)?;

        tracing::info!(field_id = %field_id, "Field removed");

        Ok(())
    }
}

/// Rejects empty and all-whitespace names.
fn validate_name(name: &str, what: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidName {
            name: name.to_string(),
            reason: format!("{what} cannot be empty"),
        });
    }
    Ok(())
}
