//! Schema storage trait definitions.
//!
//! Defines the interface for the model catalog: model and field definitions
//! plus the per-model record tables that shadow them.

use crate::Result;
use crate::models::{Field, FieldId, FieldSpec, FieldUpdate, Model, ModelId, ModelUpdate, UserId};

/// Trait for schema storage backends.
///
/// Every mutation keeps the catalog and the physical record tables in step:
/// creating a model creates its record table, adding a field adds a column,
/// and so on. Implementations must be thread-safe (`Send + Sync`).
pub trait SchemaBackend: Send + Sync {
    /// Creates a model and its empty record table.
    fn create_model(&self, name: &str, description: &str, owner: UserId) -> Result<Model>;

    /// Gets a model by id.
    ///
    /// # Errors
    ///
    /// Returns `ModelNotFound` if no model has the id.
    fn get_model(&self, model_id: ModelId) -> Result<Model>;

    /// Lists all models in creation order.
    fn list_models(&self) -> Result<Vec<Model>>;

    /// Applies a metadata update to a model.
    fn update_model(&self, model_id: ModelId, update: &ModelUpdate) -> Result<Model>;

    /// Deletes a model together with its records, fields, links, and
    /// permission grants.
    fn delete_model(&self, model_id: ModelId) -> Result<()>;

    /// Lists a model's fields in creation order.
    fn fields(&self, model_id: ModelId) -> Result<Vec<Field>>;

    /// Gets a field by id.
    ///
    /// # Errors
    ///
    /// Returns `FieldNotFound` if no field has the id.
    fn get_field(&self, field_id: FieldId) -> Result<Field>;

    /// Adds a field to a model and a matching column to its record table.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` if the name collides with a sibling field, and
    /// `IncompatibleFieldChange` if the field is required while the model
    /// already has records.
    fn add_field(&self, model_id: ModelId, spec: &FieldSpec) -> Result<Field>;

    /// Applies a field update, converting stored values when the type
    /// changes.
    ///
    /// # Errors
    ///
    /// Returns `IncompatibleFieldChange` when the conversion is not
    /// lossless for every stored value, or when making the field required
    /// while records lack a value.
    fn update_field(&self, field_id: FieldId, update: &FieldUpdate) -> Result<Field>;

    /// Removes a field and drops its column, discarding stored values.
    fn delete_field(&self, field_id: FieldId) -> Result<()>;
}
