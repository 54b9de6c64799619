//! Model definitions.
//!
//! A model is a user-defined record type created at runtime. Each model owns
//! a set of [`Field`](super::Field) definitions and a dedicated record table
//! in storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ModelId, UserId};

/// A runtime-defined record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Unique identifier.
    pub id: ModelId,
    /// Human-readable name. Not required to be unique.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// User that created the model.
    pub owner: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Creates a new model with a fresh identifier and current timestamps.
    pub fn new(name: impl Into<String>, description: impl Into<String>, owner: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: ModelId::new(),
            name: name.into(),
            description: description.into(),
            owner,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a model's metadata. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelUpdate {
    /// New name, if changing.
    pub name: Option<String>,
    /// New description, if changing.
    pub description: Option<String>,
}

impl ModelUpdate {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name to apply.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the description to apply.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns true when the update changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}
