//! # Tabula
//!
//! A runtime-defined data model engine backed by `SQLite`.
//!
//! Tabula lets an application define record types (models) at runtime, give
//! them typed fields, store and search records, and connect records across
//! models through links with per-direction cardinality bounds.
//!
//! ## Features
//!
//! - Models created, altered, and deleted at runtime
//! - Seven field types: single/multi-line text, number, boolean, date,
//!   datetime, email
//! - One `SQLite` table per model, altered in lockstep with field changes
//! - Links between models with per-direction cardinality bounds
//! - Per-model, per-user permission grants with an admin bypass
//! - Filtered, sorted, paged record search
//!
//! ## Example
//!
//! ```rust,ignore
//! use tabula::{Engine, EngineConfig, FieldSpec, FieldType, UserId};
//!
//! let engine = Engine::open(&EngineConfig::at_path("data/tabula.db"))?;
//! let owner = UserId::new();
//!
//! let invoice = engine.schema().create_model("Invoice", "Billing documents", owner)?;
//! engine.schema().add_field(
//!     invoice.id,
//!     &FieldSpec::new("number", FieldType::SingleLineText).required(),
//! )?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod models;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use config::{EngineConfig, StoreLocation};
pub use models::{
    Caller, Cardinality, CardinalitySpec, Field, FieldId, FieldSpec, FieldType, FieldUpdate,
    FieldValue, FilterCondition, Model, ModelId, ModelLink, ModelLinkId, ModelLinkView,
    ModelUpdate, Permission, Record, RecordId, RecordLink, RecordLinkId, RecordPage, RecordQuery,
    SortKey, SortOrder, UserId,
};
pub use services::{
    Engine, LinkService, PermissionService, RecordService, SchemaService, SearchService,
};
pub use storage::{LinkBackend, PermissionBackend, RecordBackend, SchemaBackend, SqliteStore};

/// Error type for tabula operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait
/// implementations. Every variant maps to one [`ErrorKind`], so callers that
/// only care about the class of failure can match on [`Error::kind`].
///
/// # Error Variant Triggers
///
/// | Kind | Raised When |
/// |------|-------------|
/// | `NotFound` | An id does not resolve to a model, field, record, or link |
/// | `Validation` | Malformed names, unknown fields, type-mismatched values or filters, lossy field changes, bad page sizes, self-links |
/// | `Conflict` | Duplicate links, cardinality bounds hit or already exceeded |
/// | `AccessDenied` | Caller lacks a required permission or creation right |
/// | `Integrity` | The storage layer itself failed |
#[derive(Debug, ThisError)]
pub enum Error {
    /// No model exists with the given id.
    #[error("model not found: {0}")]
    ModelNotFound(ModelId),

    /// No field exists with the given id.
    #[error("field not found: {0}")]
    FieldNotFound(FieldId),

    /// No record exists with the given id in the addressed model.
    #[error("record not found: {0}")]
    RecordNotFound(RecordId),

    /// No model link exists with the given id.
    #[error("model link not found: {0}")]
    ModelLinkNotFound(ModelLinkId),

    /// No record link exists with the given id under the addressed model link.
    #[error("record link not found: {0}")]
    RecordLinkNotFound(RecordLinkId),

    /// A model or field name failed validation.
    ///
    /// Raised when:
    /// - The name is empty or entirely whitespace
    /// - A field name collides with a sibling on the same model
    #[error("invalid name '{name}': {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A payload, filter, or sort referenced a field the model does not have.
    #[error("unknown field: {field}")]
    UnknownField {
        /// The unresolved field name.
        field: String,
    },

    /// A record payload left a required field absent or null.
    #[error("missing required field: {field}")]
    MissingRequiredField {
        /// Name of the required field.
        field: String,
    },

    /// A record payload value did not convert to the field's type.
    ///
    /// Raised when:
    /// - The JSON value has the wrong shape (string where number expected)
    /// - A text value violates its type's constraints (line breaks, email shape)
    /// - A date or datetime string does not parse
    #[error("invalid value for field '{field}': {reason}")]
    InvalidFieldValue {
        /// Field the value was supplied for.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A field update would lose or corrupt stored data.
    ///
    /// Raised when:
    /// - The requested type conversion is not in the lossless matrix
    /// - Stored values fail the target type's constraints
    /// - A field becomes required while records lack a value
    /// - A required field is added to a model that already has records
    #[error("incompatible change to field '{field}': {reason}")]
    IncompatibleFieldChange {
        /// Field being changed.
        field: String,
        /// Why the change was refused.
        reason: String,
    },

    /// A search filter cannot be evaluated against its field.
    #[error("invalid filter on field '{field}': {reason}")]
    InvalidFilter {
        /// Field the filter addresses.
        field: String,
        /// Why the filter was rejected.
        reason: String,
    },

    /// A page size fell outside the accepted range.
    #[error("invalid page size: {limit} (expected 1 to {max})")]
    InvalidPageSize {
        /// The requested limit.
        limit: u32,
        /// The largest accepted limit.
        max: u32,
    },

    /// A model link would connect a model to itself.
    #[error("cannot link model {0} to itself")]
    SelfLink(ModelId),

    /// The two models are already linked.
    #[error("models {model_1_id} and {model_2_id} are already linked")]
    DuplicateLink {
        /// First endpoint.
        model_1_id: ModelId,
        /// Second endpoint.
        model_2_id: ModelId,
    },

    /// The two records are already linked under this model link.
    #[error("records {record_1_id} and {record_2_id} are already linked")]
    DuplicateRecordLink {
        /// Record on the model-1 side.
        record_1_id: RecordId,
        /// Record on the model-2 side.
        record_2_id: RecordId,
    },

    /// Creating the link would push a record past its cardinality bound.
    #[error("record {record_id} already holds {count} links (bound {bound})")]
    CardinalityExceeded {
        /// Record at the bound.
        record_id: RecordId,
        /// Links the record currently holds.
        count: u64,
        /// The direction's bound.
        bound: u64,
    },

    /// A cardinality bound cannot shrink below what records already hold.
    #[error("existing links exceed requested bound: a record holds {count} links (bound {bound})")]
    CardinalityViolation {
        /// The requested bound.
        bound: u64,
        /// The largest link count currently held by a single record.
        count: u64,
    },

    /// The caller lacks a permission on the model.
    #[error("user {user_id} lacks {permission} on model {model_id}")]
    AccessDenied {
        /// Acting user.
        user_id: UserId,
        /// Model the operation addressed.
        model_id: ModelId,
        /// Permission that was required.
        permission: Permission,
    },

    /// The caller may not create models.
    #[error("user {0} may not create models")]
    ModelCreationDenied(UserId),

    /// The storage layer failed.
    ///
    /// The underlying driver or I/O error is attached as the source and
    /// logged at the point of failure; the display form stays free of
    /// backend detail.
    #[error("storage operation '{operation}' failed")]
    Integrity {
        /// The operation that failed.
        operation: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An id did not resolve.
    NotFound,
    /// The request was malformed or violated a schema rule.
    Validation,
    /// The request collided with existing state.
    Conflict,
    /// The caller lacks a right the operation requires.
    AccessDenied,
    /// Storage itself failed.
    Integrity,
}

impl ErrorKind {
    /// Returns the kind as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::AccessDenied => "access_denied",
            Self::Integrity => "integrity",
        }
    }
}

impl Error {
    /// Returns the broad classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ModelNotFound(_)
            | Self::FieldNotFound(_)
            | Self::RecordNotFound(_)
            | Self::ModelLinkNotFound(_)
            | Self::RecordLinkNotFound(_) => ErrorKind::NotFound,
            Self::InvalidName { .. }
            | Self::UnknownField { .. }
            | Self::MissingRequiredField { .. }
            | Self::InvalidFieldValue { .. }
            | Self::IncompatibleFieldChange { .. }
            | Self::InvalidFilter { .. }
            | Self::InvalidPageSize { .. }
            | Self::SelfLink(_) => ErrorKind::Validation,
            Self::DuplicateLink { .. }
            | Self::DuplicateRecordLink { .. }
            | Self::CardinalityExceeded { .. }
            | Self::CardinalityViolation { .. } => ErrorKind::Conflict,
            Self::AccessDenied { .. } | Self::ModelCreationDenied(_) => ErrorKind::AccessDenied,
            Self::Integrity { .. } => ErrorKind::Integrity,
        }
    }
}

/// Result type alias for tabula operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownField {
            field: "serial".to_string(),
        };
        assert_eq!(err.to_string(), "unknown field: serial");

        let err = Error::InvalidPageSize { limit: 0, max: 100 };
        assert_eq!(err.to_string(), "invalid page size: 0 (expected 1 to 100)");

        let err = Error::CardinalityExceeded {
            record_id: RecordId::new(),
            count: 1,
            bound: 1,
        };
        assert!(err.to_string().contains("bound 1"));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            Error::ModelNotFound(ModelId::new()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::MissingRequiredField {
                field: "x".to_string()
            }
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            Error::DuplicateLink {
                model_1_id: ModelId::new(),
                model_2_id: ModelId::new(),
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            Error::ModelCreationDenied(UserId::new()).kind(),
            ErrorKind::AccessDenied
        );
    }

    #[test]
    fn test_integrity_display_hides_backend_detail() {
        let err = Error::Integrity {
            operation: "create_record".to_string(),
            source: Box::new(rusqlite::Error::InvalidQuery),
        };
        assert_eq!(err.to_string(), "storage operation 'create_record' failed");
        assert_eq!(err.kind(), ErrorKind::Integrity);
    }
}
