//! Data models for tabula.
//!
//! This module contains the core data structures used throughout the engine:
//! model and field definitions, typed values, records, links, permissions,
//! and search requests.

mod field;
mod ids;
mod link;
mod model;
mod permission;
mod record;
mod search;
mod value;

pub use field::{Field, FieldSpec, FieldType, FieldUpdate};
pub use ids::{FieldId, ModelId, ModelLinkId, PermissionId, RecordId, RecordLinkId, UserId};
pub use link::{Cardinality, CardinalitySpec, ModelLink, ModelLinkView, RecordLink};
pub use model::{Model, ModelUpdate};
pub use permission::{Caller, Permission, UserModelPermission};
pub use record::Record;
pub use search::{
    DEFAULT_PAGE_SIZE, FilterCondition, FilterPredicate, MAX_PAGE_SIZE, PageRequest, RecordPage,
    RecordQuery, SortKey, SortOrder, SortSpec,
};
pub use value::{FieldValue, is_valid_email, validate_text};
