//! Storage layer abstraction.
//!
//! The backend traits split the store by concern:
//! - **Schema**: model and field definitions plus their physical tables
//! - **Records**: row data inside per-model tables
//! - **Links**: model links and per-link record edge tables
//! - **Permissions**: per-model permission grants
//!
//! [`sqlite::SqliteStore`] implements all four over a single database.

// Allow significant_drop_tightening - connection guards intentionally span
// whole operations so reads and writes inside them stay consistent.
#![allow(clippy::significant_drop_tightening)]

pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteStore;
pub use traits::{LinkBackend, PermissionBackend, RecordBackend, SchemaBackend};
