//! Storage backend traits.

mod links;
mod permissions;
mod records;
mod schema;

pub use links::LinkBackend;
pub use permissions::PermissionBackend;
pub use records::RecordBackend;
pub use schema::SchemaBackend;
