//! Engine services.
//!
//! One service per engine concern, each a thin layer of business rules over
//! a storage backend trait object. [`Engine`] bundles all five over one
//! shared store; individual services can also be constructed directly
//! against any backend implementation.

mod engine;
mod links;
mod permissions;
mod records;
mod schema;
mod search;

pub use engine::Engine;
pub use links::LinkService;
pub use permissions::PermissionService;
pub use records::RecordService;
pub use schema::SchemaService;
pub use search::SearchService;
