//! Core domain logic for the object association store.
//! This crate is the single source of truth for entity and link invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::entity::{
    normalize_name, AssociationKind, Entity, EntityId, EntityKind, NameValidationError,
    ObjectRecord, UnknownAssociationKind,
};
pub use repo::entity_repo::{
    EntityRepository, LookupKey, RepoError, RepoResult, SqliteEntityRepository,
};
pub use repo::object_repo::{ObjectRepository, SqliteObjectRepository};
pub use repo::schema::table_schema;
pub use service::entity_service::{EntityService, ServiceError, ServiceResult};
pub use service::object_service::ObjectService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
