//! Entity use-case service.
//!
//! # Responsibility
//! - Provide CRUD entry points shared by verbs, attributes, states and
//!   routines.
//! - Fold repository errors into the caller-facing `ServiceError` set.
//!
//! # Invariants
//! - Names are trimmed and must not be blank.
//! - Lookups that miss return `NotFound`, never `Ok(None)`.

use crate::model::entity::{
    normalize_name, AssociationKind, Entity, EntityId, EntityKind, UnknownAssociationKind,
};
use crate::repo::entity_repo::{EntityRepository, LookupKey, RepoError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error shared by entity and object use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Blank name or unknown association tag.
    InvalidArgument(String),
    /// Id or name lookup missed.
    NotFound { kind: EntityKind, key: LookupKey },
    /// Target exists but is not linked to the object.
    NotAssociated {
        object_id: EntityId,
        kind: AssociationKind,
        target_id: EntityId,
    },
    /// Name already used by another entity of the same kind.
    Conflict { kind: EntityKind, name: String },
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "{message}"),
            Self::NotFound { kind, key } => write!(f, "{kind} not found: {key}"),
            Self::NotAssociated {
                object_id,
                kind,
                target_id,
            } => write!(
                f,
                "{} {target_id} not found or not associated with Object {object_id}",
                kind.entity_kind()
            ),
            Self::Conflict { kind, name } => write!(
                f,
                "integrity error: {kind} with name `{name}` already exists"
            ),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::InvalidArgument(err.to_string()),
            RepoError::NotFound { kind, key } => Self::NotFound { kind, key },
            RepoError::Conflict { kind, name } => Self::Conflict { kind, name },
            RepoError::NotAssociated {
                object_id,
                kind,
                target_id,
            } => Self::NotAssociated {
                object_id,
                kind,
                target_id,
            },
            other => Self::Repo(other),
        }
    }
}

impl From<UnknownAssociationKind> for ServiceError {
    fn from(value: UnknownAssociationKind) -> Self {
        Self::InvalidArgument(value.to_string())
    }
}

impl ServiceError {
    pub(crate) fn not_found_id(kind: EntityKind, id: EntityId) -> Self {
        Self::NotFound {
            kind,
            key: LookupKey::Id(id),
        }
    }

    pub(crate) fn not_found_name(kind: EntityKind, name: &str) -> Self {
        Self::NotFound {
            kind,
            key: LookupKey::Name(name.to_string()),
        }
    }
}

/// Use-case service wrapper for single-kind entity CRUD.
pub struct EntityService<R: EntityRepository> {
    repo: R,
}

impl<R: EntityRepository> EntityService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn kind(&self) -> EntityKind {
        self.repo.kind()
    }

    /// Lists all entities in insertion order.
    pub fn list(&self) -> ServiceResult<Vec<Entity>> {
        Ok(self.repo.list_entities()?)
    }

    pub fn get(&self, id: EntityId) -> ServiceResult<Entity> {
        self.repo
            .get_entity(id)?
            .ok_or_else(|| ServiceError::not_found_id(self.kind(), id))
    }

    pub fn get_by_name(&self, name: &str) -> ServiceResult<Entity> {
        self.repo
            .find_entity_by_name(name)?
            .ok_or_else(|| ServiceError::not_found_name(self.kind(), name))
    }

    /// Creates one entity; `Conflict` when the name is already taken.
    pub fn create(&self, name: &str) -> ServiceResult<Entity> {
        let name = validated_name(name)?;
        let entity = self.repo.create_entity(name.as_str())?;
        info!(
            "event=entity_create module=service status=ok kind={} id={}",
            self.kind().table(),
            entity.id
        );
        Ok(entity)
    }

    /// Renames one entity in place.
    pub fn rename(&self, id: EntityId, name: &str) -> ServiceResult<Entity> {
        let name = validated_name(name)?;
        let entity = self.repo.rename_entity(id, name.as_str())?;
        info!(
            "event=entity_rename module=service status=ok kind={} id={}",
            self.kind().table(),
            entity.id
        );
        Ok(entity)
    }

    /// Deletes one entity; its links on every object are cleared with it.
    pub fn delete(&self, id: EntityId) -> ServiceResult<()> {
        self.repo.delete_entity(id)?;
        info!(
            "event=entity_delete module=service status=ok kind={} id={}",
            self.kind().table(),
            id
        );
        Ok(())
    }
}

/// Trims `name` and maps a blank value to `InvalidArgument`.
pub(crate) fn validated_name(name: &str) -> ServiceResult<String> {
    normalize_name(name).map_err(|err| ServiceError::InvalidArgument(err.to_string()))
}
