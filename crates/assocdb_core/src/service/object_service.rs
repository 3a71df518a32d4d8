//! Object and association use-case service.
//!
//! # Responsibility
//! - Provide object CRUD returning objects with their link sets.
//! - Provide add/remove/query over the four association kinds.
//!
//! # Invariants
//! - Duplicate add is an idempotent no-op.
//! - Remove fails with `NotAssociated` when the link is absent.
//! - Reverse lookup of an unknown or unlinked target is an empty list.

use crate::model::entity::{AssociationKind, EntityId, EntityKind, ObjectRecord};
use crate::repo::object_repo::ObjectRepository;
use crate::service::entity_service::{validated_name, ServiceError, ServiceResult};
use log::info;

/// Object service facade over repository implementations.
pub struct ObjectService<R: ObjectRepository> {
    repo: R,
}

impl<R: ObjectRepository> ObjectService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list_objects(&self) -> ServiceResult<Vec<ObjectRecord>> {
        Ok(self.repo.list_objects()?)
    }

    pub fn get_object(&self, id: EntityId) -> ServiceResult<ObjectRecord> {
        self.repo
            .get_object(id)?
            .ok_or_else(|| ServiceError::not_found_id(EntityKind::Object, id))
    }

    pub fn get_object_by_name(&self, name: &str) -> ServiceResult<ObjectRecord> {
        self.repo
            .find_object_by_name(name)?
            .ok_or_else(|| ServiceError::not_found_name(EntityKind::Object, name))
    }

    /// Creates one object with empty association sets.
    pub fn create_object(&self, name: &str) -> ServiceResult<ObjectRecord> {
        let name = validated_name(name)?;
        let created = self.repo.create_object(name.as_str())?;
        info!(
            "event=entity_create module=service status=ok kind=objects id={}",
            created.id
        );

        self.repo
            .get_object(created.id)?
            .ok_or(ServiceError::InconsistentState(
                "created object not found in read-back",
            ))
    }

    /// Renames one object; its association sets are unchanged.
    pub fn rename_object(&self, id: EntityId, name: &str) -> ServiceResult<ObjectRecord> {
        let name = validated_name(name)?;
        let renamed = self.repo.rename_object(id, name.as_str())?;
        info!("event=entity_rename module=service status=ok kind=objects id={id}");
        Ok(renamed)
    }

    /// Deletes one object and its links; linked entities are kept.
    pub fn delete_object(&self, id: EntityId) -> ServiceResult<()> {
        self.repo.delete_object(id)?;
        info!("event=entity_delete module=service status=ok kind=objects id={id}");
        Ok(())
    }

    /// Links one target entity to the object.
    ///
    /// # Contract
    /// - `NotFound` when either the object or the target is absent.
    /// - Linking an already-linked target returns the unchanged object.
    pub fn add_association(
        &self,
        object_id: EntityId,
        kind: AssociationKind,
        target_id: EntityId,
    ) -> ServiceResult<ObjectRecord> {
        let record = self.repo.add_association(object_id, kind, target_id)?;
        info!(
            "event=association_add module=service status=ok kind={kind} object_id={object_id} target_id={target_id}"
        );
        Ok(record)
    }

    /// Unlinks one target entity from the object.
    ///
    /// # Contract
    /// - `NotFound` when either the object or the target is absent.
    /// - `NotAssociated` when the target is not in the object's set.
    pub fn remove_association(
        &self,
        object_id: EntityId,
        kind: AssociationKind,
        target_id: EntityId,
    ) -> ServiceResult<ObjectRecord> {
        let record = self.repo.remove_association(object_id, kind, target_id)?;
        info!(
            "event=association_remove module=service status=ok kind={kind} object_id={object_id} target_id={target_id}"
        );
        Ok(record)
    }

    /// Lists all objects linked to `target_id` of `kind`, ordered by id.
    pub fn query_by_association(
        &self,
        kind: AssociationKind,
        target_id: EntityId,
    ) -> ServiceResult<Vec<ObjectRecord>> {
        Ok(self.repo.objects_by_association(kind, target_id)?)
    }

    /// Wire-tag variant of [`Self::add_association`].
    pub fn add_association_tagged(
        &self,
        object_id: EntityId,
        tag: &str,
        target_id: EntityId,
    ) -> ServiceResult<ObjectRecord> {
        self.add_association(object_id, parse_kind(tag)?, target_id)
    }

    /// Wire-tag variant of [`Self::remove_association`].
    pub fn remove_association_tagged(
        &self,
        object_id: EntityId,
        tag: &str,
        target_id: EntityId,
    ) -> ServiceResult<ObjectRecord> {
        self.remove_association(object_id, parse_kind(tag)?, target_id)
    }

    /// Wire-tag variant of [`Self::query_by_association`].
    pub fn query_by_association_tagged(
        &self,
        tag: &str,
        target_id: EntityId,
    ) -> ServiceResult<Vec<ObjectRecord>> {
        self.query_by_association(parse_kind(tag)?, target_id)
    }
}

fn parse_kind(tag: &str) -> ServiceResult<AssociationKind> {
    Ok(tag.parse::<AssociationKind>()?)
}
