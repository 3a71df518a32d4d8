//! Object/association repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide object CRUD that returns objects with their four link sets.
//! - Own link insertion/removal and reverse lookup by linked entity.
//!
//! # Invariants
//! - Link mutations run in one immediate transaction: the object and target
//!   existence checks, the write and the read-back commit together or not
//!   at all.
//! - Adding an existing link is a no-op (`INSERT OR IGNORE` on the
//!   composite primary key).
//! - Link sets are ordered by target id.

use crate::model::entity::{AssociationKind, Entity, EntityId, EntityKind, ObjectRecord};
use crate::repo::entity_repo::{
    fetch_entity, not_found, parse_entity_row, EntityRepository, RepoError, RepoResult,
    SqliteEntityRepository,
};
use crate::repo::schema::ensure_table_columns;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};

/// Repository interface for objects and their associations.
pub trait ObjectRepository {
    fn list_objects(&self) -> RepoResult<Vec<ObjectRecord>>;
    fn get_object(&self, id: EntityId) -> RepoResult<Option<ObjectRecord>>;
    fn find_object_by_name(&self, name: &str) -> RepoResult<Option<ObjectRecord>>;
    fn create_object(&self, name: &str) -> RepoResult<ObjectRecord>;
    fn rename_object(&self, id: EntityId, name: &str) -> RepoResult<ObjectRecord>;
    /// Deletes the object and its link rows; linked entities survive.
    fn delete_object(&self, id: EntityId) -> RepoResult<()>;
    /// Links `target_id` of `kind` to the object and returns the object.
    fn add_association(
        &self,
        object_id: EntityId,
        kind: AssociationKind,
        target_id: EntityId,
    ) -> RepoResult<ObjectRecord>;
    /// Unlinks `target_id` of `kind` from the object and returns the object.
    fn remove_association(
        &self,
        object_id: EntityId,
        kind: AssociationKind,
        target_id: EntityId,
    ) -> RepoResult<ObjectRecord>;
    /// Lists every object whose `kind` set contains `target_id`.
    fn objects_by_association(
        &self,
        kind: AssociationKind,
        target_id: EntityId,
    ) -> RepoResult<Vec<ObjectRecord>>;
}

/// SQLite-backed object repository.
pub struct SqliteObjectRepository<'conn> {
    conn: &'conn Connection,
    objects: SqliteEntityRepository<'conn>,
}

impl<'conn> SqliteObjectRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let objects = SqliteEntityRepository::try_new(conn, EntityKind::Object)?;
        for kind in AssociationKind::ALL {
            ensure_table_columns(conn, kind.entity_kind().table(), &["id", "name"])?;
            ensure_table_columns(conn, kind.link_table(), &["object_id", kind.link_column()])?;
        }
        Ok(Self { conn, objects })
    }

    fn begin_immediate(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

impl ObjectRepository for SqliteObjectRepository<'_> {
    fn list_objects(&self) -> RepoResult<Vec<ObjectRecord>> {
        self.objects
            .list_entities()?
            .into_iter()
            .map(|entity| load_object_record(self.conn, entity))
            .collect()
    }

    fn get_object(&self, id: EntityId) -> RepoResult<Option<ObjectRecord>> {
        match self.objects.get_entity(id)? {
            Some(entity) => Ok(Some(load_object_record(self.conn, entity)?)),
            None => Ok(None),
        }
    }

    fn find_object_by_name(&self, name: &str) -> RepoResult<Option<ObjectRecord>> {
        match self.objects.find_entity_by_name(name)? {
            Some(entity) => Ok(Some(load_object_record(self.conn, entity)?)),
            None => Ok(None),
        }
    }

    fn create_object(&self, name: &str) -> RepoResult<ObjectRecord> {
        let entity = self.objects.create_entity(name)?;
        Ok(ObjectRecord::bare(entity))
    }

    fn rename_object(&self, id: EntityId, name: &str) -> RepoResult<ObjectRecord> {
        let entity = self.objects.rename_entity(id, name)?;
        load_object_record(self.conn, entity)
    }

    fn delete_object(&self, id: EntityId) -> RepoResult<()> {
        self.objects.delete_entity(id)
    }

    fn add_association(
        &self,
        object_id: EntityId,
        kind: AssociationKind,
        target_id: EntityId,
    ) -> RepoResult<ObjectRecord> {
        let tx = self.begin_immediate()?;
        let object = require_entity(&tx, EntityKind::Object, object_id)?;
        require_entity(&tx, kind.entity_kind(), target_id)?;

        tx.execute(
            &format!(
                "INSERT OR IGNORE INTO {} (object_id, {}) VALUES (?1, ?2);",
                kind.link_table(),
                kind.link_column()
            ),
            params![object_id, target_id],
        )?;

        let record = load_object_record(&tx, object)?;
        tx.commit()?;
        Ok(record)
    }

    fn remove_association(
        &self,
        object_id: EntityId,
        kind: AssociationKind,
        target_id: EntityId,
    ) -> RepoResult<ObjectRecord> {
        let tx = self.begin_immediate()?;
        let object = require_entity(&tx, EntityKind::Object, object_id)?;
        require_entity(&tx, kind.entity_kind(), target_id)?;

        let removed = tx.execute(
            &format!(
                "DELETE FROM {} WHERE object_id = ?1 AND {} = ?2;",
                kind.link_table(),
                kind.link_column()
            ),
            params![object_id, target_id],
        )?;
        if removed == 0 {
            return Err(RepoError::NotAssociated {
                object_id,
                kind,
                target_id,
            });
        }

        let record = load_object_record(&tx, object)?;
        tx.commit()?;
        Ok(record)
    }

    fn objects_by_association(
        &self,
        kind: AssociationKind,
        target_id: EntityId,
    ) -> RepoResult<Vec<ObjectRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT o.id, o.name
             FROM objects o
             INNER JOIN {link} l ON l.object_id = o.id
             WHERE l.{column} = ?1
             ORDER BY o.id ASC;",
            link = kind.link_table(),
            column = kind.link_column()
        ))?;
        let mut rows = stmt.query([target_id])?;
        let mut entities = Vec::new();
        while let Some(row) = rows.next()? {
            entities.push(parse_entity_row(row)?);
        }
        drop(rows);

        entities
            .into_iter()
            .map(|entity| load_object_record(self.conn, entity))
            .collect()
    }
}

/// Builds the full object read model for an already-loaded object row.
pub fn load_object_record(conn: &Connection, object: Entity) -> RepoResult<ObjectRecord> {
    let mut record = ObjectRecord::bare(object);
    for kind in AssociationKind::ALL {
        *record.associations_mut(kind) = load_linked_entities(conn, record.id, kind)?;
    }
    Ok(record)
}

fn load_linked_entities(
    conn: &Connection,
    object_id: EntityId,
    kind: AssociationKind,
) -> RepoResult<Vec<Entity>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT t.id, t.name
         FROM {link} l
         INNER JOIN {table} t ON t.id = l.{column}
         WHERE l.object_id = ?1
         ORDER BY t.id ASC;",
        link = kind.link_table(),
        table = kind.entity_kind().table(),
        column = kind.link_column()
    ))?;
    let mut rows = stmt.query([object_id])?;
    let mut linked = Vec::new();
    while let Some(row) = rows.next()? {
        linked.push(parse_entity_row(row)?);
    }
    Ok(linked)
}

fn require_entity(conn: &Connection, kind: EntityKind, id: EntityId) -> RepoResult<Entity> {
    fetch_entity(conn, kind, id)?.ok_or_else(|| not_found(kind, id))
}
