//! Entity repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide name-keyed CRUD over the five entity tables.
//! - Translate SQLite constraint violations into `RepoError::Conflict`.
//!
//! # Invariants
//! - Write paths normalize names before SQL mutations.
//! - Lists are ordered by id, which follows insertion order.

use crate::db::DbError;
use crate::model::entity::{
    normalize_name, AssociationKind, Entity, EntityId, EntityKind, NameValidationError,
};
use crate::repo::schema::ensure_table_columns;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Key used for a failed lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupKey {
    Id(EntityId),
    Name(String),
}

impl Display for LookupKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id={id}"),
            Self::Name(name) => write!(f, "name=`{name}`"),
        }
    }
}

/// Generic repository error for entity and association persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(NameValidationError),
    Db(DbError),
    NotFound {
        kind: EntityKind,
        key: LookupKey,
    },
    /// Unique-name constraint rejected the write.
    Conflict {
        kind: EntityKind,
        name: String,
    },
    /// Target exists but is not linked to the object.
    NotAssociated {
        object_id: EntityId,
        kind: AssociationKind,
        target_id: EntityId,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, key } => write!(f, "{kind} not found: {key}"),
            Self::Conflict { kind, name } => {
                write!(f, "{kind} with name `{name}` already exists")
            }
            Self::NotAssociated {
                object_id,
                kind,
                target_id,
            } => write!(
                f,
                "{} {target_id} is not associated with Object {object_id}",
                kind.entity_kind()
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted entity data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NameValidationError> for RepoError {
    fn from(value: NameValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for single-kind entity CRUD.
pub trait EntityRepository {
    /// Entity collection this repository operates on.
    fn kind(&self) -> EntityKind;
    fn list_entities(&self) -> RepoResult<Vec<Entity>>;
    fn get_entity(&self, id: EntityId) -> RepoResult<Option<Entity>>;
    fn find_entity_by_name(&self, name: &str) -> RepoResult<Option<Entity>>;
    /// Inserts a new row; `Conflict` when the name is taken.
    fn create_entity(&self, name: &str) -> RepoResult<Entity>;
    /// Renames in place; `NotFound` when absent, `Conflict` on name clash.
    fn rename_entity(&self, id: EntityId, name: &str) -> RepoResult<Entity>;
    /// Hard-deletes one row; link rows are removed by FK cascade.
    fn delete_entity(&self, id: EntityId) -> RepoResult<()>;
}

/// SQLite-backed repository bound to one entity table.
pub struct SqliteEntityRepository<'conn> {
    conn: &'conn Connection,
    kind: EntityKind,
}

impl<'conn> SqliteEntityRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection, kind: EntityKind) -> RepoResult<Self> {
        ensure_table_columns(conn, kind.table(), &["id", "name"])?;
        Ok(Self { conn, kind })
    }
}

impl EntityRepository for SqliteEntityRepository<'_> {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn list_entities(&self) -> RepoResult<Vec<Entity>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, name FROM {} ORDER BY id ASC;",
            self.kind.table()
        ))?;
        let mut rows = stmt.query([])?;
        let mut entities = Vec::new();
        while let Some(row) = rows.next()? {
            entities.push(parse_entity_row(row)?);
        }
        Ok(entities)
    }

    fn get_entity(&self, id: EntityId) -> RepoResult<Option<Entity>> {
        fetch_entity(self.conn, self.kind, id)
    }

    fn find_entity_by_name(&self, name: &str) -> RepoResult<Option<Entity>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT id, name FROM {} WHERE name = ?1;",
                    self.kind.table()
                ),
                [name.trim()],
                |row| Ok((row.get::<_, EntityId>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        Ok(row.map(|(id, name)| Entity { id, name }))
    }

    fn create_entity(&self, name: &str) -> RepoResult<Entity> {
        let name = normalize_name(name)?;
        self.conn
            .execute(
                &format!("INSERT INTO {} (name) VALUES (?1);", self.kind.table()),
                [name.as_str()],
            )
            .map_err(|err| map_write_error(err, self.kind, &name))?;

        Ok(Entity {
            id: self.conn.last_insert_rowid(),
            name,
        })
    }

    fn rename_entity(&self, id: EntityId, name: &str) -> RepoResult<Entity> {
        let name = normalize_name(name)?;
        let changed = self
            .conn
            .execute(
                &format!("UPDATE {} SET name = ?1 WHERE id = ?2;", self.kind.table()),
                params![name.as_str(), id],
            )
            .map_err(|err| map_write_error(err, self.kind, &name))?;

        if changed == 0 {
            return Err(not_found(self.kind, id));
        }

        Ok(Entity { id, name })
    }

    fn delete_entity(&self, id: EntityId) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1;", self.kind.table()),
            [id],
        )?;

        if changed == 0 {
            return Err(not_found(self.kind, id));
        }

        Ok(())
    }
}

/// Loads one entity of `kind` by id.
///
/// Shared with the object repository so existence checks run on the same
/// connection or transaction as the mutation that depends on them.
pub(crate) fn fetch_entity(
    conn: &Connection,
    kind: EntityKind,
    id: EntityId,
) -> RepoResult<Option<Entity>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, name FROM {} WHERE id = ?1;",
        kind.table()
    ))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_entity_row(row)?));
    }
    Ok(None)
}

pub(crate) fn parse_entity_row(row: &Row<'_>) -> RepoResult<Entity> {
    let id: EntityId = row.get("id")?;
    let name: String = row.get("name")?;
    if name.trim().is_empty() {
        return Err(RepoError::InvalidData(format!(
            "blank name stored for entity id {id}"
        )));
    }
    Ok(Entity { id, name })
}

pub(crate) fn not_found(kind: EntityKind, id: EntityId) -> RepoError {
    RepoError::NotFound {
        kind,
        key: LookupKey::Id(id),
    }
}

fn map_write_error(err: rusqlite::Error, kind: EntityKind, name: &str) -> RepoError {
    match err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            RepoError::Conflict {
                kind,
                name: name.to_string(),
            }
        }
        other => other.into(),
    }
}
