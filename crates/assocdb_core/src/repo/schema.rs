//! SQLite schema inspection helpers.
//!
//! # Responsibility
//! - Check that tables/columns required by repositories exist.
//! - Describe entity tables as `column -> declared type` mappings.

use crate::model::entity::EntityKind;
use crate::repo::entity_repo::{RepoError, RepoResult};
use rusqlite::Connection;
use std::collections::BTreeMap;

/// Returns `column name -> declared SQL type` for the table of `kind`.
pub fn table_schema(conn: &Connection, kind: EntityKind) -> RepoResult<BTreeMap<String, String>> {
    let columns = table_columns(conn, kind.table())?;
    if columns.is_empty() {
        return Err(RepoError::MissingRequiredTable(kind.table()));
    }
    Ok(columns.into_iter().collect())
}

/// Fails unless `table` exists and carries every column in `columns`.
pub fn ensure_table_columns(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    if !table_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table));
    }

    let present = table_columns(conn, table)?;
    for column in columns {
        if !present.iter().any(|(name, _)| name == column) {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }
    Ok(())
}

pub fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<(String, String)>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get("name")?;
        let declared: String = row.get("type")?;
        columns.push((name, declared));
    }
    Ok(columns)
}
