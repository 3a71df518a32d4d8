//! Per-request store sessions.
//!
//! # Responsibility
//! - Own the shared SQLite connection for the server process.
//! - Hand each request exclusive use of it for the request's duration.
//!
//! # Invariants
//! - Store work runs on the blocking pool, never on async workers.
//! - A session is released when the operation closure returns, whether it
//!   committed or failed.
//! - A panicking operation does not wedge later requests; its open
//!   transaction is rolled back when dropped.

use crate::config::DbLocation;
use crate::error::ApiError;
use assocdb_core::db::{open_db, open_db_in_memory, DbResult};
use assocdb_core::ServiceResult;
use log::{debug, error, warn};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Wraps an already-migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    /// Opens (and migrates) the configured store.
    pub fn open(location: &DbLocation) -> DbResult<Self> {
        let conn = match location {
            DbLocation::Memory => open_db_in_memory()?,
            DbLocation::File(path) => open_db(path)?,
        };
        Ok(Self::new(conn))
    }

    /// Runs `op` with exclusive access to the store.
    ///
    /// `op` is a synchronous closure so transactions opened inside it are
    /// committed or rolled back before the session is released.
    pub async fn run<T, F>(&self, operation: &'static str, op: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> ServiceResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let joined = tokio::task::spawn_blocking(move || {
            let started_at = Instant::now();
            let conn = db.lock().unwrap_or_else(|poisoned| {
                error!("event=session_recover module=http op={operation} status=error error_code=lock_poisoned");
                db.clear_poison();
                PoisonError::into_inner(poisoned)
            });
            let result = op(&*conn).map_err(ApiError::from);
            match &result {
                Ok(_) => debug!(
                    "event=request module=http op={operation} status=ok duration_ms={}",
                    started_at.elapsed().as_millis()
                ),
                Err(err) => warn!(
                    "event=request module=http op={operation} status=error http_status={} duration_ms={}",
                    err.status().as_u16(),
                    started_at.elapsed().as_millis()
                ),
            }
            result
        })
        .await;

        match joined {
            Ok(result) => result,
            Err(err) => Err(ApiError::internal(format!(
                "store worker for `{operation}` failed: {err}"
            ))),
        }
    }
}
