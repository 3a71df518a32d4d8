//! Server configuration.
//!
//! # Responsibility
//! - Parse bind address, database location and logging options from flags
//!   or `ASSOCDB_*` environment variables.

use assocdb_core::db::IN_MEMORY_PATH;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Where the store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    Memory,
    File(PathBuf),
}

#[derive(Debug, Clone, Parser)]
#[command(name = "assocdb", version, about = "Object association store over HTTP")]
pub struct ServerConfig {
    /// Socket address to listen on.
    #[arg(long, env = "ASSOCDB_BIND", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// SQLite database file, or `:memory:` for a throwaway store.
    #[arg(long, env = "ASSOCDB_DB_PATH", default_value = "assocdb.sqlite3")]
    pub db_path: String,

    /// One of trace|debug|info|warn|error. Defaults by build mode.
    #[arg(long, env = "ASSOCDB_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files; stderr when unset.
    #[arg(long, env = "ASSOCDB_LOG_DIR")]
    pub log_dir: Option<String>,
}

impl ServerConfig {
    pub fn db_location(&self) -> DbLocation {
        let trimmed = self.db_path.trim();
        if trimmed == IN_MEMORY_PATH {
            DbLocation::Memory
        } else {
            DbLocation::File(PathBuf::from(trimmed))
        }
    }

    pub fn effective_log_level(&self) -> &str {
        self.log_level
            .as_deref()
            .unwrap_or(assocdb_core::default_log_level())
    }
}
