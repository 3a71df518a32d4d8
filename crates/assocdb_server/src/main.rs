//! Server entry point.
//!
//! # Responsibility
//! - Parse configuration, start logging, open the store and serve HTTP.
//! - Exit non-zero with a readable message when any startup step fails.

use assocdb_http::{AppState, ServerConfig};
use clap::Parser;
use log::info;
use std::error::Error;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = ServerConfig::parse();
    assocdb_core::init_logging(config.effective_log_level(), config.log_dir.as_deref())?;
    info!(
        "event=server_config module=server status=ok bind={} db={}",
        config.bind, config.db_path
    );

    let state = AppState::open(&config.db_location())?;
    let listener = TcpListener::bind(config.bind).await?;
    assocdb_http::serve(listener, state).await?;
    Ok(())
}
