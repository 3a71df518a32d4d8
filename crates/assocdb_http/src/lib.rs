//! HTTP surface for the object association store.
//!
//! # Responsibility
//! - Expose entity CRUD and association endpoints over JSON.
//! - Translate core errors into HTTP status codes at the request boundary.
//!
//! # Invariants
//! - Every request holds one store session for its whole duration.
//! - No request failure is fatal to the process.

pub mod config;
pub mod error;
pub mod routes;
pub mod session;

pub use config::{DbLocation, ServerConfig};
pub use error::ApiError;
pub use routes::router;
pub use session::AppState;

use log::info;
use std::io;
use tokio::net::TcpListener;

/// Serves the router on an already-bound listener until shutdown.
pub async fn serve(listener: TcpListener, state: AppState) -> io::Result<()> {
    let addr = listener.local_addr()?;
    info!("event=server_start module=http status=ok addr={addr}");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("event=server_stop module=http status=ok addr={addr}");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("event=server_signal module=http status=error error={err}");
        std::future::pending::<()>().await;
    }
}
