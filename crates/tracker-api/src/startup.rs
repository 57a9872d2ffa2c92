//! Server startup helper for embedding in the engine binary.
//!
//! [`spawn_api`] binds the listener eagerly, so a port conflict surfaces
//! as a startup error, then serves on a background Tokio task alongside
//! the scheduler.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{ServerConfig, ServerError, bind, serve};
use crate::state::AppState;

/// Errors that can occur when spawning the server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Bind `config` and spawn the HTTP server on a background task.
///
/// The server runs until the runtime shuts down or the handle is aborted.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address is invalid or cannot
/// be bound.
pub async fn spawn_api(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<JoinHandle<()>, StartupError> {
    let listener = bind(config).await?;
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("no local address: {e}")))?;

    let handle = tokio::spawn(async move {
        if let Err(e) = serve(listener, state).await {
            tracing::error!(error = %e, "Tracker server exited with error");
        }
    });

    tracing::info!(%addr, "Tracker server spawned on background task");

    Ok(handle)
}
