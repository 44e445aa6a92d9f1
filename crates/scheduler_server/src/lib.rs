//! HTTP boundary for the task scheduler.
//!
//! # Responsibility
//! - Expose task lifecycle operations over JSON HTTP routes.
//! - Serve the static web client from the configured directory.
//! - Resolve process configuration from the environment.

pub mod api;
pub mod config;
pub mod error;

pub use api::{build_router, AppState, CreatedResponse, TaskListResponse, TaskView};
pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ServerError};

use log::info;
use rusqlite::Connection;
use tokio::net::TcpListener;

/// Binds the configured address and serves requests until the listener fails.
///
/// # Errors
/// - [`ServerError::Storage`] when `conn` is not a migrated scheduler database.
/// - [`ServerError::Bind`] when the address is unavailable.
/// - [`ServerError::Serve`] when the accept loop stops with an I/O error.
pub async fn serve(config: &ServerConfig, conn: Connection) -> Result<(), ServerError> {
    let state = AppState::new(conn, config.web_dir.clone()).map_err(ServerError::Storage)?;
    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    let app = build_router(state);
    info!(
        "event=server_start module=http status=ok addr={addr} web_dir={}",
        config.web_dir.display()
    );
    axum::serve(listener, app).await.map_err(ServerError::Serve)
}
