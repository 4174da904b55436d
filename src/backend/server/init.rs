/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server.
 *
 * # Initialization Process
 *
 * 1. Open the configured message log backend
 * 2. Build `AppState` (registry, history service, default collaborators)
 * 3. Create and configure the router
 *
 * A message log that cannot be opened is a startup error: the server does
 * not run without somewhere to persist messages.
 */

use std::sync::Arc;

use axum::Router;

use crate::backend::chat::log::{InMemoryLog, MessageLog, SqliteLog};
use crate::backend::error::BackendError;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{LogBackend, ServerConfig};
use crate::backend::server::state::AppState;

/// Open the message log selected by `config.log_backend`
pub async fn open_message_log(config: &ServerConfig) -> Result<Arc<dyn MessageLog>, BackendError> {
    let log: Arc<dyn MessageLog> = match config.log_backend {
        LogBackend::MemoryList => Arc::new(InMemoryLog::capped_list(config.log_max_len)),
        LogBackend::MemoryStream => Arc::new(InMemoryLog::trimmed_stream(config.log_max_len)),
        LogBackend::Sqlite => {
            tracing::info!(url = %config.database_url, "Connecting to SQLite message log...");
            Arc::new(SqliteLog::connect(&config.database_url, config.log_max_len).await?)
        }
    };

    if !log.is_durable() {
        tracing::warn!(
            backend = log.backend_name(),
            "message log is not durable, history is lost on restart"
        );
    }
    Ok(log)
}

/// Create and configure the Axum application
///
/// # Returns
///
/// The router and the state it serves, so callers can inspect the state
/// (tests, the health of the registry) without going through HTTP.
pub async fn create_app(config: ServerConfig) -> Result<(Router<()>, AppState), BackendError> {
    tracing::info!("Initializing talkroom backend server");

    let log = open_message_log(&config).await?;
    let app_state = AppState::new(config, log);

    tracing::info!(
        backend = app_state.log.backend_name(),
        catch_up_limit = app_state.config.catch_up_limit,
        "Message log and connection registry initialized"
    );

    let app = create_router(app_state.clone());
    Ok((app, app_state))
}
