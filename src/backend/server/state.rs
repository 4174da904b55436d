/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * `AppState` is constructed once at startup and cloned into every handler
 * and room session. It holds:
 * - the `ConnectionRegistry` (live connections per room)
 * - the `MessageLog` backend and the `HistoryService` over it
 * - the external collaborators: identity provider, room and user directories
 * - the loaded `ServerConfig`
 *
 * # Thread Safety
 *
 * Every field is behind an `Arc`; the registry and the log backends handle
 * their own locking.
 */

use std::sync::Arc;

use axum::extract::FromRef;

use crate::backend::auth::{IdentityProvider, TrustedIdentity};
use crate::backend::chat::history::HistoryService;
use crate::backend::chat::log::{InMemoryLog, MessageLog};
use crate::backend::directory::{AnonymousUsers, OpenRooms, RoomDirectory, UserDirectory};
use crate::backend::realtime::ConnectionRegistry;
use crate::backend::server::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ConnectionRegistry>,
    pub log: Arc<dyn MessageLog>,
    pub history: HistoryService,
    pub identity: Arc<dyn IdentityProvider>,
    pub rooms: Arc<dyn RoomDirectory>,
    pub users: Arc<dyn UserDirectory>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Build state around a log backend with the default collaborators
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use talkroom::backend::chat::log::InMemoryLog;
    /// use talkroom::backend::server::config::ServerConfig;
    /// use talkroom::backend::server::state::AppState;
    ///
    /// let state = AppState::new(ServerConfig::default(), Arc::new(InMemoryLog::capped_list(100)));
    /// assert_eq!(state.log.backend_name(), "memory-list");
    /// ```
    pub fn new(config: ServerConfig, log: Arc<dyn MessageLog>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new(config.broadcast_write_timeout));
        Self {
            registry,
            history: HistoryService::new(log.clone()),
            log,
            identity: Arc::new(TrustedIdentity),
            rooms: Arc::new(OpenRooms),
            users: Arc::new(AnonymousUsers),
            config: Arc::new(config),
        }
    }

    /// In-memory state with default configuration
    pub fn in_memory() -> Self {
        let config = ServerConfig::default();
        let log = Arc::new(InMemoryLog::capped_list(config.log_max_len));
        Self::new(config, log)
    }

    pub fn with_identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_rooms(mut self, rooms: Arc<dyn RoomDirectory>) -> Self {
        self.rooms = rooms;
        self
    }

    pub fn with_users(mut self, users: Arc<dyn UserDirectory>) -> Self {
        self.users = users;
        self
    }
}

/// Implement FromRef for the connection registry
///
/// This allows Axum handlers to extract `State<Arc<ConnectionRegistry>>`
/// directly from `AppState`.
impl FromRef<AppState> for Arc<ConnectionRegistry> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.registry.clone()
    }
}

impl FromRef<AppState> for HistoryService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.history.clone()
    }
}

impl FromRef<AppState> for Arc<ServerConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}
