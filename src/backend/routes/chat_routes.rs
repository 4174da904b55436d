/**
 * Chat Routes
 *
 * - `GET /chat` - WebSocket upgrade into a room session, behind the origin
 *   check
 * - `GET /messages` - history of a room, behind the auth middleware
 */

use axum::{middleware::from_fn_with_state, routing::get, Router};

use crate::backend::chat::handlers::{get_messages, handle_chat_socket};
use crate::backend::middleware::{auth_middleware, origin_guard};
use crate::backend::server::state::AppState;

/// Add the chat routes to a router
pub fn configure_chat_routes(router: Router<AppState>, app_state: &AppState) -> Router<AppState> {
    let socket = Router::new()
        .route("/chat", get(handle_chat_socket))
        .route_layer(from_fn_with_state(app_state.config.clone(), origin_guard));

    let history = Router::new()
        .route("/messages", get(get_messages))
        .route_layer(from_fn_with_state(app_state.clone(), auth_middleware));

    router.merge(socket).merge(history)
}
