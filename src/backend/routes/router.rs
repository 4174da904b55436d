/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Routes
 *
 * - `GET /chat` - WebSocket room session
 * - `GET /messages` - room history
 * - `GET /health` - liveness and backend summary
 *
 * Every request is traced through `tower_http::trace::TraceLayer`.
 */

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::backend::routes::chat_routes::configure_chat_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// # Arguments
///
/// * `app_state` - Application state shared with every handler
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new().route("/health", get(health));
    let router = configure_chat_routes(router, &app_state);

    router
        .fallback(|| async { (axum::http::StatusCode::NOT_FOUND, "404 Not Found") })
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn health(State(app_state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "log_backend": app_state.log.backend_name(),
        "durable": app_state.log.is_durable(),
        "rooms": app_state.registry.room_count().await,
    }))
}
