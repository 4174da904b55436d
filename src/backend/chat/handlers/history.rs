/**
 * History Handler
 *
 * `GET /messages?room_id=<room>&cursor=<cursor>`
 *
 * Serves the Catch-up Query Service over HTTP. The route sits behind the
 * auth middleware, and the caller must be a member of the room.
 *
 * `cursor` may be a message id or an offset; `lastMessageId` is accepted as
 * an older name for it. Omit it to get the full retained history.
 *
 * # Response
 *
 * ```json
 * {"success": true, "messages": [...], "next_cursor": "3"}
 * ```
 */

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::backend::chat::log::Cursor;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::Message;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default, alias = "roomId")]
    pub room_id: String,
    #[serde(default, alias = "lastMessageId")]
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

pub async fn get_messages(
    State(app_state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, BackendError> {
    let room_id = query.room_id.trim();
    if room_id.is_empty() {
        return Err(BackendError::handler(StatusCode::BAD_REQUEST, "room_id is required"));
    }
    let cursor = Cursor::parse_optional(query.cursor.as_deref())?;

    if !app_state.rooms.is_member(room_id, &user.user_id).await {
        return Err(BackendError::forbidden(room_id, &user.user_id));
    }

    let page = app_state.history.page(room_id, cursor).await?;
    Ok(Json(HistoryResponse {
        success: true,
        messages: page.messages,
        next_cursor: page.next_cursor.map(|cursor| cursor.to_string()),
    }))
}
