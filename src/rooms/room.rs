use axum::{debug_handler, extract::{Path, State}, http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use tower_sessions::Session;

use crate::{accounts::active_account, store::DocStore, AppResult, AppState};

use super::{msg::{self, Message, SendMessageQuery}, resolve_room, RoomId};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RoomSnapshot {
    room_id: RoomId,
    messages: Vec<Message>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn room(
    State(store): State<DocStore>,
    session: Session,
    Path(other_id): Path<String>,
) -> AppResult<Json<RoomSnapshot>> {
    let (_, account) = active_account(&store, &session).await?;
    let room_id = resolve_room(&account.id, &other_id)?;
    let messages = msg::room_messages(&store, &room_id).await?;

    Ok(Json(RoomSnapshot { room_id, messages }))
}

#[debug_handler(state = AppState)]
pub(crate) async fn post_msg(
    State(store): State<DocStore>,
    session: Session,
    Path(other_id): Path<String>,
    Json(SendMessageQuery { text }): Json<SendMessageQuery>,
) -> AppResult<Response> {
    let (_, account) = active_account(&store, &session).await?;
    let room_id = resolve_room(&account.id, &other_id)?;

    Ok(match msg::send_msg(&store, &room_id, &account.id, &text).await {
        Some(message) => (StatusCode::ACCEPTED, Json(message)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}
