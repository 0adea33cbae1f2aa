use axum::{debug_handler, extract::{ws::Message as WsMessage, Path, State, WebSocketUpgrade}, response::{IntoResponse, Response}};
use futures_util::StreamExt;
use tower_sessions::Session;

use crate::{accounts::active_account, live, store::DocStore, AppResult};

use super::{msg::{self, SendMessageQuery}, resolve_room};

/// Live room: every change pushes the whole sorted log, and text frames of
/// the form `{"text": "..."}` are sent as messages from the caller.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn room_ws(
    Path(other_id): Path<String>,
    State(store): State<DocStore>,
    session: Session,

    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let (_, account) = active_account(&store, &session).await?;
    let room_id = resolve_room(&account.id, &other_id)?;
    let sender_id = account.id;

    Ok(ws.on_upgrade(move |stream| async move {
        let (sender, mut receiver) = stream.split();
        let mut push_task = tokio::spawn(live::pump(sender, msg::subscribe_room(&store, &room_id)));
        tracing::debug!(room = %room_id, "room opened");

        loop {
            let frame = tokio::select! {
                _ = &mut push_task => break,
                frame = receiver.next() => frame,
            };

            let text = match frame {
                Some(Ok(WsMessage::Text(text))) => text,
                Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => continue,
            };

            let Ok(SendMessageQuery { text }) = serde_json::from_str(text.as_str()) else {
                continue
            };

            let _ = msg::send_msg(&store, &room_id, &sender_id, &text).await;
        }

        push_task.abort();
        tracing::debug!(room = %room_id, "room closed");
    }).into_response())
}
