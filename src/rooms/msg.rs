use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::{now_millis, store::{decode_all, DocStore, Document, StoreResult}, AppResult};

use super::RoomId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub id: String,
    pub sender_id: String,
    pub text: String,
    /// Client clock, milliseconds since the epoch.
    pub timestamp: i64,
}

#[derive(Deserialize)]
pub(crate) struct SendMessageQuery {
    pub(crate) text: String,
}

pub fn messages_path(store: &DocStore, room: &RoomId) -> String {
    store.public(&format!("chats/{room}/messages"))
}

/// Oldest first. The store hands snapshots over in no particular order.
pub fn sort_messages(messages: &mut [Message]) {
    messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
}

fn into_log(docs: Vec<Document>) -> StoreResult<Vec<Message>> {
    let mut messages = decode_all(docs)?;
    sort_messages(&mut messages);
    Ok(messages)
}

/// Appends `text` to the room. Blank text is not sent, and a failed write is
/// logged and dropped; either way the caller gets `None`.
pub async fn send_msg(store: &DocStore, room: &RoomId, sender_id: &str, text: &str) -> Option<Message> {
    if text.trim().is_empty() {
        return None;
    }

    let mut message = Message {
        id: String::new(),
        sender_id: sender_id.to_owned(),
        text: text.to_owned(),
        timestamp: now_millis(),
    };

    match store.add(&messages_path(store, room), &message).await {
        Ok(id) => {
            message.id = id;
            tracing::debug!(%room, message_id = %message.id, "message sent");
            Some(message)
        }
        Err(err) => {
            tracing::warn!(%room, %sender_id, error = %err, "message dropped");
            None
        }
    }
}

/// Current message log of the room.
pub async fn room_messages(store: &DocStore, room: &RoomId) -> AppResult<Vec<Message>> {
    Ok(into_log(store.list(&messages_path(store, room)).await?)?)
}

/// The room's whole log, again after every change. Dropping the stream unsubscribes.
pub fn subscribe_room(store: &DocStore, room: &RoomId) -> impl Stream<Item = StoreResult<Vec<Message>>> + Send + 'static {
    store
        .subscribe(&messages_path(store, room))
        .map(|snapshot| snapshot.and_then(into_log))
}
