//! Two-party chat rooms.
//!
//! A room has no record of its own. Both participants derive the same
//! [`RoomId`] from the unordered pair of their account ids, and the room is
//! nothing more than the message collection under that id.

mod msg;
mod room;
mod ws;

use std::fmt;

use axum::{routing::get, Router};
use serde::Serialize;

use crate::{AppState, DomainError};

pub use msg::{messages_path, room_messages, send_msg, sort_messages, subscribe_room, Message};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{other_id}", get(room::room).post(room::post_msg))
        .route("/{other_id}/ws", get(ws::room_ws))
}

const SEPARATOR: char = '_';

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Room shared by `self_id` and `other_id`: the two ids sorted and joined by `_`.
/// Chatting with yourself has no room.
pub fn resolve_room(self_id: &str, other_id: &str) -> Result<RoomId, DomainError> {
    if self_id.is_empty() || other_id.is_empty() {
        return Err(DomainError::invalid("chat participants need an id"));
    }
    if self_id == other_id {
        return Err(DomainError::invalid("cannot open a chat with yourself"));
    }
    if self_id.contains('/') || other_id.contains('/') {
        return Err(DomainError::invalid("malformed participant id"));
    }

    let (first, second) = if self_id < other_id {
        (self_id, other_id)
    } else {
        (other_id, self_id)
    };
    Ok(RoomId(format!("{first}{SEPARATOR}{second}")))
}
