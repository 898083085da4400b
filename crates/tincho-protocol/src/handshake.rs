//! The first exchange on a fresh socket.
//!
//! A client opens a socket and sends exactly one [`Request`]. The server
//! answers with one [`Reply`]. After a successful `joined` reply the socket
//! carries [`Action`](crate::Action)s in and [`Update`](crate::Update)s
//! out until it closes; every other reply ends the conversation.

use serde::{Deserialize, Serialize};
use tincho_game::PlayerId;

use crate::RoomId;

/// Client → server: what this socket is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Request {
    CreateRoom(CreateRoom),
    JoinRoom(JoinRoom),
    ListRooms,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoom {
    /// Falls back to the server's default when absent.
    #[serde(default)]
    pub max_players: Option<usize>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoom {
    pub room: RoomId,
    pub player: PlayerId,
    #[serde(default)]
    pub password: Option<String>,
    /// Present when resuming a seat this player already holds.
    #[serde(default)]
    pub session_token: Option<String>,
}

/// A summary of a room returned in room listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomListEntry {
    pub room: RoomId,
    pub players: Vec<PlayerId>,
    pub max_players: usize,
    pub playing: bool,
    pub has_password: bool,
}

/// Server → client: the answer to a [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum Reply {
    RoomCreated {
        room: RoomId,
    },
    /// Keep `session_token` to resume the seat after a disconnect.
    Joined {
        room: RoomId,
        player: PlayerId,
        session_token: String,
        rejoined: bool,
    },
    Rooms {
        rooms: Vec<RoomListEntry>,
    },
    Error {
        message: String,
    },
}
