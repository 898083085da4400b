//! Error types for the room layer.

use tincho_game::{GameError, PlayerId};
use tincho_protocol::RoomId;

/// Errors that can occur during room operations.
///
/// Errors caused by a player's action travel back to that player as an
/// `error` update carrying this type's `Display` text.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room has no free seat.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The server already runs as many rooms as it is allowed to.
    #[error("rooms limit reached")]
    RoomsLimitReached,

    #[error("wrong password for room {0}")]
    InvalidPassword(RoomId),

    /// The id is seated and the caller did not prove it owns the seat.
    #[error("player {0} already exists in room")]
    PlayerAlreadyInRoom(PlayerId),

    /// A session token was sent for an id that holds no seat here.
    #[error("player {0} has no seat to resume")]
    NoSeatToResume(PlayerId),

    #[error("not your turn")]
    NotYourTurn,

    /// Only the first player to join may start the game.
    #[error("not room leader")]
    NotRoomLeader,

    #[error("invalid room config: {0}")]
    InvalidConfig(String),

    /// The room stopped and no longer takes joins or actions.
    #[error("room {0} is closed")]
    Closed(RoomId),

    /// The game rules rejected the action.
    #[error(transparent)]
    Game(#[from] GameError),
}
