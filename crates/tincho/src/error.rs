//! Unified error type for the Tincho server.

use tincho_game::GameError;
use tincho_protocol::ProtocolError;
use tincho_room::RoomError;
use tincho_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum TinchoError {
    /// Listening failed or a player socket broke.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (full, not found, closed, wrong password).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A rule violation surfaced outside a room.
    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::Accept(std::io::Error::other("gone"));
        let tincho_err: TinchoError = err.into();
        assert!(matches!(tincho_err, TinchoError::Transport(_)));
        assert!(tincho_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::UnknownType("fly".into());
        let tincho_err: TinchoError = err.into();
        assert!(matches!(tincho_err, TinchoError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NotFound(tincho_protocol::RoomId::from("ABCD"));
        let tincho_err: TinchoError = err.into();
        assert!(matches!(tincho_err, TinchoError::Room(_)));
        assert_eq!(tincho_err.to_string(), "room ABCD not found");
    }

    #[test]
    fn test_from_game_error() {
        let tincho_err: TinchoError = GameError::EmptyDeck.into();
        assert!(matches!(tincho_err, TinchoError::Game(_)));
    }
}
