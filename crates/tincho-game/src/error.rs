//! Error types for the rules engine.

use crate::{CardEffect, PlayerId};

/// Rule violations and resource exhaustion reported by [`crate::Tincho`].
///
/// The `Display` text of each variant is what a player eventually reads,
/// so keep the messages short and human.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// A pile had no card left to give.
    #[error("deck is empty")]
    EmptyDeck,

    /// A draw is outstanding and has to be resolved first.
    #[error("someone needs to discard first")]
    PendingDiscard,

    /// The operation needs a drawn card and there is none.
    #[error("no card has been drawn")]
    NoPendingDraw,

    #[error("player {0} already peeked this round")]
    PlayerNotPendingFirstPeek(PlayerId),

    #[error("player {0} already in room")]
    PlayerAlreadyInRoom(PlayerId),

    #[error("player {0} is not in the game")]
    UnknownPlayer(PlayerId),

    #[error("game already started")]
    GameAlreadyStarted,

    #[error("game not started")]
    GameNotStarted,

    /// The game is still going, so nobody has won yet.
    #[error("game has not finished")]
    GameNotFinished,

    #[error("need at least one player to deal")]
    NoPlayers,

    #[error("invalid card position {0}")]
    InvalidPosition(i32),

    #[error("card positions must be different")]
    SamePosition,

    /// The pending card does not grant the requested effect.
    #[error("invalid effect: drawn card grants {found}, not {expected}")]
    InvalidEffect {
        expected: CardEffect,
        found: CardEffect,
    },

    #[error("invalid swap: {0}")]
    InvalidSwap(String),
}
