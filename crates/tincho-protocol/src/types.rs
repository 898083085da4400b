//! Identity and view types shared by several messages.

use std::fmt;

use serde::{Deserialize, Serialize};
use tincho_game::{Hand, Player, PlayerId};

// ---------------------------------------------------------------------------
// RoomId
// ---------------------------------------------------------------------------

/// A short code players type to find a room, e.g. `"QWER"`.
///
/// `#[serde(transparent)]` makes it a plain JSON string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// ---------------------------------------------------------------------------
// Recipient: who should receive an update?
// ---------------------------------------------------------------------------

/// Specifies who should receive an update.
///
/// Handling one action produces a list of `(Recipient, Update)` pairs;
/// this enum tells the room WHERE to deliver each one. That is how a draw
/// can show the card to the drawer and only the pile to everybody else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Send to every player in the room.
    All,

    /// Send to one specific player.
    Player(PlayerId),

    /// Send to everyone EXCEPT the specified player.
    AllExcept(PlayerId),
}

impl Recipient {
    pub fn includes(&self, player: &PlayerId) -> bool {
        match self {
            Recipient::All => true,
            Recipient::Player(target) => target == player,
            Recipient::AllExcept(excluded) => excluded != player,
        }
    }
}

// ---------------------------------------------------------------------------
// Player views
// ---------------------------------------------------------------------------

/// What everybody may know about a seated player. Never includes cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub points: i32,
    pub pending_first_peek: bool,
    pub cards_in_hand: usize,
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id.clone(),
            points: player.points,
            pending_first_peek: player.pending_first_peek,
            cards_in_hand: player.hand.len(),
        }
    }
}

impl PlayerView {
    pub fn all(players: &[Player]) -> Vec<Self> {
        players.iter().map(Self::from).collect()
    }
}

/// A revealed hand, sent when a round is cut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerHand {
    pub player: PlayerId,
    pub hand: Hand,
}

impl From<&Player> for PlayerHand {
    fn from(player: &Player) -> Self {
        Self {
            player: player.id.clone(),
            hand: player.hand.clone(),
        }
    }
}
