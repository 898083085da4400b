use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Hand;

/// The name a player joins with. Unique within a room.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A seated player. Owned by [`crate::Tincho`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    /// Running total across rounds. Lower is better.
    pub points: i32,
    /// True from round start until the player looks at their two cards.
    pub pending_first_peek: bool,
    pub hand: Hand,
}

impl Player {
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            points: 0,
            pending_first_peek: true,
            hand: Hand::default(),
        }
    }
}
