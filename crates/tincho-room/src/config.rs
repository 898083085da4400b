//! Room configuration and state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tincho_game::EffectRules;

use crate::RoomError;

/// Fewest seats a room may be created with.
pub const MIN_PLAYERS: usize = 2;

/// Most seats a room may be created with.
pub const MAX_PLAYERS: usize = 10;

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration for a room instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Maximum players allowed in the room.
    pub max_players: usize,

    /// Updates buffered per player before new ones are dropped.
    pub update_buffer: usize,

    /// How long the room lives before it closes on its own.
    pub room_timeout: Duration,

    /// Which drawn cards grant which effect.
    pub effects: EffectRules,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_players: 4,
            update_buffer: 20,
            room_timeout: Duration::from_secs(60 * 60),
            effects: EffectRules::default(),
        }
    }
}

impl RoomConfig {
    pub fn validate(&self) -> Result<(), RoomError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.max_players) {
            return Err(RoomError::InvalidConfig(format!(
                "max players must be between {MIN_PLAYERS} and {MAX_PLAYERS}, got {}",
                self.max_players
            )));
        }
        if self.update_buffer == 0 {
            return Err(RoomError::InvalidConfig(
                "update buffer must hold at least one update".into(),
            ));
        }
        Ok(())
    }
}

/// Limits for the whole room registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Rooms allowed to run at the same time.
    pub max_rooms: usize,

    /// Template for every room the registry creates. `max_players` is the
    /// fallback when a creator does not ask for a specific size.
    pub room: RoomConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_rooms: 100,
            room: RoomConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Created → Started → Closed
/// ```
///
/// - **Created**: the actor exists but its loop has not run yet.
/// - **Started**: the loop is running and accepting joins and actions.
///   Whether a *game* is being played is tracked by the game state itself.
/// - **Closed**: the game ended or the room timed out. Terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomState {
    Created,
    Started,
    Closed,
}

impl RoomState {
    /// Returns `Some(next)` for the one valid forward transition.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Created => Some(Self::Started),
            Self::Started => Some(Self::Closed),
            Self::Closed => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    ///
    /// Any live room may close directly, e.g. on a timeout.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
            || (self != Self::Closed && target == Self::Closed)
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Started => write!(f, "Started"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_state_next_follows_strict_order() {
        assert_eq!(RoomState::Created.next(), Some(RoomState::Started));
        assert_eq!(RoomState::Started.next(), Some(RoomState::Closed));
        assert_eq!(RoomState::Closed.next(), None);
    }

    #[test]
    fn test_room_state_can_transition_to() {
        assert!(RoomState::Created.can_transition_to(RoomState::Started));
        assert!(RoomState::Created.can_transition_to(RoomState::Closed));
        assert!(!RoomState::Started.can_transition_to(RoomState::Created));
        assert!(!RoomState::Closed.can_transition_to(RoomState::Closed));
    }

    #[test]
    fn test_room_config_validate_player_bounds() {
        for max_players in [0, 1, 11] {
            let config = RoomConfig {
                max_players,
                ..RoomConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(RoomError::InvalidConfig(_))
            ));
        }
        for max_players in [2, 10] {
            let config = RoomConfig {
                max_players,
                ..RoomConfig::default()
            };
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.update_buffer, 20);
        assert!(config.validate().is_ok());
    }
}
