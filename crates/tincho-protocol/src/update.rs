//! Updates: what the room tells players happened.
//!
//! One action can produce different updates for different players. The
//! card-revealing fields below are `Option`s that are only filled in for
//! the player allowed to see them, and left out of the JSON otherwise.

use serde::{Deserialize, Serialize};
use tincho_game::{Card, CardEffect, DrawSource, PlayerId, Round};

use crate::{PlayerHand, PlayerView};

/// A notification pushed from a room to its players.
///
/// On the wire: `{"type": "<discriminant>", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Update {
    GameConfig(GameConfigUpdate),
    PlayersChanged(PlayersChangedUpdate),
    GameStart(RoundStartUpdate),
    PlayerPeeked(PlayerPeekedUpdate),
    Turn(TurnUpdate),
    Draw(DrawUpdate),
    EffectPeek(EffectPeekUpdate),
    EffectSwap(EffectSwapUpdate),
    Discard(DiscardUpdate),
    FailedDoubleDiscard(FailedDoubleDiscardUpdate),
    Cut(CutUpdate),
    Error(ErrorUpdate),
    StartNextRound(RoundStartUpdate),
    EndGame(EndGameUpdate),
    RejoinState(RejoinUpdate),
}

impl Update {
    /// Shorthand for an `error` update.
    pub fn error(message: impl Into<String>) -> Self {
        Update::Error(ErrorUpdate {
            message: message.into(),
        })
    }

    /// The wire discriminant, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Update::GameConfig(_) => "game_config",
            Update::PlayersChanged(_) => "players_changed",
            Update::GameStart(_) => "game_start",
            Update::PlayerPeeked(_) => "player_peeked",
            Update::Turn(_) => "turn",
            Update::Draw(_) => "draw",
            Update::EffectPeek(_) => "effect_peek",
            Update::EffectSwap(_) => "effect_swap",
            Update::Discard(_) => "discard",
            Update::FailedDoubleDiscard(_) => "failed_double_discard",
            Update::Cut(_) => "cut",
            Update::Error(_) => "error",
            Update::StartNextRound(_) => "start_next_round",
            Update::EndGame(_) => "end_game",
            Update::RejoinState(_) => "rejoin_state",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfigUpdate {
    /// Size of the composition every round is dealt from.
    pub cards_in_deck: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayersChangedUpdate {
    pub players: Vec<PlayerView>,
}

/// Sent as both `game_start` and `start_next_round`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundStartUpdate {
    pub players: Vec<PlayerView>,
    pub top_discard: Card,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerPeekedUpdate {
    pub player: PlayerId,
    /// Only for the player who peeked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cards: Option<[Card; 2]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnUpdate {
    pub player: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawUpdate {
    pub player: PlayerId,
    pub source: DrawSource,
    /// Only for the drawer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,
    /// Only for the drawer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<CardEffect>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectPeekUpdate {
    /// Who used the effect.
    pub player: PlayerId,
    /// Whose card was looked at.
    pub target: PlayerId,
    pub card_position: i32,
    /// Only for the player who peeked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectSwapUpdate {
    pub player: PlayerId,
    pub card_positions: Vec<i32>,
    pub players: Vec<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscardUpdate {
    pub player: PlayerId,
    /// `-1` stands for the drawn card.
    pub card_positions: Vec<i32>,
    pub cards: Vec<Card>,
    pub cycled_piles: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedDoubleDiscardUpdate {
    pub player: PlayerId,
    pub card_positions: Vec<i32>,
    pub cards: Vec<Card>,
    pub top_of_discard: Option<Card>,
    pub cycled_piles: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutUpdate {
    pub player: PlayerId,
    pub with_count: bool,
    pub declared: i32,
    /// Points after scoring.
    pub players: Vec<PlayerView>,
    /// Every hand, revealed.
    pub hands: Vec<PlayerHand>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorUpdate {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndGameUpdate {
    pub rounds: Vec<Round>,
}

/// Everything a reconnecting player needs to redraw the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejoinUpdate {
    pub players: Vec<PlayerView>,
    pub playing: bool,
    pub total_rounds: u32,
    pub current_turn: Option<PlayerId>,
    /// Whether the current player is holding a drawn card.
    pub card_in_hand: bool,
    /// The drawn card, only if the rejoining player is the one holding it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_in_hand_value: Option<Card>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_in_hand_source: Option<DrawSource>,
    pub last_discarded: Option<Card>,
    pub cards_in_deck: usize,
    pub cards_in_draw_pile: usize,
    pub cards_in_discard_pile: usize,
}
