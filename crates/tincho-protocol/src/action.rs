//! Actions: what a player asks the room to do.

use serde::{Deserialize, Serialize};
use tincho_game::{DrawSource, PlayerId};

#[cfg(feature = "json")]
use crate::ProtocolError;

/// A request from a player, already tied to the sending connection.
///
/// On the wire: `{"type": "<discriminant>", "data": {...}}`. `start` and
/// `first_peek` carry no data.
///
/// Only `Serialize` is derived. Decoding goes through [`Action::decode`]
/// so that an unknown discriminant is its own error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Action {
    Start,
    FirstPeek,
    Draw(DrawData),
    Discard(DiscardData),
    Cut(CutData),
    EffectPeekOwn(PeekOwnData),
    EffectPeekOther(PeekOtherData),
    EffectSwapCard(SwapData),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawData {
    pub source: DrawSource,
}

/// `position == -1` throws away the drawn card. A second position asks
/// for a double discard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscardData {
    #[serde(rename = "cardPosition", alias = "position")]
    pub position: i32,
    #[serde(
        rename = "cardPosition2",
        alias = "position2",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub position2: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutData {
    pub with_count: bool,
    #[serde(default)]
    pub declared: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeekOwnData {
    #[serde(rename = "cardPosition", alias = "position")]
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeekOtherData {
    #[serde(rename = "cardPosition", alias = "position")]
    pub position: i32,
    pub player: PlayerId,
}

/// Both lists must hold exactly two entries; the room checks that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapData {
    #[serde(rename = "cardPositions", alias = "positions")]
    pub positions: Vec<i32>,
    pub players: Vec<PlayerId>,
}

impl Action {
    /// The wire discriminant, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::FirstPeek => "first_peek",
            Action::Draw(_) => "draw",
            Action::Discard(_) => "discard",
            Action::Cut(_) => "cut",
            Action::EffectPeekOwn(_) => "effect_peek_own",
            Action::EffectPeekOther(_) => "effect_peek_other",
            Action::EffectSwapCard(_) => "effect_swap_card",
        }
    }

    /// Whether the action may arrive regardless of whose turn it is.
    pub fn ignores_turn(&self) -> bool {
        matches!(self, Action::Start | Action::FirstPeek)
    }

    /// Decodes a raw JSON action in two steps: the `type` first, then the
    /// `data` payload in the shape that `type` calls for.
    ///
    /// `effect_peek_carta_ajena` is accepted as an older spelling of
    /// `effect_peek_other`.
    #[cfg(feature = "json")]
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        #[derive(Deserialize)]
        struct RawAction {
            #[serde(rename = "type")]
            kind: String,
            #[serde(default)]
            data: serde_json::Value,
        }

        fn payload<T: serde::de::DeserializeOwned>(
            data: serde_json::Value,
        ) -> Result<T, ProtocolError> {
            serde_json::from_value(data).map_err(ProtocolError::Decode)
        }

        let raw: RawAction =
            serde_json::from_slice(bytes).map_err(ProtocolError::Decode)?;

        let action = match raw.kind.as_str() {
            "start" => Action::Start,
            "first_peek" => Action::FirstPeek,
            "draw" => Action::Draw(payload(raw.data)?),
            "discard" => Action::Discard(payload(raw.data)?),
            "cut" => Action::Cut(payload(raw.data)?),
            "effect_peek_own" => Action::EffectPeekOwn(payload(raw.data)?),
            "effect_peek_other" | "effect_peek_carta_ajena" => {
                Action::EffectPeekOther(payload(raw.data)?)
            }
            "effect_swap_card" => Action::EffectSwapCard(payload(raw.data)?),
            _ => return Err(ProtocolError::UnknownType(raw.kind)),
        };
        Ok(action)
    }
}
