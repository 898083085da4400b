//! Special effects triggered by drawn cards.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Card;

/// What a drawn card allows its holder to do instead of a plain discard.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CardEffect {
    #[default]
    None,
    /// Look at one of your own cards.
    PeekOwn,
    /// Look at one card of another player.
    PeekOther,
    /// Exchange two cards between two players.
    #[serde(rename = "swap_card")]
    Swap,
}

impl fmt::Display for CardEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardEffect::None => "none",
            CardEffect::PeekOwn => "peek_own",
            CardEffect::PeekOther => "peek_other",
            CardEffect::Swap => "swap_card",
        };
        f.write_str(name)
    }
}

/// Face value to effect table.
///
/// The rule set is data, not code: rooms are created with whatever table
/// the deployment configures. Jokers never carry an effect and neither
/// does any value missing from the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectRules {
    by_value: BTreeMap<u8, CardEffect>,
}

impl EffectRules {
    /// A table where no card has an effect.
    pub fn none() -> Self {
        Self {
            by_value: BTreeMap::new(),
        }
    }

    /// Builder-style insertion of a single rule.
    pub fn with(mut self, value: u8, effect: CardEffect) -> Self {
        self.by_value.insert(value, effect);
        self
    }

    pub fn effect_of(&self, card: &Card) -> CardEffect {
        if card.is_joker() {
            return CardEffect::None;
        }
        self.by_value
            .get(&card.value)
            .copied()
            .unwrap_or_default()
    }
}

impl Default for EffectRules {
    /// 7 peeks your own card, 8 peeks someone else's, 10 swaps.
    fn default() -> Self {
        Self::none()
            .with(7, CardEffect::PeekOwn)
            .with(8, CardEffect::PeekOther)
            .with(10, CardEffect::Swap)
    }
}
