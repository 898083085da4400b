//! Rules engine for Tincho.
//!
//! This crate knows nothing about networking or rooms. It holds the
//! authoritative game state for one table and exposes one method per
//! game operation:
//!
//! - [`Card`], [`Deck`] and [`Hand`] model the cards and the scoring rule
//! - [`EffectRules`] maps a drawn card to its special effect
//! - [`Tincho`] is the state machine: turns, piles, the pending draw,
//!   cutting and scoring
//!
//! Every operation validates first and mutates second, so a returned
//! error always means the state was left untouched.

mod card;
mod effect;
mod error;
mod player;
mod tincho;

pub use card::{Card, Deck, Hand, Suit};
pub use effect::{CardEffect, EffectRules};
pub use error::GameError;
pub use player::{Player, PlayerId};
pub use tincho::{
    CutOutcome, Discarded, DoubleDiscard, DrawSource, PeekOutcome,
    PendingDraw, PlayerRound, Round, STARTING_HAND_SIZE, Tincho,
    WINNING_POINTS,
};
