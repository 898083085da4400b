//! Cards, decks and hands.

use std::collections::VecDeque;
use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::GameError;

/// Highest face value of a standard suit.
const MAX_FACE_VALUE: u8 = 12;

/// Number of jokers in a standard deck.
const JOKERS_PER_DECK: usize = 2;

// ---------------------------------------------------------------------------
// Card
// ---------------------------------------------------------------------------

/// The suit of a card. Jokers have their own suit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
    Joker,
}

impl Suit {
    /// The four suits that carry face values 1 to 12.
    pub const STANDARD: [Suit; 4] =
        [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Suit::Spades => "spades",
            Suit::Hearts => "hearts",
            Suit::Diamonds => "diamonds",
            Suit::Clubs => "clubs",
            Suit::Joker => "joker",
        };
        f.write_str(name)
    }
}

/// A single playing card.
///
/// Cards are plain values: two cards with the same suit and value are
/// equal, even though a deck may hold several physical copies.
/// "No card" is expressed with `Option<Card>`, never with a sentinel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct Card {
    pub suit: Suit,
    pub value: u8,
}

impl Card {
    pub const fn new(suit: Suit, value: u8) -> Self {
        Self { suit, value }
    }

    pub const fn joker() -> Self {
        Self::new(Suit::Joker, 0)
    }

    pub fn is_joker(&self) -> bool {
        self.suit == Suit::Joker
    }

    /// The twelve of diamonds always scores zero.
    pub fn is_zero_king(&self) -> bool {
        self.suit == Suit::Diamonds && self.value == MAX_FACE_VALUE
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_joker() {
            f.write_str("joker")
        } else {
            write!(f, "{} of {}", self.value, self.suit)
        }
    }
}

// ---------------------------------------------------------------------------
// Deck
// ---------------------------------------------------------------------------

/// An ordered pile of cards, drawn from the front.
///
/// The same type backs the draw pile, the discard pile and the base
/// composition a room reshuffles from every round. For the discard pile
/// the front is the most recently discarded card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deck {
    cards: VecDeque<Card>,
}

impl Deck {
    /// The standard composition: four suits of 1 to 12, plus two jokers.
    pub fn new() -> Self {
        let mut cards = VecDeque::with_capacity(
            Suit::STANDARD.len() * MAX_FACE_VALUE as usize + JOKERS_PER_DECK,
        );
        for suit in Suit::STANDARD {
            for value in 1..=MAX_FACE_VALUE {
                cards.push_back(Card::new(suit, value));
            }
        }
        for _ in 0..JOKERS_PER_DECK {
            cards.push_back(Card::joker());
        }
        Self { cards }
    }

    /// An empty pile.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Appends extra cards at the back, e.g. for deck variants.
    ///
    /// Meant to be called before the composition is handed to a room.
    pub fn extend(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.cards.extend(cards);
    }

    /// Unbiased in-place permutation using the caller's random source.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.make_contiguous().shuffle(rng);
    }

    /// Removes and returns the front card.
    pub fn draw(&mut self) -> Result<Card, GameError> {
        self.cards.pop_front().ok_or(GameError::EmptyDeck)
    }

    /// Puts a card on the front of the pile.
    pub fn put_on_top(&mut self, card: Card) {
        self.cards.push_front(card);
    }

    pub fn top(&self) -> Option<Card> {
        self.cards.front().copied()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    /// Empties the pile, returning its cards front to back.
    pub(crate) fn take_all(&mut self) -> Vec<Card> {
        self.cards.drain(..).collect()
    }
}

impl From<Vec<Card>> for Deck {
    fn from(cards: Vec<Card>) -> Self {
        Self {
            cards: cards.into(),
        }
    }
}

impl FromIterator<Card> for Deck {
    fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
        Self {
            cards: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Hand
// ---------------------------------------------------------------------------

/// The cards in front of a player, addressed by position.
///
/// Positions are not stable: removing a card shifts every later card one
/// position to the left.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hand(Vec<Card>);

impl Hand {
    pub fn new(cards: Vec<Card>) -> Self {
        Self(cards)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<Card> {
        self.0.get(position).copied()
    }

    pub fn cards(&self) -> &[Card] {
        &self.0
    }

    pub(crate) fn push(&mut self, card: Card) {
        self.0.push(card);
    }

    pub(crate) fn remove(&mut self, position: usize) -> Card {
        self.0.remove(position)
    }

    /// Puts `card` at `position` and returns the card that was there.
    pub(crate) fn replace(&mut self, position: usize, card: Card) -> Card {
        std::mem::replace(&mut self.0[position], card)
    }

    pub(crate) fn swap(&mut self, a: usize, b: usize) {
        self.0.swap(a, b);
    }

    /// Scores the hand.
    ///
    /// - the twelve of diamonds is worth 0 and pins the hand minimum at 0
    /// - every other non-joker card is worth its face value
    /// - every joker is worth the hand minimum (0 for an all-joker hand)
    pub fn sum(&self) -> i32 {
        let mut total = 0;
        let mut minimum: Option<i32> = None;
        let mut jokers = 0;

        for card in &self.0 {
            let value = if card.is_joker() {
                jokers += 1;
                continue;
            } else if card.is_zero_king() {
                0
            } else {
                i32::from(card.value)
            };
            total += value;
            minimum = Some(minimum.map_or(value, |m| m.min(value)));
        }

        total + jokers * minimum.unwrap_or(0)
    }
}
