//! The Tincho state machine.
//!
//! One [`Tincho`] value is the whole truth about one table: who sits
//! where, whose turn it is, both piles, the card currently drawn and the
//! scores of every finished round.
//!
//! A turn is always *draw, then resolve*. After [`Tincho::draw`] the drawn
//! card sits in a pending slot until the same player resolves it with one
//! of:
//!
//! - [`Tincho::discard`] or [`Tincho::discard_two`]
//! - one of the `use_effect_*` methods, if the card grants that effect
//!
//! Resolving refills the draw pile from the discard pile when it ran dry
//! and passes the turn. A player may [`Tincho::cut`] instead of drawing,
//! which scores the round.
//!
//! The state machine does not check *who* is calling; the room in front of
//! it only forwards actions from the player whose turn it is.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    Card, CardEffect, Deck, EffectRules, GameError, Hand, Player, PlayerId,
};

/// Cards dealt to every player at the start of a round.
pub const STARTING_HAND_SIZE: usize = 4;

/// The game ends once anybody's running total goes above this.
pub const WINNING_POINTS: i32 = 100;

// ---------------------------------------------------------------------------
// Operation results
// ---------------------------------------------------------------------------

/// Which pile a card is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawSource {
    Pile,
    Discard,
}

/// The drawn card waiting to be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDraw {
    pub card: Card,
    pub source: DrawSource,
}

/// Result of a single discard or of an effect resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discarded {
    /// The card that landed on top of the discard pile.
    pub card: Card,
    /// Whether the discard pile was recycled into a new draw pile.
    pub cycled: bool,
}

/// Result of a double discard. Both branches pass the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoubleDiscard {
    /// Both cards were thrown away and the hand shrank by one.
    Discarded { cards: [Card; 2], cycled: bool },
    /// The values differed. The drawn card was added to the hand instead.
    NonEqualCards {
        cards: [Card; 2],
        top_of_discard: Option<Card>,
        cycled: bool,
    },
}

/// Result of a peek effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeekOutcome {
    /// The card that was looked at.
    pub card: Card,
    pub discarded: Discarded,
}

/// One player's line in a [`Round`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRound {
    pub player: PlayerId,
    /// Points scored this round.
    pub delta: i32,
    /// Running total after this round.
    pub points: i32,
    pub hand: Hand,
}

/// The record of one finished round. Never modified once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub cutter: PlayerId,
    pub with_count: bool,
    pub declared: i32,
    /// In seating order.
    pub players: Vec<PlayerRound>,
}

/// Result of a cut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutOutcome {
    /// Every round played so far, this one last.
    pub rounds: Vec<Round>,
    /// True if this cut ended the game.
    pub finished: bool,
}

// ---------------------------------------------------------------------------
// Tincho
// ---------------------------------------------------------------------------

/// Authoritative game state for one table.
#[derive(Debug)]
pub struct Tincho {
    players: Vec<Player>,
    playing: bool,
    current_turn: usize,
    draw_pile: Deck,
    discard_pile: Deck,
    /// The composition every round is dealt from.
    base_deck: Deck,
    pending: Option<PendingDraw>,
    total_rounds: u32,
    total_turns: u32,
    round_history: Vec<Round>,
    effects: EffectRules,
    rng: StdRng,
}

impl Tincho {
    /// New table dealing from `deck`, with the default effect table and an
    /// OS-seeded random source.
    pub fn new(deck: Deck) -> Self {
        Self::with_rng(deck, EffectRules::default(), StdRng::from_os_rng())
    }

    /// New table with an explicit effect table and random source.
    ///
    /// The first round is dealt from `deck` exactly as given; later rounds
    /// reshuffle a copy of it with `rng`.
    pub fn with_rng(deck: Deck, effects: EffectRules, rng: StdRng) -> Self {
        Self {
            players: Vec::new(),
            playing: false,
            current_turn: 0,
            draw_pile: Deck::empty(),
            discard_pile: Deck::empty(),
            base_deck: deck,
            pending: None,
            total_rounds: 0,
            total_turns: 0,
            round_history: Vec::new(),
            effects,
            rng,
        }
    }

    // -- Seating ------------------------------------------------------------

    /// Seats a new player at the end of the table.
    pub fn add_player(&mut self, id: PlayerId) -> Result<(), GameError> {
        if self.playing {
            return Err(GameError::GameAlreadyStarted);
        }
        if self.player(&id).is_some() {
            return Err(GameError::PlayerAlreadyInRoom(id));
        }
        self.players.push(Player::new(id));
        Ok(())
    }

    // -- Rounds ------------------------------------------------------------

    /// Starts the game and deals round 1 from the unshuffled base deck.
    ///
    /// Returns the opening top of the discard pile.
    pub fn start_game(&mut self) -> Result<Card, GameError> {
        if self.playing {
            return Err(GameError::GameAlreadyStarted);
        }
        let top = self.prepare_round(false)?;
        self.playing = true;
        Ok(top)
    }

    /// Deals the next round from a reshuffled copy of the base deck.
    pub fn start_next_round(&mut self) -> Result<Card, GameError> {
        if !self.playing {
            return Err(GameError::GameNotStarted);
        }
        self.prepare_round(true)
    }

    /// Deals a whole round into locals and commits only once every draw
    /// succeeded.
    fn prepare_round(&mut self, shuffle: bool) -> Result<Card, GameError> {
        if self.players.is_empty() {
            return Err(GameError::NoPlayers);
        }

        let mut draw_pile = self.base_deck.clone();
        if shuffle {
            draw_pile.shuffle(&mut self.rng);
        }

        let mut hands = Vec::with_capacity(self.players.len());
        for _ in &self.players {
            let mut hand = Hand::default();
            for _ in 0..STARTING_HAND_SIZE {
                hand.push(draw_pile.draw()?);
            }
            hands.push(hand);
        }
        let top = draw_pile.draw()?;

        for (player, hand) in self.players.iter_mut().zip(hands) {
            player.hand = hand;
            player.pending_first_peek = true;
        }
        self.total_rounds += 1;
        self.current_turn =
            (self.total_rounds as usize - 1) % self.players.len();
        self.pending = None;
        self.draw_pile = draw_pile;
        self.discard_pile = Deck::from(vec![top]);

        debug!(
            round = self.total_rounds,
            starting_seat = self.current_turn,
            "round dealt"
        );
        Ok(top)
    }

    // -- First peek --------------------------------------------------------

    /// The one-time look at positions 0 and 1 of a player's own hand.
    ///
    /// Has no turn requirement.
    pub fn first_peek(&mut self, id: &PlayerId) -> Result<[Card; 2], GameError> {
        if !self.playing {
            return Err(GameError::GameNotStarted);
        }
        let index = self.player_index(id)?;
        let player = &mut self.players[index];
        if !player.pending_first_peek {
            return Err(GameError::PlayerNotPendingFirstPeek(id.clone()));
        }
        let first = player.hand.get(0).ok_or(GameError::InvalidPosition(0))?;
        let second = player.hand.get(1).ok_or(GameError::InvalidPosition(1))?;
        player.pending_first_peek = false;
        Ok([first, second])
    }

    pub fn all_players_first_peeked(&self) -> bool {
        self.players.iter().all(|p| !p.pending_first_peek)
    }

    // -- Drawing -----------------------------------------------------------

    /// Draws into the pending slot for the player whose turn it is.
    pub fn draw(&mut self, source: DrawSource) -> Result<Card, GameError> {
        if !self.playing {
            return Err(GameError::GameNotStarted);
        }
        if self.pending.is_some() {
            return Err(GameError::PendingDiscard);
        }
        let card = match source {
            DrawSource::Pile => {
                self.cycle_piles_if_empty();
                self.draw_pile.draw()?
            }
            DrawSource::Discard => self.discard_pile.draw()?,
        };
        self.pending = Some(PendingDraw { card, source });
        Ok(card)
    }

    // -- Discarding --------------------------------------------------------

    /// Resolves the pending card with a single discard.
    ///
    /// `position == -1` throws the drawn card away. Any other position
    /// swaps the drawn card into the hand and throws away what was there.
    pub fn discard(&mut self, position: i32) -> Result<Discarded, GameError> {
        let pending = self.pending.ok_or(GameError::NoPendingDraw)?;
        let turn = self.current_turn;
        let slot = if position == -1 {
            None
        } else {
            Some(hand_index(&self.players[turn].hand, position)?)
        };

        let card = match slot {
            Some(index) => self.players[turn].hand.replace(index, pending.card),
            None => pending.card,
        };
        self.discard_pile.put_on_top(card);
        self.pending = None;
        let cycled = self.cycle_piles_if_empty();
        self.pass_turn();
        Ok(Discarded { card, cycled })
    }

    /// Resolves the pending card by throwing away two equal hand cards.
    ///
    /// On success the drawn card takes `position1`'s slot and the card at
    /// `position2` leaves the hand. On a value mismatch nothing leaves the
    /// hand, the drawn card is added to it as a penalty and the turn passes
    /// anyway.
    pub fn discard_two(
        &mut self,
        position1: i32,
        position2: i32,
    ) -> Result<DoubleDiscard, GameError> {
        let pending = self.pending.ok_or(GameError::NoPendingDraw)?;
        if position1 == position2 {
            return Err(GameError::SamePosition);
        }
        let turn = self.current_turn;
        let hand = &self.players[turn].hand;
        let first = hand_index(hand, position1)?;
        let second = hand_index(hand, position2)?;
        let cards = [hand.cards()[first], hand.cards()[second]];

        self.pending = None;

        if !same_value(&cards[0], &cards[1]) {
            self.players[turn].hand.push(pending.card);
            if self.discard_pile.is_empty() {
                if let Ok(card) = self.draw_pile.draw() {
                    self.discard_pile.put_on_top(card);
                }
            }
            let cycled = self.cycle_piles_if_empty();
            self.pass_turn();
            return Ok(DoubleDiscard::NonEqualCards {
                cards,
                top_of_discard: self.discard_pile.top(),
                cycled,
            });
        }

        let hand = &mut self.players[turn].hand;
        hand.replace(first, pending.card);
        hand.remove(second);
        self.discard_pile.put_on_top(cards[1]);
        self.discard_pile.put_on_top(cards[0]);
        let cycled = self.cycle_piles_if_empty();
        self.pass_turn();
        Ok(DoubleDiscard::Discarded { cards, cycled })
    }

    // -- Cutting -----------------------------------------------------------

    /// Ends the round for the player whose turn it is and scores it.
    ///
    /// The cutter claims the lowest hand. If anyone else ties or beats it,
    /// the cutter takes their sum plus 20. Otherwise the cutter scores 0,
    /// or -10 for a correctly declared sum, or their sum plus 10 for a
    /// wrong declaration. Everybody else scores their own sum.
    pub fn cut(
        &mut self,
        with_count: bool,
        declared: i32,
    ) -> Result<CutOutcome, GameError> {
        if !self.playing {
            return Err(GameError::GameNotStarted);
        }
        if self.pending.is_some() {
            return Err(GameError::PendingDiscard);
        }

        let cutter = self.current_turn;
        let cutter_sum = self.players[cutter].hand.sum();
        let beaten = self
            .players
            .iter()
            .enumerate()
            .any(|(i, p)| i != cutter && p.hand.sum() <= cutter_sum);
        let cutter_delta = if beaten {
            cutter_sum + 20
        } else if !with_count {
            0
        } else if declared == cutter_sum {
            -10
        } else {
            cutter_sum + 10
        };

        let mut lines = Vec::with_capacity(self.players.len());
        for (i, player) in self.players.iter_mut().enumerate() {
            let delta = if i == cutter {
                cutter_delta
            } else {
                player.hand.sum()
            };
            player.points += delta;
            lines.push(PlayerRound {
                player: player.id.clone(),
                delta,
                points: player.points,
                hand: player.hand.clone(),
            });
        }

        self.round_history.push(Round {
            cutter: self.players[cutter].id.clone(),
            with_count,
            declared,
            players: lines,
        });
        self.total_turns += 1;

        let finished = self.players.iter().any(|p| p.points > WINNING_POINTS);
        if finished {
            self.playing = false;
        }
        Ok(CutOutcome {
            rounds: self.round_history.clone(),
            finished,
        })
    }

    // -- Effects -----------------------------------------------------------

    /// Looks at one of the acting player's own cards.
    pub fn use_effect_peek_own(
        &mut self,
        position: i32,
    ) -> Result<PeekOutcome, GameError> {
        let pending = self.pending_with_effect(CardEffect::PeekOwn)?;
        let hand = &self.players[self.current_turn].hand;
        let card = hand.cards()[hand_index(hand, position)?];
        let discarded = self.resolve_effect(pending);
        Ok(PeekOutcome { card, discarded })
    }

    /// Looks at one card of another seated player.
    pub fn use_effect_peek_other(
        &mut self,
        player: &PlayerId,
        position: i32,
    ) -> Result<PeekOutcome, GameError> {
        let pending = self.pending_with_effect(CardEffect::PeekOther)?;
        let index = self.player_index(player)?;
        let hand = &self.players[index].hand;
        let card = hand.cards()[hand_index(hand, position)?];
        let discarded = self.resolve_effect(pending);
        Ok(PeekOutcome { card, discarded })
    }

    /// Exchanges `players[0]`'s card at `positions[0]` with `players[1]`'s
    /// card at `positions[1]`.
    ///
    /// Naming the same player twice reorders that player's hand.
    pub fn use_effect_swap(
        &mut self,
        players: &[PlayerId],
        positions: &[i32],
    ) -> Result<Discarded, GameError> {
        let pending = self.pending_with_effect(CardEffect::Swap)?;
        let ([first_player, second_player], [first_pos, second_pos]) =
            (players, positions)
        else {
            return Err(GameError::InvalidSwap(format!(
                "need exactly two players and two positions, got {} and {}",
                players.len(),
                positions.len()
            )));
        };

        let a = self.player_index(first_player)?;
        let b = self.player_index(second_player)?;
        let ia = hand_index(&self.players[a].hand, *first_pos)?;
        let ib = hand_index(&self.players[b].hand, *second_pos)?;

        if a == b {
            if ia == ib {
                return Err(GameError::SamePosition);
            }
            self.players[a].hand.swap(ia, ib);
        } else {
            let incoming = self.players[b].hand.cards()[ib];
            let outgoing = self.players[a].hand.replace(ia, incoming);
            self.players[b].hand.replace(ib, outgoing);
        }

        Ok(self.resolve_effect(pending))
    }

    fn pending_with_effect(
        &self,
        expected: CardEffect,
    ) -> Result<PendingDraw, GameError> {
        let pending = self.pending.ok_or(GameError::NoPendingDraw)?;
        let found = self.effects.effect_of(&pending.card);
        if found != expected {
            return Err(GameError::InvalidEffect { expected, found });
        }
        Ok(pending)
    }

    fn resolve_effect(&mut self, pending: PendingDraw) -> Discarded {
        self.discard_pile.put_on_top(pending.card);
        self.pending = None;
        let cycled = self.cycle_piles_if_empty();
        self.pass_turn();
        Discarded {
            card: pending.card,
            cycled,
        }
    }

    // -- Internals ---------------------------------------------------------

    fn pass_turn(&mut self) {
        self.current_turn = (self.current_turn + 1) % self.players.len();
        self.total_turns += 1;
    }

    /// Refills an empty draw pile with everything under the discard top.
    fn cycle_piles_if_empty(&mut self) -> bool {
        if !self.draw_pile.is_empty() || self.discard_pile.len() < 2 {
            return false;
        }
        let Ok(top) = self.discard_pile.draw() else {
            return false;
        };
        let mut recycled = Deck::from(self.discard_pile.take_all());
        recycled.shuffle(&mut self.rng);
        self.draw_pile = recycled;
        self.discard_pile.put_on_top(top);
        debug!(draw_pile = self.draw_pile.len(), "recycled discard pile");
        true
    }

    fn player_index(&self, id: &PlayerId) -> Result<usize, GameError> {
        self.players
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| GameError::UnknownPlayer(id.clone()))
    }

    // -- Read accessors ----------------------------------------------------

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn playing(&self) -> bool {
        self.playing
    }

    /// Seat index of the player whose turn it is.
    pub fn current_turn(&self) -> usize {
        self.current_turn
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_turn)
    }

    pub fn pending(&self) -> Option<PendingDraw> {
        self.pending
    }

    pub fn effect_of(&self, card: &Card) -> CardEffect {
        self.effects.effect_of(card)
    }

    pub fn last_discarded(&self) -> Option<Card> {
        self.discard_pile.top()
    }

    pub fn draw_pile_len(&self) -> usize {
        self.draw_pile.len()
    }

    pub fn discard_pile_len(&self) -> usize {
        self.discard_pile.len()
    }

    /// Size of the composition every round is dealt from.
    pub fn base_deck_len(&self) -> usize {
        self.base_deck.len()
    }

    /// Cards currently in play: both piles, every hand and the pending slot.
    pub fn cards_in_play(&self) -> usize {
        self.draw_pile.len()
            + self.discard_pile.len()
            + self.players.iter().map(|p| p.hand.len()).sum::<usize>()
            + usize::from(self.pending.is_some())
    }

    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    /// Resolved turns since the game started, cuts included.
    pub fn total_turns(&self) -> u32 {
        self.total_turns
    }

    pub fn round_history(&self) -> &[Round] {
        &self.round_history
    }

    /// The player with the fewest points once the game is over.
    pub fn winner(&self) -> Result<&Player, GameError> {
        if self.playing || self.round_history.is_empty() {
            return Err(GameError::GameNotFinished);
        }
        self.players
            .iter()
            .min_by_key(|p| p.points)
            .ok_or(GameError::GameNotFinished)
    }
}

/// Jokers only pair with jokers.
fn same_value(a: &Card, b: &Card) -> bool {
    a.is_joker() == b.is_joker() && a.value == b.value
}

fn hand_index(hand: &Hand, position: i32) -> Result<usize, GameError> {
    usize::try_from(position)
        .ok()
        .filter(|&index| index < hand.len())
        .ok_or(GameError::InvalidPosition(position))
}
