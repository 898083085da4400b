//! Turns a player's action into game state changes plus the updates that
//! announce them.
//!
//! Everything here is synchronous and works on a borrowed [`Tincho`]; the
//! room actor holds the write lock around each call.

use tincho_game::{Card, Discarded, DoubleDiscard, DrawSource, PlayerId, Tincho};
use tincho_protocol::{
    Action, CutUpdate, DiscardUpdate, DrawUpdate, EffectPeekUpdate,
    EffectSwapUpdate, EndGameUpdate, FailedDoubleDiscardUpdate,
    GameConfigUpdate, PlayerHand, PlayerPeekedUpdate, PlayerView,
    PlayersChangedUpdate, Recipient, RejoinUpdate, RoundStartUpdate,
    TurnUpdate, Update,
};

use crate::RoomError;

/// What an accepted action produced.
#[derive(Debug, Default)]
pub(crate) struct Outcome {
    pub updates: Vec<(Recipient, Update)>,
    /// The game is over and the room should close.
    pub finished: bool,
}

impl Outcome {
    fn push(&mut self, recipient: Recipient, update: Update) {
        self.updates.push((recipient, update));
    }

    /// Shows `private` to `player` and `public` to everyone else.
    fn split(&mut self, player: &PlayerId, private: Update, public: Update) {
        self.push(Recipient::Player(player.clone()), private);
        self.push(Recipient::AllExcept(player.clone()), public);
    }

    fn turn(&mut self, game: &Tincho) {
        if let Some(current) = game.current_player() {
            self.push(
                Recipient::All,
                Update::Turn(TurnUpdate {
                    player: current.id.clone(),
                }),
            );
        }
    }
}

/// Applies `action` on behalf of `player`.
///
/// On `Err` the game state is unchanged and only the actor should hear
/// about it.
pub(crate) fn apply(
    game: &mut Tincho,
    player: &PlayerId,
    action: Action,
) -> Result<Outcome, RoomError> {
    if !action.ignores_turn() && !is_turn_of(game, player) {
        return Err(RoomError::NotYourTurn);
    }

    match action {
        Action::Start => start(game, player),
        Action::FirstPeek => first_peek(game, player),
        Action::Draw(data) => draw(game, player, data.source),
        Action::Discard(data) => match data.position2 {
            Some(position2) => discard_two(game, player, data.position, position2),
            None => discard(game, player, data.position),
        },
        Action::Cut(data) => cut(game, player, data.with_count, data.declared),
        Action::EffectPeekOwn(data) => peek_own(game, player, data.position),
        Action::EffectPeekOther(data) => {
            peek_other(game, player, &data.player, data.position)
        }
        Action::EffectSwapCard(data) => {
            swap(game, player, &data.players, &data.positions)
        }
    }
}

fn is_turn_of(game: &Tincho, player: &PlayerId) -> bool {
    game.playing() && game.current_player().is_some_and(|p| &p.id == player)
}

fn start(game: &mut Tincho, player: &PlayerId) -> Result<Outcome, RoomError> {
    let leader = game.players().first().map(|p| &p.id);
    if leader != Some(player) {
        return Err(RoomError::NotRoomLeader);
    }
    let top_discard = game.start_game()?;

    let mut outcome = Outcome::default();
    outcome.push(
        Recipient::All,
        Update::GameConfig(GameConfigUpdate {
            cards_in_deck: game.base_deck_len(),
        }),
    );
    outcome.push(
        Recipient::All,
        Update::GameStart(round_start(game, top_discard)),
    );
    Ok(outcome)
}

fn first_peek(
    game: &mut Tincho,
    player: &PlayerId,
) -> Result<Outcome, RoomError> {
    let cards = game.first_peek(player)?;

    let mut outcome = Outcome::default();
    outcome.split(
        player,
        Update::PlayerPeeked(PlayerPeekedUpdate {
            player: player.clone(),
            cards: Some(cards),
        }),
        Update::PlayerPeeked(PlayerPeekedUpdate {
            player: player.clone(),
            cards: None,
        }),
    );
    if game.all_players_first_peeked() {
        outcome.turn(game);
    }
    Ok(outcome)
}

fn draw(
    game: &mut Tincho,
    player: &PlayerId,
    source: DrawSource,
) -> Result<Outcome, RoomError> {
    let card = game.draw(source)?;
    let effect = game.effect_of(&card);

    let mut outcome = Outcome::default();
    outcome.split(
        player,
        Update::Draw(DrawUpdate {
            player: player.clone(),
            source,
            card: Some(card),
            effect: Some(effect),
        }),
        Update::Draw(DrawUpdate {
            player: player.clone(),
            source,
            card: None,
            effect: None,
        }),
    );
    Ok(outcome)
}

fn discard(
    game: &mut Tincho,
    player: &PlayerId,
    position: i32,
) -> Result<Outcome, RoomError> {
    let discarded = game.discard(position)?;

    let mut outcome = Outcome::default();
    outcome.push(Recipient::All, discard_update(player, position, discarded));
    outcome.turn(game);
    Ok(outcome)
}

fn discard_two(
    game: &mut Tincho,
    player: &PlayerId,
    position1: i32,
    position2: i32,
) -> Result<Outcome, RoomError> {
    let update = match game.discard_two(position1, position2)? {
        DoubleDiscard::Discarded { cards, cycled } => {
            Update::Discard(DiscardUpdate {
                player: player.clone(),
                card_positions: vec![position1, position2],
                cards: cards.to_vec(),
                cycled_piles: cycled,
            })
        }
        DoubleDiscard::NonEqualCards {
            cards,
            top_of_discard,
            cycled,
        } => Update::FailedDoubleDiscard(FailedDoubleDiscardUpdate {
            player: player.clone(),
            card_positions: vec![position1, position2],
            cards: cards.to_vec(),
            top_of_discard,
            cycled_piles: cycled,
        }),
    };

    let mut outcome = Outcome::default();
    outcome.push(Recipient::All, update);
    outcome.turn(game);
    Ok(outcome)
}

fn cut(
    game: &mut Tincho,
    player: &PlayerId,
    with_count: bool,
    declared: i32,
) -> Result<Outcome, RoomError> {
    let result = game.cut(with_count, declared)?;

    let mut outcome = Outcome::default();
    outcome.push(
        Recipient::All,
        Update::Cut(CutUpdate {
            player: player.clone(),
            with_count,
            declared,
            players: PlayerView::all(game.players()),
            hands: game.players().iter().map(PlayerHand::from).collect(),
        }),
    );

    if result.finished {
        outcome.push(
            Recipient::All,
            Update::EndGame(EndGameUpdate {
                rounds: result.rounds,
            }),
        );
        outcome.finished = true;
        return Ok(outcome);
    }

    // The cut itself stands even if the next deal fails; the cutter gets
    // the error after everyone has seen the scores.
    match game.start_next_round() {
        Ok(top_discard) => outcome.push(
            Recipient::All,
            Update::StartNextRound(round_start(game, top_discard)),
        ),
        Err(err) => outcome.push(
            Recipient::Player(player.clone()),
            Update::error(err.to_string()),
        ),
    }
    Ok(outcome)
}

fn peek_own(
    game: &mut Tincho,
    player: &PlayerId,
    position: i32,
) -> Result<Outcome, RoomError> {
    let peeked = game.use_effect_peek_own(position)?;
    Ok(peek_outcome(game, player, player, position, peeked.card, peeked.discarded))
}

fn peek_other(
    game: &mut Tincho,
    player: &PlayerId,
    target: &PlayerId,
    position: i32,
) -> Result<Outcome, RoomError> {
    let peeked = game.use_effect_peek_other(target, position)?;
    Ok(peek_outcome(game, player, target, position, peeked.card, peeked.discarded))
}

fn peek_outcome(
    game: &Tincho,
    player: &PlayerId,
    target: &PlayerId,
    position: i32,
    card: Card,
    discarded: Discarded,
) -> Outcome {
    let peek = |card| {
        Update::EffectPeek(EffectPeekUpdate {
            player: player.clone(),
            target: target.clone(),
            card_position: position,
            card,
        })
    };

    let mut outcome = Outcome::default();
    outcome.split(player, peek(Some(card)), peek(None));
    outcome.push(Recipient::All, discard_update(player, -1, discarded));
    outcome.turn(game);
    outcome
}

fn swap(
    game: &mut Tincho,
    player: &PlayerId,
    players: &[PlayerId],
    positions: &[i32],
) -> Result<Outcome, RoomError> {
    let discarded = game.use_effect_swap(players, positions)?;

    let mut outcome = Outcome::default();
    outcome.push(
        Recipient::All,
        Update::EffectSwap(EffectSwapUpdate {
            player: player.clone(),
            card_positions: positions.to_vec(),
            players: players.to_vec(),
        }),
    );
    outcome.push(Recipient::All, discard_update(player, -1, discarded));
    outcome.turn(game);
    Ok(outcome)
}

fn discard_update(player: &PlayerId, position: i32, discarded: Discarded) -> Update {
    Update::Discard(DiscardUpdate {
        player: player.clone(),
        card_positions: vec![position],
        cards: vec![discarded.card],
        cycled_piles: discarded.cycled,
    })
}

fn round_start(game: &Tincho, top_discard: Card) -> RoundStartUpdate {
    RoundStartUpdate {
        players: PlayerView::all(game.players()),
        top_discard,
    }
}

/// The seating list broadcast whenever somebody joins.
pub(crate) fn players_changed(game: &Tincho) -> Update {
    Update::PlayersChanged(PlayersChangedUpdate {
        players: PlayerView::all(game.players()),
    })
}

/// Everything a reconnecting player needs to redraw the table.
///
/// The pending card is only revealed to the player holding it.
pub(crate) fn rejoin_snapshot(game: &Tincho, player: &PlayerId) -> Update {
    let current = game.current_player().map(|p| p.id.clone());
    let pending = game.pending();
    let own_pending = pending.filter(|_| current.as_ref() == Some(player));

    Update::RejoinState(RejoinUpdate {
        players: PlayerView::all(game.players()),
        playing: game.playing(),
        total_rounds: game.total_rounds(),
        current_turn: current,
        card_in_hand: pending.is_some(),
        card_in_hand_value: own_pending.map(|p| p.card),
        card_in_hand_source: pending.map(|p| p.source),
        last_discarded: game.last_discarded(),
        cards_in_deck: game.base_deck_len(),
        cards_in_draw_pile: game.draw_pile_len(),
        cards_in_discard_pile: game.discard_pile_len(),
    })
}
