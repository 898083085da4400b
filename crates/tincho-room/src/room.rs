//! Room actor: an isolated Tokio task that owns a table's game state.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. The game state sits behind an `RwLock` so that
//! observers can read it, but only the actor ever takes the write lock.

use std::collections::HashMap;
use std::sync::Arc;

use tincho_game::{PlayerId, Tincho};
use tincho_protocol::{Action, Recipient, RoomId, Update};
use tokio::sync::{RwLock, mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

use crate::actions;
use crate::connection::{Connection, JoinTicket};
use crate::{RoomConfig, RoomError, RoomState};

/// Default capacity of a room's command channel.
const COMMAND_BUFFER: usize = 64;

/// Actions a single player may have queued before their socket waits.
const ACTION_BUFFER: usize = 16;

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    /// Seat a new player or resume an existing seat.
    Join {
        player_id: PlayerId,
        session_token: Option<String>,
        reply: oneshot::Sender<Result<JoinTicket, RoomError>>,
    },

    /// An action relayed from a player's connection.
    Action { player_id: PlayerId, action: Action },
}

// ---------------------------------------------------------------------------
// RoomHandle
// ---------------------------------------------------------------------------

/// Handle to a running room actor.
///
/// Cheap to clone. The [`RoomManager`](crate::RoomManager) holds one per
/// room, and tests can hold their own.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    max_players: usize,
    sender: mpsc::Sender<RoomCommand>,
    game: Arc<RwLock<Tincho>>,
    state: watch::Receiver<RoomState>,
    cancel: CancellationToken,
}

impl RoomHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    /// Seats `player_id`, or resumes their seat if `session_token` matches
    /// the one issued when they first joined.
    ///
    /// Any token is a resume: it fails with [`RoomError::NoSeatToResume`]
    /// when `player_id` has no seat, and never seats a new player.
    pub async fn join(
        &self,
        player_id: PlayerId,
        session_token: Option<String>,
    ) -> Result<JoinTicket, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                player_id,
                session_token,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Closed(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Closed(self.room_id.clone()))?
    }

    /// Asks the room to stop. Sockets get a chance to flush what was
    /// already queued for them.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// True once the room was asked to stop or has stopped.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.state() == RoomState::Closed
    }

    pub fn state(&self) -> RoomState {
        *self.state.borrow()
    }

    /// Resolves once the actor has fully stopped.
    pub async fn closed(&self) {
        let mut state = self.state.clone();
        // An error means the actor dropped its sender, which only happens
        // after it stopped.
        let _ = state.wait_for(|s| *s == RoomState::Closed).await;
    }

    /// Runs `f` against the current game state under a read lock.
    pub async fn read<T>(&self, f: impl FnOnce(&Tincho) -> T) -> T {
        let game = self.game.read().await;
        f(&game)
    }

    /// The winner, once the game has finished.
    pub async fn winner(&self) -> Option<PlayerId> {
        self.read(|game| game.winner().ok().map(|p| p.id.clone())).await
    }

    pub async fn total_turns(&self) -> u32 {
        self.read(Tincho::total_turns).await
    }

    pub async fn total_rounds(&self) -> u32 {
        self.read(Tincho::total_rounds).await
    }

    /// Seated player ids in seating order.
    pub async fn current_players(&self) -> Vec<PlayerId> {
        self.read(|game| game.players().iter().map(|p| p.id.clone()).collect())
            .await
    }

    pub async fn playing(&self) -> bool {
        self.read(Tincho::playing).await
    }
}

// ---------------------------------------------------------------------------
// RoomActor
// ---------------------------------------------------------------------------

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room_id: RoomId,
    config: RoomConfig,
    game: Arc<RwLock<Tincho>>,
    connections: HashMap<PlayerId, Connection>,
    /// Kept so relay tasks can be handed clones.
    sender: mpsc::Sender<RoomCommand>,
    receiver: mpsc::Receiver<RoomCommand>,
    state: watch::Sender<RoomState>,
    cancel: CancellationToken,
}

impl RoomActor {
    /// Runs the actor loop until the room is closed or times out.
    async fn run(mut self) {
        self.transition(RoomState::Started);
        tracing::info!(room_id = %self.room_id, "room actor started");

        let deadline = tokio::time::sleep(self.config.room_timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break,
                _ = &mut deadline => {
                    tracing::info!(room_id = %self.room_id, "room timed out");
                    break;
                }
                Some(cmd) = self.receiver.recv() => match cmd {
                    RoomCommand::Join {
                        player_id,
                        session_token,
                        reply,
                    } => {
                        let result =
                            self.handle_join(player_id, session_token).await;
                        if reply.send(result).is_err() {
                            tracing::debug!(
                                room_id = %self.room_id,
                                "join requester went away before the reply"
                            );
                        }
                    }
                    RoomCommand::Action { player_id, action } => {
                        self.handle_action(player_id, action).await;
                    }
                },
            }
        }

        self.close();
        tracing::info!(room_id = %self.room_id, "room actor stopped");
    }

    // -- Joining -----------------------------------------------------------

    async fn handle_join(
        &mut self,
        player_id: PlayerId,
        session_token: Option<String>,
    ) -> Result<JoinTicket, RoomError> {
        if self.connections.contains_key(&player_id) {
            return self.handle_rejoin(player_id, session_token).await;
        }
        // A token skips the password, so it must match a seat.
        if session_token.is_some() {
            tracing::warn!(
                room_id = %self.room_id,
                %player_id,
                "resume requested for a player with no seat"
            );
            return Err(RoomError::NoSeatToResume(player_id));
        }
        self.handle_new_player(player_id).await
    }

    async fn handle_new_player(
        &mut self,
        player_id: PlayerId,
    ) -> Result<JoinTicket, RoomError> {
        let players_changed = {
            let mut game = self.game.write().await;
            if game.players().len() >= self.config.max_players {
                return Err(RoomError::RoomFull(self.room_id.clone()));
            }
            game.add_player(player_id.clone())?;
            actions::players_changed(&game)
        };

        let (action_tx, action_rx) = mpsc::channel(ACTION_BUFFER);
        let (connection, updates) = Connection::new(
            self.room_id.clone(),
            player_id.clone(),
            action_tx,
            self.config.update_buffer,
            self.cancel.clone(),
        );
        let handle = connection.handle();
        tokio::spawn(relay_actions(
            player_id.clone(),
            action_rx,
            self.sender.clone(),
            self.cancel.clone(),
        ));
        self.connections.insert(player_id.clone(), connection);

        tracing::info!(
            room_id = %self.room_id,
            %player_id,
            count = self.connections.len(),
            "player joined room"
        );
        self.dispatch(vec![(Recipient::All, players_changed)]);

        Ok(JoinTicket {
            connection: handle,
            updates,
            rejoined: false,
        })
    }

    async fn handle_rejoin(
        &mut self,
        player_id: PlayerId,
        session_token: Option<String>,
    ) -> Result<JoinTicket, RoomError> {
        let snapshot = {
            let game = self.game.read().await;
            actions::rejoin_snapshot(&game, &player_id)
        };
        let Some(connection) = self.connections.get_mut(&player_id) else {
            return Err(RoomError::PlayerAlreadyInRoom(player_id));
        };
        if session_token.as_deref() != Some(connection.session_token()) {
            tracing::warn!(
                room_id = %self.room_id,
                %player_id,
                "rejoin with a wrong session token"
            );
            return Err(RoomError::PlayerAlreadyInRoom(player_id));
        }

        let updates = connection.reattach();
        connection.send_update_or_drop(snapshot);
        tracing::info!(room_id = %self.room_id, %player_id, "player rejoined room");

        Ok(JoinTicket {
            connection: connection.handle(),
            updates,
            rejoined: true,
        })
    }

    // -- Actions -----------------------------------------------------------

    async fn handle_action(&mut self, player_id: PlayerId, action: Action) {
        let kind = action.kind();
        let result = {
            let mut game = self.game.write().await;
            actions::apply(&mut game, &player_id, action)
        };

        match result {
            Ok(outcome) => {
                tracing::debug!(
                    room_id = %self.room_id,
                    %player_id,
                    action = kind,
                    updates = outcome.updates.len(),
                    "action applied"
                );
                self.dispatch(outcome.updates);
                if outcome.finished {
                    tracing::info!(room_id = %self.room_id, "game over");
                    self.close();
                }
            }
            Err(err) => {
                tracing::debug!(
                    room_id = %self.room_id,
                    %player_id,
                    action = kind,
                    error = %err,
                    "action rejected"
                );
                self.dispatch(vec![(
                    Recipient::Player(player_id),
                    Update::error(err.to_string()),
                )]);
            }
        }
    }

    /// Delivers updates to their recipients, in list order.
    fn dispatch(&self, updates: Vec<(Recipient, Update)>) {
        for (recipient, update) in updates {
            for (player_id, connection) in &self.connections {
                if recipient.includes(player_id) {
                    connection.send_update_or_drop(update.clone());
                }
            }
        }
    }

    // -- Lifecycle ---------------------------------------------------------

    fn transition(&self, target: RoomState) {
        let current = *self.state.borrow();
        if current.can_transition_to(target) {
            self.state.send_replace(target);
            tracing::debug!(
                room_id = %self.room_id,
                from = %current,
                to = %target,
                "room state changed"
            );
        }
    }

    fn close(&self) {
        self.cancel.cancel();
        self.transition(RoomState::Closed);
    }
}

/// Forwards a player's actions into the room until the room closes.
async fn relay_actions(
    player_id: PlayerId,
    mut actions: mpsc::Receiver<Action>,
    room: mpsc::Sender<RoomCommand>,
    cancel: CancellationToken,
) {
    loop {
        let action = tokio::select! {
            _ = cancel.cancelled() => break,
            action = actions.recv() => match action {
                Some(action) => action,
                None => break,
            },
        };
        let forward = room.send(RoomCommand::Action {
            player_id: player_id.clone(),
            action,
        });
        tokio::select! {
            _ = cancel.cancelled() => break,
            sent = forward => {
                if sent.is_err() {
                    break;
                }
            }
        }
    }
    tracing::debug!(%player_id, "action relay stopped");
}

/// Spawns a room actor as a Tokio task and returns a handle to it.
///
/// The room closes after `config.room_timeout` even if nobody closes it.
pub fn spawn_room(room_id: RoomId, config: RoomConfig, game: Tincho) -> RoomHandle {
    let (sender, receiver) = mpsc::channel(COMMAND_BUFFER);
    let (state_tx, state_rx) = watch::channel(RoomState::Created);
    let game = Arc::new(RwLock::new(game));
    let cancel = CancellationToken::new();

    let handle = RoomHandle {
        room_id: room_id.clone(),
        max_players: config.max_players,
        sender: sender.clone(),
        game: Arc::clone(&game),
        state: state_rx,
        cancel: cancel.clone(),
    };

    let actor = RoomActor {
        room_id,
        config,
        game,
        connections: HashMap::new(),
        sender,
        receiver,
        state: state_tx,
        cancel,
    };
    tokio::spawn(actor.run());

    handle
}
