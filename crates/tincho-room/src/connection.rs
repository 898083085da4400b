//! Per-player channel pair between the network and a room.
//!
//! ```text
//! socket ──▶ ConnectionHandle::queue_action ──▶ relay task ──▶ room actor
//! socket ◀── JoinTicket::updates ◀── Connection::send_update_or_drop ◀── room actor
//! ```
//!
//! A [`Connection`] is created the first time a player id joins a room and
//! lives as long as the room. Reconnecting attaches a fresh update queue to
//! the same connection instead of creating a new one.

use rand::Rng;
use rand::distr::Alphanumeric;
use tincho_game::PlayerId;
use tincho_protocol::{Action, RoomId, Update};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use crate::RoomError;

const SESSION_TOKEN_LEN: usize = 20;

/// Generates an opaque 20-character alphanumeric session token.
///
/// ```
/// let token = tincho_room::generate_session_token();
/// assert_eq!(token.len(), 20);
/// assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn generate_session_token() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(SESSION_TOKEN_LEN)
        .map(char::from)
        .collect()
}

// ---------------------------------------------------------------------------
// ConnectionHandle: the network side
// ---------------------------------------------------------------------------

/// What the network layer holds for a seated player.
///
/// Cheap to clone. Every socket a player attaches over time gets a clone
/// of the same handle.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    room_id: RoomId,
    player_id: PlayerId,
    session_token: String,
    actions: mpsc::Sender<Action>,
    room_closed: CancellationToken,
}

impl ConnectionHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    /// The token that proves ownership of this seat on reconnect.
    pub fn session_token(&self) -> &str {
        &self.session_token
    }

    /// Hands a decoded action to the room.
    ///
    /// Waits while the inbound queue is full; fails once the room closed.
    pub async fn queue_action(&self, action: Action) -> Result<(), RoomError> {
        tokio::select! {
            _ = self.room_closed.cancelled() => {
                Err(RoomError::Closed(self.room_id.clone()))
            }
            sent = self.actions.send(action) => {
                sent.map_err(|_| RoomError::Closed(self.room_id.clone()))
            }
        }
    }

    /// Cancelled when the room closes. Network tasks select on this.
    pub fn room_closed(&self) -> &CancellationToken {
        &self.room_closed
    }
}

// ---------------------------------------------------------------------------
// JoinTicket
// ---------------------------------------------------------------------------

/// Returned by a successful join or rejoin.
#[derive(Debug)]
pub struct JoinTicket {
    pub connection: ConnectionHandle,
    /// Updates for this player, starting right after the join. Only the
    /// most recent ticket's queue is fed; older ones are closed.
    pub updates: mpsc::Receiver<Update>,
    /// True when an existing seat was resumed.
    pub rejoined: bool,
}

// ---------------------------------------------------------------------------
// Connection: the room side
// ---------------------------------------------------------------------------

/// The room's end of a player's connection. Owned by the room actor.
pub(crate) struct Connection {
    handle: ConnectionHandle,
    updates: mpsc::Sender<Update>,
    update_buffer: usize,
}

impl Connection {
    /// Creates the connection and returns the receiver of its first update
    /// queue.
    pub(crate) fn new(
        room_id: RoomId,
        player_id: PlayerId,
        actions: mpsc::Sender<Action>,
        update_buffer: usize,
        room_closed: CancellationToken,
    ) -> (Self, mpsc::Receiver<Update>) {
        let (updates, receiver) = mpsc::channel(update_buffer);
        let handle = ConnectionHandle {
            room_id,
            player_id,
            session_token: generate_session_token(),
            actions,
            room_closed,
        };
        let connection = Self {
            handle,
            updates,
            update_buffer,
        };
        (connection, receiver)
    }

    pub(crate) fn handle(&self) -> ConnectionHandle {
        self.handle.clone()
    }

    pub(crate) fn session_token(&self) -> &str {
        &self.handle.session_token
    }

    /// Queues an update without waiting. Returns `false` if it was dropped.
    ///
    /// A full queue means the player's socket is stalled or gone. The room
    /// never waits for it; the player resyncs with a snapshot on rejoin.
    pub(crate) fn send_update_or_drop(&self, update: Update) -> bool {
        match self.updates.try_send(update) {
            Ok(()) => true,
            Err(TrySendError::Full(update)) => {
                tracing::warn!(
                    room_id = %self.handle.room_id,
                    player_id = %self.handle.player_id,
                    update = update.kind(),
                    "update queue full, dropping update"
                );
                false
            }
            Err(TrySendError::Closed(update)) => {
                tracing::debug!(
                    room_id = %self.handle.room_id,
                    player_id = %self.handle.player_id,
                    update = update.kind(),
                    "no socket attached, dropping update"
                );
                false
            }
        }
    }

    /// Replaces the update queue with a fresh empty one.
    ///
    /// Whatever was still buffered for the previous socket is discarded,
    /// and that socket's receiver sees its queue close.
    pub(crate) fn reattach(&mut self) -> mpsc::Receiver<Update> {
        let (updates, receiver) = mpsc::channel(self.update_buffer);
        self.updates = updates;
        receiver
    }
}
