//! Per-connection handler: handshake, then action/update relaying.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive one `Request` (5 s deadline)
//!   2. Answer it with a `Reply`; only `joined` keeps the socket open
//!   3. Spawn the writer: room updates → socket, plus keepalive pings
//!   4. Read loop: socket → `Action::decode` → room

use std::sync::Arc;
use std::time::Duration;

use tincho_game::Deck;
use tincho_protocol::{
    Action, Codec, CreateRoom, JoinRoom, ProtocolError, Reply, Request,
    Update,
};
use tincho_room::{ConnectionHandle, JoinTicket};
use tincho_transport::{PlayerSocket, WebSocketPlayer};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::TinchoError;
use crate::server::ServerState;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
const PING_INTERVAL: Duration = Duration::from_secs(10);

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    socket: WebSocketPlayer,
    state: Arc<ServerState<C>>,
) -> Result<(), TinchoError> {
    let peer = socket.peer_addr();
    tracing::debug!(%peer, "handling new connection");

    let request = receive_request(&socket, &state.codec).await?;
    match request {
        Request::CreateRoom(create) => {
            let reply = create_room(&state, create).await;
            send_reply(&socket, &state.codec, &reply).await?;
            socket.close().await?;
        }
        Request::ListRooms => {
            // The registry lock is released before any room is read.
            let listing = state.rooms.lock().await.listing();
            let rooms = listing.entries().await;
            send_reply(&socket, &state.codec, &Reply::Rooms { rooms }).await?;
            socket.close().await?;
        }
        Request::JoinRoom(join) => {
            let Some(ticket) = join_room(&socket, &state, join).await? else {
                socket.close().await?;
                return Ok(());
            };
            relay(Arc::new(socket), state, ticket).await?;
        }
    }
    Ok(())
}

/// Waits for the first frame and decodes it as a [`Request`].
async fn receive_request<C: Codec>(
    socket: &WebSocketPlayer,
    codec: &C,
) -> Result<Request, TinchoError> {
    let data = match tokio::time::timeout(HANDSHAKE_TIMEOUT, socket.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage(
                "connection closed before handshake".into(),
            )
            .into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(ProtocolError::InvalidMessage(
                "handshake timed out".into(),
            )
            .into());
        }
    };

    match codec.decode(&data) {
        Ok(request) => Ok(request),
        Err(e) => {
            let reply = Reply::Error {
                message: e.to_string(),
            };
            send_reply(socket, codec, &reply).await?;
            socket.close().await?;
            Err(e.into())
        }
    }
}

async fn create_room<C: Codec>(
    state: &ServerState<C>,
    create: CreateRoom,
) -> Reply {
    let created = state.rooms.lock().await.create_room(
        Deck::new(),
        create.max_players,
        create.password,
    );
    match created {
        Ok(room) => Reply::RoomCreated { room },
        Err(e) => {
            tracing::info!(error = %e, "room creation refused");
            Reply::Error {
                message: e.to_string(),
            }
        }
    }
}

/// Seats the player and sends the `joined` reply. Returns `None` after
/// replying with an error.
async fn join_room<C: Codec>(
    socket: &WebSocketPlayer,
    state: &ServerState<C>,
    join: JoinRoom,
) -> Result<Option<JoinTicket>, TinchoError> {
    let JoinRoom {
        room,
        player,
        password,
        session_token,
    } = join;

    // Lock only for the lookup; the room join itself waits on the actor.
    let admitted = state.rooms.lock().await.admit(
        &room,
        password.as_deref(),
        session_token.is_some(),
    );
    let joined = match admitted {
        Ok(handle) => handle.join(player.clone(), session_token).await,
        Err(e) => Err(e),
    };

    let ticket = match joined {
        Ok(ticket) => ticket,
        Err(e) => {
            tracing::info!(room_id = %room, player_id = %player, error = %e, "join refused");
            let reply = Reply::Error {
                message: e.to_string(),
            };
            send_reply(socket, &state.codec, &reply).await?;
            return Ok(None);
        }
    };

    let reply = Reply::Joined {
        room,
        player,
        session_token: ticket.connection.session_token().to_owned(),
        rejoined: ticket.rejoined,
    };
    send_reply(socket, &state.codec, &reply).await?;
    Ok(Some(ticket))
}

/// Runs both directions for a seated player until the socket or the room
/// goes away.
async fn relay<C: Codec>(
    socket: Arc<WebSocketPlayer>,
    state: Arc<ServerState<C>>,
    ticket: JoinTicket,
) -> Result<(), TinchoError> {
    let JoinTicket {
        connection,
        updates,
        ..
    } = ticket;
    let socket_closed = CancellationToken::new();

    let writer = tokio::spawn(write_updates(
        Arc::clone(&socket),
        Arc::clone(&state),
        updates,
        connection.room_closed().clone(),
        socket_closed.clone(),
    ));

    let result = read_actions(&socket, &connection, &state.codec).await;

    socket_closed.cancel();
    if let Err(e) = writer.await {
        tracing::warn!(error = %e, "update writer panicked");
    }
    tracing::info!(
        room_id = %connection.room_id(),
        player_id = %connection.player_id(),
        "player socket closed"
    );
    result
}

/// Socket → room. Returns when the client leaves or the room closes.
async fn read_actions<C: Codec>(
    socket: &WebSocketPlayer,
    connection: &ConnectionHandle,
    codec: &C,
) -> Result<(), TinchoError> {
    let player_id = connection.player_id();
    loop {
        let data = tokio::select! {
            _ = connection.room_closed().cancelled() => return Ok(()),
            data = socket.recv() => data?,
        };
        let Some(data) = data else {
            tracing::debug!(%player_id, "client closed the socket");
            return Ok(());
        };

        match Action::decode(&data) {
            Ok(action) => {
                if let Err(e) = connection.queue_action(action).await {
                    tracing::debug!(%player_id, error = %e, "action not queued");
                    return Ok(());
                }
            }
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "undecodable action");
                send_update(socket, codec, &Update::error(e.to_string())).await?;
            }
        }
    }
}

/// Room → socket, with a keepalive ping. When the room closes, whatever is
/// still queued is flushed before the socket is closed.
async fn write_updates<C: Codec>(
    socket: Arc<WebSocketPlayer>,
    state: Arc<ServerState<C>>,
    mut updates: mpsc::Receiver<Update>,
    room_closed: CancellationToken,
    socket_closed: CancellationToken,
) {
    let mut ping = tokio::time::interval(PING_INTERVAL);
    // The first tick completes immediately.
    ping.tick().await;

    loop {
        tokio::select! {
            biased;

            _ = room_closed.cancelled() => {
                while let Ok(update) = updates.try_recv() {
                    if send_update(&socket, &state.codec, &update).await.is_err() {
                        return;
                    }
                }
                if let Err(e) = socket.close().await {
                    tracing::debug!(error = %e, "close after room end failed");
                }
                return;
            }
            _ = socket_closed.cancelled() => return,
            update = updates.recv() => match update {
                Some(update) => {
                    if let Err(e) = send_update(&socket, &state.codec, &update).await {
                        tracing::debug!(error = %e, "update send failed");
                        return;
                    }
                }
                // The seat was resumed on another socket.
                None => {
                    if let Err(e) = socket.close().await {
                        tracing::debug!(error = %e, "close after resume failed");
                    }
                    return;
                }
            },
            _ = ping.tick() => {
                if let Err(e) = socket.ping().await {
                    tracing::debug!(error = %e, "ping failed");
                    return;
                }
            }
        }
    }
}

async fn send_update<C: Codec>(
    socket: &WebSocketPlayer,
    codec: &C,
    update: &Update,
) -> Result<(), TinchoError> {
    let bytes = codec.encode(update)?;
    socket.send(&bytes).await?;
    Ok(())
}

async fn send_reply<C: Codec>(
    socket: &WebSocketPlayer,
    codec: &C,
    reply: &Reply,
) -> Result<(), TinchoError> {
    let bytes = codec.encode(reply)?;
    socket.send(&bytes).await?;
    Ok(())
}
