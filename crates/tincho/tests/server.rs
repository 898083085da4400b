//! Integration tests for the Tincho server, handler, and full connection flow.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tincho::prelude::*;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    let server = TinchoServerBuilder::new()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send_json(ws: &mut ClientWs, value: serde_json::Value) {
    ws.send(Message::text(value.to_string()))
        .await
        .expect("send should succeed");
}

/// Next text frame, decoded. Pings and other control frames are skipped.
async fn next_json<T: serde::de::DeserializeOwned>(ws: &mut ClientWs) -> T {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .expect("frame error");
        if msg.is_text() {
            return serde_json::from_slice(&msg.into_data()).expect("decode");
        }
    }
}

/// Skips updates until one of the given kind arrives.
async fn expect_update(ws: &mut ClientWs, kind: &str) -> Update {
    loop {
        let update: Update = next_json(ws).await;
        if update.kind() == kind {
            return update;
        }
    }
}

/// One-shot request on a fresh socket.
async fn request(addr: &str, request: serde_json::Value) -> Reply {
    let mut ws = connect(addr).await;
    send_json(&mut ws, request).await;
    next_json(&mut ws).await
}

async fn create_room(addr: &str, data: serde_json::Value) -> RoomId {
    let reply = request(
        addr,
        serde_json::json!({ "type": "create_room", "data": data }),
    )
    .await;
    match reply {
        Reply::RoomCreated { room } => room,
        other => panic!("expected room_created, got {other:?}"),
    }
}

/// Joins and returns the open socket plus the session token.
async fn join(
    addr: &str,
    room: &RoomId,
    player: &str,
    token: Option<&str>,
) -> (ClientWs, String) {
    let mut ws = connect(addr).await;
    send_json(
        &mut ws,
        serde_json::json!({
            "type": "join_room",
            "data": { "room": room, "player": player, "sessionToken": token },
        }),
    )
    .await;
    match next_json(&mut ws).await {
        Reply::Joined {
            player: joined,
            session_token,
            ..
        } => {
            assert_eq!(joined.as_str(), player);
            (ws, session_token)
        }
        other => panic!("expected joined, got {other:?}"),
    }
}

// =========================================================================
// Handshake
// =========================================================================

#[tokio::test]
async fn test_create_room_then_list() {
    let addr = start_server().await;
    let room = create_room(&addr, serde_json::json!({ "maxPlayers": 3 })).await;
    assert_eq!(room.as_str().len(), 4);

    let (_ana, _) = join(&addr, &room, "ana", None).await;

    match request(&addr, serde_json::json!({ "type": "list_rooms" })).await {
        Reply::Rooms { rooms } => {
            assert_eq!(rooms.len(), 1);
            assert_eq!(rooms[0].room, room);
            assert_eq!(rooms[0].max_players, 3);
            assert_eq!(rooms[0].players, vec![PlayerId::from("ana")]);
        }
        other => panic!("expected rooms, got {other:?}"),
    }
}

#[tokio::test]
async fn test_create_room_with_bad_size_replies_error() {
    let addr = start_server().await;
    let reply = request(
        &addr,
        serde_json::json!({ "type": "create_room", "data": { "maxPlayers": 11 } }),
    )
    .await;
    assert!(matches!(reply, Reply::Error { .. }));
}

#[tokio::test]
async fn test_join_unknown_room_replies_error() {
    let addr = start_server().await;
    let reply = request(
        &addr,
        serde_json::json!({
            "type": "join_room",
            "data": { "room": "NOPE", "player": "ana" },
        }),
    )
    .await;
    assert_eq!(
        reply,
        Reply::Error {
            message: "room NOPE not found".into()
        }
    );
}

#[tokio::test]
async fn test_join_with_wrong_password_replies_error() {
    let addr = start_server().await;
    let room =
        create_room(&addr, serde_json::json!({ "password": "hunter2" })).await;

    let reply = request(
        &addr,
        serde_json::json!({
            "type": "join_room",
            "data": { "room": room, "player": "ana", "password": "guess" },
        }),
    )
    .await;
    assert!(matches!(reply, Reply::Error { message } if message.contains("password")));
}

#[tokio::test]
async fn test_garbage_first_frame_replies_error() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    ws.send(Message::text("not json")).await.unwrap();

    let reply: Reply = next_json(&mut ws).await;
    assert!(matches!(reply, Reply::Error { .. }));
}

// =========================================================================
// Playing
// =========================================================================

#[tokio::test]
async fn test_two_clients_reach_first_turn() {
    let addr = start_server().await;
    let room = create_room(&addr, serde_json::json!({})).await;
    let (mut ana, ana_token) = join(&addr, &room, "ana", None).await;
    let (mut bob, bob_token) = join(&addr, &room, "bob", None).await;
    assert_eq!(ana_token.len(), 20);
    assert_ne!(ana_token, bob_token);

    send_json(&mut ana, serde_json::json!({ "type": "start" })).await;
    for ws in [&mut ana, &mut bob] {
        match expect_update(ws, "game_config").await {
            Update::GameConfig(config) => assert_eq!(config.cards_in_deck, 50),
            other => panic!("unexpected {other:?}"),
        }
        expect_update(ws, "game_start").await;
    }

    send_json(&mut ana, serde_json::json!({ "type": "first_peek" })).await;
    send_json(&mut bob, serde_json::json!({ "type": "first_peek" })).await;

    match expect_update(&mut bob, "player_peeked").await {
        Update::PlayerPeeked(peek) if peek.player.as_str() == "bob" => {
            assert!(peek.cards.is_some());
        }
        Update::PlayerPeeked(peek) => assert!(peek.cards.is_none()),
        other => panic!("unexpected {other:?}"),
    }
    match expect_update(&mut ana, "turn").await {
        Update::Turn(turn) => assert_eq!(turn.player.as_str(), "ana"),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_bad_action_gets_error_update() {
    let addr = start_server().await;
    let room = create_room(&addr, serde_json::json!({})).await;
    let (mut ana, _) = join(&addr, &room, "ana", None).await;
    expect_update(&mut ana, "players_changed").await;

    send_json(&mut ana, serde_json::json!({ "type": "dance", "data": {} })).await;
    match expect_update(&mut ana, "error").await {
        Update::Error(error) => assert!(error.message.contains("dance")),
        other => panic!("unexpected {other:?}"),
    }

    // The socket survives a bad frame.
    send_json(&mut ana, serde_json::json!({ "type": "draw", "data": { "source": "pile" } }))
        .await;
    assert_eq!(
        expect_update(&mut ana, "error").await,
        Update::error("not your turn")
    );
}

#[tokio::test]
async fn test_reconnect_with_session_token_gets_snapshot() {
    let addr = start_server().await;
    let room = create_room(&addr, serde_json::json!({ "password": "pw" })).await;

    let mut ws = connect(&addr).await;
    send_json(
        &mut ws,
        serde_json::json!({
            "type": "join_room",
            "data": { "room": room, "player": "ana", "password": "pw" },
        }),
    )
    .await;
    let token = match next_json(&mut ws).await {
        Reply::Joined { session_token, .. } => session_token,
        other => panic!("expected joined, got {other:?}"),
    };
    ws.close(None).await.unwrap();

    // No password needed when resuming with the token.
    let mut ws = connect(&addr).await;
    send_json(
        &mut ws,
        serde_json::json!({
            "type": "join_room",
            "data": { "room": room, "player": "ana", "sessionToken": token },
        }),
    )
    .await;
    match next_json(&mut ws).await {
        Reply::Joined { rejoined, .. } => assert!(rejoined),
        other => panic!("expected joined, got {other:?}"),
    }
    match next_json::<Update>(&mut ws).await {
        Update::RejoinState(snapshot) => {
            assert!(!snapshot.playing);
            assert_eq!(snapshot.players.len(), 1);
            assert_eq!(snapshot.cards_in_deck, 50);
        }
        other => panic!("expected rejoin_state, got {other:?}"),
    }
}

#[tokio::test]
async fn test_resume_elsewhere_closes_old_socket() {
    let addr = start_server().await;
    let room = create_room(&addr, serde_json::json!({})).await;
    let (mut old, token) = join(&addr, &room, "ana", None).await;
    expect_update(&mut old, "players_changed").await;

    let (mut new, _) = join(&addr, &room, "ana", Some(&token)).await;
    expect_update(&mut new, "rejoin_state").await;

    let closed = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match old.next().await {
                None | Some(Err(_)) => break,
                Some(Ok(msg)) if msg.is_close() => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "the replaced socket should be closed");
}

#[tokio::test]
async fn test_made_up_token_cannot_skip_password() {
    let addr = start_server().await;
    let room =
        create_room(&addr, serde_json::json!({ "password": "hunter2" })).await;

    let reply = request(
        &addr,
        serde_json::json!({
            "type": "join_room",
            "data": { "room": room, "player": "eve", "sessionToken": "made-up" },
        }),
    )
    .await;
    assert_eq!(
        reply,
        Reply::Error {
            message: "player eve has no seat to resume".into()
        }
    );

    match request(&addr, serde_json::json!({ "type": "list_rooms" })).await {
        Reply::Rooms { rooms } => assert!(rooms[0].players.is_empty()),
        other => panic!("expected rooms, got {other:?}"),
    }
}

#[tokio::test]
async fn test_same_name_without_token_is_refused() {
    let addr = start_server().await;
    let room = create_room(&addr, serde_json::json!({})).await;
    let (_ana, _) = join(&addr, &room, "ana", None).await;

    let reply = request(
        &addr,
        serde_json::json!({
            "type": "join_room",
            "data": { "room": room, "player": "ana" },
        }),
    )
    .await;
    assert_eq!(
        reply,
        Reply::Error {
            message: "player ana already exists in room".into()
        }
    );
}

// =========================================================================
// Shutdown
// =========================================================================

#[tokio::test]
async fn test_run_until_closes_rooms_and_sockets() {
    let server = TinchoServerBuilder::new()
        .bind("127.0.0.1:0")
        .build()
        .await
        .unwrap();
    let addr = server.local_addr().unwrap().to_string();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let running = tokio::spawn(server.run_until(async {
        let _ = stop_rx.await;
    }));

    let room = create_room(&addr, serde_json::json!({})).await;
    let (mut ana, _) = join(&addr, &room, "ana", None).await;
    expect_update(&mut ana, "players_changed").await;

    stop_tx.send(()).unwrap();
    running.await.unwrap().unwrap();

    // The socket is closed once the room is gone.
    let closed = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match ana.next().await {
                None | Some(Err(_)) => break,
                Some(Ok(msg)) if msg.is_close() => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "socket should close after shutdown");
}
