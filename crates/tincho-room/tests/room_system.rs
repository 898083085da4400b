//! Integration tests for running rooms.
//!
//! Every test talks to a real room actor through the same handles the
//! server uses: [`RoomHandle::join`] in, [`ConnectionHandle::queue_action`]
//! for actions, and the ticket's update queue out.

use std::time::Duration;

use tincho_game::{Deck, DrawSource, PlayerId, Tincho};
use tincho_protocol::{
    Action, DiscardData, DrawData, RoomId, TurnUpdate, Update,
};
use tincho_room::{JoinTicket, RoomConfig, RoomError, RoomHandle, RoomState, spawn_room};
use tokio::sync::mpsc;
use tokio::time::timeout;

// =========================================================================
// Helpers
// =========================================================================

fn pid(id: &str) -> PlayerId {
    PlayerId::from(id)
}

fn room(config: RoomConfig) -> RoomHandle {
    spawn_room(RoomId::from("TEST"), config, Tincho::new(Deck::new()))
}

async fn next_update(updates: &mut mpsc::Receiver<Update>) -> Update {
    timeout(Duration::from_secs(2), updates.recv())
        .await
        .expect("timed out waiting for an update")
        .expect("update queue closed")
}

/// Skips updates until one of the given kind arrives.
async fn expect_kind(
    updates: &mut mpsc::Receiver<Update>,
    kind: &str,
) -> Update {
    loop {
        let update = next_update(updates).await;
        if update.kind() == kind {
            return update;
        }
    }
}

fn draw_pile() -> Action {
    Action::Draw(DrawData {
        source: DrawSource::Pile,
    })
}

fn throw_drawn() -> Action {
    Action::Discard(DiscardData {
        position: -1,
        position2: None,
    })
}

/// Seats ana and bob, starts the game and has both peek.
async fn started_pair(config: RoomConfig) -> (RoomHandle, JoinTicket, JoinTicket) {
    let handle = room(config);
    let mut ana = handle.join(pid("ana"), None).await.unwrap();
    let mut bob = handle.join(pid("bob"), None).await.unwrap();

    ana.connection.queue_action(Action::Start).await.unwrap();
    expect_kind(&mut ana.updates, "game_start").await;
    expect_kind(&mut bob.updates, "game_start").await;

    ana.connection.queue_action(Action::FirstPeek).await.unwrap();
    bob.connection.queue_action(Action::FirstPeek).await.unwrap();
    expect_kind(&mut ana.updates, "turn").await;
    expect_kind(&mut bob.updates, "turn").await;

    (handle, ana, bob)
}

// =========================================================================
// Full flow
// =========================================================================

#[tokio::test]
async fn test_two_players_start_peek_and_first_turn() {
    let handle = room(RoomConfig::default());
    let mut ana = handle.join(pid("ana"), None).await.unwrap();
    let mut bob = handle.join(pid("bob"), None).await.unwrap();
    assert!(!ana.rejoined);
    assert_ne!(
        ana.connection.session_token(),
        bob.connection.session_token()
    );

    match expect_kind(&mut bob.updates, "players_changed").await {
        Update::PlayersChanged(changed) => assert_eq!(changed.players.len(), 2),
        other => panic!("unexpected {other:?}"),
    }

    ana.connection.queue_action(Action::Start).await.unwrap();
    for ticket in [&mut ana, &mut bob] {
        expect_kind(&mut ticket.updates, "game_config").await;
        match next_update(&mut ticket.updates).await {
            Update::GameStart(start) => {
                assert_eq!(start.players.len(), 2);
                assert!(start.players.iter().all(|p| p.cards_in_hand == 4));
            }
            other => panic!("expected game_start, got {other:?}"),
        }
    }

    ana.connection.queue_action(Action::FirstPeek).await.unwrap();
    match next_update(&mut ana.updates).await {
        Update::PlayerPeeked(peek) => {
            assert_eq!(peek.player, pid("ana"));
            assert!(peek.cards.is_some());
        }
        other => panic!("expected player_peeked, got {other:?}"),
    }
    match next_update(&mut bob.updates).await {
        Update::PlayerPeeked(peek) => assert!(peek.cards.is_none()),
        other => panic!("expected player_peeked, got {other:?}"),
    }

    bob.connection.queue_action(Action::FirstPeek).await.unwrap();
    let turn = Update::Turn(TurnUpdate { player: pid("ana") });
    assert_eq!(expect_kind(&mut ana.updates, "turn").await, turn);
    assert_eq!(expect_kind(&mut bob.updates, "turn").await, turn);
    assert_eq!(handle.total_rounds().await, 1);
}

#[tokio::test]
async fn test_start_by_second_player_is_rejected() {
    let handle = room(RoomConfig::default());
    let _ana = handle.join(pid("ana"), None).await.unwrap();
    let mut bob = handle.join(pid("bob"), None).await.unwrap();

    bob.connection.queue_action(Action::Start).await.unwrap();
    assert_eq!(
        expect_kind(&mut bob.updates, "error").await,
        Update::error("not room leader")
    );
    assert!(!handle.playing().await);
}

#[tokio::test]
async fn test_out_of_turn_action_errors_only_to_actor() {
    let (handle, mut ana, mut bob) = started_pair(RoomConfig::default()).await;

    bob.connection.queue_action(draw_pile()).await.unwrap();
    assert_eq!(
        next_update(&mut bob.updates).await,
        Update::error("not your turn")
    );

    ana.connection.queue_action(draw_pile()).await.unwrap();
    // ana's own draw is the next thing she hears; bob's error never
    // reached her.
    assert_eq!(next_update(&mut ana.updates).await.kind(), "draw");
    assert_eq!(handle.total_turns().await, 0);
}

#[tokio::test]
async fn test_draw_and_discard_passes_turn() {
    let (handle, mut ana, mut bob) = started_pair(RoomConfig::default()).await;

    ana.connection.queue_action(draw_pile()).await.unwrap();
    ana.connection.queue_action(throw_drawn()).await.unwrap();

    expect_kind(&mut bob.updates, "discard").await;
    assert_eq!(
        next_update(&mut bob.updates).await,
        Update::Turn(TurnUpdate { player: pid("bob") })
    );
    expect_kind(&mut ana.updates, "turn").await;
    assert_eq!(handle.total_turns().await, 1);
}

// =========================================================================
// Joining
// =========================================================================

#[tokio::test]
async fn test_join_full_room_rejected() {
    let handle = room(RoomConfig {
        max_players: 2,
        ..RoomConfig::default()
    });
    handle.join(pid("ana"), None).await.unwrap();
    handle.join(pid("bob"), None).await.unwrap();

    let err = handle.join(pid("cai"), None).await.unwrap_err();
    assert!(matches!(err, RoomError::RoomFull(_)));
    assert_eq!(handle.current_players().await, vec![pid("ana"), pid("bob")]);
}

#[tokio::test]
async fn test_join_after_start_rejected() {
    let (handle, _ana, _bob) = started_pair(RoomConfig::default()).await;
    let err = handle.join(pid("cai"), None).await.unwrap_err();
    assert_eq!(err.to_string(), "game already started");
}

#[tokio::test]
async fn test_rejoin_with_wrong_token_rejected() {
    let handle = room(RoomConfig::default());
    handle.join(pid("ana"), None).await.unwrap();

    let err = handle
        .join(pid("ana"), Some("not-the-token".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::PlayerAlreadyInRoom(_)));

    let err = handle.join(pid("ana"), None).await.unwrap_err();
    assert_eq!(err.to_string(), "player ana already exists in room");
}

#[tokio::test]
async fn test_token_for_unseated_player_is_refused() {
    let handle = room(RoomConfig::default());
    let ana = handle.join(pid("ana"), None).await.unwrap();
    let token = ana.connection.session_token().to_owned();

    // Even a real token only resumes the seat it was issued for.
    for token in [token, "made-up".to_owned()] {
        let err = handle.join(pid("eve"), Some(token)).await.unwrap_err();
        assert!(matches!(err, RoomError::NoSeatToResume(_)));
        assert_eq!(err.to_string(), "player eve has no seat to resume");
    }
    assert_eq!(handle.current_players().await, vec![pid("ana")]);
}

#[tokio::test]
async fn test_rejoin_replaces_stale_queue_with_snapshot() {
    let config = RoomConfig {
        update_buffer: 4,
        ..RoomConfig::default()
    };
    let (handle, mut ana, bob) = started_pair(config).await;
    let token = bob.connection.session_token().to_owned();
    let mut stale = bob.updates;

    // bob stops reading while ana plays a turn.
    ana.connection.queue_action(draw_pile()).await.unwrap();
    ana.connection.queue_action(throw_drawn()).await.unwrap();
    expect_kind(&mut ana.updates, "turn").await;

    let mut bob = handle.join(pid("bob"), Some(token)).await.unwrap();
    assert!(bob.rejoined);

    let Update::RejoinState(snapshot) = next_update(&mut bob.updates).await
    else {
        panic!("first update after rejoin must be the snapshot");
    };
    let (draw_len, discard_len, top) = handle
        .read(|game| {
            (
                game.draw_pile_len(),
                game.discard_pile_len(),
                game.last_discarded(),
            )
        })
        .await;
    assert!(snapshot.playing);
    assert_eq!(snapshot.current_turn, Some(pid("bob")));
    assert!(!snapshot.card_in_hand);
    assert_eq!(snapshot.cards_in_draw_pile, draw_len);
    assert_eq!(snapshot.cards_in_discard_pile, discard_len);
    assert_eq!(snapshot.last_discarded, top);

    // The old queue keeps what it had buffered, then closes. None of it
    // is replayed on the new one.
    let mut leftover = Vec::new();
    while let Some(update) = stale.recv().await {
        leftover.push(update.kind());
    }
    assert_eq!(leftover, vec!["draw", "discard", "turn"]);

    // The new queue is live.
    bob.connection.queue_action(draw_pile()).await.unwrap();
    assert_eq!(next_update(&mut bob.updates).await.kind(), "draw");
}

// =========================================================================
// Concurrency
// =========================================================================

#[tokio::test]
async fn test_concurrent_actions_keep_every_card_accounted_for() {
    let handle = room(RoomConfig {
        max_players: 3,
        ..RoomConfig::default()
    });
    let mut tickets = Vec::new();
    for name in ["ana", "bob", "cai"] {
        tickets.push(handle.join(pid(name), None).await.unwrap());
    }
    tickets[0].connection.queue_action(Action::Start).await.unwrap();
    expect_kind(&mut tickets[0].updates, "game_start").await;

    let mut players = Vec::new();
    for ticket in tickets {
        let JoinTicket {
            connection,
            mut updates,
            ..
        } = ticket;
        // Keep every queue drained so nothing backs up.
        tokio::spawn(async move { while updates.recv().await.is_some() {} });
        players.push(tokio::spawn(async move {
            connection.queue_action(Action::FirstPeek).await.unwrap();
            for _ in 0..200 {
                connection.queue_action(draw_pile()).await.unwrap();
                connection.queue_action(throw_drawn()).await.unwrap();
                tokio::task::yield_now().await;
            }
        }));
    }

    for _ in 0..20 {
        let in_play = handle.read(Tincho::cards_in_play).await;
        assert_eq!(in_play, 50);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    for player in players {
        player.await.unwrap();
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    handle
        .read(|game| {
            assert_eq!(game.cards_in_play(), 50);
            assert!(game.total_turns() > 0);
            assert!(game.players().iter().all(|p| p.hand.len() == 4));
        })
        .await;
}

// =========================================================================
// Closing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_room_times_out_and_refuses_joins() {
    let handle = room(RoomConfig {
        room_timeout: Duration::from_secs(60),
        ..RoomConfig::default()
    });
    let ana = handle.join(pid("ana"), None).await.unwrap();

    handle.closed().await;
    assert_eq!(handle.state(), RoomState::Closed);
    assert!(ana.connection.room_closed().is_cancelled());

    let err = handle.join(pid("bob"), None).await.unwrap_err();
    assert!(matches!(err, RoomError::Closed(_)));
}

#[tokio::test]
async fn test_close_lets_sockets_flush_queued_updates() {
    let handle = room(RoomConfig::default());
    let mut ana = handle.join(pid("ana"), None).await.unwrap();
    let _bob = handle.join(pid("bob"), None).await.unwrap();

    handle.close();
    handle.closed().await;
    assert!(handle.is_closed());

    // Both players_changed updates were queued before the close.
    assert_eq!(next_update(&mut ana.updates).await.kind(), "players_changed");
    assert_eq!(next_update(&mut ana.updates).await.kind(), "players_changed");

    let err = ana.connection.queue_action(Action::Start).await.unwrap_err();
    assert!(matches!(err, RoomError::Closed(_)));
}
