//! Integration tests for the two-peer session-synchronization engine.
//!
//! Each test boots the real room store on an ephemeral port and talks to it
//! over HTTP, so the full wire path (JSON bodies, merge writes, role
//! filtering) is exercised, not just the in-memory table.

use client::session::{Lifecycle, SessionEvent};
use client::store::{RoomStoreClient, StoreError};
use client::sync::{create_session, join_session, SessionCommand, SessionHandle};
use server::store::RoomStore;
use shared::room::{GamePhase, MonkeyState, RoomPutBody, HOST_PLAYER_ID, JOINER_PLAYER_ID};
use shared::{MapType, Point, UnitPoint};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const FRAME_W: f32 = 1024.0;
const FRAME_H: f32 = 768.0;

async fn start_store() -> String {
    let store = Arc::new(RoomStore::new());
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let (local_addr, serve) = server::bind(addr, store).await.expect("bind store");
    tokio::spawn(serve);
    format!("http://{}", local_addr)
}

/// Drains events until `pred` matches or the timeout expires.
async fn wait_for_event<F>(handle: &mut SessionHandle, secs: u64, mut pred: F) -> SessionEvent
where
    F: FnMut(&SessionEvent) -> bool,
{
    timeout(Duration::from_secs(secs), async {
        loop {
            let event = handle.events.recv().await.expect("event channel closed");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for session event")
}

mod store_api_tests {
    use super::*;

    #[tokio::test]
    async fn create_join_and_failure_modes() {
        let base = start_store().await;
        let client = RoomStoreClient::new(base);

        let created = client.create_room("alice", MapType::Sea).await.unwrap();
        assert_eq!(created.player_id, HOST_PLAYER_ID);
        assert_eq!(created.room_code.len(), 4);

        let joined = client.join_room(&created.room_code, "bob").await.unwrap();
        assert_eq!(joined.player_id, JOINER_PLAYER_ID);
        assert_eq!(joined.map_type, MapType::Sea);

        let record = client.get_room(&created.room_code).await.unwrap();
        assert_eq!(record.player1.as_ref().unwrap().name, "alice");
        assert_eq!(record.player2.as_ref().unwrap().name, "bob");
        assert_eq!(record.game_state, GamePhase::Waiting);

        // Third seat does not exist.
        let err = client
            .join_room(&created.room_code, "carol")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::RoomFull));

        // Well-formed but unknown code.
        let err = client.join_room("QQQQ", "dave").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));

        // Malformed code never reaches the store.
        let err = client.join_room("not a code", "eve").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn authority_filtering_over_the_wire() {
        let base = start_store().await;
        let client = RoomStoreClient::new(base);

        let created = client.create_room("alice", MapType::Original).await.unwrap();
        let code = created.room_code;
        client.join_room(&code, "bob").await.unwrap();
        client.start_game(&code).await.unwrap();

        // The joiner pushes host-only fields alongside its position; the
        // store must apply the position and drop the rest.
        let body = RoomPutBody {
            player_id: Some(JOINER_PLAYER_ID.to_string()),
            my_position: Some(UnitPoint::new(0.25, 0.75)),
            score: Some(5000),
            game_state: Some(GamePhase::Ended),
            ..RoomPutBody::default()
        };
        let record = client.update_room(&code, &body).await.unwrap();

        assert_eq!(record.player2.as_ref().unwrap().x, 0.25);
        assert_eq!(record.score, 0);
        assert_eq!(record.game_state, GamePhase::Playing);
    }

    #[tokio::test]
    async fn start_requires_a_second_player() {
        let base = start_store().await;
        let client = RoomStoreClient::new(base);

        let created = client.create_room("alice", MapType::Original).await.unwrap();
        let err = client.start_game(&created.room_code).await.unwrap_err();
        assert!(matches!(err, StoreError::Upstream { .. }));

        client.join_room(&created.room_code, "bob").await.unwrap();
        let started = client.start_game(&created.room_code).await.unwrap();
        assert!(
            started.monkey_player_id == HOST_PLAYER_ID
                || started.monkey_player_id == JOINER_PLAYER_ID
        );
    }

    #[tokio::test]
    async fn replayed_update_is_idempotent() {
        let base = start_store().await;
        let client = RoomStoreClient::new(base);

        let created = client.create_room("alice", MapType::Original).await.unwrap();
        let code = created.room_code;
        client.join_room(&code, "bob").await.unwrap();
        let started = client.start_game(&code).await.unwrap();

        let body = RoomPutBody {
            player_id: Some(started.monkey_player_id.clone()),
            my_position: Some(UnitPoint::new(0.4, 0.6)),
            monkey: Some(MonkeyState { x: 0.4, y: 0.6 }),
            ..RoomPutBody::default()
        };
        let first = client.update_room(&code, &body).await.unwrap();
        let second = client.update_room(&code, &body).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn delete_then_get_reports_not_found() {
        let base = start_store().await;
        let client = RoomStoreClient::new(base);

        let created = client.create_room("alice", MapType::Original).await.unwrap();
        client.delete_room(&created.room_code).await.unwrap();
        // Idempotent second delete.
        client.delete_room(&created.room_code).await.unwrap();

        let err = client.get_room(&created.room_code).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }
}

mod engine_tests {
    use super::*;

    /// The full match lifecycle: create, join, start, play, collide,
    /// end on both peers, restart, leave.
    #[tokio::test(flavor = "multi_thread")]
    async fn end_to_end_match() {
        let base = start_store().await;
        let store = RoomStoreClient::new(base.clone());

        let mut host = create_session(
            store.clone(),
            "alice",
            MapType::Original,
            FRAME_W,
            FRAME_H,
        )
        .await
        .expect("create session");
        let code = host.room_code.clone();

        let mut joiner = join_session(store.clone(), &code, "bob", FRAME_W, FRAME_H)
            .await
            .expect("join session");
        assert_eq!(joiner.map_type, MapType::Original);

        // Host observes the join via its slow poll, then starts.
        wait_for_event(&mut host, 5, |e| matches!(e, SessionEvent::PeerJoined)).await;
        host.commands.send(SessionCommand::StartGame).await.unwrap();

        wait_for_event(&mut host, 5, |e| {
            matches!(e, SessionEvent::PhaseChanged(Lifecycle::Playing))
        })
        .await;
        // Joiner reaches Playing strictly through the observed tag.
        wait_for_event(&mut joiner, 5, |e| {
            matches!(e, SessionEvent::PhaseChanged(Lifecycle::Playing))
        })
        .await;

        let record = store.get_room(&code).await.unwrap();
        assert_eq!(record.game_state, GamePhase::Playing);
        let monkey_id = record.monkey_player_id.clone().unwrap();
        assert!(monkey_id == HOST_PLAYER_ID || monkey_id == JOINER_PLAYER_ID);

        // Park both avatars apart and let a few sync rounds run; both
        // slots must report real (non-sentinel) positions.
        let host_target = Point::new(FRAME_W * 0.8, FRAME_H * 0.8);
        let joiner_target = Point::new(FRAME_W * 0.2, FRAME_H * 0.2);
        for _ in 0..10 {
            host.commands
                .send(SessionCommand::SetLocalPosition(host_target))
                .await
                .unwrap();
            joiner
                .commands
                .send(SessionCommand::SetLocalPosition(joiner_target))
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(60)).await;
        }
        let record = store.get_room(&code).await.unwrap();
        assert!(record.player1.as_ref().unwrap().position().is_reported());
        assert!(record.player2.as_ref().unwrap().position().is_reported());

        // Drive both avatars to the same spot; the host's simulation must
        // detect the catch and push the ended tag to the store and peer.
        let meeting_point = Point::new(FRAME_W * 0.5, FRAME_H * 0.5);
        let host_cmds = host.commands.clone();
        let joiner_cmds = joiner.commands.clone();
        let collide = async {
            loop {
                let _ = host_cmds
                    .send(SessionCommand::SetLocalPosition(meeting_point))
                    .await;
                let _ = joiner_cmds
                    .send(SessionCommand::SetLocalPosition(meeting_point))
                    .await;
                tokio::time::sleep(Duration::from_millis(30)).await;
            }
        };
        tokio::select! {
            _ = collide => unreachable!(),
            _ = wait_for_event(&mut host, 10, |e| {
                matches!(e, SessionEvent::PhaseChanged(Lifecycle::Ended))
            }) => {}
        }
        wait_for_event(&mut joiner, 10, |e| {
            matches!(e, SessionEvent::PhaseChanged(Lifecycle::Ended))
        })
        .await;

        let record = store.get_room(&code).await.unwrap();
        assert_eq!(record.game_state, GamePhase::Ended);

        // Restart: both peers must come back to Playing with a fresh score.
        host.commands
            .send(SessionCommand::RestartGame)
            .await
            .unwrap();
        wait_for_event(&mut host, 5, |e| {
            matches!(e, SessionEvent::PhaseChanged(Lifecycle::Playing))
        })
        .await;

        // Checked before the host's score clock can tick past zero.
        let record = store.get_room(&code).await.unwrap();
        assert_eq!(record.game_state, GamePhase::Playing);
        assert_eq!(record.score, 0);
        assert!(record.monkey_player_id.is_some());

        wait_for_event(&mut joiner, 5, |e| {
            matches!(e, SessionEvent::PhaseChanged(Lifecycle::Playing))
        })
        .await;

        // Leaving deletes the room and ends both sessions.
        host.commands.send(SessionCommand::Leave).await.unwrap();
        wait_for_event(&mut host, 5, |e| {
            matches!(e, SessionEvent::PhaseChanged(Lifecycle::Abandoned))
        })
        .await;
        joiner.commands.send(SessionCommand::Leave).await.unwrap();
        wait_for_event(&mut joiner, 5, |e| {
            matches!(e, SessionEvent::PhaseChanged(Lifecycle::Abandoned))
        })
        .await;

        tokio::time::sleep(Duration::from_millis(200)).await;
        let err = store.get_room(&code).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn joiner_never_reaches_playing_before_the_tag() {
        let base = start_store().await;
        let store = RoomStoreClient::new(base);

        let host = create_session(
            store.clone(),
            "alice",
            MapType::Original,
            FRAME_W,
            FRAME_H,
        )
        .await
        .unwrap();
        let mut joiner = join_session(store.clone(), &host.room_code, "bob", FRAME_W, FRAME_H)
            .await
            .unwrap();

        // No start was issued: several poll rounds must pass with the
        // joiner still waiting.
        let premature = timeout(Duration::from_secs(3), async {
            loop {
                if let Some(SessionEvent::PhaseChanged(Lifecycle::Playing)) =
                    joiner.events.recv().await
                {
                    return;
                }
            }
        })
        .await;
        assert!(premature.is_err(), "joiner entered Playing without a start");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn teardown_makes_late_callbacks_no_ops() {
        let base = start_store().await;
        let store = RoomStoreClient::new(base);

        let mut host = create_session(
            store.clone(),
            "alice",
            MapType::Original,
            FRAME_W,
            FRAME_H,
        )
        .await
        .unwrap();
        let code = host.room_code.clone();

        // Leave immediately, with the initial lobby poll likely still in
        // flight. The session must end cleanly and emit nothing afterward.
        host.commands.send(SessionCommand::Leave).await.unwrap();
        wait_for_event(&mut host, 5, |e| {
            matches!(e, SessionEvent::PhaseChanged(Lifecycle::Abandoned))
        })
        .await;
        assert!(host.events.recv().await.is_none());

        tokio::time::sleep(Duration::from_millis(200)).await;
        let err = store.get_room(&code).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }
}
