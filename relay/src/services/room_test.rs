use std::time::Duration;

use frames::ServerMessage;
use tokio::time::timeout;

use super::*;
use crate::state::test_helpers::{seat_user, seed_room, stroke, test_app_state};

async fn recv(rx: &mut mpsc::Receiver<ServerMessage>) -> ServerMessage {
    timeout(Duration::from_millis(200), rx.recv())
        .await
        .expect("timed out waiting for message")
        .expect("channel closed")
}

async fn join(
    state: &AppState,
    room_id: &str,
    user_id: &str,
    previous: Option<&Membership>,
) -> (JoinReply, mpsc::Receiver<ServerMessage>) {
    let (tx, rx) = mpsc::channel(64);
    let reply = join_room(state, room_id, UserRecord::new(user_id, "#ff0000"), Uuid::new_v4(), tx, previous)
        .await
        .expect("join should succeed");
    (reply, rx)
}

// =============================================================================
// create / exists
// =============================================================================

#[tokio::test]
async fn create_room_then_exists() {
    let state = test_app_state();
    assert!(!room_exists(&state, "abc123").await);
    create_room(&state, "abc123").await.expect("create");
    assert!(room_exists(&state, "abc123").await);
}

#[tokio::test]
async fn create_room_twice_fails() {
    let state = test_app_state();
    create_room(&state, "abc123").await.expect("create");
    let err = create_room(&state, "abc123").await.expect_err("duplicate");
    assert_eq!(err, RoomError::AlreadyExists("abc123".into()));
}

#[tokio::test]
async fn create_room_rejects_blank_id() {
    let state = test_app_state();
    assert_eq!(create_room(&state, "  ").await, Err(RoomError::InvalidId));
}

// =============================================================================
// join
// =============================================================================

#[tokio::test]
async fn join_missing_room_is_not_found() {
    let state = test_app_state();
    let (tx, _rx) = mpsc::channel(8);
    let err = join_room(&state, "nope", UserRecord::new("a", "#000"), Uuid::new_v4(), tx, None)
        .await
        .expect_err("missing room");
    assert_eq!(err, RoomError::NotFound("nope".into()));
}

#[tokio::test]
async fn padded_id_joins_the_trimmed_room() {
    let state = test_app_state();
    create_room(&state, " abc ").await.expect("create");
    assert!(room_exists(&state, " abc").await);

    let (reply, _rx) = join(&state, " abc", "a", None).await;
    assert_eq!(reply.membership.room_id, "abc");
    let mut rooms = state.rooms.write().await;
    assert!(member_room(&mut rooms, Some(&reply.membership), "abc ").is_ok());
}

#[tokio::test]
async fn join_returns_members_and_full_replay() {
    let state = test_app_state();
    seed_room(&state, "r").await;
    {
        let mut rooms = state.rooms.write().await;
        let room = rooms.get_mut("r").expect("room");
        let mut undone = stroke("s1", "r", "a", 3, frames::now_ms());
        undone.is_deleted = Some(true);
        room.push_drawing(undone);
    }

    let (reply, _rx) = join(&state, "r", "b", None).await;
    assert_eq!(reply.users.len(), 1);
    assert_eq!(reply.replay.len(), 1);
    assert_eq!(reply.replay[0].points.len(), 3);
    assert!(!reply.replay[0].is_incremental);
    assert_eq!(reply.replay[0].is_deleted, None);
    assert_eq!(reply.membership.user_id, "b");
}

#[tokio::test]
async fn join_announces_to_existing_members_only() {
    let state = test_app_state();
    seed_room(&state, "r").await;
    let (_a, mut rx_a) = join(&state, "r", "a", None).await;
    let (_b, mut rx_b) = join(&state, "r", "b", None).await;

    match recv(&mut rx_a).await {
        ServerMessage::UserJoined { user } => assert_eq!(user.id, "b"),
        other => panic!("expected user-joined, got {other:?}"),
    }
    assert!(rx_b.try_recv().is_err());
}

#[tokio::test]
async fn join_skips_expired_strokes() {
    let state = test_app_state();
    seed_room(&state, "r").await;
    {
        let mut rooms = state.rooms.write().await;
        let room = rooms.get_mut("r").expect("room");
        room.push_drawing(stroke("old", "r", "a", 2, frames::now_ms() - 31 * 60 * 1000));
        room.push_drawing(stroke("new", "r", "a", 2, frames::now_ms()));
    }
    let (reply, _rx) = join(&state, "r", "b", None).await;
    let ids: Vec<&str> = reply.replay.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, ["new"]);
}

#[tokio::test]
async fn joining_second_room_evicts_first() {
    let state = test_app_state();
    seed_room(&state, "one").await;
    seed_room(&state, "two").await;
    let (_peer, mut rx_peer) = seat_user(&state, "one", "peer").await;

    let (first, _rx) = join(&state, "one", "a", None).await;
    assert!(matches!(recv(&mut rx_peer).await, ServerMessage::UserJoined { .. }));

    let (_second, _rx2) = join(&state, "two", "a", Some(&first.membership)).await;
    assert_eq!(recv(&mut rx_peer).await, ServerMessage::UserLeft { user_id: "a".into() });

    let rooms = state.rooms.read().await;
    assert!(!rooms["one"].users.contains_key("a"));
    assert!(rooms["two"].users.contains_key("a"));
}

#[tokio::test]
async fn eviction_deletes_emptied_room() {
    let state = test_app_state();
    seed_room(&state, "one").await;
    seed_room(&state, "two").await;
    // Same user from a different socket: no previous membership passed.
    let (_first, _rx) = join(&state, "one", "a", None).await;
    let (_second, _rx2) = join(&state, "two", "a", None).await;

    assert!(!room_exists(&state, "one").await);
    assert!(room_exists(&state, "two").await);
}

#[tokio::test]
async fn rejoining_same_room_replaces_seat() {
    let state = test_app_state();
    seed_room(&state, "r").await;
    let (first, _rx1) = join(&state, "r", "a", None).await;
    let (second, _rx2) = join(&state, "r", "a", Some(&first.membership)).await;

    let rooms = state.rooms.read().await;
    let room = &rooms["r"];
    assert_eq!(room.users.len(), 1);
    assert!(room.holds(&second.membership));
    assert!(!room.holds(&first.membership));
}

// =============================================================================
// leave
// =============================================================================

#[tokio::test]
async fn leave_last_member_deletes_room() {
    let state = test_app_state();
    seed_room(&state, "r").await;
    let (reply, _rx) = join(&state, "r", "a", None).await;
    assert!(leave_room(&state, &reply.membership).await);
    assert!(!room_exists(&state, "r").await);
}

#[tokio::test]
async fn leave_notifies_remaining_members() {
    let state = test_app_state();
    seed_room(&state, "r").await;
    let (_peer, mut rx_peer) = seat_user(&state, "r", "peer").await;
    let (reply, _rx) = join(&state, "r", "a", None).await;
    assert!(matches!(recv(&mut rx_peer).await, ServerMessage::UserJoined { .. }));

    leave_room(&state, &reply.membership).await;
    assert_eq!(recv(&mut rx_peer).await, ServerMessage::UserLeft { user_id: "a".into() });
}

#[tokio::test]
async fn leave_is_idempotent() {
    let state = test_app_state();
    seed_room(&state, "r").await;
    let (_peer, _rx_peer) = seat_user(&state, "r", "peer").await;
    let (reply, _rx) = join(&state, "r", "a", None).await;
    assert!(leave_room(&state, &reply.membership).await);
    assert!(!leave_room(&state, &reply.membership).await);
}

#[tokio::test]
async fn stale_socket_cannot_evict_reconnect() {
    let state = test_app_state();
    seed_room(&state, "r").await;
    let (old, _rx1) = join(&state, "r", "a", None).await;
    let (fresh, _rx2) = join(&state, "r", "a", None).await;

    assert!(!leave_room(&state, &old.membership).await);
    let rooms = state.rooms.read().await;
    assert!(rooms["r"].holds(&fresh.membership));
}

// =============================================================================
// member_room
// =============================================================================

#[tokio::test]
async fn member_room_requires_join() {
    let state = test_app_state();
    seed_room(&state, "r").await;
    let (member, _rx) = seat_user(&state, "r", "a").await;
    let mut rooms = state.rooms.write().await;

    assert_eq!(member_room(&mut rooms, None, "r").err(), Some(RoomError::NotJoined));
    assert_eq!(
        member_room(&mut rooms, Some(&member), "other").err(),
        Some(RoomError::NotMember("other".into()))
    );
    assert!(member_room(&mut rooms, Some(&member), "r").is_ok());
}
