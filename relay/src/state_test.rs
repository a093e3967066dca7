use super::test_helpers::{seat_user, seed_room, stroke, test_app_state};
use super::*;

#[test]
fn room_state_new_is_empty() {
    let room = RoomState::new("abc123", 100);
    assert!(room.users.is_empty());
    assert!(room.drawings().is_empty());
    assert_eq!(room.created_at, 100);
    assert_eq!(room.last_active, 100);
}

#[test]
fn push_drawing_keeps_arrival_order_and_index() {
    let mut room = RoomState::new("r", 0);
    room.push_drawing(stroke("b", "r", "u", 1, 10));
    room.push_drawing(stroke("a", "r", "u", 2, 5));
    let ids: Vec<&str> = room.drawings().iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, ["b", "a"]);
    assert_eq!(room.drawing("a").map(|d| d.points.len()), Some(2));
}

#[test]
fn push_drawing_with_known_id_replaces_in_place() {
    let mut room = RoomState::new("r", 0);
    room.push_drawing(stroke("a", "r", "u", 1, 10));
    room.push_drawing(stroke("b", "r", "u", 1, 10));
    room.push_drawing(stroke("a", "r", "u", 4, 11));
    assert_eq!(room.drawings().len(), 2);
    assert_eq!(room.drawings()[0].points.len(), 4);
}

#[test]
fn purge_expired_drops_old_strokes_and_reindexes() {
    let mut room = RoomState::new("r", 0);
    room.push_drawing(stroke("old", "r", "u", 1, 1_000));
    room.push_drawing(stroke("fresh", "r", "u", 1, 9_000));
    let removed = room.purge_expired(10_000, 5_000);
    assert_eq!(removed, 1);
    assert!(room.drawing("old").is_none());
    assert_eq!(room.drawing("fresh").map(|d| d.timestamp), Some(9_000));
    assert!(room.drawing_mut("fresh").is_some());
}

#[test]
fn clear_drawings_empties_log() {
    let mut room = RoomState::new("r", 0);
    room.push_drawing(stroke("a", "r", "u", 1, 1));
    room.clear_drawings();
    assert!(room.drawings().is_empty());
    assert!(room.drawing("a").is_none());
}

#[tokio::test]
async fn user_records_are_sorted_by_id() {
    let state = test_app_state();
    seed_room(&state, "r").await;
    let (_m1, _rx1) = seat_user(&state, "r", "zed").await;
    let (_m2, _rx2) = seat_user(&state, "r", "amy").await;

    let rooms = state.rooms.read().await;
    let ids: Vec<String> = rooms["r"].user_records().into_iter().map(|u| u.id).collect();
    assert_eq!(ids, ["amy", "zed"]);
}

#[tokio::test]
async fn holds_checks_client_id() {
    let state = test_app_state();
    seed_room(&state, "r").await;
    let (member, _rx) = seat_user(&state, "r", "amy").await;

    let rooms = state.rooms.read().await;
    assert!(rooms["r"].holds(&member));
    let imposter = Membership { client_id: Uuid::new_v4(), ..member };
    assert!(!rooms["r"].holds(&imposter));
}

#[tokio::test]
async fn broadcast_skips_excluded_user() {
    let state = test_app_state();
    seed_room(&state, "r").await;
    let (_a, mut rx_a) = seat_user(&state, "r", "a").await;
    let (_b, mut rx_b) = seat_user(&state, "r", "b").await;

    {
        let rooms = state.rooms.read().await;
        rooms["r"].broadcast(&ServerMessage::CanvasClear, Some("a"));
    }

    assert_eq!(rx_b.try_recv().ok(), Some(ServerMessage::CanvasClear));
    assert!(rx_a.try_recv().is_err());
}

#[tokio::test]
async fn broadcast_tolerates_full_queue() {
    let state = test_app_state();
    seed_room(&state, "r").await;
    let (tx, mut rx) = mpsc::channel(1);
    {
        let mut rooms = state.rooms.write().await;
        let room = rooms.get_mut("r").expect("room");
        room.users.insert(
            "slow".to_owned(),
            ConnectedUser { record: UserRecord::new("slow", "#000"), client_id: Uuid::new_v4(), tx },
        );
        room.broadcast(&ServerMessage::CanvasClear, None);
        room.broadcast(&ServerMessage::CanvasClear, None);
    }
    assert!(rx.try_recv().is_ok());
    assert!(rx.try_recv().is_err());
}
