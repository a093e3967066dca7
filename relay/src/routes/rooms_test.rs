use super::*;
use crate::state::test_helpers::test_app_state;

fn body(id: &str) -> Json<CreateRoomBody> {
    Json(CreateRoomBody { id: id.to_owned() })
}

#[test]
fn room_error_to_status_maps_each_variant() {
    assert_eq!(room_error_to_status(RoomError::NotFound("r".into())), StatusCode::NOT_FOUND);
    assert_eq!(room_error_to_status(RoomError::AlreadyExists("r".into())), StatusCode::CONFLICT);
    assert_eq!(room_error_to_status(RoomError::InvalidId), StatusCode::BAD_REQUEST);
    assert_eq!(room_error_to_status(RoomError::NotJoined), StatusCode::FORBIDDEN);
    assert_eq!(room_error_to_status(RoomError::NotMember("r".into())), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_returns_created_with_id() {
    let state = test_app_state();
    let (status, Json(resp)) = create_room(State(state.clone()), body(" abc123 "))
        .await
        .expect("create");
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(resp, RoomResponse { id: "abc123".into() });

    let Json(exists) = room_exists(State(state), Path("abc123".into())).await;
    assert!(exists.exists);
}

#[tokio::test]
async fn create_duplicate_is_conflict() {
    let state = test_app_state();
    create_room(State(state.clone()), body("abc123")).await.expect("create");
    let err = create_room(State(state), body("abc123")).await.expect_err("duplicate");
    assert_eq!(err, StatusCode::CONFLICT);
}

#[tokio::test]
async fn create_blank_is_bad_request() {
    let state = test_app_state();
    let err = create_room(State(state), body("")).await.expect_err("blank");
    assert_eq!(err, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn exists_is_false_for_unknown_room() {
    let state = test_app_state();
    let Json(exists) = room_exists(State(state), Path("nope".into())).await;
    assert_eq!(exists, ExistsResponse { exists: false });
}
