use serde_json::json;

use super::*;
use crate::stroke::{StrokeStyle, Tool};

#[test]
fn client_join_room_json_shape() {
    let msg = ClientMessage::JoinRoom { room_id: "abc123".to_owned(), user: UserRecord::new("alice", "#f00") };
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(
        value,
        json!({"event": "join-room", "payload": {"roomId": "abc123", "user": {"id": "alice", "color": "#f00"}}})
    );
}

#[test]
fn client_undo_uses_camel_case_fields() {
    let msg = ClientMessage::UndoCanvas {
        room_id: "r".to_owned(),
        user_id: "u".to_owned(),
        drawing_id: "s1".to_owned(),
    };
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value["event"], "undo-canvas");
    assert_eq!(value["payload"]["drawingId"], "s1");
    assert_eq!(value["payload"]["userId"], "u");
}

#[test]
fn canvas_clear_has_no_payload() {
    let value = serde_json::to_value(ServerMessage::CanvasClear).unwrap();
    assert_eq!(value, json!({"event": "canvas-clear"}));
    let back: ServerMessage = serde_json::from_value(value).unwrap();
    assert_eq!(back, ServerMessage::CanvasClear);
}

#[test]
fn drawing_data_payload_is_the_stroke_itself() {
    let stroke = DrawingData::new("s1", "r", "u", &StrokeStyle::default(), Point::new(1.0, 1.0), 7);
    let value = serde_json::to_value(ClientMessage::DrawingData(stroke)).unwrap();
    assert_eq!(value["event"], "drawing-data");
    assert_eq!(value["payload"]["id"], "s1");
    assert_eq!(value["payload"]["tool"], "pen");
}

#[test]
fn event_names_match_serialized_tags() {
    let stroke = DrawingData::new("s1", "r", "u", &StrokeStyle::default(), Point::new(0.0, 0.0), 1);
    let client = [
        ClientMessage::JoinRoom { room_id: "r".into(), user: UserRecord::new("u", "#000") },
        ClientMessage::LeaveRoom { room_id: "r".into(), user_id: "u".into() },
        ClientMessage::DrawingData(stroke.clone()),
        ClientMessage::UserCursor { room_id: "r".into(), user_id: "u".into(), point: Point::new(0.0, 0.0) },
        ClientMessage::ClearCanvas { room_id: "r".into() },
        ClientMessage::UndoCanvas { room_id: "r".into(), user_id: "u".into(), drawing_id: "s1".into() },
        ClientMessage::RedoCanvas { room_id: "r".into(), user_id: "u".into(), drawing_id: "s1".into() },
    ];
    for msg in &client {
        let value = serde_json::to_value(msg).unwrap();
        assert_eq!(value["event"], msg.event());
        assert_eq!(msg.room_id(), "r");
    }

    let server = [
        ServerMessage::RoomJoined { room_id: "r".into(), users: vec![] },
        ServerMessage::error("nope"),
        ServerMessage::UserJoined { user: UserRecord::new("u", "#000") },
        ServerMessage::UserLeft { user_id: "u".into() },
        ServerMessage::UserCursor { user_id: "u".into(), point: Point::new(0.0, 0.0) },
        ServerMessage::DrawingData(stroke),
        ServerMessage::CanvasClear,
        ServerMessage::CanvasUndo { user_id: "u".into(), drawing_id: "s1".into() },
        ServerMessage::CanvasRedo { user_id: "u".into(), drawing_id: "s1".into() },
    ];
    for msg in &server {
        let value = serde_json::to_value(msg).unwrap();
        assert_eq!(value["event"], msg.event());
    }
}

#[test]
fn unknown_event_is_rejected() {
    let raw = json!({"event": "draw-everything", "payload": {}});
    assert!(serde_json::from_value::<ClientMessage>(raw).is_err());
}

#[test]
fn mismatched_payload_is_rejected() {
    let raw = json!({"event": "clear-canvas", "payload": {"userId": "u"}});
    assert!(serde_json::from_value::<ClientMessage>(raw).is_err());
}

#[test]
fn user_record_cursor_is_optional() {
    let mut user = UserRecord::new("u", "#123456");
    assert!(serde_json::to_value(&user).unwrap().get("cursor").is_none());
    user.cursor = Some(Point::new(3.0, 4.0));
    let value = serde_json::to_value(&user).unwrap();
    assert_eq!(value["cursor"]["x"], 3.0);
    let tool: Tool = serde_json::from_value(json!("circle")).unwrap();
    assert!(tool.is_endpoint_shape());
}
