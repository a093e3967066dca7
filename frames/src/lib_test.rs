use super::*;
use prost::Message as _;

fn sample_stroke() -> DrawingData {
    let mut stroke = DrawingData::new(
        "stroke-1",
        "abc123",
        "alice",
        &StrokeStyle { tool: Tool::Marker, color: "#00ff00".to_owned(), line_width: 3.5, opacity: 0.75, hardness: None },
        Point::with_pressure(1.25, 2.5, 0.3),
        1_700_000_000_123,
    );
    stroke.points.push(Point::new(4.0, 8.0));
    stroke.points.push(Point::new(-3.5, 0.0));
    stroke
}

#[test]
fn now_ms_is_positive() {
    assert!(now_ms() > 0);
}

#[test]
fn json_round_trip_preserves_client_message() {
    let msg = ClientMessage::DrawingData(sample_stroke());
    let text = to_json(&msg).expect("encode");
    let back: ClientMessage = from_json(&text).expect("decode");
    assert_eq!(back, msg);
}

#[test]
fn protobuf_round_trip_preserves_full_stroke() {
    let msg = ServerMessage::DrawingData(sample_stroke());
    let bytes = encode_message(&msg).expect("encode");
    assert!(!bytes.is_empty());
    let back: ServerMessage = decode_message(&bytes).expect("decode");
    assert_eq!(back, msg);
}

#[test]
fn protobuf_round_trip_keeps_integer_fields() {
    let inc = sample_stroke().incremental_since(2);
    let msg = ServerMessage::DrawingData(inc);
    let bytes = encode_message(&msg).expect("encode");
    let ServerMessage::DrawingData(back) = decode_message::<ServerMessage>(&bytes).expect("decode") else {
        panic!("expected drawing-data");
    };
    assert_eq!(back.base_point_count, Some(2));
    assert_eq!(back.timestamp, 1_700_000_000_123);
    assert!(back.is_incremental);
    assert_eq!(back.points.len(), 1);
}

#[test]
fn protobuf_round_trip_unit_variant() {
    let bytes = encode_message(&ServerMessage::CanvasClear).expect("encode");
    let back: ServerMessage = decode_message(&bytes).expect("decode");
    assert_eq!(back, ServerMessage::CanvasClear);
}

#[test]
fn encode_rejects_untagged_values() {
    let err = encode_message(&serde_json::json!({"no": "event"})).expect_err("should fail");
    assert!(matches!(err, CodecError::MissingEvent));
}

#[test]
fn decode_rejects_malformed_bytes() {
    let err = decode_message::<ClientMessage>(&[0xff, 0x00, 0x01]).expect_err("bytes should fail");
    assert!(matches!(err, CodecError::Decode(_)));
}

#[test]
fn decode_rejects_unknown_event() {
    let wire = WireFrame {
        event: "paint-everything".to_owned(),
        ts: 1,
        payload: Some(json_to_proto_value(&serde_json::json!({}))),
    };
    let mut bytes = Vec::new();
    wire.encode(&mut bytes).expect("encode");
    let err = decode_message::<ClientMessage>(&bytes).expect_err("event should fail");
    assert!(matches!(err, CodecError::Json(_)));
}

#[test]
fn decode_rejects_empty_event() {
    let wire = WireFrame { event: String::new(), ts: 1, payload: None };
    let mut bytes = Vec::new();
    wire.encode(&mut bytes).expect("encode");
    let err = decode_message::<ClientMessage>(&bytes).expect_err("empty event should fail");
    assert!(matches!(err, CodecError::MissingEvent));
}

#[test]
fn number_value_restores_integers_and_keeps_fractions() {
    assert_eq!(number_value(3.0), serde_json::json!(3));
    assert_eq!(number_value(-2.5), serde_json::json!(-2.5));
    assert_eq!(number_value(f64::NAN), serde_json::Value::Null);
}
