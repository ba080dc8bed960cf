use super::*;
use cryoflow_core::{InputMode, ProjectId, SessionConfig, SessionId, UserId};
use std::io::Cursor;

#[test]
fn request_round_trips_through_json() {
    let req = Request::Create {
        project_id: ProjectId::new("proj-1"),
        user_id: UserId::new("alice"),
        session_name: "grid-1".into(),
        input_mode: InputMode::Watch,
        watch_directory: PathBuf::from("/data/grid-1"),
        file_pattern: "*.tiff".into(),
        config: SessionConfig::default(),
    };
    let bytes = encode(&req).expect("encode");
    let decoded: Request = decode(&bytes).expect("decode");
    match decoded {
        Request::Create { session_name, .. } => assert_eq!(session_name, "grid-1"),
        other => panic!("unexpected request: {other:?}"),
    }
}

#[test]
fn response_error_round_trips() {
    let resp = Response::Error { message: "session not found".into() };
    let bytes = encode(&resp).expect("encode");
    let decoded: Response = decode(&bytes).expect("decode");
    match decoded {
        Response::Error { message } => assert_eq!(message, "session not found"),
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn write_then_read_message_preserves_bytes() {
    let mut buf = Vec::new();
    write_message(&mut buf, b"hello").await.expect("write");
    let mut cursor = Cursor::new(buf);
    let got = read_message(&mut cursor).await.expect("read");
    assert_eq!(got, b"hello");
}

#[tokio::test]
async fn read_message_on_empty_stream_reports_connection_closed() {
    let mut cursor = Cursor::new(Vec::<u8>::new());
    let err = read_message(&mut cursor).await.unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionClosed));
}

#[tokio::test]
async fn read_message_rejects_an_oversized_length_prefix() {
    let mut buf = Vec::new();
    buf.extend_from_slice(&((MAX_MESSAGE_SIZE as u32) + 1).to_be_bytes());
    let mut cursor = Cursor::new(buf);
    let err = read_message(&mut cursor).await.unwrap_err();
    assert!(matches!(err, ProtocolError::MessageTooLarge { .. }));
}

#[tokio::test]
async fn write_then_read_request_round_trips_over_a_stream() {
    let mut buf = Vec::new();
    let req = Request::Get { session_id: SessionId::new("sess-1") };
    let data = encode(&req).expect("encode");
    write_message(&mut buf, &data).await.expect("write");

    let mut cursor = Cursor::new(buf);
    let decoded = read_request(&mut cursor, DEFAULT_TIMEOUT).await.expect("read_request");
    match decoded {
        Request::Get { session_id } => assert_eq!(session_id, SessionId::new("sess-1")),
        other => panic!("unexpected request: {other:?}"),
    }
}

#[tokio::test]
async fn write_response_then_read_message_round_trips() {
    let mut buf = Vec::new();
    let resp = Response::Ok;
    write_response(&mut buf, &resp, DEFAULT_TIMEOUT).await.expect("write_response");
    let mut cursor = Cursor::new(buf);
    let bytes = read_message(&mut cursor).await.expect("read");
    let decoded: Response = decode(&bytes).expect("decode");
    assert!(matches!(decoded, Response::Ok));
}
