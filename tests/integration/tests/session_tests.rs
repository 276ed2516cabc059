//! Session Integration Tests
//!
//! Runs a real client session against the in-process broadcast server.
//!
//! Run with: cargo test -p integration-tests --test session_tests

use std::time::Duration;

use danmu_client::connection::{Session, SessionError, SessionState, SessionStatus};
use danmu_client::protocol::{encode, FrameError, OpCode};
use danmu_core::{EventSink, LiveEvent};
use integration_tests::{fixtures::*, ChannelSink, MockBroadcastServer, RunningSession};

// ============================================================================
// Handshake
// ============================================================================

#[tokio::test]
async fn test_auth_frame_is_sent_first() {
    let mut server = MockBroadcastServer::start().await.unwrap();
    let (sink, _events) = ChannelSink::pair();
    let session = RunningSession::start(&server, test_room(), sink).await.unwrap();

    let auth = server.next_frame().await.unwrap().expect("auth frame");
    assert_eq!(auth.opcode(), Some(OpCode::Auth));
    assert_eq!(auth.header_size, 16);
    assert_eq!(auth.protocol_version, 1);
    assert_eq!(auth.sequence, 1);
    assert_eq!(
        auth.payload(),
        br#"{"uid":0,"roomid":12345,"protover":1,"platform":"web","clientver":"1.4.0"}"#
    );
    assert_eq!(session.status.get(), SessionState::Live);

    session.closer.close();
    session.finish().await.unwrap().unwrap();
}

#[tokio::test]
async fn test_dial_failure_marks_failed() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (sink, _events) = ChannelSink::pair();
    let status = SessionStatus::new();
    let result = Session::builder(test_room())
        .url(format!("ws://{addr}"))
        .sink(sink)
        .status(status.clone())
        .connect()
        .await;

    assert!(matches!(result, Err(SessionError::Transport(_))));
    assert_eq!(status.get(), SessionState::Failed);
}

// ============================================================================
// Event delivery
// ============================================================================

#[tokio::test]
async fn test_chat_and_gift_reach_sink() {
    let mut server = MockBroadcastServer::start().await.unwrap();
    let (sink, mut events) = ChannelSink::pair();
    let session = RunningSession::start(&server, test_room(), sink).await.unwrap();
    server.next_frame().await.unwrap();

    server
        .send_frame(OpCode::Command, &danmaku_command("alice", "hello world"))
        .unwrap();
    assert_eq!(
        events.next().await.unwrap(),
        LiveEvent::Danmaku {
            sender: "alice".to_string(),
            text: "hello world".to_string(),
        }
    );

    server
        .send_frame(OpCode::Command, &gift_command("bob", "辣条", 10))
        .unwrap();
    assert_eq!(
        events.next().await.unwrap(),
        LiveEvent::Gift {
            sender: "bob".to_string(),
            action: "投喂".to_string(),
            gift: "辣条".to_string(),
            quantity: 10,
        }
    );

    session.closer.close();
    session.finish().await.unwrap().unwrap();
}

#[tokio::test]
async fn test_popularity_and_packed_frames() {
    let mut server = MockBroadcastServer::start().await.unwrap();
    let (sink, mut events) = ChannelSink::pair();
    let session = RunningSession::start(&server, test_room(), sink).await.unwrap();
    server.next_frame().await.unwrap();

    server.send_frame(OpCode::Popularity, &[0, 0, 0, 0x2A]).unwrap();
    assert_eq!(events.next().await.unwrap(), LiveEvent::Popularity { count: 42 });

    // Two frames in one WebSocket message
    let mut packed = encode(OpCode::Popularity, &7u32.to_be_bytes()).unwrap().to_vec();
    packed.extend_from_slice(&encode(OpCode::Popularity, &8u32.to_be_bytes()).unwrap());
    server.send_raw(packed).unwrap();

    assert_eq!(events.next().await.unwrap(), LiveEvent::Popularity { count: 7 });
    assert_eq!(events.next().await.unwrap(), LiveEvent::Popularity { count: 8 });

    session.closer.close();
    session.finish().await.unwrap().unwrap();
}

#[tokio::test]
async fn test_unknown_and_suppressed_commands() {
    let mut server = MockBroadcastServer::start().await.unwrap();
    let (sink, mut events) = ChannelSink::pair();
    let session = RunningSession::start(&server, test_room(), sink).await.unwrap();
    server.next_frame().await.unwrap();

    let welcome = command("WELCOME", serde_json::json!({ "uname": "carol" }));
    let unknown = command("GUARD_BUY", serde_json::json!({ "num": 1 }));
    server.send_frame(OpCode::Command, &welcome).unwrap();
    server.send_frame(OpCode::Command, b"not json").unwrap();
    server.send_frame(OpCode::Command, &unknown).unwrap();

    assert_eq!(
        events.next().await.unwrap(),
        LiveEvent::UnknownCommand {
            cmd: "GUARD_BUY".to_string(),
            raw: String::from_utf8(unknown).unwrap(),
        }
    );

    session.closer.close();
    session.finish().await.unwrap().unwrap();
    assert!(events.drain().is_empty());
}

// ============================================================================
// Heartbeat
// ============================================================================

#[tokio::test]
async fn test_heartbeat_echo_triggers_one_extra_heartbeat() {
    let mut server = MockBroadcastServer::start().await.unwrap();
    let (sink, _events) = ChannelSink::pair();
    let session = RunningSession::start(&server, test_room(), sink).await.unwrap();
    server.next_frame().await.unwrap();

    server.send_frame(OpCode::HeartbeatRecv, b"").unwrap();

    let beat = server.next_frame().await.unwrap().expect("heartbeat");
    assert_eq!(beat.opcode(), Some(OpCode::HeartbeatSend));
    assert_eq!(beat.payload(), b"{}");
    server
        .expect_silence(Duration::from_millis(300))
        .await
        .unwrap();

    session.closer.close();
    session.finish().await.unwrap().unwrap();
}

#[tokio::test]
async fn test_periodic_heartbeat() {
    let mut server = MockBroadcastServer::start().await.unwrap();
    let sink: std::sync::Arc<dyn EventSink> = std::sync::Arc::new(|_: LiveEvent| {});
    let config = danmu_common::SessionConfig {
        heartbeat_interval_secs: 1,
        ..danmu_common::SessionConfig::default()
    };
    let session = RunningSession::start_with_config(&server, test_room(), sink, config)
        .await
        .unwrap();
    server.next_frame().await.unwrap();

    let beat = server.next_frame().await.unwrap().expect("heartbeat");
    assert_eq!(beat.opcode(), Some(OpCode::HeartbeatSend));

    session.closer.close();
    session.finish().await.unwrap().unwrap();
}

// ============================================================================
// Teardown
// ============================================================================

#[tokio::test]
async fn test_malformed_frame_fails_session() {
    let mut server = MockBroadcastServer::start().await.unwrap();
    let (sink, _events) = ChannelSink::pair();
    let session = RunningSession::start(&server, test_room(), sink).await.unwrap();
    server.next_frame().await.unwrap();

    // total_size 4 is smaller than the header
    server
        .send_raw(vec![0, 0, 0, 4, 0, 16, 0, 1, 0, 0, 0, 5, 0, 0, 0, 1])
        .unwrap();

    let status = session.status.clone();
    let result = session.finish().await.unwrap();
    assert!(matches!(
        result,
        Err(SessionError::Frame(FrameError::MalformedFrame(_)))
    ));
    assert_eq!(status.get(), SessionState::Failed);
}

#[tokio::test]
async fn test_server_close_fails_session() {
    let mut server = MockBroadcastServer::start().await.unwrap();
    let (sink, _events) = ChannelSink::pair();
    let session = RunningSession::start(&server, test_room(), sink).await.unwrap();
    server.next_frame().await.unwrap();

    server.close().unwrap();

    let status = session.status.clone();
    let result = session.finish().await.unwrap();
    assert!(matches!(result, Err(SessionError::Transport(_))));
    assert_eq!(status.get(), SessionState::Failed);
}

#[tokio::test]
async fn test_dropped_connection_fails_session() {
    let mut server = MockBroadcastServer::start().await.unwrap();
    let (sink, _events) = ChannelSink::pair();
    let session = RunningSession::start(&server, test_room(), sink).await.unwrap();
    server.next_frame().await.unwrap();

    server.disconnect().unwrap();

    let status = session.status.clone();
    let result = session.finish().await.unwrap();
    assert!(result.unwrap_err().is_transport());
    assert_eq!(status.get(), SessionState::Failed);
}

#[tokio::test]
async fn test_graceful_close() {
    let mut server = MockBroadcastServer::start().await.unwrap();
    let (sink, mut events) = ChannelSink::pair();
    let session = RunningSession::start(&server, test_room(), sink).await.unwrap();
    server.next_frame().await.unwrap();

    server
        .send_frame(OpCode::Command, &danmaku_command("dave", "bye"))
        .unwrap();
    events.next().await.unwrap();

    session.closer.close();
    assert!(session.closer.is_closed());

    let status = session.status.clone();
    session.finish().await.unwrap().unwrap();
    assert_eq!(status.get(), SessionState::Closed);

    // The server sees the close frame and no further traffic
    assert!(server.next_frame().await.unwrap().is_none());
}
