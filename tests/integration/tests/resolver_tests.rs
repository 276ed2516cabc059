//! Room Resolver Integration Tests
//!
//! Runs the room lookup against a mock HTTP server.
//!
//! Run with: cargo test -p integration-tests --test resolver_tests

use danmu_client::connection::Session;
use danmu_client::protocol::OpCode;
use danmu_client::{ResolveError, RoomResolver};
use danmu_common::{AppError, ResolverConfig};
use integration_tests::{fixtures::*, test_session_config, ChannelSink, MockBroadcastServer};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn resolver_for(server: &MockServer) -> RoomResolver {
    let config = ResolverConfig {
        room_init_url: format!("{}/room/v1/Room/room_init?id=", server.uri()),
        timeout_secs: 5,
    };
    RoomResolver::new(&config).unwrap()
}

#[tokio::test]
async fn test_resolve_short_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/room/v1/Room/room_init"))
        .and(query_param("id", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(room_init_body(23058)))
        .expect(1)
        .mount(&server)
        .await;

    let room_id = resolver_for(&server).resolve(3).await.unwrap();
    assert_eq!(room_id.into_inner(), 23058);
}

#[tokio::test]
async fn test_resolve_missing_room_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 60004,
            "msg": "room not found",
            "data": {}
        })))
        .mount(&server)
        .await;

    let err = resolver_for(&server).resolve(99).await.unwrap_err();
    assert!(matches!(err, ResolveError::MissingRoomId));
}

#[tokio::test]
async fn test_resolve_http_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = resolver_for(&server).resolve(1).await.unwrap_err();
    assert!(matches!(err, ResolveError::Status(503)));

    let app: AppError = err.into();
    assert_eq!(app.error_code(), "RESOLVE_ERROR");
    assert!(app.is_startup_error());
}

#[tokio::test]
async fn test_resolve_non_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = resolver_for(&server).resolve(1).await.unwrap_err();
    assert!(matches!(err, ResolveError::Http(_)));
}

#[tokio::test]
async fn test_resolved_id_is_used_for_auth() {
    let http = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("id", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(room_init_body(23058)))
        .mount(&http)
        .await;

    let room_id = resolver_for(&http).resolve(3).await.unwrap();

    let mut server = MockBroadcastServer::start().await.unwrap();
    let (sink, _events) = ChannelSink::pair();
    let session = Session::builder(room_id)
        .url(server.url())
        .config(test_session_config())
        .sink(sink)
        .connect()
        .await
        .unwrap();

    let auth = server.next_frame().await.unwrap().expect("auth frame");
    assert_eq!(auth.opcode(), Some(OpCode::Auth));
    let body: serde_json::Value = serde_json::from_slice(auth.payload()).unwrap();
    assert_eq!(body["roomid"], 23058);

    session.closer().close();
    session.run().await.unwrap();
}
