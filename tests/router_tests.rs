//! Router integration tests
//!
//! Drive the axum router directly with `oneshot`, no sockets involved.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use futures::stream;
use http_body_util::BodyExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tower::util::ServiceExt;

use frame_relay::broadcast::{ViewerHandle, ViewerMessage};
use frame_relay::protocol::encode_frame;
use frame_relay::registry::{ClientId, StreamKind};
use frame_relay::server::{build_router, AppState};
use frame_relay::{Relay, ServerConfig};

fn app_with(config: ServerConfig) -> (Router, Arc<Relay>) {
    let relay = Arc::new(Relay::with_queue_capacity(config.viewer_queue_capacity));
    let router = build_router(AppState::new(Arc::clone(&relay), config));
    (router, relay)
}

fn app() -> (Router, Arc<Relay>) {
    app_with(ServerConfig::default())
}

fn upload(uri: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(body)
        .expect("Failed to build request")
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

fn drain(viewer: &mut ViewerHandle) -> Vec<ViewerMessage> {
    let mut out = Vec::new();
    while let Some(text) = viewer.try_recv() {
        out.push(serde_json::from_str(&text).expect("Invalid viewer envelope"));
    }
    out
}

fn wire(frames: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::new();
    for frame in frames {
        out.extend_from_slice(&encode_frame(frame).unwrap());
    }
    out
}

#[tokio::test]
async fn test_upload_relays_frames_and_presence() {
    let (app, relay) = app();
    let mut viewer = relay.subscribe();
    assert!(matches!(
        drain(&mut viewer).as_slice(),
        [ViewerMessage::Streams { streams }] if streams.is_empty()
    ));

    let response = app
        .oneshot(upload(
            "/stream/screen?clientId=abc",
            Body::from(wire(&[b"first", b"", b"third"])),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.is_empty());

    let messages = drain(&mut viewer);
    assert_eq!(messages.len(), 5);
    match &messages[0] {
        ViewerMessage::Streams { streams } => {
            assert_eq!(streams.len(), 1);
            assert_eq!(streams[0].client_id.as_str(), "abc");
            assert!(streams[0].has_screen);
            assert!(!streams[0].has_webcam);
        }
        other => panic!("expected presence, got {:?}", other),
    }
    assert_eq!(messages[1].frame_payload(), Some(b"first".to_vec()));
    assert_eq!(messages[2].frame_payload(), Some(Vec::new()));
    assert_eq!(messages[3].frame_payload(), Some(b"third".to_vec()));
    assert!(matches!(&messages[4], ViewerMessage::Streams { streams } if streams.is_empty()));

    assert!(relay.presence().is_empty());
}

#[tokio::test]
async fn test_frame_envelope_fields() {
    let (app, relay) = app();
    let mut viewer = relay.subscribe();
    drain(&mut viewer);

    app.oneshot(upload("/stream/webcam?clientId=cam-1", Body::from(wire(&[b"hi"]))))
        .await
        .unwrap();

    let raw = {
        let _presence = viewer.try_recv().unwrap();
        viewer.try_recv().unwrap()
    };
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["type"], "frame");
    assert_eq!(json["clientId"], "cam-1");
    assert_eq!(json["streamType"], "webcam");
    assert_eq!(json["data"], "aGk=");
}

#[tokio::test]
async fn test_missing_client_id_is_rejected() {
    let (app, relay) = app();
    let mut viewer = relay.subscribe();
    drain(&mut viewer);

    let response = app
        .oneshot(upload("/stream/screen", Body::from(wire(&[b"x"]))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Missing clientId");
    assert!(drain(&mut viewer).is_empty());
    assert_eq!(relay.stats().total_producer_sessions, 0);
}

#[tokio::test]
async fn test_empty_client_id_is_rejected() {
    let (app, _relay) = app();

    let response = app
        .oneshot(upload("/stream/webcam?clientId=", Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "clientId must not be empty");
}

#[tokio::test]
async fn test_unknown_stream_kind_is_rejected() {
    let (app, relay) = app();
    let mut viewer = relay.subscribe();
    drain(&mut viewer);

    let response = app
        .oneshot(upload("/stream/audio?clientId=abc", Body::from(wire(&[b"x"]))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Unknown stream type: audio");
    assert!(drain(&mut viewer).is_empty());
}

#[tokio::test]
async fn test_upload_requires_post() {
    let (app, _relay) = app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/stream/screen?clientId=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_transport_error_deregisters() {
    let (app, relay) = app();
    let chunks: Vec<Result<Bytes, io::Error>> = vec![
        Ok(encode_frame(b"ok").unwrap()),
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
    ];

    let response = app
        .oneshot(upload(
            "/stream/screen?clientId=abc",
            Body::from_stream(stream::iter(chunks)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(relay.presence().is_empty());
}

#[tokio::test]
async fn test_streaming_body_keeps_stream_live() {
    let (app, relay) = app();
    let client = ClientId::new("live").unwrap();
    let (tx, rx) = mpsc::channel::<Result<Bytes, io::Error>>(4);

    let request = tokio::spawn(app.oneshot(upload(
        "/stream/webcam?clientId=live",
        Body::from_stream(ReceiverStream::new(rx)),
    )));

    // Length prefix split across two chunks
    let frame = encode_frame(b"hello").unwrap();
    tx.send(Ok(frame.slice(..2))).await.unwrap();
    while !relay.is_active(&client, StreamKind::Webcam) {
        tokio::task::yield_now().await;
    }
    let mut viewer = relay.subscribe();
    drain(&mut viewer);

    tx.send(Ok(frame.slice(2..))).await.unwrap();
    let text = viewer.recv().await.unwrap();
    let message: ViewerMessage = serde_json::from_str(&text).unwrap();
    assert_eq!(message.frame_payload(), Some(b"hello".to_vec()));

    drop(tx);
    let response = request.await.unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!relay.is_active(&client, StreamKind::Webcam));
}

#[tokio::test]
async fn test_connection_limit_returns_503() {
    let (app, relay) = app_with(ServerConfig::default().max_connections(1));
    let first_client = ClientId::new("first").unwrap();
    let (tx, rx) = mpsc::channel::<Result<Bytes, io::Error>>(1);

    let first = tokio::spawn(app.clone().oneshot(upload(
        "/stream/screen?clientId=first",
        Body::from_stream(ReceiverStream::new(rx)),
    )));
    while !relay.is_active(&first_client, StreamKind::Screen) {
        tokio::task::yield_now().await;
    }

    let second = app
        .clone()
        .oneshot(upload("/stream/screen?clientId=second", Body::empty()))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::SERVICE_UNAVAILABLE);

    drop(tx);
    assert_eq!(first.await.unwrap().unwrap().status(), StatusCode::OK);

    // Permit is released once the first upload ends
    let third = app
        .oneshot(upload("/stream/screen?clientId=third", Body::empty()))
        .await
        .unwrap();
    assert_eq!(third.status(), StatusCode::OK);
}

#[tokio::test(start_paused = true)]
async fn test_idle_timeout_returns_408() {
    let (app, relay) =
        app_with(ServerConfig::default().idle_timeout(Duration::from_secs(5)));
    let (_tx, rx) = mpsc::channel::<Result<Bytes, io::Error>>(1);

    let response = app
        .oneshot(upload(
            "/stream/screen?clientId=quiet",
            Body::from_stream(ReceiverStream::new(rx)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body_text(response).await, "Idle timeout");
    assert!(relay.presence().is_empty());
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _relay) = app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
}

#[tokio::test]
async fn test_stats_endpoint() {
    let (app, relay) = app();
    let _viewer = relay.subscribe();

    app.clone()
        .oneshot(upload("/stream/screen?clientId=abc", Body::from(wire(&[b"a", b"b"]))))
        .await
        .unwrap();

    let response = app
        .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["activeProducers"], 0);
    assert_eq!(json["totalProducerSessions"], 1);
    assert_eq!(json["viewers"], 1);
    assert_eq!(json["framesPublished"], 2);
    assert_eq!(json["slowViewersDropped"], 0);
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let (app, _relay) = app();

    let response = app
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
