//! Integration tests for live list views over WebSocket
//!
//! These tests spin up a real HTTP+WebSocket server and verify the full
//! flow: connect → initial view → store mutation → new view pushed.

mod common;

use common::{ADMIN_EMAIL, ADMIN_PASSWORD, USER_EMAIL, USER_PASSWORD, build_host, test_config};
use exam_portal::core::record::Fields;
use exam_portal::server::{ServerBuilder, ServerHost};
use exam_portal::storage::InMemoryRecordStore;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;
type WsWrite = futures_util::stream::SplitSink<WsStream, Message>;
type WsRead = futures_util::stream::SplitStream<WsStream>;

/// Helper: start a test server and return (address, host, admin token)
async fn start_test_server() -> (SocketAddr, Arc<ServerHost>, String) {
    let host = build_host().await;
    let admin = host
        .identity
        .sign_in(ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .unwrap()
        .token;

    let app = ServerBuilder::router(host.clone(), vec![]).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Small delay to let the server start
    tokio::time::sleep(Duration::from_millis(50)).await;

    (addr, host, admin)
}

/// Helper: open a live view and return its first `view` message + stream
async fn ws_connect(addr: SocketAddr, collection: &str, token: &str) -> (Value, WsWrite, WsRead) {
    let url = format!("ws://{}/ws/{}?token={}", addr, collection, token);
    let (ws_stream, _) = connect_async(&url).await.expect("Failed to connect");
    let (write, mut read) = ws_stream.split();

    let initial = ws_recv(&mut read).await;
    assert_eq!(initial["type"], "view");
    assert_eq!(initial["collection"], collection);

    (initial, write, read)
}

/// Helper: send a JSON message over WS
async fn ws_send(write: &mut WsWrite, msg: &Value) {
    let text = serde_json::to_string(msg).unwrap();
    write.send(Message::Text(text.into())).await.unwrap();
}

/// Helper: receive next JSON message from WS (with timeout)
async fn ws_recv(read: &mut WsRead) -> Value {
    let msg = timeout(Duration::from_secs(2), read.next())
        .await
        .expect("Timeout waiting for WS message")
        .expect("Stream ended")
        .expect("WS error");

    match msg {
        Message::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("Expected text message, got {:?}", other),
    }
}

fn exam_fields(title: &str) -> Fields {
    serde_json::from_value(json!({
        "title": title,
        "description": "Live exam",
        "examDate": "2030-01-01",
    }))
    .unwrap()
}

fn titles(view: &Value) -> Vec<String> {
    view["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["title"].as_str().unwrap().to_string())
        .collect()
}

// === Tests ===

#[tokio::test]
async fn test_ws_initial_view() {
    let (addr, host, admin) = start_test_server().await;
    host.store.create("exams", exam_fields("Physics")).await.unwrap();

    let (initial, _write, _read) = ws_connect(addr, "exams", &admin).await;

    assert_eq!(initial["filter"], "");
    assert_eq!(initial["sort"], "newest");
    assert_eq!(initial["status"], "all");
    assert_eq!(titles(&initial), vec!["Physics"]);
    assert_eq!(initial["data"][0]["formattedDate"], "01/01/2030");
    assert_eq!(initial["pagination"]["page_size"], 10);
}

#[tokio::test]
async fn test_ws_mutation_pushes_new_view() {
    let (addr, host, admin) = start_test_server().await;
    let (initial, _write, mut read) = ws_connect(addr, "exams", &admin).await;
    assert!(titles(&initial).is_empty());

    host.store.create("exams", exam_fields("Physics")).await.unwrap();
    let view = ws_recv(&mut read).await;
    assert_eq!(view["type"], "view");
    assert_eq!(titles(&view), vec!["Physics"]);

    host.store.create("exams", exam_fields("Chemistry")).await.unwrap();
    let view = ws_recv(&mut read).await;
    assert_eq!(titles(&view), vec!["Chemistry", "Physics"]);
}

#[tokio::test]
async fn test_ws_view_state_messages() {
    let (addr, host, admin) = start_test_server().await;
    for title in ["Physics", "Chemistry", "Biology"] {
        host.store.create("exams", exam_fields(title)).await.unwrap();
    }
    let (_initial, mut write, mut read) = ws_connect(addr, "exams", &admin).await;

    ws_send(&mut write, &json!({"type": "set_filter", "text": "  CHEM "})).await;
    let view = ws_recv(&mut read).await;
    assert_eq!(view["filter"], "  CHEM ");
    assert_eq!(titles(&view), vec!["Chemistry"]);

    ws_send(&mut write, &json!({"type": "set_filter", "text": ""})).await;
    ws_recv(&mut read).await;

    ws_send(&mut write, &json!({"type": "set_sort", "sort": "titleAsc"})).await;
    let view = ws_recv(&mut read).await;
    assert_eq!(view["sort"], "titleAsc");
    assert_eq!(titles(&view), vec!["Biology", "Chemistry", "Physics"]);

    // Filter changes stay applied when the snapshot changes
    ws_send(&mut write, &json!({"type": "set_filter", "text": "og"})).await;
    ws_recv(&mut read).await;
    host.store.create("exams", exam_fields("Geography")).await.unwrap();
    let view = ws_recv(&mut read).await;
    assert_eq!(titles(&view), vec!["Biology", "Geography"]);
}

#[tokio::test]
async fn test_ws_rejected_page_size() {
    let (addr, _host, admin) = start_test_server().await;
    let (_initial, mut write, mut read) = ws_connect(addr, "exams", &admin).await;

    ws_send(&mut write, &json!({"type": "set_page_size", "page_size": 7})).await;
    let error = ws_recv(&mut read).await;
    assert_eq!(error["type"], "error");
    assert!(error["message"].as_str().unwrap().contains("Page size must be one of"));

    ws_send(&mut write, &json!({"type": "set_page_size", "page_size": 25})).await;
    let view = ws_recv(&mut read).await;
    assert_eq!(view["pagination"]["page_size"], 25);
}

#[tokio::test]
async fn test_ws_ping_pong() {
    let (addr, _host, admin) = start_test_server().await;
    let (_initial, mut write, mut read) = ws_connect(addr, "exams", &admin).await;

    ws_send(&mut write, &json!({"type": "ping"})).await;
    let pong = ws_recv(&mut read).await;
    assert_eq!(pong["type"], "pong");
}

#[tokio::test]
async fn test_ws_invalid_message() {
    let (addr, _host, admin) = start_test_server().await;
    let (_initial, mut write, mut read) = ws_connect(addr, "exams", &admin).await;

    ws_send(&mut write, &json!({"type": "subscribe"})).await;
    let error = ws_recv(&mut read).await;
    assert_eq!(error["type"], "error");
    assert!(error["message"].as_str().unwrap().starts_with("Invalid message"));
}

#[tokio::test]
async fn test_ws_banner_status_filter() {
    let (addr, host, admin) = start_test_server().await;
    for (title, active) in [("Admissions", true), ("Results", false)] {
        let fields: Fields =
            serde_json::from_value(json!({ "title": title, "isActive": active })).unwrap();
        host.store.create("banners", fields).await.unwrap();
    }
    let (initial, mut write, mut read) = ws_connect(addr, "banners", &admin).await;
    assert_eq!(titles(&initial).len(), 2);

    ws_send(&mut write, &json!({"type": "set_status", "status": "inactive"})).await;
    let view = ws_recv(&mut read).await;
    assert_eq!(view["status"], "inactive");
    assert_eq!(titles(&view), vec!["Results"]);
}

#[tokio::test]
async fn test_ws_requires_admin() {
    let (addr, host, _admin) = start_test_server().await;

    let anonymous = connect_async(format!("ws://{}/ws/exams", addr)).await;
    assert!(anonymous.is_err());

    let user = host
        .identity
        .sign_up(USER_EMAIL, USER_PASSWORD, None)
        .await
        .unwrap();
    host.write_profile(user.user_id, USER_EMAIL, None, exam_portal::core::auth::Role::User)
        .await
        .unwrap();
    let as_user = connect_async(format!("ws://{}/ws/exams?token={}", addr, user.token)).await;
    assert!(as_user.is_err());
}

#[tokio::test]
async fn test_ws_unknown_collection() {
    let (addr, _host, admin) = start_test_server().await;

    let result = connect_async(format!("ws://{}/ws/unicorns?token={}", addr, admin)).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_ws_close_unsubscribes() {
    let store = InMemoryRecordStore::new();
    let feed = store.feed().clone();
    let host = ServerBuilder::new()
        .with_config(test_config())
        .with_record_store(store)
        .in_memory()
        .build_host()
        .unwrap();
    let host = Arc::new(host);
    host.seed_admins().await.unwrap();
    let admin = host
        .identity
        .sign_in(ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .unwrap()
        .token;

    let app = ServerBuilder::router(host.clone(), vec![]).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let (_initial, mut write, _read) = ws_connect(addr, "exams", &admin).await;
    assert_eq!(feed.subscriber_count("exams"), 1);

    write.send(Message::Close(None)).await.unwrap();

    let mut remaining = feed.subscriber_count("exams");
    for _ in 0..40 {
        if remaining == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
        remaining = feed.subscriber_count("exams");
    }
    assert_eq!(remaining, 0);
}
