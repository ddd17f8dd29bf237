mod common;

use std::time::Duration;

use common::TestServer;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

async fn connect(server: &TestServer, name: &str) -> WsStream {
    let (ws, _) = connect_async(server.ws_url(name)).await.unwrap();
    ws
}

/// Next text frame as JSON, skipping control frames.
async fn next_json(ws: &mut WsStream) -> Value {
    loop {
        let msg = timeout(WAIT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

/// True once the server has closed the connection.
async fn closed(ws: &mut WsStream) -> bool {
    loop {
        match timeout(WAIT, ws.next()).await {
            Err(_) => return false,
            Ok(None) | Ok(Some(Err(_))) | Ok(Some(Ok(Message::Close(_)))) => return true,
            Ok(Some(Ok(_))) => continue,
        }
    }
}

async fn active_sessions(server: &TestServer) -> u64 {
    let health: Value = reqwest::get(server.url("/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    health["active_sessions"].as_u64().unwrap()
}

async fn wait_for_sessions(server: &TestServer, expected: u64) {
    for _ in 0..100 {
        if active_sessions(server).await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("expected {expected} active sessions");
}

#[tokio::test]
async fn join_receives_initial_view() {
    let server = TestServer::start().await;
    server.seed_game("daily", 3, 2);

    let mut ws = connect(&server, "daily").await;
    let view = next_json(&mut ws).await;
    assert_eq!(view["failed"], false);
    assert_eq!(view["width"], 3);
    assert_eq!(view["height"], 2);
    assert_eq!(view["grid"].as_array().unwrap().len(), 6);
    assert_eq!(active_sessions(&server).await, 1);
}

#[tokio::test]
async fn malformed_frame_closes_only_that_connection() {
    let server = TestServer::start().await;
    server.seed_game("daily", 2, 1);

    let mut bad = connect(&server, "daily").await;
    let mut good = connect(&server, "daily").await;
    next_json(&mut bad).await;
    next_json(&mut good).await;

    bad.send(Message::Text("{\"cmd\":\"dance\"}".into())).await.unwrap();
    assert!(closed(&mut bad).await);

    good.send(Message::Text(json!({ "cmd": "name", "name": "bob" }).to_string()))
        .await
        .unwrap();
    assert_eq!(next_json(&mut good).await["online"], json!(["bob"]));

    let update = json!({
        "cmd": "update",
        "data": [
            { "char": "A", "certain": true, "author": "bob", "time": 1 },
            { "char": "", "certain": false, "author": "", "time": 0 },
        ],
    });
    good.send(Message::Text(update.to_string())).await.unwrap();
    assert_eq!(next_json(&mut good).await["grid"][0]["char"], "A");

    good.close(None).await.unwrap();
    wait_for_sessions(&server, 0).await;
}

#[tokio::test]
async fn unknown_game_is_answered_then_closed() {
    let server = TestServer::start().await;

    let mut ws = connect(&server, "missing").await;
    let msg = timeout(WAIT, ws.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(msg, Message::Text("\"unknown-game\"".into()));
    assert!(closed(&mut ws).await);
    assert_eq!(active_sessions(&server).await, 0);
}

#[tokio::test]
async fn invalid_names_are_not_upgraded() {
    let server = TestServer::start().await;
    assert!(connect_async(server.ws_url("bad..name")).await.is_err());
}

#[tokio::test]
async fn silent_peer_is_pinged_then_dropped() {
    let server = TestServer::start_with_ping_interval(Duration::from_millis(150)).await;
    server.seed_game("daily", 1, 1);

    let mut ws = connect(&server, "daily").await;
    next_json(&mut ws).await;

    // Not polling the stream means no pong goes back.
    tokio::time::sleep(Duration::from_millis(500)).await;

    let mut saw_ping = false;
    loop {
        match timeout(WAIT, ws.next()).await.unwrap() {
            Some(Ok(Message::Ping(_))) => saw_ping = true,
            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
            Some(Ok(_)) => {}
        }
    }
    assert!(saw_ping);
    wait_for_sessions(&server, 0).await;
}
