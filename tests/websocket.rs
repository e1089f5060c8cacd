//! WebSocket tests against a live server on an ephemeral port.

#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use release_monitor_gateway::app_state::AppState;
use release_monitor_gateway::build_app;
use release_monitor_gateway::config::GatewayConfig;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server() -> SocketAddr {
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("cannot bind test listener");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("listener has no address");
    };
    let app = build_app(AppState::new(64), &GatewayConfig::default());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let Ok((client, _)) = connect_async(format!("ws://{addr}/ws")).await else {
        panic!("ws handshake failed");
    };
    client
}

async fn send_command(client: &mut Client, id: &str, payload: Value) {
    let envelope = json!({"id": id, "type": "command", "payload": payload});
    let Ok(()) = client.send(Message::text(envelope.to_string())).await else {
        panic!("ws send failed");
    };
}

async fn next_json(client: &mut Client) -> Value {
    let Ok(Some(Ok(message))) = tokio::time::timeout(Duration::from_secs(5), client.next()).await
    else {
        panic!("no ws message within timeout");
    };
    let Ok(text) = message.to_text() else {
        panic!("expected a text frame");
    };
    let Ok(value) = serde_json::from_str(text) else {
        panic!("ws frame is not JSON: {text}");
    };
    value
}

async fn next_of_type(client: &mut Client, msg_type: &str) -> Value {
    for _ in 0..8 {
        let value = next_json(client).await;
        if value["type"] == msg_type {
            return value;
        }
    }
    panic!("no {msg_type} message received");
}

#[tokio::test]
async fn applied_events_reach_subscribers() {
    let addr = start_server().await;
    let mut client = connect(addr).await;

    send_command(
        &mut client,
        "sub",
        json!({"command": "subscribe", "service_ids": ["*"]}),
    )
    .await;
    let reply = next_json(&mut client).await;
    assert_eq!(reply["id"], "sub");
    assert_eq!(reply["payload"]["wildcard"], true);

    send_command(
        &mut client,
        "apply",
        json!({"command": "apply", "event": {
            "type": "SERVICE", "sub_type": "ORDERING", "order": ["argus"]
        }}),
    )
    .await;

    let response = next_of_type(&mut client, "response").await;
    assert_eq!(response["payload"]["applied"], true);

    let event = next_of_type(&mut client, "event").await;
    assert_eq!(event["payload"]["kind"], "applied");
    assert_eq!(event["payload"]["sequence"], 1);
    assert_eq!(event["payload"]["data"]["type"], "SERVICE");
}

#[tokio::test]
async fn filtered_subscription_skips_other_services() {
    let addr = start_server().await;
    let mut feeder = connect(addr).await;
    let mut watcher = connect(addr).await;

    send_command(
        &mut watcher,
        "sub",
        json!({"command": "subscribe", "service_ids": ["b"]}),
    )
    .await;
    next_of_type(&mut watcher, "response").await;

    for (id, event) in [
        ("1", json!({"type": "SERVICE", "sub_type": "ORDERING", "order": ["a", "b"]})),
        ("2", json!({"type": "DELETE", "sub_type": "a"})),
        ("3", json!({"type": "DELETE", "sub_type": "b"})),
    ] {
        send_command(&mut feeder, id, json!({"command": "apply", "event": event})).await;
        next_of_type(&mut feeder, "response").await;
    }

    // The reorder concerns every service; the delete of "a" is filtered out.
    let first = next_of_type(&mut watcher, "event").await;
    assert_eq!(first["payload"]["event"], "reorder");
    let second = next_of_type(&mut watcher, "event").await;
    assert_eq!(second["payload"]["event"], "delete");
    assert_eq!(second["payload"]["data"]["sub_type"], "b");
}

#[tokio::test]
async fn snapshot_command_returns_state() {
    let addr = start_server().await;
    let mut client = connect(addr).await;

    send_command(
        &mut client,
        "apply",
        json!({"command": "apply", "event": {
            "type": "EDIT", "service_data": {"id": "argus", "url": "https://example.org"}
        }}),
    )
    .await;
    next_of_type(&mut client, "response").await;

    send_command(&mut client, "snap", json!({"command": "snapshot"})).await;
    let reply = next_of_type(&mut client, "response").await;
    assert_eq!(reply["id"], "snap");
    assert_eq!(reply["payload"]["order"], json!(["argus"]));
    assert_eq!(
        reply["payload"]["service"]["argus"]["url"],
        "https://example.org"
    );
}

#[tokio::test]
async fn unknown_command_is_an_error() {
    let addr = start_server().await;
    let mut client = connect(addr).await;

    send_command(&mut client, "x", json!({"command": "teleport"})).await;
    let reply = next_json(&mut client).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["id"], "x");
}
