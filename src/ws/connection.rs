//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::api::dto::{IngestResponse, MonitorSnapshotResponse};
use crate::domain::{BusMessage, ServiceId};
use crate::error::{LAGGED_CODE, MonitorError};
use crate::service::MonitorService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards matching messages from the [`broadcast::Receiver`] to the client.
///
/// A client that lags behind the bus is told how many events it missed so
/// it can request a fresh snapshot.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<BusMessage>,
    monitor_service: Arc<MonitorService>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response =
                            handle_text_message(&text, &mut subs, &monitor_service).await;
                        if send(&mut ws_tx, &response).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            // Message from EventBus
            event = event_rx.recv() => {
                match event {
                    Ok(message) => {
                        if subs.admit(&message)
                            && send(&mut ws_tx, &WsMessage::event(&message)).await.is_err()
                        {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                        let notice = WsMessage::error(
                            String::new(),
                            LAGGED_CODE,
                            format!("missed {n} events; request a snapshot"),
                        );
                        if send(&mut ws_tx, &notice).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

async fn send(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    msg: &WsMessage,
) -> Result<(), axum::Error> {
    let Ok(json) = serde_json::to_string(msg) else {
        tracing::error!(msg_type = ?msg.msg_type, "failed to encode ws message");
        return Ok(());
    };
    ws_tx.send(Message::text(json)).await
}

/// Handles a text message from the client, returning the reply.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    monitor_service: &MonitorService,
) -> WsMessage {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        let err = MonitorError::InvalidRequest("malformed JSON".into());
        return error_reply(String::new(), &err);
    };
    let result = if msg.msg_type == WsMessageType::Command {
        match serde_json::from_value::<WsCommand>(msg.payload) {
            Ok(command) => dispatch(command, subs, monitor_service).await,
            Err(e) => Err(MonitorError::InvalidRequest(format!("unknown command: {e}"))),
        }
    } else {
        Err(MonitorError::InvalidRequest("expected a command message".into()))
    };

    match result {
        Ok(payload) => WsMessage::new(msg.id, WsMessageType::Response, payload),
        Err(e) => error_reply(msg.id, &e),
    }
}

async fn dispatch(
    command: WsCommand,
    subs: &mut SubscriptionManager,
    monitor_service: &MonitorService,
) -> Result<serde_json::Value, MonitorError> {
    match command {
        WsCommand::Subscribe { service_ids } => {
            let (ids, wildcard) = parse_ids(&service_ids);
            subs.subscribe(&ids, wildcard);
            Ok(serde_json::json!({
                "subscribed": ids,
                "count": subs.count(),
                "wildcard": subs.is_subscribed_all(),
            }))
        }
        WsCommand::Unsubscribe { service_ids } => {
            let (ids, wildcard) = parse_ids(&service_ids);
            subs.unsubscribe(&ids, wildcard);
            Ok(serde_json::json!({
                "unsubscribed": ids,
                "remaining_count": subs.count(),
                "wildcard": subs.is_subscribed_all(),
            }))
        }
        WsCommand::Snapshot => {
            let (sequence, snapshot) = monitor_service.sequenced_snapshot().await;
            to_payload(&MonitorSnapshotResponse::new(sequence, &snapshot))
        }
        WsCommand::Apply { event } => {
            let receipt = monitor_service.ingest(event).await?;
            to_payload(&IngestResponse::from(&receipt))
        }
        WsCommand::Action { service_id, action } => {
            let request = monitor_service
                .request_action(&ServiceId::from(service_id), action)
                .await?;
            to_payload(&request)
        }
    }
}

fn to_payload<T: Serialize>(value: &T) -> Result<serde_json::Value, MonitorError> {
    serde_json::to_value(value).map_err(|e| MonitorError::Internal(e.to_string()))
}

fn error_reply(id: String, err: &MonitorError) -> WsMessage {
    if err.is_protocol_error() {
        tracing::warn!(error = %err, "ws client sent an unusable event");
    }
    WsMessage::error(id, err.error_code(), err.to_string())
}

/// Splits raw ids into service ids and the wildcard flag.
fn parse_ids(raw: &[String]) -> (Vec<ServiceId>, bool) {
    let wildcard = raw.iter().any(|s| s == "*");
    let ids = raw
        .iter()
        .filter(|s| *s != "*" && !s.is_empty())
        .map(|s| ServiceId::from(s.as_str()))
        .collect();
    (ids, wildcard)
}
