use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, timeout};

use crate::chat::hub::HubCommand;
use crate::state::AppState;

/// Ping interval: server sends a WebSocket ping every 30 seconds to detect
/// abrupt disconnects.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Pong timeout: if pong not received within 10 seconds after ping, close.
const PONG_TIMEOUT: Duration = Duration::from_secs(10);

/// Run the actor-per-connection pattern for an accepted WebSocket.
///
/// Splits the WebSocket into reader and writer halves:
/// - Writer task: owns the sink, forwards frames from the connection's mpsc channel
/// - Reader loop: forwards inbound text frames to the hub as commands
///
/// All chat state lives in the hub; the actor only shuttles frames. A slow
/// client backs up its own channel, never the hub.
pub async fn run_connection(socket: WebSocket, state: AppState) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<Message>();

    // Announce the connection to the hub and wait for the assigned id.
    let (id_tx, id_rx) = oneshot::channel();
    if state
        .hub
        .send(HubCommand::Connect {
            tx: tx.clone(),
            id_tx,
        })
        .is_err()
    {
        return;
    }
    let Ok(conn_id) = id_rx.await else {
        // Registration failed; the hub already logged it.
        return;
    };

    // Spawn writer task: forwards mpsc messages to the WebSocket sink.
    let writer_handle = tokio::spawn(writer_task(ws_sender, rx));

    // Track pong reception
    let (pong_tx, mut pong_rx) = mpsc::unbounded_channel::<()>();

    // Spawn ping task: sends periodic pings and monitors pong responses.
    let ping_tx = tx.clone();
    let ping_handle = tokio::spawn(async move {
        let mut ping_timer = interval(PING_INTERVAL);
        // Skip the first immediate tick
        ping_timer.tick().await;

        loop {
            ping_timer.tick().await;

            if ping_tx.send(Message::Ping(vec![1, 2, 3, 4].into())).is_err() {
                // Writer task has died — connection is gone
                break;
            }

            match timeout(PONG_TIMEOUT, pong_rx.recv()).await {
                Ok(Some(())) => {
                    // Pong received, continue
                }
                _ => {
                    tracing::warn!(id = conn_id, "Pong timeout, closing connection");
                    let _ = ping_tx.send(Message::Close(Some(CloseFrame {
                        code: 1001,
                        reason: "Pong timeout".into(),
                    })));
                    break;
                }
            }
        }
    });

    // Reader loop: forward incoming frames to the hub.
    loop {
        match ws_receiver.next().await {
            Some(Ok(msg)) => match msg {
                Message::Text(text) => {
                    if state
                        .hub
                        .send(HubCommand::Inbound {
                            id: conn_id,
                            text: text.to_string(),
                        })
                        .is_err()
                    {
                        break;
                    }
                }
                Message::Binary(data) => {
                    // The protocol is text-only JSON frames.
                    tracing::debug!(id = conn_id, len = data.len(), "Ignoring binary frame");
                }
                Message::Pong(_) => {
                    // Pong received — notify the ping task
                    let _ = pong_tx.send(());
                }
                Message::Ping(data) => {
                    // Respond to client pings with pong
                    let _ = tx.send(Message::Pong(data));
                }
                Message::Close(frame) => {
                    tracing::debug!(id = conn_id, reason = ?frame, "Client initiated close");
                    break;
                }
            },
            Some(Err(e)) => {
                tracing::debug!(id = conn_id, error = %e, "WebSocket receive error");
                break;
            }
            None => {
                // Stream ended — client disconnected
                break;
            }
        }
    }

    // Cleanup: stop helper tasks, then notify the hub. The Disconnect
    // command is idempotent with the delivery-failure path.
    writer_handle.abort();
    ping_handle.abort();
    let _ = state.hub.send(HubCommand::Disconnect { id: conn_id });
}

/// Writer task: receives messages from the connection's channel and forwards
/// them to the WebSocket sink.
async fn writer_task(
    mut ws_sender: futures_util::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(msg) = rx.recv().await {
        if ws_sender.send(msg).await.is_err() {
            // WebSocket send failed — connection is broken
            break;
        }
    }
}
