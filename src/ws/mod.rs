pub mod handlers;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use std::sync::Arc;

use crate::engine::GameService;
use crate::projection::{RoomView, RoomWatcher};
use crate::protocol::{ClientMessage, ServerMessage};
use handlers::ConnContext;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<Arc<GameService>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

/// Serialize a server message and push it down the socket. Returns false
/// once the peer is gone and the pump should wind down.
async fn push(sink: &mut SplitSink<WebSocket, Message>, msg: &ServerMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sink.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "server message did not serialize");
            true
        }
    }
}

/// Pump for one client connection.
///
/// Each connection follows at most one room. A watcher task streams fresh
/// room snapshots through `view_rx` and is swapped out whenever the
/// connection binds to a different room.
async fn handle_socket(socket: WebSocket, service: Arc<GameService>) {
    let (mut sink, mut stream) = socket.split();
    let mut conn = ConnContext::default();

    let (view_tx, mut view_rx) = tokio::sync::mpsc::channel::<RoomView>(16);
    let mut watcher: Option<tokio::task::JoinHandle<()>> = None;

    tracing::debug!("socket connected");

    loop {
        tokio::select! {
            view = view_rx.recv() => {
                let Some(view) = view else { continue };
                let state = ServerMessage::RoomState {
                    flags: view.flags_for(conn.player_id.as_deref()),
                    view,
                };
                if !push(&mut sink, &state).await {
                    break;
                }
            }

            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let msg = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(msg) => msg,
                            Err(e) => {
                                tracing::warn!(error = %e, "unreadable client message");
                                let reply = ServerMessage::Error {
                                    code: "PARSE_ERROR".to_string(),
                                    msg: format!("not a recognized message: {e}"),
                                };
                                if !push(&mut sink, &reply).await {
                                    break;
                                }
                                continue;
                            }
                        };

                        let watched = conn.room_id.clone();
                        let reply = handlers::handle_message(msg, &mut conn, &service).await;

                        // Joining, resuming or leaving moves the connection
                        // between rooms, so the watcher has to follow.
                        if conn.room_id != watched {
                            if let Some(task) = watcher.take() {
                                task.abort();
                            }
                            if let Some(room_id) = conn.room_id.clone() {
                                let follow = RoomWatcher::new(service.store().clone(), room_id);
                                watcher = Some(tokio::spawn(follow.run(view_tx.clone())));
                            }
                        }

                        if let Some(reply) = reply {
                            if !push(&mut sink, &reply).await {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::debug!("peer sent close");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sink.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "socket error, dropping connection");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    if let Some(task) = watcher.take() {
        task.abort();
    }
    tracing::debug!("socket closed");
}
