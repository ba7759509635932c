//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{SessionEvent, SessionId, SessionSender},
    infrastructure::dto::websocket::{ClientMessage, ServerMessage},
    ui::state::AppState,
    usecase::SessionError,
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// Authenticate right after the upgrade
    pub access_token: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query.access_token))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, access_token: Option<String>) {
    let (mut sender, mut receiver) = socket.split();

    // Create a channel for this session to receive events
    let (tx, mut rx) = mpsc::unbounded_channel::<SessionEvent>();
    let session_id = state.session_manager.connect(tx.clone()).await;

    // Spawn a task to forward events to this client
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&ServerMessage::from(&event)) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize event: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    if let Some(token) = access_token {
        handle_client_message(
            &state,
            session_id,
            &tx,
            ClientMessage::Authenticate {
                access_token: token,
            },
        )
        .await;
    }

    // Frames are handled one at a time, in arrival order. A frame that is
    // being handled is never cancelled.
    loop {
        tokio::select! {
            frame = receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    tracing::debug!("Session {} received: {}", session_id, text.as_str());
                    match serde_json::from_str::<ClientMessage>(text.as_str()) {
                        Ok(message) => handle_client_message(&state, session_id, &tx, message).await,
                        Err(e) => {
                            tracing::warn!("Session {} sent an invalid frame: {}", session_id, e);
                            send_error(&tx, format!("invalid message: {e}"));
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("Session {} requested close", session_id);
                    break;
                }
                Some(Ok(Message::Binary(_))) => {
                    send_error(&tx, "binary frames are not supported");
                }
                // Ping/pong is handled automatically by the WebSocket protocol
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("Session {} WebSocket error: {}", session_id, e);
                    break;
                }
            },
            _ = &mut send_task => break,
        }
    }

    send_task.abort();
    state.session_manager.disconnect(session_id).await;
}

async fn handle_client_message(
    state: &AppState,
    session_id: SessionId,
    tx: &SessionSender,
    message: ClientMessage,
) {
    let manager = &state.session_manager;
    let result = match message {
        ClientMessage::Authenticate { access_token } => {
            manager.authenticate(session_id, access_token).await.map(drop)
        }
        ClientMessage::RequestRoom { room } => manager.request_room(session_id, room).await.map(drop),
        ClientMessage::Chat { message } => manager.post_message(session_id, message).await.map(drop),
    };

    match result {
        Ok(()) => {}
        // Already reported as `authentication-failed`
        Err(SessionError::Authentication(_)) => {}
        Err(e) => {
            tracing::debug!("Session {} request rejected: {}", session_id, e);
            send_error(tx, e);
        }
    }
}

fn send_error(tx: &SessionSender, reason: impl ToString) {
    let _ = tx.send(SessionEvent::Error {
        reason: reason.to_string(),
    });
}
