use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::{ClientMessage, InitMessage, ServerMessage, UserJoinedMessage, UserLeftMessage};
use crate::ws::registry::SEND_QUEUE_CAPACITY;
use crate::ws::router::route_message;
use crate::AppState;

/// WebSocket handler
pub async fn websocket_handler(
    Path((document_id, user_id)): Path<(String, String)>,
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    info!("New WebSocket connection attempt for document {}", document_id);
    ws.on_upgrade(move |socket| handle_socket(socket, document_id, user_id, state))
}

/// Lifecycle of one physical connection: register, snapshot, receive loop,
/// deregister. Participant identity is caller-supplied and not verified here;
/// any identity check belongs upstream of this handler.
async fn handle_socket(socket: WebSocket, document_id: String, user_id: String, state: Arc<AppState>) {
    // Correlation id for log lines; routing identity stays (document, user)
    let connection_id = Uuid::new_v4();
    info!(
        "WebSocket connection established for document {} user {} (connection {})",
        document_id, user_id, connection_id
    );

    // Split the socket into sender and receiver
    let (mut sender, mut receiver) = socket.split();

    // Bounded outbound queue; the registry holds the sending half for fan-out
    let (tx, mut rx) = mpsc::channel::<Message>(SEND_QUEUE_CAPACITY);

    state.registry.register(&document_id, &user_id, tx.clone());

    // Send the initial presence snapshot to the new participant, so a late
    // joiner reconstructs state without racing the broadcast stream
    let init = ServerMessage::Init(InitMessage {
        active_users: state.registry.list_participants(&document_id),
        cursors: state.registry.snapshot_cursors(&document_id),
        timestamp: Utc::now().to_rfc3339(),
    });
    match serde_json::to_string(&init) {
        Ok(text) => {
            let _ = tx.send(Message::Text(text)).await;
        }
        Err(e) => error!("Failed to encode init message for document {}: {}", document_id, e),
    }

    // Notify the other participants, with the refreshed roster attached
    let joined = ServerMessage::UserJoined(UserJoinedMessage {
        user_id: user_id.clone(),
        active_users: state.registry.list_participants(&document_id),
        timestamp: Utc::now().to_rfc3339(),
    });
    state.registry.broadcast(&document_id, &joined, Some(&user_id));

    // Writer task: drain the outbound queue into the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    // Reader task: decode inbound messages and hand them to the router
    let recv_state = state.clone();
    let recv_document_id = document_id.clone();
    let recv_user_id = user_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    let parsed: ClientMessage = match serde_json::from_str(&text) {
                        Ok(parsed) => parsed,
                        Err(e) => {
                            // Protocol violation: terminate this connection
                            // only, the document channel is unaffected
                            error!(
                                "Failed to parse message from {} for document {}: {}",
                                recv_user_id, recv_document_id, e
                            );
                            break;
                        }
                    };
                    route_message(&recv_state.registry, &recv_document_id, &recv_user_id, parsed, &tx);
                }
                Message::Close(_) => break,
                // Binary frames and transport-level ping/pong are not part of
                // the collaboration protocol
                _ => {}
            }
        }
    });

    // Wait for either task to finish (and finish the other)
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    // Teardown for any reason: graceful close, transport error or protocol
    // violation all end up here
    state.registry.deregister(&document_id, &user_id);
    let left = ServerMessage::UserLeft(UserLeftMessage {
        user_id: user_id.clone(),
        active_users: state.registry.list_participants(&document_id),
        timestamp: Utc::now().to_rfc3339(),
    });
    state.registry.broadcast(&document_id, &left, None);

    info!(
        "WebSocket connection terminated for document {} user {} (connection {})",
        document_id, user_id, connection_id
    );
}
