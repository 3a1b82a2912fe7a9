use axum::extract::ws::Message;
use chrono::Utc;
use tracing::{debug, error};

use crate::models::{
    AnnotationAddedMessage, AnnotationDeletedMessage, AnnotationUpdatedMessage, ClientMessage,
    CursorPosition, CursorUpdateMessage, NewCommentMessage, PongMessage, ServerMessage,
    UserSelectionMessage,
};
use crate::ws::registry::{CollabRegistry, ParticipantSink};

/// Interpret one inbound event from `sender_id` and fan it out to the other
/// participants of the document. Every outbound event gets a fresh server
/// timestamp at the moment of routing; client-supplied times are never
/// forwarded. Payloads are relayed verbatim, content checks belong to the
/// annotation store.
pub fn route_message(
    registry: &CollabRegistry,
    document_id: &str,
    sender_id: &str,
    message: ClientMessage,
    reply: &ParticipantSink,
) {
    match message {
        ClientMessage::CursorMove(msg) => {
            let position = CursorPosition { x: msg.x, y: msg.y, page: msg.page };
            registry.update_cursor(document_id, sender_id, position);
            let update = ServerMessage::CursorUpdate(CursorUpdateMessage {
                user_id: sender_id.to_string(),
                position,
                timestamp: Utc::now().to_rfc3339(),
            });
            registry.broadcast(document_id, &update, Some(sender_id));
        }
        ClientMessage::AnnotationAdd(msg) => {
            let added = ServerMessage::AnnotationAdded(AnnotationAddedMessage {
                user_id: sender_id.to_string(),
                annotation: msg.annotation,
                timestamp: Utc::now().to_rfc3339(),
            });
            registry.broadcast(document_id, &added, Some(sender_id));
        }
        ClientMessage::AnnotationUpdate(msg) => {
            let updated = ServerMessage::AnnotationUpdated(AnnotationUpdatedMessage {
                user_id: sender_id.to_string(),
                annotation_id: msg.annotation_id,
                changes: msg.changes,
                timestamp: Utc::now().to_rfc3339(),
            });
            registry.broadcast(document_id, &updated, Some(sender_id));
        }
        ClientMessage::AnnotationDelete(msg) => {
            let deleted = ServerMessage::AnnotationDeleted(AnnotationDeletedMessage {
                user_id: sender_id.to_string(),
                annotation_id: msg.annotation_id,
                timestamp: Utc::now().to_rfc3339(),
            });
            registry.broadcast(document_id, &deleted, Some(sender_id));
        }
        ClientMessage::Selection(msg) => {
            let selection = ServerMessage::UserSelection(UserSelectionMessage {
                user_id: sender_id.to_string(),
                selection: msg.selection,
                page: msg.page,
                timestamp: Utc::now().to_rfc3339(),
            });
            registry.broadcast(document_id, &selection, Some(sender_id));
        }
        ClientMessage::Comment(msg) => {
            let comment = ServerMessage::NewComment(NewCommentMessage {
                user_id: sender_id.to_string(),
                comment: msg.comment,
                annotation_id: msg.annotation_id,
                timestamp: Utc::now().to_rfc3339(),
            });
            registry.broadcast(document_id, &comment, Some(sender_id));
        }
        ClientMessage::Ping => {
            // Keep-alive, answered directly to the sender and never fanned out
            let pong = ServerMessage::Pong(PongMessage { timestamp: Utc::now().to_rfc3339() });
            match serde_json::to_string(&pong) {
                Ok(text) => {
                    if reply.try_send(Message::Text(text)).is_err() {
                        error!("Failed to send pong to {} on document {}", sender_id, document_id);
                    }
                }
                Err(e) => error!("Failed to encode pong: {}", e),
            }
        }
        ClientMessage::Unknown => {
            // Forward compatibility: future event kinds are dropped, not errors
            debug!("Ignoring unrecognized message type from {} on document {}", sender_id, document_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CursorMoveMessage;
    use crate::ws::registry::SEND_QUEUE_CAPACITY;
    use serde_json::Value;
    use tokio::sync::mpsc;

    fn sink() -> (ParticipantSink, mpsc::Receiver<Message>) {
        mpsc::channel(SEND_QUEUE_CAPACITY)
    }

    fn next_value(rx: &mut mpsc::Receiver<Message>) -> Option<Value> {
        match rx.try_recv() {
            Ok(Message::Text(text)) => serde_json::from_str(&text).ok(),
            _ => None,
        }
    }

    #[test]
    fn cursor_move_updates_registry_and_fans_out() {
        let registry = CollabRegistry::new();
        let (tx_a, mut rx_a) = sink();
        let (tx_b, mut rx_b) = sink();
        registry.register("doc-1", "A", tx_a.clone());
        registry.register("doc-1", "B", tx_b);

        let msg = ClientMessage::CursorMove(CursorMoveMessage { x: 10.0, y: 20.0, page: 1 });
        route_message(&registry, "doc-1", "A", msg, &tx_a);

        let received = next_value(&mut rx_b).expect("B should receive the cursor update");
        assert_eq!(received["type"], "cursor_update");
        assert_eq!(received["user_id"], "A");
        assert_eq!(received["position"]["x"], 10.0);
        assert_eq!(received["position"]["y"], 20.0);
        assert_eq!(received["position"]["page"], 1);
        assert!(received["timestamp"].is_string());

        // The sender never sees an echo of its own event
        assert!(next_value(&mut rx_a).is_none());

        let cursors = registry.snapshot_cursors("doc-1");
        assert_eq!(cursors["A"], CursorPosition { x: 10.0, y: 20.0, page: 1 });
        assert_eq!(cursors["B"], CursorPosition::default());
    }

    #[test]
    fn annotation_events_relay_payloads_verbatim() {
        let registry = CollabRegistry::new();
        let (tx_a, _rx_a) = sink();
        let (tx_b, mut rx_b) = sink();
        registry.register("doc-1", "A", tx_a.clone());
        registry.register("doc-1", "B", tx_b);

        let inbound: ClientMessage = serde_json::from_str(
            r#"{"type":"annotation_update","annotation_id":"ann-7","changes":{"color":"red"}}"#,
        )
        .unwrap();
        route_message(&registry, "doc-1", "A", inbound, &tx_a);

        let received = next_value(&mut rx_b).expect("B should receive the annotation update");
        assert_eq!(received["type"], "annotation_updated");
        assert_eq!(received["user_id"], "A");
        assert_eq!(received["annotation_id"], "ann-7");
        assert_eq!(received["changes"]["color"], "red");
    }

    #[test]
    fn ping_answers_only_the_sender() {
        let registry = CollabRegistry::new();
        let (tx_a, mut rx_a) = sink();
        let (tx_b, mut rx_b) = sink();
        registry.register("doc-1", "A", tx_a.clone());
        registry.register("doc-1", "B", tx_b);

        route_message(&registry, "doc-1", "A", ClientMessage::Ping, &tx_a);

        let received = next_value(&mut rx_a).expect("A should receive a pong");
        assert_eq!(received["type"], "pong");
        assert!(next_value(&mut rx_b).is_none());
    }

    #[test]
    fn unknown_kind_produces_no_fan_out() {
        let registry = CollabRegistry::new();
        let (tx_a, mut rx_a) = sink();
        let (tx_b, mut rx_b) = sink();
        registry.register("doc-1", "A", tx_a.clone());
        registry.register("doc-1", "B", tx_b);

        route_message(&registry, "doc-1", "A", ClientMessage::Unknown, &tx_a);
        assert!(next_value(&mut rx_a).is_none());
        assert!(next_value(&mut rx_b).is_none());
    }
}
