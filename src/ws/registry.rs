use axum::extract::ws::Message;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::RwLock;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::models::{CursorPosition, ServerMessage};

/// Number of independent lock shards. Operations on different documents
/// only contend when their ids hash to the same shard.
const SHARD_COUNT: usize = 16;

/// Capacity of each participant's outbound queue. A participant whose queue
/// is full has events dropped (delivery is best-effort, at-most-once); only a
/// closed queue marks the peer as dead.
pub const SEND_QUEUE_CAPACITY: usize = 64;

/// Outbound sink for one participant connection. The Session Gateway owns the
/// receiving half and forwards queued frames to the socket.
pub type ParticipantSink = mpsc::Sender<Message>;

#[derive(Default)]
struct DocumentChannel {
    connections: HashMap<String, ParticipantSink>,
    cursors: HashMap<String, CursorPosition>,
}

/// Bookkeeping of which participants are connected to which document and
/// their last-known cursor. This is the only shared mutable state in the
/// subsystem; Gateway and Router code never touch the underlying maps
/// directly.
///
/// Channels are created lazily on the first `register` and deleted inside the
/// same critical section as the `deregister` that empties them, so repeated
/// connect/disconnect churn of short-lived documents cannot grow the maps.
///
/// Known issue: a reconnect under an already-registered participant id
/// replaces the registry slot without closing the prior socket. The stale
/// connection keeps running until its transport errors out, and its teardown
/// then deregisters the (document, participant) slot even though the slot
/// belongs to the replacement by that point. This mirrors the observed
/// behavior of the upstream service rather than guessing at eviction
/// semantics.
pub struct CollabRegistry {
    shards: Vec<RwLock<HashMap<String, DocumentChannel>>>,
}

impl CollabRegistry {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| RwLock::new(HashMap::new())).collect(),
        }
    }

    fn shard(&self, document_id: &str) -> &RwLock<HashMap<String, DocumentChannel>> {
        let mut hasher = DefaultHasher::new();
        document_id.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % SHARD_COUNT]
    }

    /// Insert a participant connection, creating the document channel if it
    /// does not exist yet. The cursor starts at the default position.
    /// Duplicate participant ids overwrite the existing slot.
    pub fn register(&self, document_id: &str, user_id: &str, sink: ParticipantSink) {
        let mut shard = self.shard(document_id).write().unwrap();
        let channel = shard.entry(document_id.to_string()).or_default();
        channel.connections.insert(user_id.to_string(), sink);
        channel.cursors.insert(user_id.to_string(), CursorPosition::default());
        info!("User {} connected to document {}", user_id, document_id);
    }

    /// Remove a participant connection and its cursor state. Deletes the
    /// document channel when the last participant leaves. Safe to call on an
    /// already-removed participant.
    pub fn deregister(&self, document_id: &str, user_id: &str) {
        let mut shard = self.shard(document_id).write().unwrap();
        if let Some(channel) = shard.get_mut(document_id) {
            channel.connections.remove(user_id);
            channel.cursors.remove(user_id);
            if channel.connections.is_empty() {
                shard.remove(document_id);
            }
        }
        info!("User {} disconnected from document {}", user_id, document_id);
    }

    /// Overwrite the stored cursor for a participant. No-op when the
    /// participant is not registered.
    pub fn update_cursor(&self, document_id: &str, user_id: &str, position: CursorPosition) {
        let mut shard = self.shard(document_id).write().unwrap();
        if let Some(channel) = shard.get_mut(document_id) {
            if channel.connections.contains_key(user_id) {
                channel.cursors.insert(user_id.to_string(), position);
            }
        }
    }

    /// Participants currently connected to a document. Empty for unknown ids.
    pub fn list_participants(&self, document_id: &str) -> Vec<String> {
        let shard = self.shard(document_id).read().unwrap();
        shard
            .get(document_id)
            .map(|channel| channel.connections.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Cursor positions of all connected participants. Empty for unknown ids.
    pub fn snapshot_cursors(&self, document_id: &str) -> HashMap<String, CursorPosition> {
        let shard = self.shard(document_id).read().unwrap();
        shard
            .get(document_id)
            .map(|channel| channel.cursors.clone())
            .unwrap_or_default()
    }

    /// Fan a message out to every participant of a document except `exclude`.
    ///
    /// Delivery is best-effort: a participant whose queue is closed is
    /// treated as dead and deregistered, a participant whose queue is full
    /// misses this event. Neither case affects delivery to the others.
    pub fn broadcast(&self, document_id: &str, message: &ServerMessage, exclude: Option<&str>) {
        let text = match serde_json::to_string(message) {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to encode broadcast for document {}: {}", document_id, e);
                return;
            }
        };

        // Snapshot the recipients so no lock is held while enqueueing.
        let recipients: Vec<(String, ParticipantSink)> = {
            let shard = self.shard(document_id).read().unwrap();
            match shard.get(document_id) {
                Some(channel) => channel
                    .connections
                    .iter()
                    .filter(|(user_id, _)| exclude != Some(user_id.as_str()))
                    .map(|(user_id, sink)| (user_id.clone(), sink.clone()))
                    .collect(),
                None => return,
            }
        };

        let mut disconnected = Vec::new();
        for (user_id, sink) in recipients {
            match sink.try_send(Message::Text(text.clone())) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("Outbound queue full for {} on document {}, dropping event", user_id, document_id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    error!("Error sending to {} on document {}: queue closed", user_id, document_id);
                    disconnected.push(user_id);
                }
            }
        }

        // Clean up peers whose connection vanished
        for user_id in disconnected {
            self.deregister(document_id, &user_id);
        }
    }

    /// Enqueue a message for a single participant. Same failure handling as
    /// `broadcast`.
    pub fn send_to(&self, document_id: &str, user_id: &str, message: &ServerMessage) {
        let text = match serde_json::to_string(message) {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to encode message for {}: {}", user_id, e);
                return;
            }
        };

        let sink = {
            let shard = self.shard(document_id).read().unwrap();
            shard
                .get(document_id)
                .and_then(|channel| channel.connections.get(user_id))
                .cloned()
        };

        let Some(sink) = sink else { return };
        match sink.try_send(Message::Text(text)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Outbound queue full for {} on document {}, dropping event", user_id, document_id);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!("Error sending to {} on document {}: queue closed", user_id, document_id);
                self.deregister(document_id, user_id);
            }
        }
    }

    /// Channel and connection counts across all shards, for diagnostics.
    pub fn stats(&self) -> (usize, usize) {
        let mut n_channels = 0;
        let mut n_conn = 0;
        for shard in &self.shards {
            let shard = shard.read().unwrap();
            n_channels += shard.len();
            n_conn += shard.values().map(|channel| channel.connections.len()).sum::<usize>();
        }
        (n_channels, n_conn)
    }
}

impl Default for CollabRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PongMessage;

    fn sink() -> (ParticipantSink, mpsc::Receiver<Message>) {
        mpsc::channel(SEND_QUEUE_CAPACITY)
    }

    fn pong() -> ServerMessage {
        ServerMessage::Pong(PongMessage { timestamp: "t".to_string() })
    }

    fn received_text(rx: &mut mpsc::Receiver<Message>) -> Option<String> {
        match rx.try_recv() {
            Ok(Message::Text(text)) => Some(text),
            _ => None,
        }
    }

    #[test]
    fn register_then_deregister_releases_channel() {
        let registry = CollabRegistry::new();
        let (tx, _rx) = sink();

        registry.register("doc-1", "A", tx);
        assert_eq!(registry.list_participants("doc-1"), vec!["A".to_string()]);
        assert_eq!(registry.stats(), (1, 1));

        registry.deregister("doc-1", "A");
        assert!(registry.list_participants("doc-1").is_empty());
        assert!(registry.snapshot_cursors("doc-1").is_empty());
        // Last participant gone, channel state fully released
        assert_eq!(registry.stats(), (0, 0));
    }

    #[test]
    fn deregister_unknown_participant_is_a_noop() {
        let registry = CollabRegistry::new();
        registry.deregister("doc-1", "ghost");
        assert_eq!(registry.stats(), (0, 0));

        let (tx, _rx) = sink();
        registry.register("doc-1", "A", tx);
        registry.deregister("doc-1", "ghost");
        assert_eq!(registry.list_participants("doc-1"), vec!["A".to_string()]);
    }

    #[test]
    fn cursor_defaults_then_follows_updates() {
        let registry = CollabRegistry::new();
        let (tx, _rx) = sink();
        registry.register("doc-1", "A", tx);

        let cursors = registry.snapshot_cursors("doc-1");
        assert_eq!(cursors["A"], CursorPosition::default());

        let moved = CursorPosition { x: 10.0, y: 20.0, page: 2 };
        registry.update_cursor("doc-1", "A", moved);
        assert_eq!(registry.snapshot_cursors("doc-1")["A"], moved);

        // Unregistered participants never get a cursor entry
        registry.update_cursor("doc-1", "B", moved);
        assert!(!registry.snapshot_cursors("doc-1").contains_key("B"));
    }

    #[test]
    fn unknown_document_reads_are_empty() {
        let registry = CollabRegistry::new();
        assert!(registry.list_participants("nope").is_empty());
        assert!(registry.snapshot_cursors("nope").is_empty());
    }

    #[test]
    fn broadcast_excludes_the_sender() {
        let registry = CollabRegistry::new();
        let (tx_a, mut rx_a) = sink();
        let (tx_b, mut rx_b) = sink();
        registry.register("doc-1", "A", tx_a);
        registry.register("doc-1", "B", tx_b);

        registry.broadcast("doc-1", &pong(), Some("A"));
        assert!(received_text(&mut rx_a).is_none());
        assert!(received_text(&mut rx_b).is_some());
    }

    #[test]
    fn broadcast_deregisters_dead_peers_and_delivers_to_the_rest() {
        let registry = CollabRegistry::new();
        let (tx_a, rx_a) = sink();
        let (tx_b, mut rx_b) = sink();
        registry.register("doc-1", "A", tx_a);
        registry.register("doc-1", "B", tx_b);

        // A's connection vanished
        drop(rx_a);

        registry.broadcast("doc-1", &pong(), None);
        assert!(received_text(&mut rx_b).is_some());
        assert_eq!(registry.list_participants("doc-1"), vec!["B".to_string()]);
    }

    #[test]
    fn full_queue_drops_the_event_but_keeps_the_peer() {
        let registry = CollabRegistry::new();
        let (tx_a, _rx_a) = mpsc::channel(1);
        registry.register("doc-1", "A", tx_a);

        registry.broadcast("doc-1", &pong(), None);
        registry.broadcast("doc-1", &pong(), None); // queue full, dropped
        assert_eq!(registry.list_participants("doc-1"), vec!["A".to_string()]);
    }

    #[test]
    fn reconnect_overwrites_the_registry_slot() {
        let registry = CollabRegistry::new();
        let (tx_old, mut rx_old) = sink();
        let (tx_new, mut rx_new) = sink();

        registry.register("doc-1", "A", tx_old);
        registry.register("doc-1", "A", tx_new);
        assert_eq!(registry.list_participants("doc-1").len(), 1);

        registry.send_to("doc-1", "A", &pong());
        assert!(received_text(&mut rx_old).is_none());
        assert!(received_text(&mut rx_new).is_some());
    }

    #[test]
    fn documents_are_independent() {
        let registry = CollabRegistry::new();
        let (tx_a, _rx_a) = sink();
        let (tx_b, mut rx_b) = sink();
        registry.register("doc-1", "A", tx_a);
        registry.register("doc-2", "B", tx_b);

        registry.broadcast("doc-1", &pong(), None);
        assert!(received_text(&mut rx_b).is_none());

        registry.deregister("doc-1", "A");
        assert_eq!(registry.list_participants("doc-2"), vec!["B".to_string()]);
        assert_eq!(registry.stats(), (1, 1));
    }
}
