
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::models::CursorPosition;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CursorMoveMessage {
    pub x: f64,
    pub y: f64,
    pub page: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AnnotationAddMessage {
    pub annotation: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AnnotationUpdateMessage {
    pub annotation_id: String,
    pub changes: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AnnotationDeleteMessage {
    pub annotation_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SelectionMessage {
    pub selection: Value,
    pub page: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CommentMessage {
    pub comment: Value,
    pub annotation_id: String,
}

/// Messages received from a participant. Unrecognized kinds land on
/// `Unknown` so future client event types never terminate a connection.
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "cursor_move")]
    CursorMove(CursorMoveMessage),
    #[serde(rename = "annotation_add")]
    AnnotationAdd(AnnotationAddMessage),
    #[serde(rename = "annotation_update")]
    AnnotationUpdate(AnnotationUpdateMessage),
    #[serde(rename = "annotation_delete")]
    AnnotationDelete(AnnotationDeleteMessage),
    #[serde(rename = "selection")]
    Selection(SelectionMessage),
    #[serde(rename = "comment")]
    Comment(CommentMessage),
    #[serde(rename = "ping")]
    Ping,
    #[serde(other)]
    Unknown,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct InitMessage {
    pub active_users: Vec<String>,
    pub cursors: HashMap<String, CursorPosition>,
    pub timestamp: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserJoinedMessage {
    pub user_id: String,
    pub active_users: Vec<String>,
    pub timestamp: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserLeftMessage {
    pub user_id: String,
    pub active_users: Vec<String>,
    pub timestamp: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CursorUpdateMessage {
    pub user_id: String,
    pub position: CursorPosition,
    pub timestamp: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AnnotationAddedMessage {
    pub user_id: String,
    pub annotation: Value,
    pub timestamp: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AnnotationUpdatedMessage {
    pub user_id: String,
    pub annotation_id: String,
    pub changes: Value,
    pub timestamp: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AnnotationDeletedMessage {
    pub user_id: String,
    pub annotation_id: String,
    pub timestamp: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserSelectionMessage {
    pub user_id: String,
    pub selection: Value,
    pub page: u32,
    pub timestamp: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NewCommentMessage {
    pub user_id: String,
    pub comment: Value,
    pub annotation_id: String,
    pub timestamp: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PongMessage {
    pub timestamp: String,
}

/// Messages pushed to participants. Every variant carries a server-assigned
/// RFC 3339 timestamp; it is the only ordering signal receivers get.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "init")]
    Init(InitMessage),
    #[serde(rename = "user_joined")]
    UserJoined(UserJoinedMessage),
    #[serde(rename = "user_left")]
    UserLeft(UserLeftMessage),
    #[serde(rename = "cursor_update")]
    CursorUpdate(CursorUpdateMessage),
    #[serde(rename = "annotation_added")]
    AnnotationAdded(AnnotationAddedMessage),
    #[serde(rename = "annotation_updated")]
    AnnotationUpdated(AnnotationUpdatedMessage),
    #[serde(rename = "annotation_deleted")]
    AnnotationDeleted(AnnotationDeletedMessage),
    #[serde(rename = "user_selection")]
    UserSelection(UserSelectionMessage),
    #[serde(rename = "new_comment")]
    NewComment(NewCommentMessage),
    #[serde(rename = "pong")]
    Pong(PongMessage),
}
