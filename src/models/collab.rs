use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::models::CursorPosition;

/// Response listing the participants currently connected to a document
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ActiveUsersResponse {
    pub document_id: String,
    pub active_users: Vec<String>,
    pub user_count: usize,
}

/// Response with the cursor positions of all connected participants
#[derive(Serialize, Deserialize, ToSchema)]
pub struct CursorsResponse {
    pub document_id: String,
    pub cursors: HashMap<String, CursorPosition>,
}
