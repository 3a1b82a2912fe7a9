use crate::{models::ActiveUsersResponse, AppState};
use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::debug;

/// List the participants currently viewing a document. Unknown document ids
/// yield an empty roster, never an error.
pub async fn active_users(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
) -> Json<ActiveUsersResponse> {
    debug!("Active users requested for document {}", document_id);
    let active_users = state.registry.list_participants(&document_id);
    let user_count = active_users.len();
    Json(ActiveUsersResponse {
        document_id,
        active_users,
        user_count,
    })
}
