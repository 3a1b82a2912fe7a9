use crate::{models::CursorsResponse, AppState};
use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::debug;

/// Cursor positions of all participants connected to a document, for polling
/// clients without a live connection.
pub async fn cursors(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
) -> Json<CursorsResponse> {
    debug!("Cursor snapshot requested for document {}", document_id);
    Json(CursorsResponse {
        cursors: state.registry.snapshot_cursors(&document_id),
        document_id,
    })
}
