use crate::handlers::{active_users, cursors, diagnostics, health_check, ready_check};
use crate::AppState;
use axum::{routing::get, Router};
use std::sync::Arc;

/// Create API routes
pub fn create_api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/diagnostics", get(diagnostics))
        .route("/collaborate/active-users/:document_id", get(active_users))
        .route("/collaborate/cursors/:document_id", get(cursors))
        .with_state(state)
}
