pub mod config;
pub mod docs;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod ws;

use axum::{http::StatusCode, routing::get, Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use docs::ApiDoc;
use models::ErrorResponse;
use routes::create_api_routes;
use ws::registry::CollabRegistry;

/// Shared application state. The registry is the only mutable piece;
/// everything else holds it by reference.
pub struct AppState {
    pub registry: CollabRegistry,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            registry: CollabRegistry::new(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble the full application router: WebSocket endpoint, REST API,
/// Swagger UI and request tracing.
pub fn app(state: Arc<AppState>) -> Router {
    // REST routes under /api
    let api_routes = create_api_routes(state.clone());

    Router::new()
        // WebSocket endpoint for live collaboration
        .route(
            "/ws/collaborate/:document_id/:user_id",
            get(ws::handler::websocket_handler),
        )
        .with_state(state)
        // Mount API routes
        .nest("/api", api_routes)
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        // Add tracing layer
        .layer(TraceLayer::new_for_http())
}

async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    let status = StatusCode::NOT_FOUND;
    (
        status,
        Json(ErrorResponse {
            code: status.as_u16(),
            status: status.to_string(),
            error: "Resource not found".to_string(),
        }),
    )
}
