use crate::models::*;
use utoipa::OpenApi;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Readiness check endpoint
#[utoipa::path(
    get,
    path = "/api/ready",
    responses(
        (status = 200, description = "Service is ready", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn ready_check_doc() {}

/// List participants currently viewing a document
#[utoipa::path(
    get,
    path = "/api/collaborate/active-users/{document_id}",
    params(
        ("document_id" = String, Path, description = "Document identifier")
    ),
    responses(
        (status = 200, description = "Current participant roster", body = ActiveUsersResponse)
    )
)]
#[allow(dead_code)]
pub async fn active_users_doc() {}

/// Cursor positions for a document
#[utoipa::path(
    get,
    path = "/api/collaborate/cursors/{document_id}",
    params(
        ("document_id" = String, Path, description = "Document identifier")
    ),
    responses(
        (status = 200, description = "Current cursor snapshot", body = CursorsResponse)
    )
)]
#[allow(dead_code)]
pub async fn cursors_doc() {}

/// Hub and process diagnostics
#[utoipa::path(
    get,
    path = "/api/diagnostics",
    responses(
        (status = 200, description = "Diagnostics information", body = DiagnosticsResponse)
    )
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        ready_check_doc,
        active_users_doc,
        cursors_doc,
        diagnostics_doc,
    ),
    components(
        schemas(
            HealthResponse,
            ActiveUsersResponse,
            CursorsResponse,
            DiagnosticsResponse,
            ErrorResponse,
            CursorPosition,
        )
    ),
    tags(
        (name = "collaboration", description = "Real-time document collaboration endpoints")
    )
)]
pub struct ApiDoc;
