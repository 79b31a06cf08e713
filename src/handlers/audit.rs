use super::common::{map_service_error, success_response};
use crate::{
    auth::{AuthenticatedUser, Role},
    errors::ApiError,
    handlers::AppState,
};
use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use uuid::Uuid;

/// Audit trail for one entity, newest first
#[utoipa::path(
    get,
    path = "/api/v1/audit/{entity_type}/{id}",
    params(
        ("entity_type" = String, Path, description = "Entity type, e.g. request"),
        ("id" = Uuid, Path, description = "Entity ID")
    ),
    responses(
        (status = 200, description = "Audit trail fetched"),
        (status = 403, description = "Caller may not read audit logs")
    ),
    tag = "audit"
)]
pub async fn get_history(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path((entity_type, entity_id)): Path<(String, Uuid)>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    actor
        .require(&[Role::Director, Role::Admin], "read audit logs")
        .map_err(map_service_error)?;

    let entries = state
        .services
        .audit
        .history(&entity_type, entity_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(entries))
}

/// Creates the router for audit endpoints
pub fn audit_routes() -> Router<AppState> {
    Router::new().route("/:entity_type/:id", get(get_history))
}
