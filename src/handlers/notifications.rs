use super::common::{map_service_error, success_response, PaginatedResponse};
use crate::{auth::AuthenticatedUser, errors::ApiError, handlers::AppState};
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    #[serde(default)]
    pub unread_only: bool,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    50
}

/// Poll the caller's notifications
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    responses((status = 200, description = "Notifications listed")),
    tag = "notifications"
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let (rows, total) = state
        .services
        .notifications
        .list_for_user(actor.id, query.unread_only, query.page, query.per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        rows,
        query.page,
        query.per_page,
        total,
    )))
}

/// Mark one notification as read
#[utoipa::path(
    post,
    path = "/api/v1/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked read"),
        (status = 404, description = "Notification not found")
    ),
    tag = "notifications"
)]
pub async fn mark_read(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(notification_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let notification = state
        .services
        .notifications
        .mark_read(actor.id, notification_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(notification))
}

/// Mark all of the caller's notifications as read
#[utoipa::path(
    post,
    path = "/api/v1/notifications/read-all",
    responses((status = 200, description = "Notifications marked read")),
    tag = "notifications"
)]
pub async fn mark_all_read(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let updated = state
        .services
        .notifications
        .mark_all_read(actor.id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({ "updated": updated })))
}

/// Creates the router for notification endpoints
pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/read-all", post(mark_all_read))
        .route("/:id/read", post(mark_read))
}
