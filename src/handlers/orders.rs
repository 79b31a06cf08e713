use super::common::{map_service_error, success_response, validate_input, PaginatedResponse};
use crate::{
    auth::AuthenticatedUser,
    errors::ApiError,
    handlers::AppState,
    services::orders::OrderFilter,
    services::request_status::OrderStatus,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderStatusRequest {
    #[validate(length(min = 1))]
    pub status: String,
    pub actual_delivery: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default, ToSchema)]
pub struct CancelOrderRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub request_id: Option<Uuid>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

/// List purchase orders
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    responses((status = 200, description = "Orders listed")),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<ListOrdersQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let filter = OrderFilter {
        status: query.status,
        supplier_id: query.supplier_id,
        request_id: query.request_id,
    };

    let (rows, total) = state
        .services
        .orders
        .list_orders(filter, query.page, query.per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        rows,
        query.page,
        query.per_page,
        total,
    )))
}

/// Get a purchase order by ID
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order fetched"),
        (status = 404, description = "Order not found")
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .get_order(order_id)
        .await
        .map_err(map_service_error)?
        .ok_or_else(|| ApiError::NotFound(format!("Order with ID {} not found", order_id)))?;

    Ok(success_response(order))
}

/// Advance an order along its lifecycle
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/status",
    request_body = UpdateOrderStatusRequest,
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order advanced"),
        (status = 400, description = "Unknown status"),
        (status = 409, description = "Invalid transition")
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let new_status = OrderStatus::from_str(&payload.status).map_err(|_| {
        ApiError::ValidationError(format!(
            "Unknown order status '{}'; valid statuses are emitida, en_transito, recibida, cancelada",
            payload.status
        ))
    })?;

    let order = state
        .services
        .orders
        .advance_order(
            order_id,
            new_status,
            &actor,
            payload.actual_delivery,
            payload.notes,
        )
        .await
        .map_err(map_service_error)?;

    info!("Order {} advanced to {}", order.folio, order.status);
    Ok(success_response(order))
}

/// Cancel an order
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/cancel",
    request_body = CancelOrderRequest,
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order cancelled"),
        (status = 409, description = "Order already terminal")
    ),
    tag = "orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<CancelOrderRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .cancel_order(order_id, &actor, payload.reason)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order))
}

/// Creates the router for order endpoints
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/:id", get(get_order))
        .route("/:id/status", put(update_order_status))
        .route("/:id/cancel", post(cancel_order))
}
