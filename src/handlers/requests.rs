use super::common::{
    created_response, map_service_error, success_response, validate_input, PaginatedResponse,
};
use crate::{
    auth::AuthenticatedUser,
    errors::ApiError,
    handlers::AppState,
    services::requests::{CreateRequestItem, CreateRequestPayload, RequestFilter},
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Request and response DTOs

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateRequestRequest {
    #[validate(length(min = 1))]
    pub priority: String,
    #[validate(length(min = 1, max = 2000))]
    pub justification: String,
    pub delivery_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_draft: bool,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    #[validate(length(min = 1))]
    pub items: Vec<RequestItemRequest>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RequestItemRequest {
    #[validate(length(min = 1, max = 200))]
    pub material: String,
    pub specification: Option<String>,
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[validate(length(min = 1, max = 30))]
    pub unit: String,
    pub approx_unit_cost: Option<Decimal>,
    #[serde(default)]
    pub in_stock: bool,
    pub stock_location: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default, ToSchema)]
pub struct TransitionRequest {
    /// Expected request version; stale writes are rejected with 409.
    pub version: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RejectRequestRequest {
    #[validate(length(min = 1, max = 500, message = "Rejection reason is required"))]
    pub reason: String,
    pub version: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, Default, ToSchema)]
pub struct CancelRequestRequest {
    pub reason: Option<String>,
    pub version: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ListRequestsQuery {
    pub status: Option<String>,
    pub area: Option<String>,
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

// Handler functions

/// Create a new purchase request
#[utoipa::path(
    post,
    path = "/api/v1/requests",
    request_body = CreateRequestRequest,
    responses(
        (status = 201, description = "Request created"),
        (status = 400, description = "Invalid request")
    ),
    tag = "requests"
)]
pub async fn create_request(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<CreateRequestRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let items = payload
        .items
        .into_iter()
        .map(|item| CreateRequestItem {
            material: item.material,
            specification: item.specification,
            quantity: item.quantity,
            unit: item.unit,
            approx_unit_cost: item.approx_unit_cost,
            in_stock: item.in_stock,
            stock_location: item.stock_location,
        })
        .collect();

    let service_payload = CreateRequestPayload {
        priority: payload.priority,
        justification: payload.justification,
        delivery_date: payload.delivery_date,
        is_draft: payload.is_draft,
        scheduled_for: payload.scheduled_for,
        notes: payload.notes,
        items,
    };

    let (request, items) = state
        .services
        .requests
        .create_request(service_payload, &actor)
        .await
        .map_err(map_service_error)?;

    info!("Request created: {}", request.folio);

    Ok(created_response(serde_json::json!({
        "request": request,
        "items": items,
    })))
}

/// List purchase requests
#[utoipa::path(
    get,
    path = "/api/v1/requests",
    responses(
        (status = 200, description = "Requests listed")
    ),
    tag = "requests"
)]
pub async fn list_requests(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Query(query): Query<ListRequestsQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    // Requesters only see their own; purchasers and directors see all.
    let user_filter = if actor.role.can_purchase() || actor.role.can_authorize() {
        None
    } else {
        Some(actor.id)
    };

    let filter = RequestFilter {
        status: query.status,
        area: query.area,
        user_id: user_filter,
    };

    let (rows, total) = state
        .services
        .requests
        .list_requests(filter, query.page, query.per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        rows,
        query.page,
        query.per_page,
        total,
    )))
}

/// Get a purchase request by ID
#[utoipa::path(
    get,
    path = "/api/v1/requests/{id}",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request fetched"),
        (status = 404, description = "Request not found")
    ),
    tag = "requests"
)]
pub async fn get_request(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(request_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let request = state
        .services
        .requests
        .get_request(request_id)
        .await
        .map_err(map_service_error)?
        .ok_or_else(|| ApiError::NotFound(format!("Request with ID {} not found", request_id)))?;

    Ok(success_response(request))
}

/// Get the line items of a request
#[utoipa::path(
    get,
    path = "/api/v1/requests/{id}/items",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses((status = 200, description = "Request items fetched")),
    tag = "requests"
)]
pub async fn get_request_items(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(request_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let items = state
        .services
        .requests
        .get_items(request_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(items))
}

/// Submit a draft or scheduled request into the approval queue
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/submit",
    request_body = TransitionRequest,
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request submitted"),
        (status = 409, description = "Invalid transition")
    ),
    tag = "requests"
)]
pub async fn submit_request(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<TransitionRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let request = state
        .services
        .requests
        .submit_request(request_id, &actor, payload.version)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(request))
}

/// Authorize a pending request (director)
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/authorize",
    request_body = TransitionRequest,
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request authorized"),
        (status = 403, description = "Caller may not authorize"),
        (status = 409, description = "Invalid transition")
    ),
    tag = "requests"
)]
pub async fn authorize_request(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<TransitionRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let request = state
        .services
        .requests
        .authorize(request_id, &actor, payload.version)
        .await
        .map_err(map_service_error)?;

    info!("Request authorized: {}", request.folio);
    Ok(success_response(request))
}

/// Reject a pending request (director, reason required)
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/reject",
    request_body = RejectRequestRequest,
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request rejected"),
        (status = 400, description = "Missing reason"),
        (status = 409, description = "Invalid transition")
    ),
    tag = "requests"
)]
pub async fn reject_request(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<RejectRequestRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let request = state
        .services
        .requests
        .reject(request_id, &actor, &payload.reason, payload.version)
        .await
        .map_err(map_service_error)?;

    info!("Request rejected: {}", request.folio);
    Ok(success_response(request))
}

/// Cancel a request before authorization
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/cancel",
    request_body = CancelRequestRequest,
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request cancelled"),
        (status = 409, description = "Invalid transition")
    ),
    tag = "requests"
)]
pub async fn cancel_request(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<CancelRequestRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let request = state
        .services
        .requests
        .cancel(request_id, &actor, payload.reason, payload.version)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(request))
}

/// Explicitly move an authorized request into quoting
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/start-quoting",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request moved to quoting"),
        (status = 409, description = "Invalid transition")
    ),
    tag = "requests"
)]
pub async fn start_quoting(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(request_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let request = state
        .services
        .requests
        .advance_to_quoting(request_id, &actor)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(request))
}

/// Issue the purchase order for a fully resolved request
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/issue-order",
    request_body = TransitionRequest,
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 201, description = "Purchase order issued"),
        (status = 400, description = "Unresolved items"),
        (status = 409, description = "Invalid transition")
    ),
    tag = "requests"
)]
pub async fn issue_order(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<TransitionRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let (request, order) = state
        .services
        .requests
        .issue_order(request_id, &actor, payload.version)
        .await
        .map_err(map_service_error)?;

    info!("Order {} issued for request {}", order.folio, request.folio);

    Ok(created_response(serde_json::json!({
        "request": request,
        "order": order,
    })))
}

/// Director override acknowledging over-budget spend
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/budget-approval",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Over-budget spend approved"),
        (status = 403, description = "Caller may not approve budgets")
    ),
    tag = "requests"
)]
pub async fn approve_budget(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(request_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let request = state
        .services
        .requests
        .approve_budget(request_id, &actor)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(request))
}

/// Per-line quotation comparison for a request
#[utoipa::path(
    get,
    path = "/api/v1/requests/{id}/comparison",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses((status = 200, description = "Comparison computed")),
    tag = "requests"
)]
pub async fn get_comparison(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(request_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let comparison = state
        .services
        .quotations
        .compute_comparison(request_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(comparison))
}

/// Live total over the currently selected quotation items
#[utoipa::path(
    get,
    path = "/api/v1/requests/{id}/total-selected",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses((status = 200, description = "Total computed")),
    tag = "requests"
)]
pub async fn get_total_selected(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(request_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let total = state
        .services
        .quotations
        .total_selected(request_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({ "total": total })))
}

/// Creates the router for request endpoints
pub fn request_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_request))
        .route("/", get(list_requests))
        .route("/:id", get(get_request))
        .route("/:id/items", get(get_request_items))
        .route("/:id/submit", post(submit_request))
        .route("/:id/authorize", post(authorize_request))
        .route("/:id/reject", post(reject_request))
        .route("/:id/cancel", post(cancel_request))
        .route("/:id/start-quoting", post(start_quoting))
        .route("/:id/issue-order", post(issue_order))
        .route("/:id/budget-approval", post(approve_budget))
        .route("/:id/comparison", get(get_comparison))
        .route("/:id/total-selected", get(get_total_selected))
}
