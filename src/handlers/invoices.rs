use super::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    auth::{AuthenticatedUser, Role},
    errors::ApiError,
    handlers::AppState,
    services::invoices::RegisterInvoicePayload,
};
use axum::{
    extract::{Json, Path, State},
    routing::{get, post},
    Router,
};
use tracing::info;
use uuid::Uuid;

/// Register an invoice against a received order
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/invoices",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 201, description = "Invoice registered"),
        (status = 409, description = "Order not yet received")
    ),
    tag = "invoices"
)]
pub async fn register_invoice(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<RegisterInvoicePayload>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    actor
        .require(&[Role::Comprador, Role::Admin], "register invoices")
        .map_err(map_service_error)?;

    let invoice = state
        .services
        .invoices
        .register(order_id, payload)
        .await
        .map_err(map_service_error)?;

    info!("Invoice registered: {}", invoice.invoice_number);
    Ok(created_response(invoice))
}

/// List the invoices registered against an order
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/invoices",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses((status = 200, description = "Invoices listed")),
    tag = "invoices"
)]
pub async fn list_order_invoices(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let invoices = state
        .services
        .invoices
        .list_for_order(order_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(invoices))
}

/// Routes nested under /orders/:id
pub fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/:id/invoices", post(register_invoice))
        .route("/:id/invoices", get(list_order_invoices))
}
