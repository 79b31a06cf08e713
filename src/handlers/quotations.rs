use super::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    auth::AuthenticatedUser,
    errors::ApiError,
    handlers::AppState,
    services::quotations::{AttachQuotationItem, AttachQuotationRequest},
};
use axum::{
    extract::{Json, Path, State},
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

// Request DTOs

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct AttachQuotationHttpRequest {
    pub request_id: Uuid,
    pub supplier_id: Uuid,
    pub payment_terms: Option<String>,
    pub valid_until: Option<DateTime<Utc>>,
    #[validate(length(min = 1))]
    pub items: Vec<QuotationItemHttpRequest>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct QuotationItemHttpRequest {
    pub request_item_id: Uuid,
    pub unit_price: Decimal,
    #[serde(default)]
    pub has_invoice: bool,
    pub delivery_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub has_warranty: bool,
    pub warranty_months: Option<i32>,
}

// Handler functions

/// Attach a supplier quotation to a request
#[utoipa::path(
    post,
    path = "/api/v1/quotations",
    request_body = AttachQuotationHttpRequest,
    responses(
        (status = 201, description = "Quotation attached"),
        (status = 409, description = "Supplier already quoted this request")
    ),
    tag = "quotations"
)]
pub async fn attach_quotation(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<AttachQuotationHttpRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    actor
        .require(
            &[crate::auth::Role::Comprador, crate::auth::Role::Admin],
            "attach quotations",
        )
        .map_err(map_service_error)?;

    let items = payload
        .items
        .into_iter()
        .map(|item| AttachQuotationItem {
            request_item_id: item.request_item_id,
            unit_price: item.unit_price,
            has_invoice: item.has_invoice,
            delivery_date: item.delivery_date,
            has_warranty: item.has_warranty,
            warranty_months: item.warranty_months,
        })
        .collect();

    let quotation = state
        .services
        .quotations
        .attach_quotation(
            AttachQuotationRequest {
                request_id: payload.request_id,
                supplier_id: payload.supplier_id,
                payment_terms: payload.payment_terms,
                valid_until: payload.valid_until,
                items,
            },
            actor.id,
        )
        .await
        .map_err(map_service_error)?;

    info!("Quotation attached: {}", quotation.id);
    Ok(created_response(quotation))
}

/// Get a quotation with its items
#[utoipa::path(
    get,
    path = "/api/v1/quotations/{id}",
    params(("id" = Uuid, Path, description = "Quotation ID")),
    responses(
        (status = 200, description = "Quotation fetched"),
        (status = 404, description = "Quotation not found")
    ),
    tag = "quotations"
)]
pub async fn get_quotation(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(quotation_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let (quotation, items) = state
        .services
        .quotations
        .get_quotation(quotation_id)
        .await
        .map_err(map_service_error)?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Quotation with ID {} not found", quotation_id))
        })?;

    Ok(success_response(serde_json::json!({
        "quotation": quotation,
        "items": items,
    })))
}

/// Mark a quotation item as the winning bid for its request line
#[utoipa::path(
    post,
    path = "/api/v1/quotations/items/{id}/select",
    params(("id" = Uuid, Path, description = "Quotation item ID")),
    responses(
        (status = 200, description = "Item selected"),
        (status = 404, description = "Quotation item not found")
    ),
    tag = "quotations"
)]
pub async fn select_item(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(quotation_item_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    actor
        .require(
            &[crate::auth::Role::Comprador, crate::auth::Role::Admin],
            "select quotation items",
        )
        .map_err(map_service_error)?;

    let item = state
        .services
        .quotations
        .select_item(quotation_item_id, actor.id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(item))
}

/// Creates the router for quotation endpoints
pub fn quotation_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(attach_quotation))
        .route("/:id", get(get_quotation))
        .route("/items/:id/select", post(select_item))
}
