use super::common::{
    created_response, map_service_error, success_response, validate_input, PaginatedResponse,
};
use crate::{
    auth::{AuthenticatedUser, Role},
    errors::ApiError,
    handlers::AppState,
    services::suppliers::{CreateSupplierPayload, SupplierFilter, UpdateSupplierPayload},
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ListSuppliersQuery {
    pub category: Option<String>,
    pub active: Option<bool>,
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

/// Register a supplier
#[utoipa::path(
    post,
    path = "/api/v1/suppliers",
    responses(
        (status = 201, description = "Supplier created"),
        (status = 409, description = "RFC already registered")
    ),
    tag = "suppliers"
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<CreateSupplierPayload>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    actor
        .require(&[Role::Comprador, Role::Admin], "manage suppliers")
        .map_err(map_service_error)?;

    let supplier = state
        .services
        .suppliers
        .create_supplier(payload)
        .await
        .map_err(map_service_error)?;

    info!("Supplier created: {}", supplier.rfc);
    Ok(created_response(supplier))
}

/// List suppliers
#[utoipa::path(
    get,
    path = "/api/v1/suppliers",
    responses((status = 200, description = "Suppliers listed")),
    tag = "suppliers"
)]
pub async fn list_suppliers(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<ListSuppliersQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let filter = SupplierFilter {
        category: query.category,
        active: query.active,
    };

    let (rows, total) = state
        .services
        .suppliers
        .list_suppliers(filter, query.page, query.per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        rows,
        query.page,
        query.per_page,
        total,
    )))
}

/// Get a supplier by ID
#[utoipa::path(
    get,
    path = "/api/v1/suppliers/{id}",
    params(("id" = Uuid, Path, description = "Supplier ID")),
    responses(
        (status = 200, description = "Supplier fetched"),
        (status = 404, description = "Supplier not found")
    ),
    tag = "suppliers"
)]
pub async fn get_supplier(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(supplier_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let supplier = state
        .services
        .suppliers
        .get_supplier(supplier_id)
        .await
        .map_err(map_service_error)?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Supplier with ID {} not found", supplier_id))
        })?;

    Ok(success_response(supplier))
}

/// Update a supplier
#[utoipa::path(
    put,
    path = "/api/v1/suppliers/{id}",
    params(("id" = Uuid, Path, description = "Supplier ID")),
    responses(
        (status = 200, description = "Supplier updated"),
        (status = 404, description = "Supplier not found")
    ),
    tag = "suppliers"
)]
pub async fn update_supplier(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(supplier_id): Path<Uuid>,
    Json(payload): Json<UpdateSupplierPayload>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    actor
        .require(&[Role::Comprador, Role::Admin], "manage suppliers")
        .map_err(map_service_error)?;

    let supplier = state
        .services
        .suppliers
        .update_supplier(supplier_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(supplier))
}

/// Deactivate a supplier (soft delete)
#[utoipa::path(
    post,
    path = "/api/v1/suppliers/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Supplier ID")),
    responses(
        (status = 200, description = "Supplier deactivated"),
        (status = 404, description = "Supplier not found")
    ),
    tag = "suppliers"
)]
pub async fn deactivate_supplier(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(supplier_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    actor
        .require(&[Role::Comprador, Role::Admin], "manage suppliers")
        .map_err(map_service_error)?;

    let supplier = state
        .services
        .suppliers
        .deactivate_supplier(supplier_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(supplier))
}

/// Creates the router for supplier endpoints
pub fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_supplier))
        .route("/", get(list_suppliers))
        .route("/:id", get(get_supplier))
        .route("/:id", put(update_supplier))
        .route("/:id/deactivate", post(deactivate_supplier))
}
