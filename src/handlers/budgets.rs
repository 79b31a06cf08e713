use super::common::{map_service_error, success_response, validate_input};
use crate::{
    auth::{AuthenticatedUser, Role},
    errors::ApiError,
    handlers::AppState,
};
use axum::{
    extract::{Json, Path, State},
    routing::{get, post, put},
    Router,
};
use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct AssignBudgetRequest {
    #[validate(length(min = 1))]
    pub area: String,
    #[validate(range(min = 2000, max = 2100))]
    pub year: i32,
    pub total_amount: Decimal,
}

/// Budget position for the caller's own area, current year
#[utoipa::path(
    get,
    path = "/api/v1/budgets/my",
    responses((status = 200, description = "Budget fetched")),
    tag = "budgets"
)]
pub async fn get_my_budget(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let budget = state
        .services
        .budgets
        .get_budget(&actor.area, Utc::now().year())
        .await
        .map_err(map_service_error)?;

    Ok(success_response(budget))
}

/// Budget position for an area and year
#[utoipa::path(
    get,
    path = "/api/v1/budgets/{area}/{year}",
    params(
        ("area" = String, Path, description = "Area name"),
        ("year" = i32, Path, description = "Budget year")
    ),
    responses((status = 200, description = "Budget fetched")),
    tag = "budgets"
)]
pub async fn get_budget(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path((area, year)): Path<(String, i32)>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    actor
        .require(
            &[Role::Comprador, Role::Director, Role::Admin],
            "inspect other areas' budgets",
        )
        .map_err(map_service_error)?;

    let budget = state
        .services
        .budgets
        .get_budget(&area, year)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(budget))
}

/// Assign or update the allowance for an area and year
#[utoipa::path(
    put,
    path = "/api/v1/budgets",
    request_body = AssignBudgetRequest,
    responses(
        (status = 200, description = "Budget assigned"),
        (status = 403, description = "Caller may not assign budgets")
    ),
    tag = "budgets"
)]
pub async fn assign_budget(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<AssignBudgetRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    actor
        .require(&[Role::Director, Role::Admin], "assign budgets")
        .map_err(map_service_error)?;

    let budget = state
        .services
        .budgets
        .assign(&payload.area, payload.year, payload.total_amount)
        .await
        .map_err(map_service_error)?;

    info!("Budget assigned: {} {}", budget.area, budget.year);
    Ok(success_response(budget))
}

/// Recompute accumulators from issued orders and correct drift
#[utoipa::path(
    post,
    path = "/api/v1/budgets/reconcile",
    responses(
        (status = 200, description = "Reconciliation completed"),
        (status = 403, description = "Caller may not reconcile budgets")
    ),
    tag = "budgets"
)]
pub async fn reconcile_budgets(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    actor
        .require(&[Role::Admin], "reconcile budgets")
        .map_err(map_service_error)?;

    let corrections = state
        .services
        .budgets
        .reconcile()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({
        "corrections": corrections,
    })))
}

/// Creates the router for budget endpoints
pub fn budget_routes() -> Router<AppState> {
    Router::new()
        .route("/", put(assign_budget))
        .route("/my", get(get_my_budget))
        .route("/reconcile", post(reconcile_budgets))
        .route("/:area/:year", get(get_budget))
}
