use super::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    auth::{AuthenticatedUser, Role},
    errors::ApiError,
    handlers::AppState,
    services::schedules::{CreateSchedulePayload, DeclareNoRequirementPayload},
};
use axum::{
    extract::{Json, Query, State},
    routing::{get, post},
    Router,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    pub area: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NoRequirementQuery {
    pub area: Option<String>,
    pub year: Option<i32>,
}

/// Create a submission window for an area
#[utoipa::path(
    post,
    path = "/api/v1/area-schedules",
    responses(
        (status = 201, description = "Schedule created"),
        (status = 403, description = "Caller may not manage schedules")
    ),
    tag = "schedules"
)]
pub async fn create_schedule(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<CreateSchedulePayload>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    actor
        .require(&[Role::Director, Role::Admin], "manage area schedules")
        .map_err(map_service_error)?;

    let schedule = state
        .services
        .schedules
        .create_schedule(payload, actor.id)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(schedule))
}

/// List submission windows
#[utoipa::path(
    get,
    path = "/api/v1/area-schedules",
    responses((status = 200, description = "Schedules listed")),
    tag = "schedules"
)]
pub async fn list_schedules(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<ScheduleQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let schedules = state
        .services
        .schedules
        .list_schedules(query.area)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(schedules))
}

/// Declare that the caller's area has no requirements for a period
#[utoipa::path(
    post,
    path = "/api/v1/no-requirements",
    responses(
        (status = 201, description = "Declaration recorded"),
        (status = 409, description = "Period already declared")
    ),
    tag = "schedules"
)]
pub async fn declare_no_requirement(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<DeclareNoRequirementPayload>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let declaration = state
        .services
        .schedules
        .declare_no_requirement(&actor.area, payload, actor.id)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(declaration))
}

/// List no-requirement declarations
#[utoipa::path(
    get,
    path = "/api/v1/no-requirements",
    responses((status = 200, description = "Declarations listed")),
    tag = "schedules"
)]
pub async fn list_no_requirements(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<NoRequirementQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let declarations = state
        .services
        .schedules
        .list_no_requirements(query.area, query.year)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(declarations))
}

/// Routers for the scheduling resources
pub fn area_schedule_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_schedule))
        .route("/", get(list_schedules))
}

pub fn no_requirement_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(declare_no_requirement))
        .route("/", get(list_no_requirements))
}
