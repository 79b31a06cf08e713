//! Procura API Library
//!
//! Backend for procurement management: purchase requests, supplier
//! quotations, purchase orders, invoices and per-area budgets.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod push;
pub mod services;

use axum::{extract::State, response::Json, routing::get, Router};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
    pub push: Arc<push::PushGateway>,
}

/// Response envelope expected by the frontend on every endpoint:
/// `{"success": bool, "data": ..., "error": string?}`.
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

// API v1 routes
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Status and health endpoints
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        // Workflow resources
        .nest("/requests", handlers::requests::request_routes())
        .nest("/quotations", handlers::quotations::quotation_routes())
        .nest(
            "/orders",
            handlers::orders::order_routes().merge(handlers::invoices::invoice_routes()),
        )
        .nest("/budgets", handlers::budgets::budget_routes())
        // Catalog and supporting resources
        .nest("/suppliers", handlers::suppliers::supplier_routes())
        .nest(
            "/notifications",
            handlers::notifications::notification_routes(),
        )
        .nest(
            "/area-schedules",
            handlers::schedules::area_schedule_routes(),
        )
        .nest(
            "/no-requirements",
            handlers::schedules::no_requirement_routes(),
        )
        .nest("/audit", handlers::audit::audit_routes())
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let version = env!("CARGO_PKG_VERSION");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "service": "procura-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}
