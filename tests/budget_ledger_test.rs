//! End-to-end tests for the area budget ledger: the zeroed sentinel for
//! unassigned budgets, consumption on order issuance, the allow-but-flag
//! over-budget policy, release on cancellation and drift reconciliation.

mod common;

use axum::http::{Method, StatusCode};
use chrono::{Datelike, Utc};
use common::{issue_order_flow, money, response_json, TestApp, TEST_AREA};
use procura_api::entities::budget::{self, Entity as BudgetEntity};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;

async fn assign_budget(app: &TestApp, total: &str) {
    let response = app
        .request_as(
            &app.director,
            Method::PUT,
            "/api/v1/budgets",
            Some(json!({
                "area": TEST_AREA,
                "year": Utc::now().year(),
                "total_amount": total,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

async fn my_budget(app: &TestApp) -> serde_json::Value {
    let response = app
        .request_as(&app.solicitante, Method::GET, "/api/v1/budgets/my", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    response_json(response).await["data"].clone()
}

/// Writes the accumulator directly, bypassing the services, to simulate
/// historical spend or drift.
async fn force_spent(app: &TestApp, spent: Decimal) {
    let row = BudgetEntity::find()
        .filter(budget::Column::Area.eq(TEST_AREA))
        .filter(budget::Column::Year.eq(Utc::now().year()))
        .one(&*app.db)
        .await
        .expect("query budget")
        .expect("budget row");
    let mut active: budget::ActiveModel = row.into();
    active.spent_amount = Set(spent);
    active.update(&*app.db).await.expect("update budget");
}

#[tokio::test]
async fn missing_budget_degrades_to_a_zero_sentinel() {
    let app = TestApp::new().await;

    let budget = my_budget(&app).await;
    assert_eq!(budget["area"], TEST_AREA);
    assert_eq!(money(&budget["total_amount"]), Decimal::ZERO);
    assert_eq!(money(&budget["spent_amount"]), Decimal::ZERO);
    assert_eq!(money(&budget["available_amount"]), Decimal::ZERO);
    assert_eq!(budget["percentage_used"], 0.0);
}

#[tokio::test]
async fn assign_then_fetch_reports_the_position() {
    let app = TestApp::new().await;
    assign_budget(&app, "10000.00").await;

    let year = Utc::now().year();
    let response = app
        .request_as(
            &app.director,
            Method::GET,
            &format!("/api/v1/budgets/{}/{}", TEST_AREA, year),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let budget = response_json(response).await["data"].clone();
    assert_eq!(money(&budget["total_amount"]), dec!(10000.00));
    assert_eq!(money(&budget["spent_amount"]), Decimal::ZERO);
    assert_eq!(money(&budget["available_amount"]), dec!(10000.00));

    // Re-assigning updates the allowance without touching spend.
    assign_budget(&app, "12000.00").await;
    let budget = my_budget(&app).await;
    assert_eq!(money(&budget["total_amount"]), dec!(12000.00));
    assert_eq!(money(&budget["spent_amount"]), Decimal::ZERO);
}

#[tokio::test]
async fn issuing_an_order_consumes_budget() {
    let app = TestApp::new().await;
    assign_budget(&app, "10000.00").await;

    issue_order_flow(&app, "800.00", "PRV010101AB1").await;

    let budget = my_budget(&app).await;
    assert_eq!(money(&budget["spent_amount"]), dec!(800.00));
    assert_eq!(money(&budget["available_amount"]), dec!(9200.00));
}

#[tokio::test]
async fn over_budget_orders_are_flagged_not_blocked() {
    let app = TestApp::new().await;
    assign_budget(&app, "10000.00").await;
    force_spent(&app, dec!(9500.00)).await;

    // The $800 order goes through despite only $500 remaining.
    let (request_id, _) = issue_order_flow(&app, "800.00", "PRV010101AB1").await;

    let budget = my_budget(&app).await;
    assert_eq!(money(&budget["spent_amount"]), dec!(10300.00));
    // Over-budget is representable, never clamped to zero.
    assert_eq!(money(&budget["available_amount"]), dec!(-300.00));
    assert!(budget["percentage_used"].as_f64().unwrap() > 100.0);

    // The overrun stays unapproved until a director signs it off.
    let response = app
        .request_as(
            &app.solicitante,
            Method::GET,
            &format!("/api/v1/requests/{}", request_id),
            None,
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "emitida");
    assert_eq!(body["data"]["budget_approved"], false);

    let response = app
        .request_as(
            &app.solicitante,
            Method::POST,
            &format!("/api/v1/requests/{}/budget-approval", request_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request_as(
            &app.director,
            Method::POST,
            &format!("/api/v1/requests/{}/budget-approval", request_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["budget_approved"], true);
}

#[tokio::test]
async fn spend_without_an_assigned_budget_is_allowed() {
    let app = TestApp::new().await;

    // No budget row for the area at all; the order still goes through.
    issue_order_flow(&app, "800.00", "PRV010101AB1").await;

    let budget = my_budget(&app).await;
    assert_eq!(money(&budget["total_amount"]), Decimal::ZERO);
    assert_eq!(money(&budget["spent_amount"]), Decimal::ZERO);
}

#[tokio::test]
async fn cancelling_an_order_releases_its_spend() {
    let app = TestApp::new().await;
    assign_budget(&app, "10000.00").await;

    let (request_id, order_id) = issue_order_flow(&app, "800.00", "PRV010101AB1").await;
    assert_eq!(money(&my_budget(&app).await["spent_amount"]), dec!(800.00));

    let response = app
        .request_as(
            &app.comprador,
            Method::POST,
            &format!("/api/v1/orders/{}/cancel", order_id),
            Some(json!({ "reason": "proveedor sin existencias" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let budget = my_budget(&app).await;
    assert_eq!(money(&budget["spent_amount"]), Decimal::ZERO);
    assert_eq!(money(&budget["available_amount"]), dec!(10000.00));

    let response = app
        .request_as(
            &app.solicitante,
            Method::GET,
            &format!("/api/v1/requests/{}", request_id),
            None,
        )
        .await;
    assert_eq!(response_json(response).await["data"]["status"], "cancelada");
}

#[tokio::test]
async fn reconcile_corrects_a_drifted_accumulator() {
    let app = TestApp::new().await;
    assign_budget(&app, "10000.00").await;
    issue_order_flow(&app, "800.00", "PRV010101AB1").await;

    // Drift the accumulator away from the true sum over orders.
    force_spent(&app, dec!(5000.00)).await;

    let response = app
        .request_as(&app.admin, Method::POST, "/api/v1/budgets/reconcile", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let corrections = body["data"]["corrections"].as_array().unwrap();
    assert_eq!(corrections.len(), 1);
    assert_eq!(corrections[0]["area"], TEST_AREA);
    assert_eq!(money(&corrections[0]["stored_spent"]), dec!(5000.00));
    assert_eq!(money(&corrections[0]["actual_spent"]), dec!(800.00));

    assert_eq!(money(&my_budget(&app).await["spent_amount"]), dec!(800.00));

    // A second run finds nothing to correct.
    let response = app
        .request_as(&app.admin, Method::POST, "/api/v1/budgets/reconcile", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["corrections"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn budget_mutations_require_elevated_roles() {
    let app = TestApp::new().await;

    let response = app
        .request_as(
            &app.comprador,
            Method::PUT,
            "/api/v1/budgets",
            Some(json!({
                "area": TEST_AREA,
                "year": Utc::now().year(),
                "total_amount": "10000.00",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request_as(&app.comprador, Method::POST, "/api/v1/budgets/reconcile", None)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Requesters may only look at their own area's position.
    let response = app
        .request_as(
            &app.solicitante,
            Method::GET,
            &format!("/api/v1/budgets/{}/{}", TEST_AREA, Utc::now().year()),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
