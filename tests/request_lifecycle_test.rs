//! End-to-end tests for the purchase request lifecycle:
//! creation (draft / scheduled / pending), director authorization and
//! rejection, requester cancellation, and the scheduled-submission sweep.

mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{response_json, TestApp};
use serde_json::json;

fn two_item_request() -> serde_json::Value {
    json!({
        "priority": "normal",
        "justification": "Equipo de cómputo para el área",
        "items": [
            { "material": "Mouse", "quantity": 5, "unit": "pieza" },
            { "material": "Teclado", "quantity": 2, "unit": "pieza" }
        ]
    })
}

async fn create_pending_request(app: &TestApp) -> String {
    let response = app
        .request_as(
            &app.solicitante,
            Method::POST,
            "/api/v1/requests",
            Some(two_item_request()),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["request"]["status"], "pendiente");
    body["data"]["request"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn create_assigns_sequential_folio_and_pending_status() {
    let app = TestApp::new().await;
    let year = Utc::now().format("%Y").to_string();

    let response = app
        .request_as(
            &app.solicitante,
            Method::POST,
            "/api/v1/requests",
            Some(two_item_request()),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(
        body["data"]["request"]["folio"],
        format!("REQ-{}-001", year)
    );
    assert_eq!(body["data"]["request"]["area"], "Sistemas");
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);

    let response = app
        .request_as(
            &app.solicitante,
            Method::POST,
            "/api/v1/requests",
            Some(two_item_request()),
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(
        body["data"]["request"]["folio"],
        format!("REQ-{}-002", year)
    );
}

#[tokio::test]
async fn requests_require_authentication() {
    let app = TestApp::new().await;
    let response = app.request_anonymous(Method::GET, "/api/v1/requests").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn authorize_then_reject_is_invalid_transition() {
    let app = TestApp::new().await;
    let request_id = create_pending_request(&app).await;

    let response = app
        .request_as(
            &app.director,
            Method::POST,
            &format!("/api/v1/requests/{}/authorize", request_id),
            Some(json!({})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "autorizada");
    assert!(body["data"]["authorized_at"].is_string());

    // Rejecting an already authorized request must fail and leave it intact.
    let response = app
        .request_as(
            &app.director,
            Method::POST,
            &format!("/api/v1/requests/{}/reject", request_id),
            Some(json!({ "reason": "demasiado caro" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .request_as(
            &app.director,
            Method::GET,
            &format!("/api/v1/requests/{}", request_id),
            None,
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "autorizada");
    assert!(body["data"]["rejection_reason"].is_null());
}

#[tokio::test]
async fn solicitante_cannot_authorize() {
    let app = TestApp::new().await;
    let request_id = create_pending_request(&app).await;

    let response = app
        .request_as(
            &app.solicitante,
            Method::POST,
            &format!("/api/v1/requests/{}/authorize", request_id),
            Some(json!({})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn reject_requires_reason() {
    let app = TestApp::new().await;
    let request_id = create_pending_request(&app).await;

    let response = app
        .request_as(
            &app.director,
            Method::POST,
            &format!("/api/v1/requests/{}/reject", request_id),
            Some(json!({ "reason": "" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_as(
            &app.director,
            Method::POST,
            &format!("/api/v1/requests/{}/reject", request_id),
            Some(json!({ "reason": "No hay presupuesto este mes" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "rechazada");
    assert_eq!(body["data"]["rejection_reason"], "No hay presupuesto este mes");
}

#[tokio::test]
async fn requester_can_cancel_before_authorization() {
    let app = TestApp::new().await;
    let request_id = create_pending_request(&app).await;

    let response = app
        .request_as(
            &app.solicitante,
            Method::POST,
            &format!("/api/v1/requests/{}/cancel", request_id),
            Some(json!({ "reason": "ya no se necesita" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "cancelada");

    // Terminal: cannot be authorized afterwards.
    let response = app
        .request_as(
            &app.director,
            Method::POST,
            &format!("/api/v1/requests/{}/authorize", request_id),
            Some(json!({})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn other_users_cannot_cancel_someone_elses_request() {
    let app = TestApp::new().await;
    let request_id = create_pending_request(&app).await;

    let response = app
        .request_as(
            &app.comprador,
            Method::POST,
            &format!("/api/v1/requests/{}/cancel", request_id),
            Some(json!({})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn draft_flow_submits_into_pending() {
    let app = TestApp::new().await;

    let mut payload = two_item_request();
    payload["is_draft"] = json!(true);

    let response = app
        .request_as(&app.solicitante, Method::POST, "/api/v1/requests", Some(payload))
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["request"]["status"], "borrador");
    let request_id = body["data"]["request"]["id"].as_str().unwrap().to_string();

    let response = app
        .request_as(
            &app.solicitante,
            Method::POST,
            &format!("/api/v1/requests/{}/submit", request_id),
            Some(json!({})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "pendiente");
    assert_eq!(body["data"]["is_draft"], false);
}

#[tokio::test]
async fn scheduled_sweep_is_idempotent() {
    let app = TestApp::new().await;

    let mut payload = two_item_request();
    payload["scheduled_for"] = json!(Utc::now() + Duration::hours(1));

    let response = app
        .request_as(&app.solicitante, Method::POST, "/api/v1/requests", Some(payload))
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["request"]["status"], "programada");
    let request_id = body["data"]["request"]["id"].as_str().unwrap().to_string();

    // Before the scheduled time the sweep does nothing.
    let activated = app
        .services
        .requests
        .activate_due_requests(Utc::now())
        .await
        .unwrap();
    assert_eq!(activated, 0);

    // Once due, exactly one activation; a second run in the same minute is a
    // no-op.
    let later = Utc::now() + Duration::hours(2);
    let activated = app
        .services
        .requests
        .activate_due_requests(later)
        .await
        .unwrap();
    assert_eq!(activated, 1);

    let activated = app
        .services
        .requests
        .activate_due_requests(later)
        .await
        .unwrap();
    assert_eq!(activated, 0);

    let response = app
        .request_as(
            &app.solicitante,
            Method::GET,
            &format!("/api/v1/requests/{}", request_id),
            None,
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "pendiente");
}

#[tokio::test]
async fn stale_version_is_rejected() {
    let app = TestApp::new().await;
    let request_id = create_pending_request(&app).await;

    // Version 1 is current; a stale writer holding version 0 loses.
    let response = app
        .request_as(
            &app.director,
            Method::POST,
            &format!("/api/v1/requests/{}/authorize", request_id),
            Some(json!({ "version": 0 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .request_as(
            &app.director,
            Method::POST,
            &format!("/api/v1/requests/{}/authorize", request_id),
            Some(json!({ "version": 1 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn invalid_priority_is_rejected() {
    let app = TestApp::new().await;

    let mut payload = two_item_request();
    payload["priority"] = json!("inmediata");

    let response = app
        .request_as(&app.solicitante, Method::POST, "/api/v1/requests", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn solicitante_only_sees_own_requests() {
    let app = TestApp::new().await;
    create_pending_request(&app).await;

    // A different requester sees an empty list; the purchaser sees all.
    let response = app
        .request_as(&app.comprador, Method::GET, "/api/v1/requests", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["pagination"]["total"], 1);

    let response = app
        .request_as(&app.solicitante, Method::GET, "/api/v1/requests", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["pagination"]["total"], 1);
}
