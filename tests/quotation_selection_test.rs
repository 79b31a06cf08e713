//! End-to-end tests for quotation handling: attaching supplier quotations,
//! per-line winner selection, the comparison matrix, live selected totals and
//! order issuance gating.

mod common;

use axum::http::{Method, StatusCode};
use common::{money, response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use uuid::Uuid;

/// Creates a two-line request (Mouse x5, Teclado x2), authorizes it and
/// returns (request_id, mouse_item_id, teclado_item_id).
async fn authorized_request(app: &TestApp) -> (String, String, String) {
    let response = app
        .request_as(
            &app.solicitante,
            Method::POST,
            "/api/v1/requests",
            Some(json!({
                "priority": "normal",
                "justification": "Equipo de cómputo para el área",
                "items": [
                    { "material": "Mouse", "quantity": 5, "unit": "pieza" },
                    { "material": "Teclado", "quantity": 2, "unit": "pieza" }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    let request_id = body["data"]["request"]["id"].as_str().unwrap().to_string();
    let items = body["data"]["items"].as_array().unwrap();
    let mouse = items[0]["id"].as_str().unwrap().to_string();
    let teclado = items[1]["id"].as_str().unwrap().to_string();

    let response = app
        .request_as(
            &app.director,
            Method::POST,
            &format!("/api/v1/requests/{}/authorize", request_id),
            Some(json!({})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    (request_id, mouse, teclado)
}

async fn create_supplier(app: &TestApp, name: &str, rfc: &str) -> String {
    let response = app
        .request_as(
            &app.comprador,
            Method::POST,
            "/api/v1/suppliers",
            Some(json!({ "name": name, "rfc": rfc })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string()
}

async fn attach(
    app: &TestApp,
    request_id: &str,
    supplier_id: &str,
    items: Vec<Value>,
) -> axum::response::Response {
    app.request_as(
        &app.comprador,
        Method::POST,
        "/api/v1/quotations",
        Some(json!({
            "request_id": request_id,
            "supplier_id": supplier_id,
            "items": items,
        })),
    )
    .await
}

async fn comparison(app: &TestApp, request_id: &str) -> Value {
    let response = app
        .request_as(
            &app.comprador,
            Method::GET,
            &format!("/api/v1/requests/{}/comparison", request_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    response_json(response).await["data"].clone()
}

async fn select(app: &TestApp, quotation_item_id: &str) -> axum::response::Response {
    app.request_as(
        &app.comprador,
        Method::POST,
        &format!("/api/v1/quotations/items/{}/select", quotation_item_id),
        None,
    )
    .await
}

async fn total_selected(app: &TestApp, request_id: &str) -> rust_decimal::Decimal {
    let response = app
        .request_as(
            &app.comprador,
            Method::GET,
            &format!("/api/v1/requests/{}/total-selected", request_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    money(&response_json(response).await["data"]["total"])
}

#[tokio::test]
async fn attach_computes_subtotals_and_advances_to_quoting() {
    let app = TestApp::new().await;
    let (request_id, mouse, teclado) = authorized_request(&app).await;
    let supplier = create_supplier(&app, "Papelera del Centro", "PCE010101AB1").await;

    let response = attach(
        &app,
        &request_id,
        &supplier,
        vec![
            json!({ "request_item_id": mouse, "unit_price": "100.00" }),
            json!({ "request_item_id": teclado, "unit_price": "250.00" }),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    // 100 x 5 + 250 x 2, computed server-side from the request quantities.
    assert_eq!(money(&body["data"]["total_amount"]), dec!(1000.00));

    // The first quotation moves the request into quoting.
    let response = app
        .request_as(
            &app.comprador,
            Method::GET,
            &format!("/api/v1/requests/{}", request_id),
            None,
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "cotizando");
}

#[tokio::test]
async fn second_quotation_from_same_supplier_conflicts() {
    let app = TestApp::new().await;
    let (request_id, mouse, _) = authorized_request(&app).await;
    let supplier = create_supplier(&app, "Papelera del Centro", "PCE010101AB1").await;

    let response = attach(
        &app,
        &request_id,
        &supplier,
        vec![json!({ "request_item_id": mouse, "unit_price": "100.00" })],
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let quotation_id = response_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = attach(
        &app,
        &request_id,
        &supplier,
        vec![json!({ "request_item_id": mouse, "unit_price": "95.00" })],
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_json(response).await;
    assert_eq!(body["success"], false);

    // The original quotation is untouched.
    let response = app
        .request_as(
            &app.comprador,
            Method::GET,
            &format!("/api/v1/quotations/{}", quotation_id),
            None,
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(money(&body["data"]["quotation"]["total_amount"]), dec!(500.00));
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn selecting_a_competitor_deselects_the_previous_winner() {
    let app = TestApp::new().await;
    let (request_id, mouse, _) = authorized_request(&app).await;
    let supplier_a = create_supplier(&app, "Proveedor A", "PRA010101AB1").await;
    let supplier_b = create_supplier(&app, "Proveedor B", "PRB010101AB2").await;

    attach(
        &app,
        &request_id,
        &supplier_a,
        vec![json!({ "request_item_id": mouse, "unit_price": "100.00" })],
    )
    .await;
    attach(
        &app,
        &request_id,
        &supplier_b,
        vec![json!({ "request_item_id": mouse, "unit_price": "90.00" })],
    )
    .await;

    // Options come back cheapest first, so B leads.
    let matrix = comparison(&app, &request_id).await;
    let options = matrix[0]["options"].as_array().unwrap();
    assert_eq!(options.len(), 2);
    assert_eq!(money(&options[0]["unit_price"]), dec!(90.00));
    let b_item = options[0]["quotation_item_id"].as_str().unwrap().to_string();
    let a_item = options[1]["quotation_item_id"].as_str().unwrap().to_string();

    let response = select(&app, &b_item).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(total_selected(&app, &request_id).await, dec!(450.00));

    // Picking A afterwards must leave exactly one winner: A.
    let response = select(&app, &a_item).await;
    assert_eq!(response.status(), StatusCode::OK);

    let matrix = comparison(&app, &request_id).await;
    let options = matrix[0]["options"].as_array().unwrap();
    let selected: Vec<&Value> = options
        .iter()
        .filter(|o| o["is_selected"] == true)
        .collect();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0]["quotation_item_id"], a_item.as_str());
    assert_eq!(matrix[0]["selected_quotation_item_id"], a_item.as_str());
    assert_eq!(total_selected(&app, &request_id).await, dec!(500.00));
}

#[tokio::test]
async fn selecting_the_same_item_twice_is_a_noop() {
    let app = TestApp::new().await;
    let (request_id, mouse, _) = authorized_request(&app).await;
    let supplier = create_supplier(&app, "Proveedor A", "PRA010101AB1").await;

    attach(
        &app,
        &request_id,
        &supplier,
        vec![json!({ "request_item_id": mouse, "unit_price": "100.00" })],
    )
    .await;

    let matrix = comparison(&app, &request_id).await;
    let item = matrix[0]["options"][0]["quotation_item_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = select(&app, &item).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = select(&app, &item).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["is_selected"], true);
    assert_eq!(total_selected(&app, &request_id).await, dec!(500.00));
}

#[tokio::test]
async fn unquoted_lines_are_reported_unresolved() {
    let app = TestApp::new().await;
    let (request_id, mouse, _) = authorized_request(&app).await;
    let supplier = create_supplier(&app, "Proveedor A", "PRA010101AB1").await;

    attach(
        &app,
        &request_id,
        &supplier,
        vec![json!({ "request_item_id": mouse, "unit_price": "100.00" })],
    )
    .await;

    let matrix = comparison(&app, &request_id).await;
    assert_eq!(matrix.as_array().unwrap().len(), 2);
    // Mouse has a bid but no winner yet; Teclado has no bids at all.
    assert_eq!(matrix[0]["material"], "Mouse");
    assert_eq!(matrix[0]["unresolved"], true);
    assert_eq!(matrix[1]["material"], "Teclado");
    assert_eq!(matrix[1]["options"].as_array().unwrap().len(), 0);
    assert_eq!(matrix[1]["unresolved"], true);
}

#[tokio::test]
async fn issue_order_is_blocked_while_a_line_is_unresolved() {
    let app = TestApp::new().await;
    let (request_id, mouse, _) = authorized_request(&app).await;
    let supplier = create_supplier(&app, "Proveedor A", "PRA010101AB1").await;

    attach(
        &app,
        &request_id,
        &supplier,
        vec![json!({ "request_item_id": mouse, "unit_price": "100.00" })],
    )
    .await;
    let matrix = comparison(&app, &request_id).await;
    let item = matrix[0]["options"][0]["quotation_item_id"]
        .as_str()
        .unwrap()
        .to_string();
    select(&app, &item).await;

    // Teclado has neither a winning bid nor stock coverage.
    let response = app
        .request_as(
            &app.comprador,
            Method::POST,
            &format!("/api/v1/requests/{}/issue-order", request_id),
            Some(json!({})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("Teclado"));

    // The request stays in quoting.
    let response = app
        .request_as(
            &app.comprador,
            Method::GET,
            &format!("/api/v1/requests/{}", request_id),
            None,
        )
        .await;
    assert_eq!(response_json(response).await["data"]["status"], "cotizando");
}

#[tokio::test]
async fn in_stock_lines_skip_sourcing() {
    let app = TestApp::new().await;

    let response = app
        .request_as(
            &app.solicitante,
            Method::POST,
            "/api/v1/requests",
            Some(json!({
                "priority": "normal",
                "justification": "Reposición parcial de equipo",
                "items": [
                    { "material": "Mouse", "quantity": 5, "unit": "pieza" },
                    { "material": "Teclado", "quantity": 2, "unit": "pieza",
                      "in_stock": true, "stock_location": "Almacén central" }
                ]
            })),
        )
        .await;
    let body = response_json(response).await;
    let request_id = body["data"]["request"]["id"].as_str().unwrap().to_string();
    let mouse = body["data"]["items"][0]["id"].as_str().unwrap().to_string();

    app.request_as(
        &app.director,
        Method::POST,
        &format!("/api/v1/requests/{}/authorize", request_id),
        Some(json!({})),
    )
    .await;

    let supplier = create_supplier(&app, "Proveedor A", "PRA010101AB1").await;
    attach(
        &app,
        &request_id,
        &supplier,
        vec![json!({ "request_item_id": mouse, "unit_price": "100.00" })],
    )
    .await;

    let matrix = comparison(&app, &request_id).await;
    assert_eq!(matrix[1]["in_stock"], true);
    assert_eq!(matrix[1]["unresolved"], false);

    let item = matrix[0]["options"][0]["quotation_item_id"]
        .as_str()
        .unwrap()
        .to_string();
    select(&app, &item).await;

    let response = app
        .request_as(
            &app.comprador,
            Method::POST,
            &format!("/api/v1/requests/{}/issue-order", request_id),
            Some(json!({})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    // Only the sourced line is billed.
    assert_eq!(money(&body["data"]["order"]["total_amount"]), dec!(500.00));
}

#[tokio::test]
async fn multi_supplier_selection_issues_one_order_for_the_selected_total() {
    let app = TestApp::new().await;
    let (request_id, mouse, teclado) = authorized_request(&app).await;
    let supplier_a = create_supplier(&app, "Proveedor A", "PRA010101AB1").await;
    let supplier_b = create_supplier(&app, "Proveedor B", "PRB010101AB2").await;

    attach(
        &app,
        &request_id,
        &supplier_a,
        vec![
            json!({ "request_item_id": mouse, "unit_price": "100.00" }),
            json!({ "request_item_id": teclado, "unit_price": "260.00" }),
        ],
    )
    .await;
    attach(
        &app,
        &request_id,
        &supplier_b,
        vec![
            json!({ "request_item_id": mouse, "unit_price": "110.00", "has_invoice": true }),
            json!({ "request_item_id": teclado, "unit_price": "240.00", "has_invoice": true }),
        ],
    )
    .await;

    // A wins the mouse line, B wins the keyboard line.
    let matrix = comparison(&app, &request_id).await;
    let a_mouse = matrix[0]["options"]
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["supplier_id"] == supplier_a.as_str())
        .unwrap()["quotation_item_id"]
        .as_str()
        .unwrap()
        .to_string();
    let b_teclado = matrix[1]["options"]
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["supplier_id"] == supplier_b.as_str())
        .unwrap()["quotation_item_id"]
        .as_str()
        .unwrap()
        .to_string();
    select(&app, &a_mouse).await;
    select(&app, &b_teclado).await;

    let expected = dec!(980.00); // 100 x 5 + 240 x 2
    assert_eq!(total_selected(&app, &request_id).await, expected);

    let response = app
        .request_as(
            &app.comprador,
            Method::POST,
            &format!("/api/v1/requests/{}/issue-order", request_id),
            Some(json!({})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["data"]["request"]["status"], "emitida");
    assert_eq!(money(&body["data"]["order"]["total_amount"]), expected);
    assert!(body["data"]["order"]["folio"]
        .as_str()
        .unwrap()
        .starts_with("OC-"));
    // A mixed-supplier order carries no single supplier link.
    assert!(body["data"]["order"]["supplier_id"].is_null());
    assert!(body["data"]["order"]["quotation_id"].is_null());
    // One of the selected bids promised an invoice.
    assert_eq!(body["data"]["order"]["requires_invoice"], true);
}

#[tokio::test]
async fn quotes_from_deactivated_suppliers_remain_selectable() {
    let app = TestApp::new().await;
    let (request_id, mouse, _) = authorized_request(&app).await;
    let supplier = create_supplier(&app, "Proveedor B", "PRB010101AB2").await;

    attach(
        &app,
        &request_id,
        &supplier,
        vec![json!({ "request_item_id": mouse, "unit_price": "90.00" })],
    )
    .await;

    let response = app
        .request_as(
            &app.comprador,
            Method::POST,
            &format!("/api/v1/suppliers/{}/deactivate", supplier),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // A submitted quote is a point-in-time commitment.
    let matrix = comparison(&app, &request_id).await;
    let item = matrix[0]["options"][0]["quotation_item_id"]
        .as_str()
        .unwrap()
        .to_string();
    let response = select(&app, &item).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn negative_unit_price_is_rejected() {
    let app = TestApp::new().await;
    let (request_id, mouse, _) = authorized_request(&app).await;
    let supplier = create_supplier(&app, "Proveedor A", "PRA010101AB1").await;

    let response = attach(
        &app,
        &request_id,
        &supplier,
        vec![json!({ "request_item_id": mouse, "unit_price": "-1.00" })],
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn quotation_items_must_belong_to_the_request() {
    let app = TestApp::new().await;
    let (request_id, _, _) = authorized_request(&app).await;
    let supplier = create_supplier(&app, "Proveedor A", "PRA010101AB1").await;

    let response = attach(
        &app,
        &request_id,
        &supplier,
        vec![json!({ "request_item_id": Uuid::new_v4(), "unit_price": "100.00" })],
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn quotations_require_an_authorized_request() {
    let app = TestApp::new().await;

    // Pending, not yet authorized.
    let response = app
        .request_as(
            &app.solicitante,
            Method::POST,
            "/api/v1/requests",
            Some(json!({
                "priority": "normal",
                "justification": "Material de oficina",
                "items": [{ "material": "Papel", "quantity": 10, "unit": "caja" }]
            })),
        )
        .await;
    let body = response_json(response).await;
    let request_id = body["data"]["request"]["id"].as_str().unwrap().to_string();
    let item = body["data"]["items"][0]["id"].as_str().unwrap().to_string();

    let supplier = create_supplier(&app, "Proveedor A", "PRA010101AB1").await;
    let response = attach(
        &app,
        &request_id,
        &supplier,
        vec![json!({ "request_item_id": item, "unit_price": "100.00" })],
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn requesters_cannot_attach_or_select() {
    let app = TestApp::new().await;
    let (request_id, mouse, _) = authorized_request(&app).await;
    let supplier = create_supplier(&app, "Proveedor A", "PRA010101AB1").await;

    let response = app
        .request_as(
            &app.solicitante,
            Method::POST,
            "/api/v1/quotations",
            Some(json!({
                "request_id": request_id,
                "supplier_id": supplier,
                "items": [{ "request_item_id": mouse, "unit_price": "100.00" }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    attach(
        &app,
        &request_id,
        &supplier,
        vec![json!({ "request_item_id": mouse, "unit_price": "100.00" })],
    )
    .await;
    let matrix = comparison(&app, &request_id).await;
    let item = matrix[0]["options"][0]["quotation_item_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .request_as(
            &app.solicitante,
            Method::POST,
            &format!("/api/v1/quotations/items/{}/select", item),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
