//! Shared test harness: a fully wired application over in-memory SQLite.

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    routing::get,
    Router,
};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ConnectOptions, Database};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use procura_api::{
    auth::{AuthConfig, Claims, Role},
    entities::user,
    events::EventSender,
    handlers::AppServices,
    push::PushGateway,
    AppState,
};

pub const TEST_SECRET: &str = "integration-test-secret-key-with-enough-length-0123456789";
pub const TEST_AREA: &str = "Sistemas";

pub struct TestUser {
    pub id: Uuid,
    pub role: Role,
}

pub struct TestApp {
    pub router: Router,
    pub db: Arc<sea_orm::DatabaseConnection>,
    pub services: AppServices,
    pub solicitante: TestUser,
    pub comprador: TestUser,
    pub director: TestUser,
    pub admin: TestUser,
}

impl TestApp {
    pub async fn new() -> Self {
        // A single connection keeps the in-memory database alive and shared.
        let mut opts = ConnectOptions::new("sqlite::memory:".to_string());
        opts.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opts).await.expect("connect sqlite");
        procura_api::db::run_migrations(&db)
            .await
            .expect("run migrations");
        let db = Arc::new(db);

        let (event_tx, event_rx) = tokio::sync::mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);

        let services = AppServices::new(db.clone(), Arc::new(event_sender.clone()));

        let push = Arc::new(PushGateway::new());
        push.initialize();
        tokio::spawn(procura_api::events::process_events(
            event_rx,
            services.notifications.clone(),
            push.clone(),
        ));

        let config = test_config();
        let state = AppState {
            db: db.clone(),
            config,
            event_sender,
            services: services.clone(),
            push,
        };

        let auth_config = Arc::new(AuthConfig::new(TEST_SECRET));
        let router = Router::new()
            .route("/", get(|| async { "up" }))
            .nest("/api/v1", procura_api::api_v1_routes())
            .layer(axum::middleware::from_fn_with_state(
                auth_config,
                |axum::extract::State(auth): axum::extract::State<Arc<AuthConfig>>,
                 mut req: axum::http::Request<Body>,
                 next: axum::middleware::Next| async move {
                    req.extensions_mut().insert(auth);
                    next.run(req).await
                },
            ))
            .with_state(state);

        let app = Self {
            router,
            db: db.clone(),
            services,
            solicitante: TestUser {
                id: Uuid::new_v4(),
                role: Role::Solicitante,
            },
            comprador: TestUser {
                id: Uuid::new_v4(),
                role: Role::Comprador,
            },
            director: TestUser {
                id: Uuid::new_v4(),
                role: Role::Director,
            },
            admin: TestUser {
                id: Uuid::new_v4(),
                role: Role::Admin,
            },
        };

        app.seed_user(&app.solicitante, "solicitante@test.mx").await;
        app.seed_user(&app.comprador, "comprador@test.mx").await;
        app.seed_user(&app.director, "director@test.mx").await;
        app.seed_user(&app.admin, "admin@test.mx").await;

        app
    }

    async fn seed_user(&self, test_user: &TestUser, email: &str) {
        user::ActiveModel {
            id: Set(test_user.id),
            name: Set(format!("User {}", email)),
            email: Set(email.to_string()),
            role: Set(test_user.role.to_string()),
            area: Set(TEST_AREA.to_string()),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db)
        .await
        .expect("seed user");
    }

    pub fn token_for(&self, test_user: &TestUser) -> String {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: test_user.id,
            name: "Test".into(),
            role: test_user.role,
            area: TEST_AREA.into(),
            exp: now + 3600,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .expect("encode token")
    }

    /// Issue a request with the given user's bearer token.
    pub async fn request_as(
        &self,
        test_user: &TestUser,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        let token = self.token_for(test_user);
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token));

        let request = if let Some(body) = body {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            builder
                .body(Body::from(body.to_string()))
                .expect("build request")
        } else {
            builder.body(Body::empty()).expect("build request")
        };

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router response")
    }

    /// Issue a request without credentials.
    pub async fn request_anonymous(&self, method: Method, uri: &str) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router response")
    }
}

/// Monetary fields may arrive as JSON strings or numbers depending on the
/// backend's column affinity; normalize before comparing.
#[allow(dead_code)]
pub fn money(value: &Value) -> rust_decimal::Decimal {
    use rust_decimal::prelude::FromPrimitive;
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => rust_decimal::Decimal::from_f64(n.as_f64().expect("numeric value"))
            .expect("decimal from number")
            .round_dp(2),
        other => panic!("expected monetary value, got {:?}", other),
    }
}

/// Drives a one-item request through authorize, quote, select and issue,
/// returning (request_id, order_id). The quoted line has quantity 1, so the
/// order total equals `unit_price`.
#[allow(dead_code)]
pub async fn issue_order_flow(app: &TestApp, unit_price: &str, rfc: &str) -> (String, String) {
    let response = app
        .request_as(
            &app.solicitante,
            Method::POST,
            "/api/v1/requests",
            Some(serde_json::json!({
                "priority": "normal",
                "justification": "Licencias de software para el área",
                "items": [
                    { "material": "Licencia antivirus", "quantity": 1, "unit": "licencia" }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    let body = response_json(response).await;
    let request_id = body["data"]["request"]["id"].as_str().unwrap().to_string();

    let response = app
        .request_as(
            &app.director,
            Method::POST,
            &format!("/api/v1/requests/{}/authorize", request_id),
            Some(serde_json::json!({})),
        )
        .await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    let response = app
        .request_as(
            &app.comprador,
            Method::POST,
            "/api/v1/suppliers",
            Some(serde_json::json!({ "name": format!("Proveedor {}", rfc), "rfc": rfc })),
        )
        .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    let supplier_id = response_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .request_as(
            &app.comprador,
            Method::POST,
            "/api/v1/quotations",
            Some(serde_json::json!({
                "request_id": request_id,
                "supplier_id": supplier_id,
                "items": [{
                    "request_item_id": item_id_of(app, &request_id).await,
                    "unit_price": unit_price,
                }]
            })),
        )
        .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    let quotation_id = response_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .request_as(
            &app.comprador,
            Method::GET,
            &format!("/api/v1/quotations/{}", quotation_id),
            None,
        )
        .await;
    let quotation_item_id = response_json(response).await["data"]["items"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .request_as(
            &app.comprador,
            Method::POST,
            &format!("/api/v1/quotations/items/{}/select", quotation_item_id),
            None,
        )
        .await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    let response = app
        .request_as(
            &app.comprador,
            Method::POST,
            &format!("/api/v1/requests/{}/issue-order", request_id),
            Some(serde_json::json!({})),
        )
        .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    let order_id = response_json(response).await["data"]["order"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    (request_id, order_id)
}

#[allow(dead_code)]
async fn item_id_of(app: &TestApp, request_id: &str) -> String {
    let response = app
        .request_as(
            &app.comprador,
            Method::GET,
            &format!("/api/v1/requests/{}/items", request_id),
            None,
        )
        .await;
    response_json(response).await["data"][0]["id"]
        .as_str()
        .unwrap()
        .to_string()
}

fn test_config() -> procura_api::config::AppConfig {
    // Deserialize through serde so defaults stay in one place.
    serde_json::from_value(serde_json::json!({
        "database_url": "sqlite::memory:",
        "jwt_secret": TEST_SECRET,
        "environment": "development",
        "auto_migrate": true
    }))
    .expect("test config")
}

pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
