use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use solarops_api::{
    config::AppConfig,
    db::{self, DbConfig},
    events::{process_events, EventSender},
    handlers::app_router,
    AppState,
};
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Test harness backed by an in-memory SQLite database.
///
/// The pool is capped at one connection so concurrent units of work serialize
/// at acquire time, the same way a busy single-writer SQLite deployment
/// behaves.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_config = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&db_config)
            .await
            .expect("failed to create test database");
        db::create_schema(&pool)
            .await
            .expect("failed to create test schema");

        let (tx, rx) = mpsc::channel(256);
        let event_sender = EventSender::new(tx);
        let event_task = tokio::spawn(process_events(rx));

        let config = AppConfig {
            environment: "test".to_string(),
            db_max_connections: 1,
            ..Default::default()
        };
        let state = AppState::new(Arc::new(pool), config, event_sender);
        let router = app_router(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Send a JSON request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn get(&self, uri: &str) -> axum::response::Response {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> axum::response::Response {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> axum::response::Response {
        self.request(Method::PUT, uri, Some(body)).await
    }

    /// Seed a customer directly through the service layer, returning its id.
    pub async fn seed_customer(&self, name: &str) -> i32 {
        let customer = solarops_api::services::customers::create_customer(
            &self.state.db,
            serde_json::from_value(json!({ "name": name })).expect("valid customer input"),
        )
        .await
        .expect("failed to seed customer");
        customer.id
    }

    /// Seed an inventory item with initial stock, returning its id.
    pub async fn seed_item(&self, name: &str, quantity: i32, unit_price: Decimal) -> i32 {
        let item = self
            .state
            .inventory
            .create_item(
                serde_json::from_value(json!({
                    "name": name,
                    "quantity": quantity,
                    "unit_price": unit_price,
                }))
                .expect("valid item input"),
            )
            .await
            .expect("failed to seed inventory item");
        item.id
    }
}

/// Deserialize a response body as JSON.
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body was not valid JSON")
}

/// Read a JSON field as a [`Decimal`], whether it was serialized as a string
/// or a bare number. Comparisons should be numeric: SQLite stores decimals as
/// REAL, so the scale of a round-tripped value is not guaranteed.
#[allow(dead_code)]
pub fn as_decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("field was not a decimal string"),
        Value::Number(n) => n
            .to_string()
            .parse()
            .expect("field was not a decimal number"),
        other => panic!("expected a decimal-valued field, got {other}"),
    }
}
