//! HTTP surface. Thin axum handlers that parse the request, call into the
//! services, and serialize the result; every failure path flows through
//! [`crate::errors::ServiceError`]'s `IntoResponse`.

pub mod activities;
pub mod common;
pub mod customers;
pub mod dashboard;
pub mod financial;
pub mod inventory;
pub mod invoices;
pub mod suppliers;

use std::time::Duration;

use axum::{response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::db;
use crate::errors::ServiceError;
use crate::AppState;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    db::ping(&state.db).await?;
    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

/// Builds the full application router with middleware applied.
pub fn app_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/suppliers", suppliers::router())
        .nest("/customers", customers::router())
        .nest("/inventory", inventory::router())
        .nest("/invoices", invoices::router())
        .nest("/financial", financial::router())
        .nest("/activities", activities::router())
        .nest("/activity-types", activities::types_router())
        .nest("/dashboard", dashboard::router());

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
