use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::errors::ServiceError;
use crate::handlers::common::{ListResponse, PaginationParams};
use crate::services::suppliers::{self, CreateSupplierInput, UpdateSupplierInput};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl ListQuery {
    fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.limit)
    }
}

async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateSupplierInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let supplier = suppliers::create_supplier(&state.db, input).await?;
    state
        .event_sender
        .send(crate::events::Event::SupplierCreated {
            supplier_id: supplier.id,
        })
        .await;
    Ok((StatusCode::CREATED, Json(supplier)))
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let pagination = query.pagination();
    let (items, total) = suppliers::list_suppliers(
        &state.db,
        query.search,
        pagination.page(),
        pagination.limit(),
    )
    .await?;
    Ok(Json(ListResponse::new(items, total, &pagination)))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let supplier = suppliers::get_supplier(&state.db, id).await?;
    Ok(Json(supplier))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UpdateSupplierInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let supplier = suppliers::update_supplier(&state.db, id, input).await?;
    Ok(Json(supplier))
}

async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    suppliers::delete_supplier(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn stock_value(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let value = suppliers::supplier_stock_value(&state.db, id).await?;
    Ok(Json(json!({ "supplier_id": id, "stock_value": value })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one).put(update).delete(delete))
        .route("/:id/stock-value", get(stock_value))
}
