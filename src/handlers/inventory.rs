use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::entities::stock_transaction::StockChangeReason;
use crate::errors::ServiceError;
use crate::handlers::common::{ListResponse, PaginationParams};
use crate::services::inventory::{CreateItemInput, ItemFilter, UpdateItemInput};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl ListQuery {
    fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.limit)
    }
}

#[derive(Debug, Deserialize)]
pub struct StockInRequest {
    pub quantity: i32,
    pub unit_price: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    /// Signed correction: positive adds stock, negative removes it.
    pub delta: i32,
    pub reason: StockChangeReason,
    pub notes: Option<String>,
}

async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateItemInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.inventory.create_item(input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let pagination = query.pagination();
    let filter = ItemFilter {
        search: query.search.clone(),
        category: query.category.clone(),
    };
    let (items, total) = state
        .inventory
        .list_items(filter, pagination.page(), pagination.limit())
        .await?;
    Ok(Json(ListResponse::new(items, total, &pagination)))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.inventory.get_item(id).await?;
    Ok(Json(item))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UpdateItemInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.inventory.update_item(id, input).await?;
    Ok(Json(item))
}

async fn categories(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let categories = state.inventory.list_categories().await?;
    Ok(Json(categories))
}

async fn low_stock(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let items = state.inventory.list_low_stock().await?;
    Ok(Json(items))
}

async fn transactions(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let rows = state.inventory.list_transactions(id).await?;
    Ok(Json(rows))
}

async fn stock_in(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<StockInRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let row = state
        .inventory
        .receive_stock(id, req.quantity, req.unit_price, req.notes)
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

async fn adjust(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<AdjustRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let row = state
        .inventory
        .adjust_stock(id, req.delta, req.reason, req.notes)
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/categories", get(categories))
        .route("/low-stock", get(low_stock))
        .route("/:id", get(get_one).put(update))
        .route("/:id/transactions", get(transactions))
        .route("/:id/stock-in", post(stock_in))
        .route("/:id/adjust", post(adjust))
}
