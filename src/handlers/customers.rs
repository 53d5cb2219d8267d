use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::errors::ServiceError;
use crate::handlers::common::{ListResponse, PaginationParams};
use crate::services::customers::{self, CreateCustomerInput, UpdateCustomerInput};
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
    Json(input): Json<CreateCustomerInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let customer = customers::create_customer(&state.db, input).await?;
    state
        .event_sender
        .send(crate::events::Event::CustomerCreated {
            customer_id: customer.id,
        })
        .await;
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let pagination = query.pagination();
    let (items, total) = customers::list_customers(
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
    let customer = customers::get_customer(&state.db, id).await?;
    Ok(Json(customer))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UpdateCustomerInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let customer = customers::update_customer(&state.db, id, input).await?;
    Ok(Json(customer))
}

async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    customers::delete_customer(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn invoices(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let invoices = customers::customer_invoices(&state.db, id).await?;
    Ok(Json(invoices))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one).put(update).delete(delete))
        .route("/:id/invoices", get(invoices))
}
