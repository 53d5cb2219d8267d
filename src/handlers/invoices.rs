use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use crate::entities::invoice::InvoiceStatus;
use crate::errors::ServiceError;
use crate::handlers::common::{ListResponse, PaginationParams};
use crate::services::invoicing::CreateInvoiceInput;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<InvoiceStatus>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl ListQuery {
    fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.limit)
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: InvoiceStatus,
}

async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateInvoiceInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.invoicing.create_invoice(input).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let pagination = query.pagination();
    let (items, total) = state
        .invoicing
        .list_invoices(query.status, pagination.page(), pagination.limit())
        .await?;
    Ok(Json(ListResponse::new(items, total, &pagination)))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.invoicing.get_invoice(id).await?;
    Ok(Json(detail))
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<StatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let invoice = state.invoicing.update_status(id, req.status).await?;
    Ok(Json(invoice))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one))
        .route("/:id/status", put(update_status))
}
