use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::entities::financial_record::FinancialType;
use crate::errors::ServiceError;
use crate::events::Event;
use crate::handlers::common::{ListResponse, PaginationParams};
use crate::services::financial::{self, CreateFinancialRecordInput, RecordFilter};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub record_type: Option<FinancialType>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
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
    Json(input): Json<CreateFinancialRecordInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let record = financial::create_record(&state.db, input).await?;
    state
        .event_sender
        .send(Event::FinancialRecordAdded {
            record_id: record.id,
        })
        .await;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let filter = RecordFilter {
        record_type: query.record_type,
        from: query.from,
        to: query.to,
    };
    let pagination = query.pagination();
    let (items, total) = financial::list_records(
        &state.db,
        filter,
        pagination.page(),
        pagination.limit(),
    )
    .await?;
    Ok(Json(ListResponse::new(items, total, &pagination)))
}

async fn summary(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let summary = financial::summary(&state.db).await?;
    Ok(Json(summary))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/records", get(list).post(create))
        .route("/summary", get(summary))
}
