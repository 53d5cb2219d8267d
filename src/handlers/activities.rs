use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use crate::entities::activity::ActivityStatus;
use crate::errors::ServiceError;
use crate::events::Event;
use crate::handlers::common::{ListResponse, PaginationParams};
use crate::services::activities::{
    self, ActivityFilter, CreateActivityInput, CreateActivityTypeInput,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub customer_id: Option<i32>,
    pub status: Option<ActivityStatus>,
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
    pub status: ActivityStatus,
}

async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateActivityInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let activity = activities::create_activity(&state.db, input).await?;
    state
        .event_sender
        .send(Event::ActivityLogged {
            activity_id: activity.id,
        })
        .await;
    Ok((StatusCode::CREATED, Json(activity)))
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let filter = ActivityFilter {
        customer_id: query.customer_id,
        status: query.status,
    };
    let pagination = query.pagination();
    let (items, total) = activities::list_activities(
        &state.db,
        filter,
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
    let activity = activities::get_activity(&state.db, id).await?;
    Ok(Json(activity))
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<StatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let activity = activities::update_activity_status(&state.db, id, req.status).await?;
    Ok(Json(activity))
}

async fn create_type(
    State(state): State<AppState>,
    Json(input): Json<CreateActivityTypeInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let activity_type = activities::create_activity_type(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(activity_type)))
}

async fn list_types(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let types = activities::list_activity_types(&state.db).await?;
    Ok(Json(types))
}

async fn deactivate_type(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let activity_type = activities::deactivate_activity_type(&state.db, id).await?;
    Ok(Json(activity_type))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one))
        .route("/:id/status", put(update_status))
}

pub fn types_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_types).post(create_type))
        .route("/:id", axum::routing::delete(deactivate_type))
}
