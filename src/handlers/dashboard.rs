use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};

use crate::errors::ServiceError;
use crate::services::reports;
use crate::AppState;

async fn summary(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let summary = reports::dashboard(&state.db).await?;
    Ok(Json(summary))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(summary))
}
