//! Customer activities (installations, maintenance visits) and their
//! user-defined types.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use tracing::instrument;
use validator::Validate;

use crate::entities::activity::{self, ActivityStatus, Entity as ActivityEntity};
use crate::entities::activity_type::{self, Entity as ActivityTypeEntity};
use crate::entities::Currency;
use crate::errors::ServiceError;
use crate::services::customers::get_customer;
use crate::services::inventory::validate_pagination;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateActivityTypeInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateActivityInput {
    pub customer_id: i32,
    pub activity_type_id: i32,
    #[validate(length(min = 1))]
    pub description: String,
    pub date: Option<NaiveDate>,
    pub technician: Option<String>,
    pub equipment_used: Option<String>,
    pub labor_hours: Option<Decimal>,
    pub labor_cost: Option<Decimal>,
    pub material_cost: Option<Decimal>,
    pub currency: Option<Currency>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActivityFilter {
    pub customer_id: Option<i32>,
    pub status: Option<ActivityStatus>,
}

#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_activity_type(
    db: &DatabaseConnection,
    input: CreateActivityTypeInput,
) -> Result<activity_type::Model, ServiceError> {
    input.validate()?;

    let exists = ActivityTypeEntity::find()
        .filter(activity_type::Column::Name.eq(input.name.clone()))
        .count(db)
        .await
        .map_err(ServiceError::db_error)?;
    if exists > 0 {
        return Err(ServiceError::Conflict(format!(
            "activity type '{}' already exists",
            input.name
        )));
    }

    activity_type::ActiveModel {
        name: Set(input.name),
        description: Set(input.description),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(ServiceError::db_error)
}

/// Active types only; retired ones stay attached to historical activities.
#[instrument(skip(db))]
pub async fn list_activity_types(
    db: &DatabaseConnection,
) -> Result<Vec<activity_type::Model>, ServiceError> {
    ActivityTypeEntity::find()
        .filter(activity_type::Column::IsActive.eq(true))
        .order_by_asc(activity_type::Column::Name)
        .all(db)
        .await
        .map_err(ServiceError::db_error)
}

/// Retires an activity type instead of deleting it.
#[instrument(skip(db))]
pub async fn deactivate_activity_type(
    db: &DatabaseConnection,
    id: i32,
) -> Result<activity_type::Model, ServiceError> {
    let record = ActivityTypeEntity::find_by_id(id)
        .one(db)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("activity type {id} not found")))?;

    let mut active: activity_type::ActiveModel = record.into();
    active.is_active = Set(false);
    active.update(db).await.map_err(ServiceError::db_error)
}

#[instrument(skip(db, input), fields(customer_id = input.customer_id))]
pub async fn create_activity(
    db: &DatabaseConnection,
    input: CreateActivityInput,
) -> Result<activity::Model, ServiceError> {
    input.validate()?;
    get_customer(db, input.customer_id).await?;

    let activity_type = ActivityTypeEntity::find_by_id(input.activity_type_id)
        .one(db)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "activity type {} not found",
                input.activity_type_id
            ))
        })?;
    if !activity_type.is_active {
        return Err(ServiceError::InvalidOperation(format!(
            "activity type '{}' is no longer active",
            activity_type.name
        )));
    }

    let total_cost = match (input.labor_cost, input.material_cost) {
        (None, None) => None,
        (labor, material) => {
            Some(labor.unwrap_or(Decimal::ZERO) + material.unwrap_or(Decimal::ZERO))
        }
    };

    activity::ActiveModel {
        customer_id: Set(input.customer_id),
        activity_type_id: Set(input.activity_type_id),
        description: Set(input.description),
        status: Set(ActivityStatus::Scheduled),
        date: Set(input.date.unwrap_or_else(|| Utc::now().date_naive())),
        completed_date: Set(None),
        technician: Set(input.technician),
        equipment_used: Set(input.equipment_used),
        labor_hours: Set(input.labor_hours),
        labor_cost: Set(input.labor_cost),
        material_cost: Set(input.material_cost),
        total_cost: Set(total_cost),
        currency: Set(input.currency.unwrap_or_default()),
        notes: Set(input.notes),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(ServiceError::db_error)
}

#[instrument(skip(db))]
pub async fn get_activity(
    db: &DatabaseConnection,
    id: i32,
) -> Result<activity::Model, ServiceError> {
    ActivityEntity::find_by_id(id)
        .one(db)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("activity {id} not found")))
}

#[instrument(skip(db))]
pub async fn list_activities(
    db: &DatabaseConnection,
    filter: ActivityFilter,
    page: u64,
    limit: u64,
) -> Result<(Vec<activity::Model>, u64), ServiceError> {
    validate_pagination(page, limit)?;

    let mut query = ActivityEntity::find();
    if let Some(customer_id) = filter.customer_id {
        query = query.filter(activity::Column::CustomerId.eq(customer_id));
    }
    if let Some(status) = filter.status {
        query = query.filter(activity::Column::Status.eq(status));
    }
    query = query
        .order_by_desc(activity::Column::Date)
        .order_by_desc(activity::Column::Id);

    let paginator = query.paginate(db, limit);
    let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
    let activities = paginator
        .fetch_page(page - 1)
        .await
        .map_err(ServiceError::db_error)?;

    Ok((activities, total))
}

/// Moves an activity along its lifecycle. Completing stamps the completion
/// date; completed and cancelled activities are immutable.
#[instrument(skip(db))]
pub async fn update_activity_status(
    db: &DatabaseConnection,
    id: i32,
    next: ActivityStatus,
) -> Result<activity::Model, ServiceError> {
    let record = get_activity(db, id).await?;

    if matches!(
        record.status,
        ActivityStatus::Completed | ActivityStatus::Cancelled
    ) {
        return Err(ServiceError::InvalidOperation(format!(
            "activity {id} is already finalized"
        )));
    }

    let mut active: activity::ActiveModel = record.into();
    active.status = Set(next);
    if next == ActivityStatus::Completed {
        active.completed_date = Set(Some(Utc::now().date_naive()));
    }
    active.update(db).await.map_err(ServiceError::db_error)
}
