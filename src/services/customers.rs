//! Customer directory.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::instrument;
use validator::Validate;

use crate::entities::customer::{self, Entity as CustomerEntity};
use crate::entities::invoice::{self, Entity as InvoiceEntity};
use crate::errors::ServiceError;
use crate::services::inventory::validate_pagination;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub identification_number: Option<String>,
    pub citizenship: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCustomerInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub identification_number: Option<String>,
    pub citizenship: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}

#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_customer(
    db: &DatabaseConnection,
    input: CreateCustomerInput,
) -> Result<customer::Model, ServiceError> {
    input.validate()?;

    customer::ActiveModel {
        name: Set(input.name),
        identification_number: Set(input.identification_number),
        citizenship: Set(input.citizenship),
        address: Set(input.address),
        phone: Set(input.phone),
        email: Set(input.email),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(ServiceError::db_error)
}

#[instrument(skip(db))]
pub async fn get_customer(
    db: &DatabaseConnection,
    id: i32,
) -> Result<customer::Model, ServiceError> {
    CustomerEntity::find_by_id(id)
        .one(db)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("customer {id} not found")))
}

#[instrument(skip(db))]
pub async fn list_customers(
    db: &DatabaseConnection,
    search: Option<String>,
    page: u64,
    limit: u64,
) -> Result<(Vec<customer::Model>, u64), ServiceError> {
    validate_pagination(page, limit)?;

    let mut query = CustomerEntity::find();
    if let Some(search) = search.filter(|s| !s.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(customer::Column::Name.contains(&search))
                .add(customer::Column::Phone.contains(&search))
                .add(customer::Column::IdentificationNumber.contains(&search)),
        );
    }
    query = query.order_by_asc(customer::Column::Name);

    let paginator = query.paginate(db, limit);
    let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
    let customers = paginator
        .fetch_page(page - 1)
        .await
        .map_err(ServiceError::db_error)?;

    Ok((customers, total))
}

#[instrument(skip(db, input))]
pub async fn update_customer(
    db: &DatabaseConnection,
    id: i32,
    input: UpdateCustomerInput,
) -> Result<customer::Model, ServiceError> {
    input.validate()?;
    let customer = get_customer(db, id).await?;

    let mut active: customer::ActiveModel = customer.into();
    if let Some(name) = input.name {
        active.name = Set(name);
    }
    if let Some(identification_number) = input.identification_number {
        active.identification_number = Set(Some(identification_number));
    }
    if let Some(citizenship) = input.citizenship {
        active.citizenship = Set(Some(citizenship));
    }
    if let Some(address) = input.address {
        active.address = Set(Some(address));
    }
    if let Some(phone) = input.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(email) = input.email {
        active.email = Set(Some(email));
    }

    active.update(db).await.map_err(ServiceError::db_error)
}

/// Deletes a customer unless invoices reference them; sales history is
/// never orphaned.
#[instrument(skip(db))]
pub async fn delete_customer(db: &DatabaseConnection, id: i32) -> Result<(), ServiceError> {
    get_customer(db, id).await?;

    let invoice_count = InvoiceEntity::find()
        .filter(invoice::Column::CustomerId.eq(id))
        .count(db)
        .await
        .map_err(ServiceError::db_error)?;
    if invoice_count > 0 {
        return Err(ServiceError::Conflict(format!(
            "customer {id} has {invoice_count} invoice(s) and cannot be deleted"
        )));
    }

    CustomerEntity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(())
}

/// A customer's invoices, newest first.
#[instrument(skip(db))]
pub async fn customer_invoices(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Vec<invoice::Model>, ServiceError> {
    get_customer(db, id).await?;

    InvoiceEntity::find()
        .filter(invoice::Column::CustomerId.eq(id))
        .order_by_desc(invoice::Column::CreatedAt)
        .order_by_desc(invoice::Column::Id)
        .all(db)
        .await
        .map_err(ServiceError::db_error)
}
