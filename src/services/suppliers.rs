//! Supplier directory.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::instrument;
use validator::Validate;

use crate::entities::inventory_item::{self, Entity as InventoryEntity};
use crate::entities::supplier::{self, Entity as SupplierEntity};
use crate::entities::Currency;
use crate::errors::ServiceError;
use crate::services::inventory::validate_pagination;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSupplierInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
    pub payment_terms: Option<String>,
    pub currency: Option<Currency>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateSupplierInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
    pub payment_terms: Option<String>,
    pub currency: Option<Currency>,
    pub notes: Option<String>,
}

#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_supplier(
    db: &DatabaseConnection,
    input: CreateSupplierInput,
) -> Result<supplier::Model, ServiceError> {
    input.validate()?;

    supplier::ActiveModel {
        name: Set(input.name),
        contact_person: Set(input.contact_person),
        phone: Set(input.phone),
        email: Set(input.email),
        address: Set(input.address),
        payment_terms: Set(input.payment_terms),
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
pub async fn get_supplier(
    db: &DatabaseConnection,
    id: i32,
) -> Result<supplier::Model, ServiceError> {
    SupplierEntity::find_by_id(id)
        .one(db)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("supplier {id} not found")))
}

#[instrument(skip(db))]
pub async fn list_suppliers(
    db: &DatabaseConnection,
    search: Option<String>,
    page: u64,
    limit: u64,
) -> Result<(Vec<supplier::Model>, u64), ServiceError> {
    validate_pagination(page, limit)?;

    let mut query = SupplierEntity::find();
    if let Some(search) = search.filter(|s| !s.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(supplier::Column::Name.contains(&search))
                .add(supplier::Column::ContactPerson.contains(&search)),
        );
    }
    query = query.order_by_asc(supplier::Column::Name);

    let paginator = query.paginate(db, limit);
    let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
    let suppliers = paginator
        .fetch_page(page - 1)
        .await
        .map_err(ServiceError::db_error)?;

    Ok((suppliers, total))
}

#[instrument(skip(db, input))]
pub async fn update_supplier(
    db: &DatabaseConnection,
    id: i32,
    input: UpdateSupplierInput,
) -> Result<supplier::Model, ServiceError> {
    input.validate()?;
    let supplier = get_supplier(db, id).await?;

    let mut active: supplier::ActiveModel = supplier.into();
    if let Some(name) = input.name {
        active.name = Set(name);
    }
    if let Some(contact_person) = input.contact_person {
        active.contact_person = Set(Some(contact_person));
    }
    if let Some(phone) = input.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(email) = input.email {
        active.email = Set(Some(email));
    }
    if let Some(address) = input.address {
        active.address = Set(Some(address));
    }
    if let Some(payment_terms) = input.payment_terms {
        active.payment_terms = Set(Some(payment_terms));
    }
    if let Some(currency) = input.currency {
        active.currency = Set(currency);
    }
    if let Some(notes) = input.notes {
        active.notes = Set(Some(notes));
    }

    active.update(db).await.map_err(ServiceError::db_error)
}

/// Deletes a supplier. Items sourced from it keep their rows; the link is
/// cleared first so the foreign key stays consistent.
#[instrument(skip(db))]
pub async fn delete_supplier(db: &DatabaseConnection, id: i32) -> Result<(), ServiceError> {
    get_supplier(db, id).await?;

    InventoryEntity::update_many()
        .col_expr(
            inventory_item::Column::SupplierId,
            sea_orm::sea_query::Expr::value(Option::<i32>::None),
        )
        .filter(inventory_item::Column::SupplierId.eq(id))
        .exec(db)
        .await
        .map_err(ServiceError::db_error)?;

    SupplierEntity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(())
}

/// Total catalog value of the stock currently sourced from this supplier.
#[instrument(skip(db))]
pub async fn supplier_stock_value(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Decimal, ServiceError> {
    get_supplier(db, id).await?;

    let items = InventoryEntity::find()
        .filter(inventory_item::Column::SupplierId.eq(id))
        .all(db)
        .await
        .map_err(ServiceError::db_error)?;

    Ok(items.iter().map(|i| i.total_value()).sum())
}
