//! Dashboard aggregates.

use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use sea_orm::sea_query::Expr;
use serde::Serialize;
use tracing::instrument;

use crate::entities::activity::Entity as ActivityEntity;
use crate::entities::customer::Entity as CustomerEntity;
use crate::entities::inventory_item::{self, Entity as InventoryEntity};
use crate::entities::invoice::{self, Entity as InvoiceEntity, InvoiceStatus};
use crate::entities::supplier::Entity as SupplierEntity;
use crate::errors::ServiceError;

/// Counters and headline figures for the landing page.
#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub supplier_count: u64,
    pub customer_count: u64,
    pub inventory_item_count: u64,
    pub invoice_count: u64,
    pub pending_invoice_count: u64,
    pub activity_count: u64,
    pub low_stock_count: u64,
    pub total_stock_value: Decimal,
    pub recent_invoices: Vec<invoice::Model>,
}

#[instrument(skip(db))]
pub async fn dashboard(db: &DatabaseConnection) -> Result<DashboardSummary, ServiceError> {
    let supplier_count = SupplierEntity::find()
        .count(db)
        .await
        .map_err(ServiceError::db_error)?;
    let customer_count = CustomerEntity::find()
        .count(db)
        .await
        .map_err(ServiceError::db_error)?;
    let inventory_item_count = InventoryEntity::find()
        .count(db)
        .await
        .map_err(ServiceError::db_error)?;
    let invoice_count = InvoiceEntity::find()
        .count(db)
        .await
        .map_err(ServiceError::db_error)?;
    let pending_invoice_count = InvoiceEntity::find()
        .filter(invoice::Column::Status.eq(InvoiceStatus::Pending))
        .count(db)
        .await
        .map_err(ServiceError::db_error)?;
    let activity_count = ActivityEntity::find()
        .count(db)
        .await
        .map_err(ServiceError::db_error)?;
    let low_stock_count = InventoryEntity::find()
        .filter(
            Expr::col(inventory_item::Column::Quantity)
                .lte(Expr::col(inventory_item::Column::MinimumStockLevel)),
        )
        .count(db)
        .await
        .map_err(ServiceError::db_error)?;

    // Catalog value of everything on hand, summed in the database.
    let total_stock_value: Option<Decimal> = InventoryEntity::find()
        .select_only()
        .column_as(
            Expr::expr(
                Expr::col(inventory_item::Column::Quantity)
                    .mul(Expr::col(inventory_item::Column::UnitPrice)),
            )
            .sum(),
            "total",
        )
        .into_tuple()
        .one(db)
        .await
        .map_err(ServiceError::db_error)?
        .flatten();

    let recent_invoices = InvoiceEntity::find()
        .order_by_desc(invoice::Column::CreatedAt)
        .order_by_desc(invoice::Column::Id)
        .limit(5)
        .all(db)
        .await
        .map_err(ServiceError::db_error)?;

    Ok(DashboardSummary {
        supplier_count,
        customer_count,
        inventory_item_count,
        invoice_count,
        pending_invoice_count,
        activity_count,
        low_stock_count,
        total_stock_value: total_stock_value.unwrap_or(Decimal::ZERO),
        recent_invoices,
    })
}
