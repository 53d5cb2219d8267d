use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

use super::Currency;

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum TransactionType {
    #[sea_orm(string_value = "Stock In")]
    #[serde(rename = "Stock In")]
    StockIn,
    #[sea_orm(string_value = "Stock Out")]
    #[serde(rename = "Stock Out")]
    StockOut,
    #[sea_orm(string_value = "Adjustment")]
    Adjustment,
}

/// Business reason attached to a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum StockChangeReason {
    #[sea_orm(string_value = "Sold to Customer")]
    #[serde(rename = "Sold to Customer")]
    SoldToCustomer,
    #[sea_orm(string_value = "Installed to Client")]
    #[serde(rename = "Installed to Client")]
    InstalledToClient,
    #[sea_orm(string_value = "Damaged")]
    Damaged,
    #[sea_orm(string_value = "Returned")]
    Returned,
    #[sea_orm(string_value = "Stock Adjustment")]
    #[serde(rename = "Stock Adjustment")]
    Adjustment,
}

/// Append-only audit log of every stock movement. Rows are never updated or
/// deleted; for each item the sum of `quantity` equals the stored quantity on
/// the inventory row (ledger reconciliation invariant).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub inventory_id: i32,
    pub transaction_type: TransactionType,
    /// Signed delta: positive for inbound, negative for outbound.
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
    pub total_value: Option<Decimal>,
    pub currency: Currency,
    pub reason: Option<StockChangeReason>,
    /// Entity this movement is attributed to (e.g. an invoice id).
    pub reference_id: Option<i32>,
    pub reference_type: Option<String>,
    pub customer_name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inventory_item::Entity",
        from = "Column::InventoryId",
        to = "super::inventory_item::Column::Id"
    )]
    Inventory,
}

impl Related<super::inventory_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inventory.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if let ActiveValue::NotSet = active_model.created_at {
            active_model.created_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}
