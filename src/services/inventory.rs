//! Inventory Ledger.
//!
//! All quantity changes go through this module. The primitives (`reserve`,
//! [`Reservation::commit`], [`stock_in`], [`adjust`]) are generic over the
//! connection so the caller decides the unit of work: the invoice assembler
//! passes its own transaction in, the HTTP endpoints wrap each call in a
//! transaction of their own. Every change appends exactly one
//! `stock_transaction` row, and `inventory.quantity` can never go negative.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::entities::inventory_item::{self, Entity as InventoryEntity};
use crate::entities::stock_transaction::{
    self, Entity as StockTransactionEntity, StockChangeReason, TransactionType,
};
use crate::entities::{Currency, PaymentType};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// A pending claim against an item's stock.
///
/// Produced by [`reserve`] after validation; nothing is written until
/// [`Reservation::commit`] runs, and its effects become visible to other
/// readers only when the enclosing transaction commits.
#[derive(Debug, Clone)]
pub struct Reservation {
    pub inventory_id: i32,
    pub quantity: i32,
    /// Price the caller quoted for this reservation (not re-read from the
    /// catalog; the invoice records what was quoted).
    pub unit_price: Decimal,
    pub currency: Currency,
    /// Quantity observed at validation time.
    pub available: i32,
}

/// Reference tags stamped onto the STOCK_OUT row a reservation produces.
#[derive(Debug, Clone)]
pub struct StockOutReference {
    pub reference_id: i32,
    pub reference_type: String,
    pub customer_name: Option<String>,
    pub notes: Option<String>,
}

/// Validates a stock claim against the current quantity.
///
/// Fails fast with `InvalidInput` for non-positive quantities, `NotFound` for
/// unknown items, and `InsufficientStock` when the request exceeds what is on
/// hand. No rows are touched.
pub async fn reserve<C: ConnectionTrait>(
    conn: &C,
    inventory_id: i32,
    quantity: i32,
    unit_price: Decimal,
) -> Result<Reservation, ServiceError> {
    if quantity <= 0 {
        return Err(ServiceError::InvalidInput(format!(
            "reservation quantity must be positive, got {quantity}"
        )));
    }
    if unit_price < Decimal::ZERO {
        return Err(ServiceError::InvalidInput(format!(
            "unit price must not be negative, got {unit_price}"
        )));
    }

    let item = InventoryEntity::find_by_id(inventory_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("inventory item {inventory_id} not found")))?;

    if item.quantity < quantity {
        return Err(ServiceError::InsufficientStock {
            inventory_id,
            available: item.quantity,
            requested: quantity,
        });
    }

    Ok(Reservation {
        inventory_id,
        quantity,
        unit_price,
        currency: item.currency,
        available: item.quantity,
    })
}

impl Reservation {
    /// Applies the reservation: decrements the stock and appends the matching
    /// STOCK_OUT row.
    ///
    /// The decrement is guarded (`UPDATE ... WHERE quantity >= requested`) and
    /// the affected row count is checked, so a concurrent sale that consumed
    /// the stock between validation and commit surfaces as
    /// `InsufficientStock` instead of a negative quantity, even at
    /// read-committed isolation.
    pub async fn commit<C: ConnectionTrait>(
        self,
        conn: &C,
        reference: StockOutReference,
    ) -> Result<stock_transaction::Model, ServiceError> {
        let updated = InventoryEntity::update_many()
            .col_expr(
                inventory_item::Column::Quantity,
                Expr::col(inventory_item::Column::Quantity).sub(self.quantity),
            )
            .col_expr(inventory_item::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(inventory_item::Column::Id.eq(self.inventory_id))
            .filter(inventory_item::Column::Quantity.gte(self.quantity))
            .exec(conn)
            .await
            .map_err(ServiceError::db_error)?;

        if updated.rows_affected == 0 {
            // Lost a race (or the item vanished); report the current state.
            let current = InventoryEntity::find_by_id(self.inventory_id)
                .one(conn)
                .await
                .map_err(ServiceError::db_error)?;
            return Err(match current {
                Some(item) => ServiceError::InsufficientStock {
                    inventory_id: self.inventory_id,
                    available: item.quantity,
                    requested: self.quantity,
                },
                None => ServiceError::NotFound(format!(
                    "inventory item {} not found",
                    self.inventory_id
                )),
            });
        }

        let total = Decimal::from(self.quantity) * self.unit_price;
        let row = stock_transaction::ActiveModel {
            inventory_id: Set(self.inventory_id),
            transaction_type: Set(TransactionType::StockOut),
            quantity: Set(-self.quantity),
            unit_price: Set(Some(self.unit_price)),
            total_value: Set(Some(-total)),
            currency: Set(self.currency),
            reason: Set(Some(StockChangeReason::SoldToCustomer)),
            reference_id: Set(Some(reference.reference_id)),
            reference_type: Set(Some(reference.reference_type)),
            customer_name: Set(reference.customer_name),
            notes: Set(reference.notes),
            ..Default::default()
        };

        row.insert(conn).await.map_err(ServiceError::db_error)
    }
}

/// Receives stock into an item and appends the STOCK_IN audit row.
pub async fn stock_in<C: ConnectionTrait>(
    conn: &C,
    inventory_id: i32,
    quantity: i32,
    unit_price: Decimal,
    notes: Option<String>,
) -> Result<stock_transaction::Model, ServiceError> {
    if quantity <= 0 {
        return Err(ServiceError::InvalidInput(format!(
            "stock-in quantity must be positive, got {quantity}"
        )));
    }

    let item = InventoryEntity::find_by_id(inventory_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("inventory item {inventory_id} not found")))?;

    // Relative increment, never an absolute write: a concurrent guarded
    // decrement between our read and this update must not be clobbered.
    let updated = InventoryEntity::update_many()
        .col_expr(
            inventory_item::Column::Quantity,
            Expr::col(inventory_item::Column::Quantity).add(quantity),
        )
        .col_expr(inventory_item::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(inventory_item::Column::Id.eq(inventory_id))
        .exec(conn)
        .await
        .map_err(ServiceError::db_error)?;
    if updated.rows_affected == 0 {
        return Err(ServiceError::NotFound(format!(
            "inventory item {inventory_id} not found"
        )));
    }

    let row = stock_transaction::ActiveModel {
        inventory_id: Set(inventory_id),
        transaction_type: Set(TransactionType::StockIn),
        quantity: Set(quantity),
        unit_price: Set(Some(unit_price)),
        total_value: Set(Some(Decimal::from(quantity) * unit_price)),
        currency: Set(item.currency),
        notes: Set(notes),
        ..Default::default()
    };

    row.insert(conn).await.map_err(ServiceError::db_error)
}

/// Applies a signed manual correction, guarded so the stock never goes
/// negative. Returns the appended ADJUSTMENT row.
pub async fn adjust<C: ConnectionTrait>(
    conn: &C,
    inventory_id: i32,
    delta: i32,
    reason: StockChangeReason,
    notes: Option<String>,
) -> Result<stock_transaction::Model, ServiceError> {
    if delta == 0 {
        return Err(ServiceError::InvalidInput(
            "adjustment delta must not be zero".to_string(),
        ));
    }

    let mut update = InventoryEntity::update_many()
        .col_expr(
            inventory_item::Column::Quantity,
            Expr::col(inventory_item::Column::Quantity).add(delta),
        )
        .col_expr(inventory_item::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(inventory_item::Column::Id.eq(inventory_id));
    if delta < 0 {
        update = update.filter(inventory_item::Column::Quantity.gte(-delta));
    }
    let updated = update.exec(conn).await.map_err(ServiceError::db_error)?;

    if updated.rows_affected == 0 {
        let current = InventoryEntity::find_by_id(inventory_id)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?;
        return Err(match current {
            Some(item) => ServiceError::InsufficientStock {
                inventory_id,
                available: item.quantity,
                requested: -delta,
            },
            None => ServiceError::NotFound(format!("inventory item {inventory_id} not found")),
        });
    }

    let item = InventoryEntity::find_by_id(inventory_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("inventory item {inventory_id} not found")))?;

    let row = stock_transaction::ActiveModel {
        inventory_id: Set(inventory_id),
        transaction_type: Set(TransactionType::Adjustment),
        quantity: Set(delta),
        unit_price: Set(Some(item.unit_price)),
        total_value: Set(Some(Decimal::from(delta) * item.unit_price)),
        currency: Set(item.currency),
        reason: Set(Some(reason)),
        notes: Set(notes),
        ..Default::default()
    };

    row.insert(conn).await.map_err(ServiceError::db_error)
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub specifications: Option<String>,
    #[validate(range(min = 0))]
    pub quantity: i32,
    pub unit_price: Decimal,
    pub currency: Option<Currency>,
    pub supplier_id: Option<i32>,
    pub payment_type: Option<PaymentType>,
    pub minimum_stock_level: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateItemInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub specifications: Option<String>,
    pub unit_price: Option<Decimal>,
    pub currency: Option<Currency>,
    pub supplier_id: Option<i32>,
    pub payment_type: Option<PaymentType>,
    pub minimum_stock_level: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub search: Option<String>,
    pub category: Option<String>,
}

/// Service for managing inventory over HTTP-sized units of work.
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates an item; a positive initial quantity is recorded as the item's
    /// first STOCK_IN so the audit trail starts reconciled.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_item(
        &self,
        input: CreateItemInput,
    ) -> Result<inventory_item::Model, ServiceError> {
        input.validate()?;
        if input.unit_price < Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "unit price must not be negative".to_string(),
            ));
        }

        let default_currency = input.currency.unwrap_or_default();
        let item = self
            .db
            .transaction::<_, inventory_item::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let item = inventory_item::ActiveModel {
                        name: Set(input.name.clone()),
                        brand: Set(input.brand),
                        category: Set(input.category),
                        specifications: Set(input.specifications),
                        quantity: Set(input.quantity),
                        unit_price: Set(input.unit_price),
                        currency: Set(default_currency),
                        supplier_id: Set(input.supplier_id),
                        payment_type: Set(input.payment_type),
                        minimum_stock_level: Set(input.minimum_stock_level.unwrap_or(5)),
                        notes: Set(input.notes),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    if item.quantity > 0 {
                        stock_transaction::ActiveModel {
                            inventory_id: Set(item.id),
                            transaction_type: Set(TransactionType::StockIn),
                            quantity: Set(item.quantity),
                            unit_price: Set(Some(item.unit_price)),
                            total_value: Set(Some(item.total_value())),
                            currency: Set(item.currency),
                            notes: Set(Some(format!("Initial stock for {}", item.name))),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    }

                    Ok(item)
                })
            })
            .await
            .map_err(ServiceError::from)?;

        info!(item_id = item.id, quantity = item.quantity, "inventory item created");
        self.event_sender
            .send(Event::InventoryItemCreated {
                item_id: item.id,
                initial_quantity: item.quantity,
            })
            .await;

        Ok(item)
    }

    #[instrument(skip(self))]
    pub async fn get_item(&self, id: i32) -> Result<inventory_item::Model, ServiceError> {
        InventoryEntity::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("inventory item {id} not found")))
    }

    /// Updates descriptive fields. Quantity is deliberately not updatable
    /// here; it moves only through the ledger.
    #[instrument(skip(self, input))]
    pub async fn update_item(
        &self,
        id: i32,
        input: UpdateItemInput,
    ) -> Result<inventory_item::Model, ServiceError> {
        input.validate()?;
        let item = self.get_item(id).await?;

        let mut active: inventory_item::ActiveModel = item.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(brand) = input.brand {
            active.brand = Set(Some(brand));
        }
        if let Some(category) = input.category {
            active.category = Set(Some(category));
        }
        if let Some(specifications) = input.specifications {
            active.specifications = Set(Some(specifications));
        }
        if let Some(unit_price) = input.unit_price {
            if unit_price < Decimal::ZERO {
                return Err(ServiceError::InvalidInput(
                    "unit price must not be negative".to_string(),
                ));
            }
            active.unit_price = Set(unit_price);
        }
        if let Some(currency) = input.currency {
            active.currency = Set(currency);
        }
        if let Some(supplier_id) = input.supplier_id {
            active.supplier_id = Set(Some(supplier_id));
        }
        if let Some(payment_type) = input.payment_type {
            active.payment_type = Set(Some(payment_type));
        }
        if let Some(minimum) = input.minimum_stock_level {
            active.minimum_stock_level = Set(minimum);
        }
        if let Some(notes) = input.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Utc::now());

        active.update(&*self.db).await.map_err(ServiceError::db_error)
    }

    /// Lists items with optional text search (name, brand, specifications)
    /// and category filter.
    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        filter: ItemFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<inventory_item::Model>, u64), ServiceError> {
        validate_pagination(page, limit)?;

        let mut query = InventoryEntity::find();
        if let Some(search) = filter.search.filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(inventory_item::Column::Name.contains(&search))
                    .add(inventory_item::Column::Brand.contains(&search))
                    .add(inventory_item::Column::Specifications.contains(&search)),
            );
        }
        if let Some(category) = filter.category.filter(|c| !c.is_empty()) {
            query = query.filter(inventory_item::Column::Category.eq(category));
        }
        query = query.order_by_asc(inventory_item::Column::Name);

        let paginator = query.paginate(&*self.db, limit);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((items, total))
    }

    /// Distinct non-empty categories, for the inventory filter dropdown.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<String>, ServiceError> {
        let categories: Vec<Option<String>> = InventoryEntity::find()
            .select_only()
            .column(inventory_item::Column::Category)
            .distinct()
            .into_tuple()
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(categories.into_iter().flatten().filter(|c| !c.is_empty()).collect())
    }

    /// Items at or below their minimum stock level.
    #[instrument(skip(self))]
    pub async fn list_low_stock(&self) -> Result<Vec<inventory_item::Model>, ServiceError> {
        let items = InventoryEntity::find()
            .filter(
                Expr::col(inventory_item::Column::Quantity)
                    .lte(Expr::col(inventory_item::Column::MinimumStockLevel)),
            )
            .order_by_asc(inventory_item::Column::Quantity)
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(items)
    }

    /// Full audit trail for one item, newest first.
    #[instrument(skip(self))]
    pub async fn list_transactions(
        &self,
        inventory_id: i32,
    ) -> Result<Vec<stock_transaction::Model>, ServiceError> {
        // 404 on unknown items rather than an empty list.
        self.get_item(inventory_id).await?;

        let rows = StockTransactionEntity::find()
            .filter(stock_transaction::Column::InventoryId.eq(inventory_id))
            .order_by_desc(stock_transaction::Column::CreatedAt)
            .order_by_desc(stock_transaction::Column::Id)
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(rows)
    }

    /// Replenishment endpoint: receive stock in its own unit of work.
    #[instrument(skip(self))]
    pub async fn receive_stock(
        &self,
        inventory_id: i32,
        quantity: i32,
        unit_price: Decimal,
        notes: Option<String>,
    ) -> Result<stock_transaction::Model, ServiceError> {
        let row = self
            .db
            .transaction::<_, stock_transaction::Model, ServiceError>(move |txn| {
                Box::pin(
                    async move { stock_in(txn, inventory_id, quantity, unit_price, notes).await },
                )
            })
            .await
            .map_err(ServiceError::from)?;

        self.event_sender
            .send(Event::StockReceived {
                item_id: inventory_id,
                quantity,
            })
            .await;

        Ok(row)
    }

    /// Manual correction endpoint (damage, returns, count fixes).
    #[instrument(skip(self))]
    pub async fn adjust_stock(
        &self,
        inventory_id: i32,
        delta: i32,
        reason: StockChangeReason,
        notes: Option<String>,
    ) -> Result<stock_transaction::Model, ServiceError> {
        let row = self
            .db
            .transaction::<_, stock_transaction::Model, ServiceError>(move |txn| {
                Box::pin(async move { adjust(txn, inventory_id, delta, reason, notes).await })
            })
            .await
            .map_err(ServiceError::from)?;

        let item = self.get_item(inventory_id).await?;
        self.event_sender
            .send(Event::StockAdjusted {
                item_id: inventory_id,
                delta,
                new_quantity: item.quantity,
            })
            .await;
        if item.is_low_stock() {
            self.event_sender
                .send(Event::LowStock {
                    item_id: item.id,
                    quantity: item.quantity,
                    minimum: item.minimum_stock_level,
                })
                .await;
        }

        Ok(row)
    }
}

pub(crate) fn validate_pagination(page: u64, limit: u64) -> Result<(), ServiceError> {
    if page == 0 {
        return Err(ServiceError::ValidationError(
            "Page number must be greater than 0".to_string(),
        ));
    }
    if limit == 0 || limit > 1000 {
        return Err(ServiceError::ValidationError(
            "Limit must be between 1 and 1000".to_string(),
        ));
    }
    Ok(())
}
