//! Invoice assembly.
//!
//! Creating an invoice is the one operation that touches sales and stock
//! together, so it runs as a single database transaction in two phases:
//! validate everything first (customer, every line's stock), then mutate
//! (invoice header, lines, guarded stock decrements with their STOCK_OUT
//! rows). Any failure rolls the whole unit back.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveEnum, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::entities::customer::Entity as CustomerEntity;
use crate::entities::inventory_item;
use crate::entities::invoice::{self, Entity as InvoiceEntity, InvoiceStatus};
use crate::entities::invoice_item::{self, Entity as InvoiceItemEntity};
use crate::entities::{Currency, PaymentType};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::inventory::{self, validate_pagination, StockOutReference};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InvoiceLineInput {
    pub inventory_id: i32,
    /// Must be positive; zero-quantity lines are rejected outright.
    pub quantity: i32,
    /// Price quoted for this sale. May differ from the catalog price.
    pub unit_price: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceInput {
    pub customer_id: i32,
    pub currency: Option<Currency>,
    pub tax_amount: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub payment_method: Option<PaymentType>,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "invoice must have at least one line"))]
    pub lines: Vec<InvoiceLineInput>,
}

/// An invoice line joined with its catalog item, for detail responses.
#[derive(Debug, Serialize)]
pub struct InvoiceLineDetail {
    #[serde(flatten)]
    pub line: invoice_item::Model,
    pub item_name: Option<String>,
    pub item_brand: Option<String>,
    pub total_price: Decimal,
}

#[derive(Debug, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: invoice::Model,
    pub customer_name: String,
    pub final_amount: Decimal,
    pub lines: Vec<InvoiceLineDetail>,
}

/// Service assembling invoices and driving their lifecycle.
#[derive(Clone)]
pub struct InvoicingService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl InvoicingService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates an invoice with its lines and stock movements atomically.
    ///
    /// Phase 1 reserves stock for every line without writing anything, so a
    /// failing line (unknown item, not enough stock) rejects the whole
    /// invoice before a single row exists. Phase 2 inserts the header and
    /// lines and commits each reservation; the guarded decrement inside the
    /// commit protects against concurrent sales that slipped in between the
    /// phases. Note that two lines against the same item validate against the
    /// same snapshot, which is why the commit guard is checked again.
    #[instrument(skip(self, input), fields(customer_id = input.customer_id, lines = input.lines.len()))]
    pub async fn create_invoice(
        &self,
        input: CreateInvoiceInput,
    ) -> Result<InvoiceDetail, ServiceError> {
        input.validate()?;
        for line in &input.lines {
            if line.quantity <= 0 {
                return Err(ServiceError::InvalidInput(format!(
                    "line quantity must be positive, got {} for item {}",
                    line.quantity, line.inventory_id
                )));
            }
            if line.unit_price < Decimal::ZERO {
                return Err(ServiceError::InvalidInput(format!(
                    "line unit price must not be negative for item {}",
                    line.inventory_id
                )));
            }
        }

        let currency = input.currency.unwrap_or_default();
        let (invoice, lines) = self
            .db
            .transaction::<_, (invoice::Model, Vec<invoice_item::Model>), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        let customer = CustomerEntity::find_by_id(input.customer_id)
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!(
                                    "customer {} not found",
                                    input.customer_id
                                ))
                            })?;

                        // Phase 1: validate every line before touching a row.
                        let mut reservations = Vec::with_capacity(input.lines.len());
                        for line in &input.lines {
                            let reservation = inventory::reserve(
                                txn,
                                line.inventory_id,
                                line.quantity,
                                line.unit_price,
                            )
                            .await?;
                            reservations.push(reservation);
                        }

                        let total_amount: Decimal = input
                            .lines
                            .iter()
                            .map(|l| Decimal::from(l.quantity) * l.unit_price)
                            .sum();

                        let invoice = invoice::ActiveModel {
                            customer_id: Set(customer.id),
                            total_amount: Set(total_amount),
                            currency: Set(currency),
                            tax_amount: Set(input.tax_amount.unwrap_or(Decimal::ZERO)),
                            discount_amount: Set(input.discount_amount.unwrap_or(Decimal::ZERO)),
                            status: Set(InvoiceStatus::Pending),
                            due_date: Set(input.due_date),
                            paid_date: Set(None),
                            payment_method: Set(input.payment_method),
                            notes: Set(input.notes.clone()),
                            created_at: Set(Utc::now()),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                        // Phase 2: lines plus their matching stock movements.
                        let mut saved_lines = Vec::with_capacity(input.lines.len());
                        for (line, reservation) in input.lines.iter().zip(reservations) {
                            let saved = invoice_item::ActiveModel {
                                invoice_id: Set(invoice.id),
                                inventory_id: Set(line.inventory_id),
                                quantity: Set(line.quantity),
                                unit_price: Set(line.unit_price),
                                description: Set(line.description.clone()),
                                ..Default::default()
                            }
                            .insert(txn)
                            .await
                            .map_err(ServiceError::db_error)?;

                            reservation
                                .commit(
                                    txn,
                                    StockOutReference {
                                        reference_id: invoice.id,
                                        reference_type: "INVOICE".to_string(),
                                        customer_name: Some(customer.name.clone()),
                                        notes: Some(format!("Sold via invoice #{}", invoice.id)),
                                    },
                                )
                                .await?;

                            saved_lines.push(saved);
                        }

                        Ok((invoice, saved_lines))
                    })
                },
            )
            .await
            .map_err(ServiceError::from)?;

        info!(
            invoice_id = invoice.id,
            total = %invoice.total_amount,
            "invoice created"
        );
        self.event_sender
            .send(Event::InvoiceCreated {
                invoice_id: invoice.id,
                customer_id: invoice.customer_id,
                total_amount: invoice.total_amount,
            })
            .await;

        self.detail_for(invoice, lines).await
    }

    #[instrument(skip(self))]
    pub async fn get_invoice(&self, id: i32) -> Result<InvoiceDetail, ServiceError> {
        let invoice = InvoiceEntity::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("invoice {id} not found")))?;

        let lines = InvoiceItemEntity::find()
            .filter(invoice_item::Column::InvoiceId.eq(id))
            .order_by_asc(invoice_item::Column::Id)
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        self.detail_for(invoice, lines).await
    }

    /// Invoices newest-first with the total count for paging.
    #[instrument(skip(self))]
    pub async fn list_invoices(
        &self,
        status: Option<InvoiceStatus>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<invoice::Model>, u64), ServiceError> {
        validate_pagination(page, limit)?;

        let mut query = InvoiceEntity::find();
        if let Some(status) = status {
            query = query.filter(invoice::Column::Status.eq(status));
        }
        query = query
            .order_by_desc(invoice::Column::CreatedAt)
            .order_by_desc(invoice::Column::Id);

        let paginator = query.paginate(&*self.db, limit);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let invoices = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((invoices, total))
    }

    /// Moves an invoice along its lifecycle. Disallowed transitions (e.g.
    /// reopening a paid invoice) are rejected; marking Paid stamps the paid
    /// date. Cancelling does not restock: returns go through a manual
    /// inventory adjustment so the audit trail shows what actually happened.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: i32,
        next: InvoiceStatus,
    ) -> Result<invoice::Model, ServiceError> {
        let invoice = InvoiceEntity::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("invoice {id} not found")))?;

        let current = invoice.status;
        if !current.can_transition_to(next) {
            return Err(ServiceError::InvalidOperation(format!(
                "invoice {} cannot move from {} to {}",
                id,
                current.to_value(),
                next.to_value()
            )));
        }

        let mut active: invoice::ActiveModel = invoice.into();
        active.status = Set(next);
        if next == InvoiceStatus::Paid {
            active.paid_date = Set(Some(Utc::now().date_naive()));
        }
        let updated = active.update(&*self.db).await.map_err(ServiceError::db_error)?;

        self.event_sender
            .send(Event::InvoiceStatusChanged {
                invoice_id: updated.id,
                old_status: current.to_value(),
                new_status: next.to_value(),
            })
            .await;

        Ok(updated)
    }

    async fn detail_for(
        &self,
        invoice: invoice::Model,
        lines: Vec<invoice_item::Model>,
    ) -> Result<InvoiceDetail, ServiceError> {
        let customer = CustomerEntity::find_by_id(invoice.customer_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;
        let customer_name = customer.map(|c| c.name).unwrap_or_default();

        let mut detailed = Vec::with_capacity(lines.len());
        for line in lines {
            let item = inventory_item::Entity::find_by_id(line.inventory_id)
                .one(&*self.db)
                .await
                .map_err(ServiceError::db_error)?;
            let total_price = line.total_price();
            detailed.push(InvoiceLineDetail {
                item_name: item.as_ref().map(|i| i.name.clone()),
                item_brand: item.and_then(|i| i.brand),
                line,
                total_price,
            });
        }

        let final_amount = invoice.final_amount();
        Ok(InvoiceDetail {
            invoice,
            customer_name,
            final_amount,
            lines: detailed,
        })
    }
}
