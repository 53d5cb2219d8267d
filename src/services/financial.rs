//! Financial ledger: income and expense records plus the summary the
//! dashboard reads. Invoice revenue lives in the invoices table and is folded
//! in at query time; it is never duplicated into this ledger.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use crate::entities::financial_record::{
    self, Entity as FinancialEntity, ExpenseCategory, FinancialType,
};
use crate::entities::invoice::{self, Entity as InvoiceEntity, InvoiceStatus};
use crate::entities::{Currency, PaymentType};
use crate::errors::ServiceError;
use crate::services::inventory::validate_pagination;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFinancialRecordInput {
    #[serde(rename = "type")]
    pub record_type: FinancialType,
    /// Required for expenses, ignored for income.
    pub category: Option<ExpenseCategory>,
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    pub amount: Decimal,
    pub currency: Option<Currency>,
    pub date: Option<NaiveDate>,
    pub payment_method: Option<PaymentType>,
    pub receipt_number: Option<String>,
    pub vendor_supplier: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub record_type: Option<FinancialType>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Aggregates for the finance page: invoice revenue, manual income and
/// expenses, and the resulting profit.
#[derive(Debug, Serialize)]
pub struct FinancialSummary {
    pub total_sales: Decimal,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub profit: Decimal,
    pub recent_records: Vec<financial_record::Model>,
}

#[instrument(skip(db, input))]
pub async fn create_record(
    db: &DatabaseConnection,
    input: CreateFinancialRecordInput,
) -> Result<financial_record::Model, ServiceError> {
    input.validate()?;
    if input.amount <= Decimal::ZERO {
        return Err(ServiceError::InvalidInput(
            "amount must be positive".to_string(),
        ));
    }
    if input.record_type == FinancialType::Expense && input.category.is_none() {
        return Err(ServiceError::ValidationError(
            "expense records require a category".to_string(),
        ));
    }

    financial_record::ActiveModel {
        record_type: Set(input.record_type),
        category: Set(input.category),
        description: Set(input.description),
        amount: Set(input.amount),
        currency: Set(input.currency.unwrap_or_default()),
        date: Set(input.date.unwrap_or_else(|| Utc::now().date_naive())),
        payment_method: Set(input.payment_method),
        receipt_number: Set(input.receipt_number),
        vendor_supplier: Set(input.vendor_supplier),
        reference_id: Set(None),
        notes: Set(input.notes),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(ServiceError::db_error)
}

#[instrument(skip(db))]
pub async fn list_records(
    db: &DatabaseConnection,
    filter: RecordFilter,
    page: u64,
    limit: u64,
) -> Result<(Vec<financial_record::Model>, u64), ServiceError> {
    validate_pagination(page, limit)?;

    let mut query = FinancialEntity::find();
    if let Some(record_type) = filter.record_type {
        query = query.filter(financial_record::Column::RecordType.eq(record_type));
    }
    if let Some(from) = filter.from {
        query = query.filter(financial_record::Column::Date.gte(from));
    }
    if let Some(to) = filter.to {
        query = query.filter(financial_record::Column::Date.lte(to));
    }
    query = query
        .order_by_desc(financial_record::Column::Date)
        .order_by_desc(financial_record::Column::Id);

    let paginator = query.paginate(db, limit);
    let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
    let records = paginator
        .fetch_page(page - 1)
        .await
        .map_err(ServiceError::db_error)?;

    Ok((records, total))
}

async fn sum_records(
    db: &DatabaseConnection,
    record_type: FinancialType,
) -> Result<Decimal, ServiceError> {
    let sum: Option<Decimal> = FinancialEntity::find()
        .select_only()
        .column_as(financial_record::Column::Amount.sum(), "total")
        .filter(financial_record::Column::RecordType.eq(record_type))
        .into_tuple()
        .one(db)
        .await
        .map_err(ServiceError::db_error)?
        .flatten();
    Ok(sum.unwrap_or(Decimal::ZERO))
}

/// Summary over the whole ledger. Cancelled invoices do not count as sales;
/// profit is sales plus manual income minus expenses.
#[instrument(skip(db))]
pub async fn summary(db: &DatabaseConnection) -> Result<FinancialSummary, ServiceError> {
    let total_sales: Option<Decimal> = InvoiceEntity::find()
        .select_only()
        .column_as(invoice::Column::TotalAmount.sum(), "total")
        .filter(invoice::Column::Status.ne(InvoiceStatus::Cancelled))
        .into_tuple()
        .one(db)
        .await
        .map_err(ServiceError::db_error)?
        .flatten();
    let total_sales = total_sales.unwrap_or(Decimal::ZERO);

    let total_income = sum_records(db, FinancialType::Income).await?;
    let total_expenses = sum_records(db, FinancialType::Expense).await?;

    let recent_records = FinancialEntity::find()
        .order_by_desc(financial_record::Column::Date)
        .order_by_desc(financial_record::Column::Id)
        .limit(10)
        .all(db)
        .await
        .map_err(ServiceError::db_error)?;

    Ok(FinancialSummary {
        total_sales,
        total_income,
        total_expenses,
        profit: total_sales + total_income - total_expenses,
        recent_records,
    })
}
