use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{Currency, PaymentType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum FinancialType {
    #[sea_orm(string_value = "Income")]
    Income,
    #[sea_orm(string_value = "Expense")]
    Expense,
}

/// Expense buckets used by the financial dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ExpenseCategory {
    #[sea_orm(string_value = "Fuel")]
    Fuel,
    #[sea_orm(string_value = "Car Maintenance")]
    #[serde(rename = "Car Maintenance")]
    CarMaintenance,
    #[sea_orm(string_value = "Rent")]
    Rent,
    #[sea_orm(string_value = "Solar Maintenance")]
    #[serde(rename = "Solar Maintenance")]
    SolarMaintenance,
    #[sea_orm(string_value = "Services")]
    Services,
    #[sea_orm(string_value = "Employee Payments")]
    #[serde(rename = "Employee Payments")]
    EmployeePayments,
    #[sea_orm(string_value = "Utilities")]
    Utilities,
    #[sea_orm(string_value = "Equipment Purchase")]
    #[serde(rename = "Equipment Purchase")]
    Equipment,
    #[sea_orm(string_value = "Other Expenses")]
    #[serde(rename = "Other Expenses")]
    Other,
}

/// An income or expense entry in the company books.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "financial_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub record_type: FinancialType,
    pub category: Option<ExpenseCategory>,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub date: NaiveDate,
    pub payment_method: Option<PaymentType>,
    pub receipt_number: Option<String>,
    pub vendor_supplier: Option<String>,
    /// Link to the originating invoice or activity, if any.
    pub reference_id: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
