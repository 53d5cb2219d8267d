//! Database entities.
//!
//! Every closed enum persisted as text uses the exact legacy string values
//! (the previous system stored enum values as free text), so historical rows
//! keep parsing while the Rust side gets a closed tagged type.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub mod activity;
pub mod activity_type;
pub mod customer;
pub mod financial_record;
pub mod inventory_item;
pub mod invoice;
pub mod invoice_item;
pub mod stock_transaction;
pub mod supplier;

/// Currencies the business trades in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Currency {
    #[sea_orm(string_value = "USD")]
    #[serde(rename = "USD")]
    Usd,
    #[sea_orm(string_value = "ZWL")]
    #[serde(rename = "ZWL")]
    Zwl,
    #[sea_orm(string_value = "RAND")]
    #[serde(rename = "RAND")]
    Rand,
}

impl Default for Currency {
    fn default() -> Self {
        Currency::Usd
    }
}

/// How a purchase or sale was paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum PaymentType {
    #[sea_orm(string_value = "Cash")]
    Cash,
    #[sea_orm(string_value = "EcoCash")]
    EcoCash,
    #[sea_orm(string_value = "Swipe")]
    Swipe,
    #[sea_orm(string_value = "Transfer")]
    Transfer,
    #[sea_orm(string_value = "Credit")]
    Credit,
}
