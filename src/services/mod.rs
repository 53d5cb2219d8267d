pub mod activities;
pub mod customers;
pub mod financial;
pub mod inventory;
pub mod invoicing;
pub mod reports;
pub mod suppliers;
