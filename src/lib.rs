//! Business-management backend for a solar equipment company: suppliers,
//! customers, inventory with an append-only stock ledger, invoicing with
//! atomic stock reservation, financial records, and customer activities.

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod services;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::events::EventSender;
use crate::services::inventory::InventoryService;
use crate::services::invoicing::InvoicingService;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: AppConfig,
    pub event_sender: EventSender,
    pub inventory: InventoryService,
    pub invoicing: InvoicingService,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: AppConfig, event_sender: EventSender) -> Self {
        let inventory = InventoryService::new(db.clone(), event_sender.clone());
        let invoicing = InvoicingService::new(db.clone(), event_sender.clone());
        Self {
            db,
            config,
            event_sender,
            inventory,
            invoicing,
        }
    }
}
