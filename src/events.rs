//! Application events.
//!
//! Services emit events after their unit of work commits; a background task
//! consumes them and writes structured log lines. Delivery is best-effort and
//! never affects the outcome of the operation that produced the event.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    SupplierCreated { supplier_id: i32 },
    CustomerCreated { customer_id: i32 },
    InventoryItemCreated { item_id: i32, initial_quantity: i32 },
    StockReceived { item_id: i32, quantity: i32 },
    StockAdjusted { item_id: i32, delta: i32, new_quantity: i32 },
    LowStock { item_id: i32, quantity: i32, minimum: i32 },
    InvoiceCreated { invoice_id: i32, customer_id: i32, total_amount: Decimal },
    InvoiceStatusChanged { invoice_id: i32, old_status: String, new_status: String },
    FinancialRecordAdded { record_id: i32 },
    ActivityLogged { activity_id: i32 },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, logging instead of failing when the channel is closed.
    pub async fn send(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            warn!(error = %e, "event channel closed, dropping event");
        }
    }
}

/// Consumes events and logs them until the channel closes.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::InvoiceCreated {
                invoice_id,
                customer_id,
                total_amount,
            } => {
                info!(invoice_id, customer_id, %total_amount, "invoice created");
            }
            Event::LowStock {
                item_id,
                quantity,
                minimum,
            } => {
                warn!(item_id, quantity, minimum, "item at or below minimum stock level");
            }
            other => info!(event = ?other, "event processed"),
        }
    }
    info!("event channel closed, stopping event processor");
}
