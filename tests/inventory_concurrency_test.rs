mod common;

use rust_decimal_macros::dec;
use serde_json::json;
use solarops_api::errors::ServiceError;
use solarops_api::services::invoicing::CreateInvoiceInput;

use common::TestApp;

fn invoice_input(customer_id: i32, item_id: i32, quantity: i32) -> CreateInvoiceInput {
    serde_json::from_value(json!({
        "customer_id": customer_id,
        "lines": [
            { "inventory_id": item_id, "quantity": quantity, "unit_price": "10.00" }
        ]
    }))
    .expect("valid invoice input")
}

#[tokio::test]
async fn concurrent_invoices_never_oversell() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("Race Buyer").await;
    let item_id = app.seed_item("MC4 Connector", 10, dec!(10.00)).await;

    // Two invoices for half the stock each, issued concurrently. Both must
    // succeed because together they exactly consume the stock.
    let first = app
        .state
        .invoicing
        .create_invoice(invoice_input(customer_id, item_id, 5));
    let second = app
        .state
        .invoicing
        .create_invoice(invoice_input(customer_id, item_id, 5));
    let (first, second) = tokio::join!(first, second);
    assert!(first.is_ok(), "first invoice failed: {first:?}");
    assert!(second.is_ok(), "second invoice failed: {second:?}");

    let item = app.state.inventory.get_item(item_id).await.unwrap();
    assert_eq!(item.quantity, 0);

    // A third sale has nothing left to claim.
    let third = app
        .state
        .invoicing
        .create_invoice(invoice_input(customer_id, item_id, 1))
        .await;
    match third {
        Err(ServiceError::InsufficientStock {
            available,
            requested,
            ..
        }) => {
            assert_eq!(available, 0);
            assert_eq!(requested, 1);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // Quantity never went negative at any point.
    let item = app.state.inventory.get_item(item_id).await.unwrap();
    assert_eq!(item.quantity, 0);
}

#[tokio::test]
async fn concurrent_stock_in_and_sale_keep_the_ledger_reconciled() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("Interleaved Buyer").await;
    let item_id = app.seed_item("AC Isolator", 10, dec!(10.00)).await;

    // A replenishment and a sale racing each other: both deltas must land,
    // neither may overwrite the other with a stale absolute quantity.
    let restock = app
        .state
        .inventory
        .receive_stock(item_id, 5, dec!(8.00), None);
    let sale = app
        .state
        .invoicing
        .create_invoice(invoice_input(customer_id, item_id, 4));
    let (restock, sale) = tokio::join!(restock, sale);
    assert!(restock.is_ok(), "stock-in failed: {restock:?}");
    assert!(sale.is_ok(), "invoice failed: {sale:?}");

    let item = app.state.inventory.get_item(item_id).await.unwrap();
    assert_eq!(item.quantity, 11);

    let rows = app.state.inventory.list_transactions(item_id).await.unwrap();
    let ledger_total: i32 = rows.iter().map(|r| r.quantity).sum();
    assert_eq!(ledger_total, item.quantity);
}

#[tokio::test]
async fn many_competing_single_unit_sales_stop_at_zero() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("Bulk Racer").await;
    let item_id = app.seed_item("Fuse Holder", 3, dec!(10.00)).await;

    let mut handles = Vec::new();
    for _ in 0..6 {
        let invoicing = app.state.invoicing.clone();
        let input = invoice_input(customer_id, item_id, 1);
        handles.push(tokio::spawn(
            async move { invoicing.create_invoice(input).await },
        ));
    }

    let mut succeeded = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(_) => succeeded += 1,
            Err(ServiceError::InsufficientStock { .. }) => rejected += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(succeeded, 3);
    assert_eq!(rejected, 3);

    let item = app.state.inventory.get_item(item_id).await.unwrap();
    assert_eq!(item.quantity, 0);
}
