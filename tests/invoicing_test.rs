mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;
use solarops_api::entities::{invoice, stock_transaction};

use common::{as_decimal, body_json, TestApp};

#[tokio::test]
async fn creating_an_invoice_decrements_stock_and_records_the_sale() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("T. Moyo").await;
    let item_id = app.seed_item("300W Panel", 10, dec!(350.00)).await;

    let response = app
        .post(
            "/api/v1/invoices",
            json!({
                "customer_id": customer_id,
                "lines": [
                    { "inventory_id": item_id, "quantity": 4, "unit_price": "350.00" }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let invoice = body_json(response).await;
    assert_eq!(invoice["status"], "Pending");
    assert_eq!(invoice["customer_name"], "T. Moyo");
    assert_eq!(as_decimal(&invoice["total_amount"]), dec!(1400.00));
    assert_eq!(invoice["lines"].as_array().unwrap().len(), 1);
    assert_eq!(invoice["lines"][0]["item_name"], "300W Panel");
    let invoice_id = invoice["id"].as_i64().unwrap();

    // Stock went from 10 to 6.
    let item = body_json(app.get(&format!("/api/v1/inventory/{item_id}")).await).await;
    assert_eq!(item["quantity"], 6);

    // Exactly one STOCK_OUT row, negative and attributed to the invoice.
    // The seed item also has its initial STOCK_IN row.
    let rows = body_json(
        app.get(&format!("/api/v1/inventory/{item_id}/transactions"))
            .await,
    )
    .await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    let stock_out = &rows[0];
    assert_eq!(stock_out["transaction_type"], "Stock Out");
    assert_eq!(stock_out["quantity"], -4);
    assert_eq!(as_decimal(&stock_out["total_value"]), dec!(-1400.00));
    assert_eq!(stock_out["reference_id"], invoice_id);
    assert_eq!(stock_out["reference_type"], "INVOICE");
    assert_eq!(
        stock_out["notes"],
        format!("Sold via invoice #{invoice_id}")
    );
}

#[tokio::test]
async fn overselling_returns_conflict_with_stock_numbers() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("S. Ndlovu").await;
    let item_id = app.seed_item("Inverter 5kVA", 6, dec!(1200.00)).await;

    let response = app
        .post(
            "/api/v1/invoices",
            json!({
                "customer_id": customer_id,
                "lines": [
                    { "inventory_id": item_id, "quantity": 10, "unit_price": "1200.00" }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_json(response).await;
    assert_eq!(body["details"]["available"], 6);
    assert_eq!(body["details"]["requested"], 10);

    // The same failing request again reports the same numbers; failures have
    // no side effects to accumulate.
    let response = app
        .post(
            "/api/v1/invoices",
            json!({
                "customer_id": customer_id,
                "lines": [
                    { "inventory_id": item_id, "quantity": 10, "unit_price": "1200.00" }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["details"]["available"], 6);
    assert_eq!(body["details"]["requested"], 10);

    // Nothing was written: stock unchanged, no invoice, no STOCK_OUT row
    // beyond the seed item's initial STOCK_IN.
    let item = body_json(app.get(&format!("/api/v1/inventory/{item_id}")).await).await;
    assert_eq!(item["quantity"], 6);
    let invoices = invoice::Entity::find()
        .all(&*app.state.db)
        .await
        .unwrap();
    assert!(invoices.is_empty());
    let rows = body_json(
        app.get(&format!("/api/v1/inventory/{item_id}/transactions"))
            .await,
    )
    .await;
    assert_eq!(rows.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn a_failing_line_rolls_back_the_whole_invoice() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("Rollback Co").await;
    let panel_id = app.seed_item("Panel", 10, dec!(100.00)).await;
    let battery_id = app.seed_item("Battery", 2, dec!(800.00)).await;

    let response = app
        .post(
            "/api/v1/invoices",
            json!({
                "customer_id": customer_id,
                "lines": [
                    { "inventory_id": panel_id, "quantity": 5, "unit_price": "100.00" },
                    { "inventory_id": battery_id, "quantity": 3, "unit_price": "800.00" }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The first line's stock was not touched.
    let panel = body_json(app.get(&format!("/api/v1/inventory/{panel_id}")).await).await;
    assert_eq!(panel["quantity"], 10);
    let battery = body_json(app.get(&format!("/api/v1/inventory/{battery_id}")).await).await;
    assert_eq!(battery["quantity"], 2);

    let invoices = invoice::Entity::find()
        .all(&*app.state.db)
        .await
        .unwrap();
    assert!(invoices.is_empty());
}

#[tokio::test]
async fn duplicate_lines_for_one_item_cannot_jointly_oversell() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("Split Lines").await;
    let item_id = app.seed_item("Charge Controller", 10, dec!(60.00)).await;

    // Each line passes validation against the same snapshot (6 <= 10), but
    // together they want 12; the guarded decrement on the second commit must
    // reject and roll back the whole invoice.
    let response = app
        .post(
            "/api/v1/invoices",
            json!({
                "customer_id": customer_id,
                "lines": [
                    { "inventory_id": item_id, "quantity": 6, "unit_price": "60.00" },
                    { "inventory_id": item_id, "quantity": 6, "unit_price": "60.00" }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["details"]["available"], 4);
    assert_eq!(body["details"]["requested"], 6);

    // Full rollback: the first line's decrement is undone too.
    let item = body_json(app.get(&format!("/api/v1/inventory/{item_id}")).await).await;
    assert_eq!(item["quantity"], 10);
    let invoices = invoice::Entity::find()
        .all(&*app.state.db)
        .await
        .unwrap();
    assert!(invoices.is_empty());
    let rows = body_json(
        app.get(&format!("/api/v1/inventory/{item_id}/transactions"))
            .await,
    )
    .await;
    assert_eq!(rows.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_invoice_requests_are_rejected() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("Edge Case").await;
    let item_id = app.seed_item("Cable", 50, dec!(2.50)).await;

    // No lines.
    let response = app
        .post(
            "/api/v1/invoices",
            json!({ "customer_id": customer_id, "lines": [] }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Zero quantity.
    let response = app
        .post(
            "/api/v1/invoices",
            json!({
                "customer_id": customer_id,
                "lines": [{ "inventory_id": item_id, "quantity": 0, "unit_price": "2.50" }]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Negative price.
    let response = app
        .post(
            "/api/v1/invoices",
            json!({
                "customer_id": customer_id,
                "lines": [{ "inventory_id": item_id, "quantity": 1, "unit_price": "-2.50" }]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown customer.
    let response = app
        .post(
            "/api/v1/invoices",
            json!({
                "customer_id": 9999,
                "lines": [{ "inventory_id": item_id, "quantity": 1, "unit_price": "2.50" }]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Unknown item.
    let response = app
        .post(
            "/api/v1/invoices",
            json!({
                "customer_id": customer_id,
                "lines": [{ "inventory_id": 9999, "quantity": 1, "unit_price": "2.50" }]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Nothing leaked through any of the failed attempts.
    let item = body_json(app.get(&format!("/api/v1/inventory/{item_id}")).await).await;
    assert_eq!(item["quantity"], 50);
}

#[tokio::test]
async fn caller_prices_are_recorded_even_when_they_differ_from_the_catalog() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("Discount Buyer").await;
    let item_id = app.seed_item("Controller", 5, dec!(90.00)).await;

    let response = app
        .post(
            "/api/v1/invoices",
            json!({
                "customer_id": customer_id,
                "lines": [
                    { "inventory_id": item_id, "quantity": 2, "unit_price": "75.00" }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let invoice = body_json(response).await;
    assert_eq!(as_decimal(&invoice["total_amount"]), dec!(150.00));
    assert_eq!(as_decimal(&invoice["lines"][0]["unit_price"]), dec!(75.00));

    // The catalog price is untouched.
    let item = body_json(app.get(&format!("/api/v1/inventory/{item_id}")).await).await;
    assert_eq!(as_decimal(&item["unit_price"]), dec!(90.00));
}

#[tokio::test]
async fn ledger_reconciles_after_mixed_stock_movements() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("Ledger Check").await;
    let item_id = app.seed_item("Fuse", 20, dec!(1.00)).await;

    app.post(
        "/api/v1/invoices",
        json!({
            "customer_id": customer_id,
            "lines": [{ "inventory_id": item_id, "quantity": 7, "unit_price": "1.00" }]
        }),
    )
    .await;
    app.post(
        &format!("/api/v1/inventory/{item_id}/stock-in"),
        json!({ "quantity": 5, "unit_price": "0.80" }),
    )
    .await;
    app.post(
        &format!("/api/v1/inventory/{item_id}/adjust"),
        json!({ "delta": -2, "reason": "Damaged" }),
    )
    .await;

    let item = body_json(app.get(&format!("/api/v1/inventory/{item_id}")).await).await;
    assert_eq!(item["quantity"], 16);

    // Sum of signed ledger quantities equals the stored quantity.
    let rows = stock_transaction::Entity::find()
        .filter(stock_transaction::Column::InventoryId.eq(item_id))
        .all(&*app.state.db)
        .await
        .unwrap();
    let ledger_total: i32 = rows.iter().map(|r| r.quantity).sum();
    assert_eq!(ledger_total, 16);
}

#[tokio::test]
async fn invoice_status_follows_the_lifecycle() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("Lifecycle").await;
    let item_id = app.seed_item("Bracket", 10, dec!(4.00)).await;

    let created = body_json(
        app.post(
            "/api/v1/invoices",
            json!({
                "customer_id": customer_id,
                "lines": [{ "inventory_id": item_id, "quantity": 1, "unit_price": "4.00" }]
            }),
        )
        .await,
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    // Pending -> Paid stamps the paid date.
    let response = app
        .put(&format!("/api/v1/invoices/{id}/status"), json!({ "status": "Paid" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let paid = body_json(response).await;
    assert_eq!(paid["status"], "Paid");
    assert!(!paid["paid_date"].is_null());

    // Paid is terminal.
    let response = app
        .put(&format!("/api/v1/invoices/{id}/status"), json!({ "status": "Pending" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let response = app
        .put(&format!("/api/v1/invoices/{id}/status"), json!({ "status": "Cancelled" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cancelling_an_invoice_does_not_restock() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("Cancel Co").await;
    let item_id = app.seed_item("Pump", 8, dec!(200.00)).await;

    let created = body_json(
        app.post(
            "/api/v1/invoices",
            json!({
                "customer_id": customer_id,
                "lines": [{ "inventory_id": item_id, "quantity": 3, "unit_price": "200.00" }]
            }),
        )
        .await,
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let response = app
        .put(&format!("/api/v1/invoices/{id}/status"), json!({ "status": "Cancelled" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Stock stays where the sale left it; returns go through a manual
    // adjustment with its own audit row.
    let item = body_json(app.get(&format!("/api/v1/inventory/{item_id}")).await).await;
    assert_eq!(item["quantity"], 5);
}

#[tokio::test]
async fn multi_line_invoice_totals_are_server_computed() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("Totals").await;
    let panel_id = app.seed_item("Panel 450W", 10, dec!(350.00)).await;
    let battery_id = app.seed_item("Lithium Battery", 4, dec!(950.00)).await;

    let response = app
        .post(
            "/api/v1/invoices",
            json!({
                "customer_id": customer_id,
                "tax_amount": "50.00",
                "discount_amount": "100.00",
                "lines": [
                    { "inventory_id": panel_id, "quantity": 2, "unit_price": "350.00" },
                    { "inventory_id": battery_id, "quantity": 1, "unit_price": "950.00" }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let invoice = body_json(response).await;

    assert_eq!(as_decimal(&invoice["total_amount"]), dec!(1650.00));
    assert_eq!(as_decimal(&invoice["final_amount"]), dec!(1600.00));

    let listed = body_json(app.request(Method::GET, "/api/v1/invoices", None).await).await;
    assert_eq!(listed["total"], 1);
}
