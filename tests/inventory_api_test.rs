mod common;

use axum::http::StatusCode;
use rust_decimal_macros::dec;
use serde_json::json;

use common::{as_decimal, body_json, TestApp};

#[tokio::test]
async fn creating_an_item_with_stock_seeds_the_ledger() {
    let app = TestApp::new().await;

    let response = app
        .post(
            "/api/v1/inventory",
            json!({
                "name": "400W Mono Panel",
                "brand": "Jinko",
                "category": "Panels",
                "quantity": 12,
                "unit_price": "310.00",
                "minimum_stock_level": 3
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let item = body_json(response).await;
    let item_id = item["id"].as_i64().unwrap();
    assert_eq!(item["quantity"], 12);
    assert_eq!(item["currency"], "USD");

    let rows = body_json(
        app.get(&format!("/api/v1/inventory/{item_id}/transactions"))
            .await,
    )
    .await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["transaction_type"], "Stock In");
    assert_eq!(rows[0]["quantity"], 12);
    assert_eq!(rows[0]["notes"], "Initial stock for 400W Mono Panel");
}

#[tokio::test]
async fn zero_stock_items_start_with_an_empty_ledger() {
    let app = TestApp::new().await;
    let item_id = app.seed_item("Spare Relay", 0, dec!(15.00)).await;

    let rows = body_json(
        app.get(&format!("/api/v1/inventory/{item_id}/transactions"))
            .await,
    )
    .await;
    assert!(rows.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn search_and_category_filters_narrow_the_list() {
    let app = TestApp::new().await;
    app.seed_item("450W Panel", 5, dec!(400.00)).await;
    app.seed_item("Lithium Battery", 2, dec!(900.00)).await;

    let panel_id = {
        let response = app
            .post(
                "/api/v1/inventory",
                json!({
                    "name": "300W Panel",
                    "category": "Panels",
                    "quantity": 4,
                    "unit_price": "250.00"
                }),
            )
            .await;
        body_json(response).await["id"].as_i64().unwrap()
    };

    let listed = body_json(app.get("/api/v1/inventory?search=Panel").await).await;
    assert_eq!(listed["total"], 2);

    let listed = body_json(app.get("/api/v1/inventory?category=Panels").await).await;
    assert_eq!(listed["total"], 1);
    assert_eq!(listed["items"][0]["id"], panel_id);

    let categories = body_json(app.get("/api/v1/inventory/categories").await).await;
    assert_eq!(categories, json!(["Panels"]));
}

#[tokio::test]
async fn low_stock_reports_items_at_or_below_their_minimum() {
    let app = TestApp::new().await;

    // Default minimum stock level is 5.
    let low_id = app.seed_item("Breaker", 5, dec!(8.00)).await;
    app.seed_item("Busbar", 30, dec!(12.00)).await;

    let items = body_json(app.get("/api/v1/inventory/low-stock").await).await;
    let items = items.as_array().unwrap().clone();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], low_id);
}

#[tokio::test]
async fn stock_in_and_adjustments_move_quantity_with_audit_rows() {
    let app = TestApp::new().await;
    let item_id = app.seed_item("Earth Rod", 4, dec!(6.00)).await;

    let response = app
        .post(
            &format!("/api/v1/inventory/{item_id}/stock-in"),
            json!({ "quantity": 10, "unit_price": "5.50", "notes": "Restock from Harare depot" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let row = body_json(response).await;
    assert_eq!(row["transaction_type"], "Stock In");
    assert_eq!(as_decimal(&row["total_value"]), dec!(55.00));

    let response = app
        .post(
            &format!("/api/v1/inventory/{item_id}/adjust"),
            json!({ "delta": -3, "reason": "Damaged", "notes": "Water damage" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let row = body_json(response).await;
    assert_eq!(row["transaction_type"], "Adjustment");
    assert_eq!(row["quantity"], -3);
    assert_eq!(row["reason"], "Damaged");

    let item = body_json(app.get(&format!("/api/v1/inventory/{item_id}")).await).await;
    assert_eq!(item["quantity"], 11);
}

#[tokio::test]
async fn adjustments_cannot_push_stock_negative() {
    let app = TestApp::new().await;
    let item_id = app.seed_item("Clamp", 2, dec!(3.00)).await;

    let response = app
        .post(
            &format!("/api/v1/inventory/{item_id}/adjust"),
            json!({ "delta": -5, "reason": "Stock Adjustment" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["details"]["available"], 2);
    assert_eq!(body["details"]["requested"], 5);

    let item = body_json(app.get(&format!("/api/v1/inventory/{item_id}")).await).await;
    assert_eq!(item["quantity"], 2);
}

#[tokio::test]
async fn non_positive_stock_in_is_rejected() {
    let app = TestApp::new().await;
    let item_id = app.seed_item("Din Rail", 7, dec!(2.00)).await;

    for quantity in [0, -4] {
        let response = app
            .post(
                &format!("/api/v1/inventory/{item_id}/stock-in"),
                json!({ "quantity": quantity, "unit_price": "2.00" }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn updating_an_item_cannot_change_its_quantity() {
    let app = TestApp::new().await;
    let item_id = app.seed_item("Combiner Box", 6, dec!(45.00)).await;

    let response = app
        .put(
            &format!("/api/v1/inventory/{item_id}"),
            json!({ "name": "Combiner Box 4-way", "unit_price": "48.00" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let item = body_json(response).await;
    assert_eq!(item["name"], "Combiner Box 4-way");
    assert_eq!(as_decimal(&item["unit_price"]), dec!(48.00));
    // Quantity only moves through the ledger.
    assert_eq!(item["quantity"], 6);
}

#[tokio::test]
async fn unknown_items_return_not_found() {
    let app = TestApp::new().await;

    let response = app.get("/api/v1/inventory/41").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get("/api/v1/inventory/41/transactions").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
