mod common;

use axum::http::{Method, StatusCode};
use common::{read_json, TestApp};
use serde_json::{json, Value};

async fn seed_supplier(app: &TestApp) -> String {
    let response = app
        .request_as_staff(
            Method::POST,
            "/api/v1/suppliers",
            Some(json!({
                "name": "Dental Depot",
                "contact_name": "Ana Cruz",
                "email": "orders@dentaldepot.example",
                "phone": "0917-555-0101"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    body["data"]["id"].as_str().expect("supplier id").to_string()
}

async fn seed_item(app: &TestApp, sku: &str, reorder_level: i32) -> String {
    let response = app
        .request_as_staff(
            Method::POST,
            "/api/v1/items",
            Some(json!({
                "sku": sku,
                "name": format!("Item {}", sku),
                "unit": "box",
                "unit_cost": "120.50",
                "reorder_level": reorder_level
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    body["data"]["id"].as_str().expect("item id").to_string()
}

async fn item_on_hand(app: &TestApp, item_id: &str) -> i64 {
    let response = app
        .request(Method::GET, &format!("/api/v1/items/{}", item_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    body["data"]["quantity_on_hand"].as_i64().expect("on hand")
}

#[tokio::test]
async fn item_crud_round_trip() {
    let app = TestApp::new().await;

    let response = app
        .request_as_staff(
            Method::POST,
            "/api/v1/categories",
            Some(json!({ "name": "Consumables", "description": "Gloves, masks, bibs" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let category = read_json(response).await;
    let category_id = category["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .request_as_staff(
            Method::POST,
            "/api/v1/items",
            Some(json!({
                "sku": "GLV-M",
                "name": "Nitrile Gloves (M)",
                "category_id": category_id,
                "unit": "box",
                "unit_cost": "250.00",
                "reorder_level": 5
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let item = read_json(response).await;
    assert_eq!(item["data"]["quantity_on_hand"], 0);
    let item_id = item["data"]["id"].as_str().unwrap().to_string();

    // Duplicate SKU is rejected
    let response = app
        .request_as_staff(
            Method::POST,
            "/api/v1/items",
            Some(json!({
                "sku": "GLV-M",
                "name": "Duplicate",
                "unit": "box",
                "unit_cost": "1.00",
                "reorder_level": 0
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .request(Method::GET, "/api/v1/items?search=Gloves", None)
        .await;
    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["id"].as_str().unwrap(), item_id);
}

#[tokio::test]
async fn mutations_require_identity() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/categories",
            Some(json!({ "name": "No identity" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn destructive_operations_require_admin() {
    let app = TestApp::new().await;
    let supplier_id = seed_supplier(&app).await;

    let response = app
        .request_as_staff(
            Method::DELETE,
            &format!("/api/v1/suppliers/{}", supplier_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request_as_admin(
            Method::DELETE,
            &format!("/api/v1/suppliers/{}", supplier_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["is_active"], false);
}

#[tokio::test]
async fn purchase_order_lifecycle_through_delivery() {
    let app = TestApp::new().await;
    let supplier_id = seed_supplier(&app).await;
    let item_id = seed_item(&app, "COMP-A", 2).await;

    let response = app
        .request_as_staff(
            Method::POST,
            "/api/v1/purchase-orders",
            Some(json!({
                "supplier_id": supplier_id,
                "lines": [
                    { "item_id": item_id, "quantity": 10, "unit_cost": "100.00" }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let po = read_json(response).await;
    let po_id = po["data"]["id"].as_str().unwrap().to_string();
    let po_number = po["data"]["po_number"].as_str().unwrap();
    assert!(po_number.starts_with("PO-"), "unexpected: {}", po_number);
    assert!(po_number.ends_with("-001"), "unexpected: {}", po_number);
    assert_eq!(po["data"]["status"], "pending");

    // Partial delivery
    let response = app
        .request_as_staff(
            Method::POST,
            "/api/v1/stock/in",
            Some(json!({
                "supplier_id": supplier_id,
                "purchase_order_id": po_id,
                "lines": [
                    { "item_id": item_id, "batch_no": "B-2026-01", "quantity": 4,
                      "unit_cost": "100.00", "expiry_date": "2027-06-30" }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(item_on_hand(&app, &item_id).await, 4);

    let response = app
        .request(Method::GET, &format!("/api/v1/purchase-orders/{}", po_id), None)
        .await;
    let body = read_json(response).await;
    assert_eq!(body["data"]["status"], "partially_received");
    assert_eq!(body["data"]["lines"][0]["quantity_received"], 4);

    // Same batch number again: the existing lot grows instead of duplicating
    let response = app
        .request_as_staff(
            Method::POST,
            "/api/v1/stock/in",
            Some(json!({
                "supplier_id": supplier_id,
                "purchase_order_id": po_id,
                "lines": [
                    { "item_id": item_id, "batch_no": "B-2026-01", "quantity": 6,
                      "unit_cost": "100.00" }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(item_on_hand(&app, &item_id).await, 10);

    let response = app
        .request(Method::GET, &format!("/api/v1/items/{}", item_id), None)
        .await;
    let body = read_json(response).await;
    let batches = body["data"]["batches"].as_array().unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0]["quantity"], 10);

    let response = app
        .request(Method::GET, &format!("/api/v1/purchase-orders/{}", po_id), None)
        .await;
    let body = read_json(response).await;
    assert_eq!(body["data"]["status"], "received");

    // A received order cannot be cancelled
    let response = app
        .request_as_staff(
            Method::POST,
            &format!("/api/v1/purchase-orders/{}/cancel", po_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn po_numbers_increment_within_a_day() {
    let app = TestApp::new().await;
    let supplier_id = seed_supplier(&app).await;
    let item_id = seed_item(&app, "SEQ-1", 0).await;

    let mut numbers = Vec::new();
    for _ in 0..3 {
        let response = app
            .request_as_staff(
                Method::POST,
                "/api/v1/purchase-orders",
                Some(json!({
                    "supplier_id": supplier_id,
                    "lines": [{ "item_id": item_id, "quantity": 1, "unit_cost": "10.00" }]
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = read_json(response).await;
        numbers.push(body["data"]["po_number"].as_str().unwrap().to_string());
    }

    assert!(numbers[0].ends_with("-001"));
    assert!(numbers[1].ends_with("-002"));
    assert!(numbers[2].ends_with("-003"));
}

#[tokio::test]
async fn purchase_order_list_filters_by_order_date() {
    let app = TestApp::new().await;
    let supplier_id = seed_supplier(&app).await;
    let item_id = seed_item(&app, "DATE-1", 0).await;

    let response = app
        .request_as_staff(
            Method::POST,
            "/api/v1/purchase-orders",
            Some(json!({
                "supplier_id": supplier_id,
                "lines": [{ "item_id": item_id, "quantity": 1, "unit_cost": "10.00" }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let today = chrono::Utc::now().date_naive();
    let yesterday = today - chrono::Duration::days(1);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/purchase-orders?from={}&to={}", today, today),
            None,
        )
        .await;
    let body = read_json(response).await;
    assert_eq!(body["pagination"]["total"], 1);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/purchase-orders?to={}", yesterday),
            None,
        )
        .await;
    let body = read_json(response).await;
    assert_eq!(body["pagination"]["total"], 0);
}

#[tokio::test]
async fn stock_out_rolls_back_on_insufficient_stock() {
    let app = TestApp::new().await;
    let supplier_id = seed_supplier(&app).await;
    let item_id = seed_item(&app, "ANES-1", 2).await;

    let response = app
        .request_as_staff(
            Method::POST,
            "/api/v1/stock/in",
            Some(json!({
                "supplier_id": supplier_id,
                "lines": [
                    { "item_id": item_id, "batch_no": "L-77", "quantity": 5, "unit_cost": "80.00" }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(Method::GET, &format!("/api/v1/items/{}", item_id), None)
        .await;
    let body = read_json(response).await;
    let batch_id = body["data"]["batches"][0]["id"].as_str().unwrap().to_string();

    // First line would fit, second overdraws: nothing may be deducted
    let response = app
        .request_as_staff(
            Method::POST,
            "/api/v1/stock/out",
            Some(json!({
                "reason": "usage",
                "lines": [
                    { "item_id": item_id, "batch_id": batch_id, "quantity": 3 },
                    { "item_id": item_id, "batch_id": batch_id, "quantity": 9 }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(item_on_hand(&app, &item_id).await, 5);

    // A fitting request goes through
    let response = app
        .request_as_staff(
            Method::POST,
            "/api/v1/stock/out",
            Some(json!({
                "reason": "usage",
                "lines": [
                    { "item_id": item_id, "batch_id": batch_id, "quantity": 3 }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(item_on_hand(&app, &item_id).await, 2);
}

#[tokio::test]
async fn manual_adjustment_cannot_go_negative() {
    let app = TestApp::new().await;
    let supplier_id = seed_supplier(&app).await;
    let item_id = seed_item(&app, "CEM-1", 0).await;

    let response = app
        .request_as_staff(
            Method::POST,
            "/api/v1/stock/in",
            Some(json!({
                "supplier_id": supplier_id,
                "lines": [
                    { "item_id": item_id, "batch_no": "C-1", "quantity": 2, "unit_cost": "60.00" }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request_as_staff(
            Method::POST,
            "/api/v1/stock/adjustments",
            Some(json!({
                "item_id": item_id,
                "quantity_delta": -5,
                "reason": "recount"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(item_on_hand(&app, &item_id).await, 2);

    let response = app
        .request_as_staff(
            Method::POST,
            "/api/v1/stock/adjustments",
            Some(json!({
                "item_id": item_id,
                "quantity_delta": -1,
                "reason": "broken vial"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(item_on_hand(&app, &item_id).await, 1);
}

#[tokio::test]
async fn low_stock_and_expiring_reports() {
    let app = TestApp::new().await;
    let supplier_id = seed_supplier(&app).await;
    let low_item = seed_item(&app, "LOW-1", 10).await;
    let ok_item = seed_item(&app, "OK-1", 1).await;

    let response = app
        .request_as_staff(
            Method::POST,
            "/api/v1/stock/in",
            Some(json!({
                "supplier_id": supplier_id,
                "lines": [
                    { "item_id": low_item, "batch_no": "LB-1", "quantity": 3,
                      "unit_cost": "10.00", "expiry_date": "2026-09-01" },
                    { "item_id": ok_item, "batch_no": "OB-1", "quantity": 50,
                      "unit_cost": "10.00", "expiry_date": "2030-01-01" }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.request(Method::GET, "/api/v1/reports/stock/low", None).await;
    let body = read_json(response).await;
    let rows: Vec<Value> = body["data"].as_array().unwrap().clone();
    assert!(rows.iter().any(|r| r["sku"] == "LOW-1"));
    assert!(!rows.iter().any(|r| r["sku"] == "OK-1"));

    // 2026-09-01 falls inside the default 30-day window relative to test time
    // only if run before then; instead assert the far-future batch is absent.
    let response = app
        .request(Method::GET, "/api/v1/reports/stock/expiring", None)
        .await;
    let body = read_json(response).await;
    let rows = body["data"].as_array().unwrap();
    assert!(!rows.iter().any(|r| r["batch_no"] == "OB-1"));
}

#[tokio::test]
async fn activity_feed_records_stock_events() {
    let app = TestApp::new().await;
    let supplier_id = seed_supplier(&app).await;
    let item_id = seed_item(&app, "ACT-1", 0).await;

    let response = app
        .request_as_staff(
            Method::POST,
            "/api/v1/stock/in",
            Some(json!({
                "supplier_id": supplier_id,
                "lines": [
                    { "item_id": item_id, "batch_no": "A-1", "quantity": 2, "unit_cost": "5.00" }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // The event pipeline is asynchronous; give it a moment to flush.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let response = app
        .request(Method::GET, "/api/v1/activity?entity_type=stock_in", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["action"], "stock.delivery_received");
    assert_eq!(rows[0]["actor_name"], "Front Desk");
}
