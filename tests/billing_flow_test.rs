mod common;

use axum::http::{Method, StatusCode};
use common::{read_json, TestApp};
use serde_json::{json, Value};
use uuid::Uuid;

fn money(value: &Value) -> f64 {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .expect("decimal string")
}

async fn create_invoice(app: &TestApp, charges: Value) -> String {
    let response = app
        .request_as_staff(
            Method::POST,
            "/api/v1/invoices",
            Some(json!({
                "patient_id": Uuid::new_v4(),
                "patient_name": "Maria Santos",
                "charges": charges
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    body["data"]["id"].as_str().expect("invoice id").to_string()
}

async fn invoice_detail(app: &TestApp, invoice_id: &str) -> Value {
    let response = app
        .request(Method::GET, &format!("/api/v1/invoices/{}", invoice_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    read_json(response).await
}

async fn pay(app: &TestApp, invoice_id: &str, amount: &str) -> axum::http::StatusCode {
    let response = app
        .request_as_staff(
            Method::POST,
            &format!("/api/v1/invoices/{}/payments", invoice_id),
            Some(json!({ "amount": amount, "method": "cash" })),
        )
        .await;
    response.status()
}

#[tokio::test]
async fn invoice_detail_derives_totals_from_charges() {
    let app = TestApp::new().await;
    let invoice_id = create_invoice(
        &app,
        json!([
            { "description": "Oral prophylaxis", "quantity": 1, "unit_price": "1200.00" },
            { "description": "Composite filling", "quantity": 2, "unit_price": "1500.00" }
        ]),
    )
    .await;

    let body = invoice_detail(&app, &invoice_id).await;
    assert_eq!(body["data"]["status"], "open");
    assert!(body["data"]["invoice_number"]
        .as_str()
        .unwrap()
        .starts_with("INV-"));
    assert_eq!(money(&body["data"]["totals"]["subtotal"]), 4200.0);
    assert_eq!(money(&body["data"]["totals"]["balance_due"]), 4200.0);
    assert_eq!(body["data"]["charges"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn payments_move_status_from_open_to_paid() {
    let app = TestApp::new().await;
    let invoice_id = create_invoice(
        &app,
        json!([{ "description": "Extraction", "quantity": 1, "unit_price": "2000.00" }]),
    )
    .await;

    assert_eq!(pay(&app, &invoice_id, "500.00").await, StatusCode::CREATED);
    let body = invoice_detail(&app, &invoice_id).await;
    assert_eq!(body["data"]["status"], "partially_paid");
    assert_eq!(money(&body["data"]["totals"]["balance_due"]), 1500.0);

    assert_eq!(pay(&app, &invoice_id, "1500.00").await, StatusCode::CREATED);
    let body = invoice_detail(&app, &invoice_id).await;
    assert_eq!(body["data"]["status"], "paid");
    assert_eq!(money(&body["data"]["totals"]["balance_due"]), 0.0);
}

#[tokio::test]
async fn overpayment_is_rejected() {
    let app = TestApp::new().await;
    let invoice_id = create_invoice(
        &app,
        json!([{ "description": "Consultation", "quantity": 1, "unit_price": "800.00" }]),
    )
    .await;

    assert_eq!(pay(&app, &invoice_id, "800.01").await, StatusCode::BAD_REQUEST);
    assert_eq!(pay(&app, &invoice_id, "0").await, StatusCode::BAD_REQUEST);
    assert_eq!(pay(&app, &invoice_id, "800.00").await, StatusCode::CREATED);

    // Nothing left to pay
    assert_eq!(pay(&app, &invoice_id, "0.01").await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn discount_can_settle_an_invoice() {
    let app = TestApp::new().await;
    let invoice_id = create_invoice(
        &app,
        json!([{ "description": "Denture repair", "quantity": 1, "unit_price": "1000.00" }]),
    )
    .await;

    assert_eq!(pay(&app, &invoice_id, "900.00").await, StatusCode::CREATED);

    // Discount above the remaining balance is rejected
    let response = app
        .request_as_admin(
            Method::POST,
            &format!("/api/v1/invoices/{}/adjustments", invoice_id),
            Some(json!({ "kind": "discount", "amount": "150.00", "reason": "senior citizen" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_as_admin(
            Method::POST,
            &format!("/api/v1/invoices/{}/adjustments", invoice_id),
            Some(json!({ "kind": "discount", "amount": "100.00", "reason": "senior citizen" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = invoice_detail(&app, &invoice_id).await;
    assert_eq!(body["data"]["status"], "paid");
    assert_eq!(money(&body["data"]["totals"]["balance_due"]), 0.0);
}

#[tokio::test]
async fn refund_cannot_exceed_collected_amount() {
    let app = TestApp::new().await;
    let invoice_id = create_invoice(
        &app,
        json!([{ "description": "Whitening", "quantity": 1, "unit_price": "5000.00" }]),
    )
    .await;
    assert_eq!(pay(&app, &invoice_id, "2000.00").await, StatusCode::CREATED);

    let response = app
        .request_as_admin(
            Method::POST,
            &format!("/api/v1/invoices/{}/adjustments", invoice_id),
            Some(json!({ "kind": "refund", "amount": "2500.00", "reason": "procedure aborted" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_as_admin(
            Method::POST,
            &format!("/api/v1/invoices/{}/adjustments", invoice_id),
            Some(json!({ "kind": "refund", "amount": "2000.00", "reason": "procedure aborted" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // 5000 charged, 2000 paid, 2000 refunded
    let body = invoice_detail(&app, &invoice_id).await;
    assert_eq!(money(&body["data"]["totals"]["total_refunds"]), 2000.0);
    assert_eq!(money(&body["data"]["totals"]["balance_due"]), 1000.0);
}

#[tokio::test]
async fn refund_cannot_push_balance_below_zero() {
    let app = TestApp::new().await;
    let invoice_id = create_invoice(
        &app,
        json!([{ "description": "Fluoride treatment", "quantity": 1, "unit_price": "100.00" }]),
    )
    .await;
    assert_eq!(pay(&app, &invoice_id, "100.00").await, StatusCode::CREATED);

    // Fully settled: a refund would drive the balance negative
    let response = app
        .request_as_admin(
            Method::POST,
            &format!("/api/v1/invoices/{}/adjustments", invoice_id),
            Some(json!({ "kind": "refund", "amount": "100.00", "reason": "double charge" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = invoice_detail(&app, &invoice_id).await;
    assert_eq!(body["data"]["status"], "paid");
    assert_eq!(money(&body["data"]["totals"]["balance_due"]), 0.0);
}

#[tokio::test]
async fn adjustments_require_admin() {
    let app = TestApp::new().await;
    let invoice_id = create_invoice(
        &app,
        json!([{ "description": "Cleaning", "quantity": 1, "unit_price": "1200.00" }]),
    )
    .await;

    let response = app
        .request_as_staff(
            Method::POST,
            &format!("/api/v1/invoices/{}/adjustments", invoice_id),
            Some(json!({ "kind": "discount", "amount": "100.00", "reason": "promo" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn voiding_rules() {
    let app = TestApp::new().await;
    let paid_invoice = create_invoice(
        &app,
        json!([{ "description": "Braces adjustment", "quantity": 1, "unit_price": "1500.00" }]),
    )
    .await;
    assert_eq!(pay(&app, &paid_invoice, "500.00").await, StatusCode::CREATED);

    // An invoice with payments cannot be voided
    let response = app
        .request_as_admin(
            Method::POST,
            &format!("/api/v1/invoices/{}/void", paid_invoice),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let fresh_invoice = create_invoice(
        &app,
        json!([{ "description": "X-ray", "quantity": 1, "unit_price": "600.00" }]),
    )
    .await;

    // Staff cannot void
    let response = app
        .request_as_staff(
            Method::POST,
            &format!("/api/v1/invoices/{}/void", fresh_invoice),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request_as_admin(
            Method::POST,
            &format!("/api/v1/invoices/{}/void", fresh_invoice),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["status"], "void");

    // Void invoices reject further mutations
    let response = app
        .request_as_staff(
            Method::POST,
            &format!("/api/v1/invoices/{}/charges", fresh_invoice),
            Some(json!({ "description": "Late charge", "quantity": 1, "unit_price": "10.00" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(pay(&app, &fresh_invoice, "10.00").await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn installment_plan_must_cover_balance_exactly() {
    let app = TestApp::new().await;
    let invoice_id = create_invoice(
        &app,
        json!([{ "description": "Root canal", "quantity": 1, "unit_price": "9000.00" }]),
    )
    .await;

    // One part is not a plan
    let response = app
        .request_as_staff(
            Method::POST,
            &format!("/api/v1/invoices/{}/installments", invoice_id),
            Some(json!({ "parts": [
                { "due_date": "2026-09-01", "amount": "9000.00" }
            ]})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Sum mismatch
    let response = app
        .request_as_staff(
            Method::POST,
            &format!("/api/v1/invoices/{}/installments", invoice_id),
            Some(json!({ "parts": [
                { "due_date": "2026-09-01", "amount": "4000.00" },
                { "due_date": "2026-10-01", "amount": "4000.00" }
            ]})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_as_staff(
            Method::POST,
            &format!("/api/v1/invoices/{}/installments", invoice_id),
            Some(json!({ "parts": [
                { "due_date": "2026-09-01", "amount": "4500.00" },
                { "due_date": "2026-10-01", "amount": "4500.00" }
            ]})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    let parts = body["data"].as_array().unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0]["sequence"], 1);
    assert_eq!(parts[0]["status"], "pending");

    // Only one plan per invoice
    let response = app
        .request_as_staff(
            Method::POST,
            &format!("/api/v1/invoices/{}/installments", invoice_id),
            Some(json!({ "parts": [
                { "due_date": "2026-09-01", "amount": "4500.00" },
                { "due_date": "2026-10-01", "amount": "4500.00" }
            ]})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn payment_settles_a_named_installment() {
    let app = TestApp::new().await;
    let invoice_id = create_invoice(
        &app,
        json!([{ "description": "Crown", "quantity": 1, "unit_price": "6000.00" }]),
    )
    .await;

    let response = app
        .request_as_staff(
            Method::POST,
            &format!("/api/v1/invoices/{}/installments", invoice_id),
            Some(json!({ "parts": [
                { "due_date": "2026-01-15", "amount": "3000.00" },
                { "due_date": "2026-02-15", "amount": "3000.00" }
            ]})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    let first_part = body["data"][0]["id"].as_str().unwrap().to_string();

    let response = app
        .request_as_staff(
            Method::POST,
            &format!("/api/v1/invoices/{}/payments", invoice_id),
            Some(json!({
                "amount": "3000.00",
                "method": "transfer",
                "installment_id": first_part
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = invoice_detail(&app, &invoice_id).await;
    assert_eq!(body["data"]["status"], "partially_paid");
    assert_eq!(body["data"]["installments"][0]["status"], "paid");
    assert_eq!(body["data"]["installments"][1]["status"], "pending");

    // A settled installment cannot be paid twice
    let response = app
        .request_as_staff(
            Method::POST,
            &format!("/api/v1/invoices/{}/payments", invoice_id),
            Some(json!({
                "amount": "3000.00",
                "method": "transfer",
                "installment_id": body["data"]["installments"][0]["id"]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn overdue_installments_report() {
    let app = TestApp::new().await;
    let invoice_id = create_invoice(
        &app,
        json!([{ "description": "Implant", "quantity": 1, "unit_price": "20000.00" }]),
    )
    .await;

    let response = app
        .request_as_staff(
            Method::POST,
            &format!("/api/v1/invoices/{}/installments", invoice_id),
            Some(json!({ "parts": [
                { "due_date": "2026-03-01", "amount": "10000.00" },
                { "due_date": "2026-12-01", "amount": "10000.00" }
            ]})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(Method::GET, "/api/v1/installments/overdue?as_of=2026-06-01", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["due_date"], "2026-03-01");

    // Both parts overdue later in the year
    let response = app
        .request(Method::GET, "/api/v1/installments/overdue?as_of=2026-12-31", None)
        .await;
    let body = read_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn invoice_list_filters_by_status() {
    let app = TestApp::new().await;
    let first = create_invoice(
        &app,
        json!([{ "description": "Checkup", "quantity": 1, "unit_price": "500.00" }]),
    )
    .await;
    let _second = create_invoice(
        &app,
        json!([{ "description": "Checkup", "quantity": 1, "unit_price": "500.00" }]),
    )
    .await;
    assert_eq!(pay(&app, &first, "500.00").await, StatusCode::CREATED);

    let response = app
        .request(Method::GET, "/api/v1/invoices?status=paid", None)
        .await;
    let body = read_json(response).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["id"].as_str().unwrap(), first);

    let response = app
        .request(Method::GET, "/api/v1/invoices?status=open", None)
        .await;
    let body = read_json(response).await;
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn invoice_list_filters_by_issue_date() {
    let app = TestApp::new().await;
    let _invoice = create_invoice(
        &app,
        json!([{ "description": "Checkup", "quantity": 1, "unit_price": "500.00" }]),
    )
    .await;

    let today = chrono::Utc::now().date_naive();
    let tomorrow = today + chrono::Duration::days(1);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/invoices?from={}&to={}", today, today),
            None,
        )
        .await;
    let body = read_json(response).await;
    assert_eq!(body["pagination"]["total"], 1);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/invoices?from={}", tomorrow),
            None,
        )
        .await;
    let body = read_json(response).await;
    assert_eq!(body["pagination"]["total"], 0);
}
