mod common;

use axum::http::{Method, StatusCode};
use common::{read_json, TestApp};
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn link_envelope(id: &str, status: &str, paid_at: Option<i64>) -> Value {
    let payments = match paid_at {
        Some(ts) => json!([{ "attributes": { "paid_at": ts } }]),
        None => json!([]),
    };
    json!({
        "data": {
            "id": id,
            "attributes": {
                "checkout_url": format!("https://pay.example/{}", id),
                "qr_code": "data:image/png;base64,AAAA",
                "status": status,
                "payments": payments
            }
        }
    })
}

async fn create_invoice(app: &TestApp, unit_price: &str) -> String {
    let response = app
        .request_as_staff(
            Method::POST,
            "/api/v1/invoices",
            Some(json!({
                "patient_id": Uuid::new_v4(),
                "patient_name": "Jose Rizal",
                "charges": [
                    { "description": "Cleaning", "quantity": 1, "unit_price": unit_price }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    body["data"]["id"].as_str().expect("invoice id").to_string()
}

async fn create_link(app: &TestApp, invoice_id: &str, body: Value) -> Value {
    let response = app
        .request_as_staff(
            Method::POST,
            &format!("/api/v1/invoices/{}/payment-links", invoice_id),
            Some(body),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await
}

#[tokio::test]
async fn creates_link_for_full_balance_in_centavos() {
    let gateway = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/links"))
        .and(body_partial_json(json!({
            "data": { "attributes": { "amount": 150000 } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(link_envelope(
            "link_1", "unpaid", None,
        )))
        .expect(1)
        .mount(&gateway)
        .await;

    let app = TestApp::with_gateway(&gateway.uri()).await;
    let invoice_id = create_invoice(&app, "1500.00").await;

    let body = create_link(&app, &invoice_id, json!({})).await;
    assert_eq!(body["data"]["status"], "unpaid");
    assert_eq!(body["data"]["provider_ref"], "link_1");
    assert_eq!(
        body["data"]["checkout_url"],
        "https://pay.example/link_1"
    );
}

#[tokio::test]
async fn rejects_link_amount_above_balance() {
    let gateway = MockServer::start().await;
    let app = TestApp::with_gateway(&gateway.uri()).await;
    let invoice_id = create_invoice(&app, "500.00").await;

    let response = app
        .request_as_staff(
            Method::POST,
            &format!("/api/v1/invoices/{}/payment-links", invoice_id),
            Some(json!({ "amount": "600.00" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn poll_confirms_payment_and_settles_invoice() {
    let gateway = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/links"))
        .respond_with(ResponseTemplate::new(200).set_body_json(link_envelope(
            "link_2", "unpaid", None,
        )))
        .mount(&gateway)
        .await;
    // First poll finds the link still unpaid
    Mock::given(method("GET"))
        .and(path("/links/link_2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(link_envelope(
            "link_2", "unpaid", None,
        )))
        .up_to_n_times(1)
        .mount(&gateway)
        .await;

    let app = TestApp::with_gateway(&gateway.uri()).await;
    let invoice_id = create_invoice(&app, "2500.00").await;
    let body = create_link(&app, &invoice_id, json!({})).await;
    let link_id = body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .request_as_staff(
            Method::POST,
            &format!("/api/v1/payment-links/{}/poll", link_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["status"], "unpaid");

    // Patient pays; later polls see a paid link
    let paid_at = chrono::Utc::now().timestamp() + 5;
    Mock::given(method("GET"))
        .and(path("/links/link_2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(link_envelope(
            "link_2",
            "paid",
            Some(paid_at),
        )))
        .mount(&gateway)
        .await;

    let response = app
        .request_as_staff(
            Method::POST,
            &format!("/api/v1/payment-links/{}/poll", link_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["status"], "paid");
    assert!(body["data"]["payment_id"].is_string());

    let response = app
        .request(Method::GET, &format!("/api/v1/invoices/{}", invoice_id), None)
        .await;
    let body = read_json(response).await;
    assert_eq!(body["data"]["status"], "paid");
    let payments = body["data"]["payments"].as_array().unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0]["method"], "gateway");
    assert_eq!(payments[0]["reference"], "link_2");

    // Polling a confirmed link records nothing further
    let response = app
        .request_as_staff(
            Method::POST,
            &format!("/api/v1/payment-links/{}/poll", link_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(Method::GET, &format!("/api/v1/invoices/{}", invoice_id), None)
        .await;
    let body = read_json(response).await;
    assert_eq!(body["data"]["payments"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn stale_gateway_confirmation_is_ignored() {
    let gateway = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/links"))
        .respond_with(ResponseTemplate::new(200).set_body_json(link_envelope(
            "link_3", "unpaid", None,
        )))
        .mount(&gateway)
        .await;
    // Paid long before this link was requested
    Mock::given(method("GET"))
        .and(path("/links/link_3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(link_envelope(
            "link_3",
            "paid",
            Some(946_684_800),
        )))
        .mount(&gateway)
        .await;

    let app = TestApp::with_gateway(&gateway.uri()).await;
    let invoice_id = create_invoice(&app, "1000.00").await;
    let body = create_link(&app, &invoice_id, json!({})).await;
    let link_id = body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .request_as_staff(
            Method::POST,
            &format!("/api/v1/payment-links/{}/poll", link_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["status"], "unpaid");

    let response = app
        .request(Method::GET, &format!("/api/v1/invoices/{}", invoice_id), None)
        .await;
    let body = read_json(response).await;
    assert_eq!(body["data"]["status"], "open");
    assert!(body["data"]["payments"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn gateway_outage_maps_to_bad_gateway() {
    let gateway = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/links"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&gateway)
        .await;

    let app = TestApp::with_gateway(&gateway.uri()).await;
    let invoice_id = create_invoice(&app, "750.00").await;

    let response = app
        .request_as_staff(
            Method::POST,
            &format!("/api/v1/invoices/{}/payment-links", invoice_id),
            Some(json!({})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
