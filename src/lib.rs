//! Clinic Admin API Library
//!
//! Billing and inventory backend for the dental clinic's administrative
//! dashboards.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

impl AppState {
    /// Wires every service against the shared connection and event channel.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        use services::*;

        let gateway = paymongo::PaymentGatewayClient::new(
            config.payment_gateway_url.clone(),
            config.payment_gateway_secret.clone(),
        );

        let services = handlers::AppServices {
            categories: Arc::new(categories::CategoryService::new(db.clone())),
            suppliers: Arc::new(suppliers::SupplierService::new(db.clone())),
            items: Arc::new(items::ItemService::new(db.clone())),
            purchase_orders: Arc::new(purchase_orders::PurchaseOrderService::new(
                db.clone(),
                event_sender.clone(),
            )),
            receiving: Arc::new(receiving::ReceivingService::new(
                db.clone(),
                event_sender.clone(),
            )),
            stock_out: Arc::new(stock_out::StockOutService::new(
                db.clone(),
                event_sender.clone(),
            )),
            stock_adjustments: Arc::new(stock_adjustments::StockAdjustmentService::new(
                db.clone(),
                event_sender.clone(),
            )),
            invoices: Arc::new(invoices::InvoiceService::new(
                db.clone(),
                event_sender.clone(),
            )),
            payments: Arc::new(payments::PaymentService::new(
                db.clone(),
                event_sender.clone(),
            )),
            installments: Arc::new(installments::InstallmentService::new(
                db.clone(),
                event_sender.clone(),
            )),
            adjustments: Arc::new(adjustments::AdjustmentService::new(
                db.clone(),
                event_sender.clone(),
            )),
            payment_links: Arc::new(payment_links::PaymentLinkService::new(
                db.clone(),
                gateway,
                event_sender.clone(),
            )),
            reports: Arc::new(reports::ReportService::new(
                db.clone(),
                config.expiry_window_days,
            )),
            activity: Arc::new(activity_log::ActivityLogService::new(db.clone())),
        };

        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}

/// All versioned API routes.
pub fn api_v1_routes() -> Router<AppState> {
    let invoices = handlers::invoices::routes()
        .merge(handlers::payments::invoice_routes())
        .merge(handlers::adjustments::invoice_routes())
        .merge(handlers::installments::invoice_routes())
        .merge(handlers::payment_links::invoice_routes());

    Router::new()
        .nest("/categories", handlers::categories::routes())
        .nest("/suppliers", handlers::suppliers::routes())
        .nest("/items", handlers::items::routes())
        .nest("/purchase-orders", handlers::purchase_orders::routes())
        .nest("/stock", handlers::stock::routes())
        .nest("/invoices", invoices)
        .nest("/payments", handlers::payments::routes())
        .nest("/payment-links", handlers::payment_links::routes())
        .nest("/installments", handlers::installments::routes())
        .nest("/adjustments", handlers::adjustments::routes())
        .nest("/reports", handlers::reports::routes())
        .nest("/activity", handlers::activity::routes())
}

/// Health and status routes mounted at the root.
pub fn status_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(api_status))
}

/// Liveness plus a database ping.
async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let database = match db::check_connection(&state.db).await {
        Ok(()) => "up",
        Err(_) => "down",
    };
    Json(json!({
        "status": if database == "up" { "healthy" } else { "degraded" },
        "database": database,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn api_status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
