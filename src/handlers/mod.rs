pub mod activity;
pub mod adjustments;
pub mod categories;
pub mod common;
pub mod installments;
pub mod invoices;
pub mod items;
pub mod payment_links;
pub mod payments;
pub mod purchase_orders;
pub mod reports;
pub mod stock;
pub mod suppliers;

pub use crate::AppState;

use std::sync::Arc;

use crate::services::{
    activity_log::ActivityLogService, adjustments::AdjustmentService, categories::CategoryService,
    installments::InstallmentService, invoices::InvoiceService, items::ItemService,
    payment_links::PaymentLinkService, payments::PaymentService,
    purchase_orders::PurchaseOrderService, receiving::ReceivingService, reports::ReportService,
    stock_adjustments::StockAdjustmentService, stock_out::StockOutService,
    suppliers::SupplierService,
};

/// Container with every domain service, shared through [`AppState`].
#[derive(Clone)]
pub struct AppServices {
    pub categories: Arc<CategoryService>,
    pub suppliers: Arc<SupplierService>,
    pub items: Arc<ItemService>,
    pub purchase_orders: Arc<PurchaseOrderService>,
    pub receiving: Arc<ReceivingService>,
    pub stock_out: Arc<StockOutService>,
    pub stock_adjustments: Arc<StockAdjustmentService>,
    pub invoices: Arc<InvoiceService>,
    pub payments: Arc<PaymentService>,
    pub installments: Arc<InstallmentService>,
    pub adjustments: Arc<AdjustmentService>,
    pub payment_links: Arc<PaymentLinkService>,
    pub reports: Arc<ReportService>,
    pub activity: Arc<ActivityLogService>,
}
