pub mod activity_log;
pub mod adjustments;
pub mod categories;
pub mod installments;
pub mod invoice_totals;
pub mod invoices;
pub mod items;
pub mod payment_links;
pub mod payments;
pub mod paymongo;
pub mod purchase_orders;
pub mod receiving;
pub mod reports;
pub mod stock_adjustments;
pub mod stock_out;
pub mod suppliers;
