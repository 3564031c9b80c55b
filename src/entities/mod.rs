pub mod activity_logs;
pub mod adjustments;
pub mod categories;
pub mod installments;
pub mod invoices;
pub mod items;
pub mod payment_links;
pub mod payments;
pub mod purchase_order_lines;
pub mod purchase_orders;
pub mod stock_adjustments;
pub mod stock_batches;
pub mod stock_in_headers;
pub mod stock_in_lines;
pub mod stock_out_headers;
pub mod stock_out_lines;
pub mod suppliers;
pub mod treatment_charges;
