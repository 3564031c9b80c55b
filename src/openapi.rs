use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Clinic Admin API",
        version = "0.3.0",
        description = r#"
# Dental Clinic Administration API

Billing and inventory backend for the clinic's administrative dashboards.

## Authentication

Requests are authenticated at the clinic's API gateway, which forwards the
caller's identity in `x-user-id`, `x-user-name`, and `x-user-role` headers.
Mutating endpoints reject requests without an identity; destructive ones
(deletes, voids, adjustments) require the `admin` role.

## Responses

Every endpoint answers with the standard envelope:

```json
{
  "success": true,
  "data": { },
  "pagination": { "page": 1, "per_page": 20, "total": 42, "total_pages": 3 },
  "message": "optional human-readable note"
}
```

## Pagination

List endpoints accept `page` (default 1) and `per_page` (default 20, max 100).
        "#
    ),
    servers(
        (url = "http://localhost:8080/api/v1", description = "Local development")
    ),
    tags(
        (name = "Categories", description = "Item category management"),
        (name = "Suppliers", description = "Supplier management"),
        (name = "Items", description = "Inventory item management"),
        (name = "Purchase Orders", description = "Procurement"),
        (name = "Stock", description = "Deliveries, stock-outs, and corrections"),
        (name = "Invoices", description = "Patient billing"),
        (name = "Payments", description = "Payments and payment links"),
        (name = "Reports", description = "Billing and inventory reports"),
        (name = "Activity", description = "Audit trail")
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::services::categories::CategoryInput,
        crate::services::suppliers::SupplierInput,
        crate::services::items::ItemInput,
        crate::services::purchase_orders::CreatePurchaseOrderInput,
        crate::services::purchase_orders::PurchaseOrderLineInput,
        crate::services::purchase_orders::PurchaseOrderStatus,
        crate::services::receiving::ReceiveDeliveryInput,
        crate::services::receiving::ReceiveLineInput,
        crate::services::stock_out::StockOutInput,
        crate::services::stock_out::StockOutLineInput,
        crate::services::stock_out::StockOutReason,
        crate::services::stock_adjustments::StockAdjustmentInput,
        crate::services::invoices::CreateInvoiceInput,
        crate::services::invoices::ChargeInput,
        crate::services::invoice_totals::InvoiceTotals,
        crate::services::invoice_totals::InvoiceStatus,
        crate::services::invoice_totals::AdjustmentKind,
        crate::services::invoice_totals::PaymentMethod,
        crate::services::payments::RecordPaymentInput,
        crate::services::installments::CreateInstallmentPlanInput,
        crate::services::installments::InstallmentPartInput,
        crate::services::installments::InstallmentStatus,
        crate::services::adjustments::ApplyAdjustmentInput,
        crate::services::payment_links::CreatePaymentLinkInput,
        crate::services::payment_links::PaymentLinkStatus,
        crate::services::reports::MonthlyRevenueRow,
        crate::services::reports::TopTreatmentRow,
        crate::services::reports::OutstandingInvoiceRow,
        crate::services::reports::LowStockRow,
        crate::services::reports::ExpiringBatchRow,
    ))
)]
pub struct ApiDoc;

/// Swagger UI router serving the generated document at `/api-docs`.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
