use super::common::{
    created_response, map_service_error, paginated_response, success_response, validate_input,
    PaginationParams,
};
use crate::{
    auth::UserContext,
    errors::ApiError,
    handlers::AppState,
    services::{
        invoice_totals::InvoiceStatus,
        invoices::{ChargeInput, CreateInvoiceInput, InvoiceFilter},
    },
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_invoice))
        .route("/", get(list_invoices))
        .route("/:id", get(get_invoice))
        .route("/:id/charges", post(add_charge))
        .route("/:id/void", post(void_invoice))
}

#[derive(Debug, Deserialize)]
struct InvoiceListQuery {
    patient_id: Option<Uuid>,
    status: Option<InvoiceStatus>,
    /// Inclusive issue-date range
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

async fn create_invoice(
    State(state): State<AppState>,
    user: UserContext,
    Json(payload): Json<CreateInvoiceInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let invoice = state
        .services
        .invoices
        .create_invoice(payload, (&user).into())
        .await
        .map_err(map_service_error)?;
    info!("Invoice created: {}", invoice.invoice_number);
    Ok(created_response(invoice))
}

/// Invoice detail: header, charges, payments, adjustments, installments, and
/// the derived totals.
async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state
        .services
        .invoices
        .get_invoice_detail(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(detail))
}

async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<InvoiceListQuery>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.normalized();
    let filter = InvoiceFilter {
        patient_id: query.patient_id,
        status: query.status,
        issued_from: query.from,
        issued_to: query.to,
    };
    let (rows, total) = state
        .services
        .invoices
        .list_invoices(filter, page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(paginated_response(rows, page, per_page, total))
}

async fn add_charge(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: UserContext,
    Json(payload): Json<ChargeInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let charge = state
        .services
        .invoices
        .add_charge(id, payload, (&user).into())
        .await
        .map_err(map_service_error)?;
    Ok(created_response(charge))
}

async fn void_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: UserContext,
) -> Result<impl IntoResponse, ApiError> {
    user.require_admin()?;
    let invoice = state
        .services
        .invoices
        .void_invoice(id, (&user).into())
        .await
        .map_err(map_service_error)?;
    info!("Invoice voided: {}", invoice.invoice_number);
    Ok(success_response(invoice))
}
