use super::common::{
    created_response, map_service_error, paginated_response, validate_input, PaginationParams,
};
use crate::{
    auth::UserContext, errors::ApiError, handlers::AppState,
    services::payments::RecordPaymentInput,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

/// Routes nested under `/invoices`.
pub fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/:id/payments", post(record_payment))
        .route("/:id/payments", get(list_invoice_payments))
}

/// Routes nested under `/payments`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_payments))
}

#[derive(Debug, Deserialize)]
struct PaymentListQuery {
    invoice_id: Option<Uuid>,
}

async fn record_payment(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    user: UserContext,
    Json(payload): Json<RecordPaymentInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let payment = state
        .services
        .payments
        .record_payment(invoice_id, payload, (&user).into())
        .await
        .map_err(map_service_error)?;
    info!(
        "Payment recorded: {} against invoice {}",
        payment.id, invoice_id
    );
    Ok(created_response(payment))
}

async fn list_invoice_payments(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.normalized();
    let (rows, total) = state
        .services
        .payments
        .list_payments(Some(invoice_id), page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(paginated_response(rows, page, per_page, total))
}

async fn list_payments(
    State(state): State<AppState>,
    Query(query): Query<PaymentListQuery>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.normalized();
    let (rows, total) = state
        .services
        .payments
        .list_payments(query.invoice_id, page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(paginated_response(rows, page, per_page, total))
}
