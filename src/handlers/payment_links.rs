use super::common::{
    created_response, map_service_error, success_response, validate_input,
};
use crate::{
    auth::UserContext, errors::ApiError, handlers::AppState,
    services::payment_links::CreatePaymentLinkInput,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tracing::info;
use uuid::Uuid;

/// Routes nested under `/invoices`.
pub fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/:id/payment-links", post(create_payment_link))
        .route("/:id/payment-links", get(list_payment_links))
}

/// Routes nested under `/payment-links`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/:id/poll", post(poll_payment_link))
}

async fn create_payment_link(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    user: UserContext,
    Json(payload): Json<CreatePaymentLinkInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let link = state
        .services
        .payment_links
        .create_payment_link(invoice_id, payload, (&user).into())
        .await
        .map_err(map_service_error)?;
    info!("Payment link created: {} for invoice {}", link.id, invoice_id);
    Ok(created_response(link))
}

async fn list_payment_links(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let links = state
        .services
        .payment_links
        .list_for_invoice(invoice_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(links))
}

/// Checks the gateway for payment. Safe to call repeatedly; a confirmed link
/// is returned unchanged.
async fn poll_payment_link(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: UserContext,
) -> Result<impl IntoResponse, ApiError> {
    let link = state
        .services
        .payment_links
        .poll_payment_link(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(link))
}
