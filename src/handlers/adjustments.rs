use super::common::{
    created_response, map_service_error, paginated_response, validate_input, PaginationParams,
};
use crate::{
    auth::UserContext, errors::ApiError, handlers::AppState,
    services::adjustments::ApplyAdjustmentInput,
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
        .route("/:id/adjustments", post(apply_adjustment))
        .route("/:id/adjustments", get(list_invoice_adjustments))
}

/// Routes nested under `/adjustments`: the global adjustment log.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_adjustments))
}

#[derive(Debug, Deserialize)]
struct AdjustmentListQuery {
    invoice_id: Option<Uuid>,
}

/// Discounts, write-offs, and refunds are admin-only.
async fn apply_adjustment(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    user: UserContext,
    Json(payload): Json<ApplyAdjustmentInput>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_admin()?;
    validate_input(&payload)?;
    let adjustment = state
        .services
        .adjustments
        .apply_adjustment(invoice_id, payload, (&user).into())
        .await
        .map_err(map_service_error)?;
    info!(
        "Adjustment applied: {} {} on invoice {}",
        adjustment.kind, adjustment.amount, invoice_id
    );
    Ok(created_response(adjustment))
}

async fn list_invoice_adjustments(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.normalized();
    let (rows, total) = state
        .services
        .adjustments
        .list_adjustments(Some(invoice_id), page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(paginated_response(rows, page, per_page, total))
}

async fn list_adjustments(
    State(state): State<AppState>,
    Query(query): Query<AdjustmentListQuery>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.normalized();
    let (rows, total) = state
        .services
        .adjustments
        .list_adjustments(query.invoice_id, page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(paginated_response(rows, page, per_page, total))
}
