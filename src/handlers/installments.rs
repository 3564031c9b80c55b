use super::common::{
    created_response, map_service_error, paginated_response, success_response, validate_input,
    PaginationParams,
};
use crate::{
    auth::UserContext, errors::ApiError, handlers::AppState,
    services::installments::CreateInstallmentPlanInput,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

/// Routes nested under `/invoices`.
pub fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/:id/installments", post(create_plan))
        .route("/:id/installments", get(list_plan))
}

/// Routes nested under `/installments`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/overdue", get(list_overdue))
}

#[derive(Debug, Deserialize)]
struct OverdueQuery {
    /// Defaults to today
    as_of: Option<NaiveDate>,
}

async fn create_plan(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    user: UserContext,
    Json(payload): Json<CreateInstallmentPlanInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let plan = state
        .services
        .installments
        .create_plan(invoice_id, payload, (&user).into())
        .await
        .map_err(map_service_error)?;
    info!(
        "Installment plan created: {} part(s) on invoice {}",
        plan.len(),
        invoice_id
    );
    Ok(created_response(plan))
}

async fn list_plan(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = state
        .services
        .installments
        .list_for_invoice(invoice_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(plan))
}

async fn list_overdue(
    State(state): State<AppState>,
    Query(query): Query<OverdueQuery>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let as_of = query.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let (page, per_page) = pagination.normalized();
    let (rows, total) = state
        .services
        .installments
        .list_overdue(as_of, page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(paginated_response(rows, page, per_page, total))
}
