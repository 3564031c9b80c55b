use super::common::{map_service_error, success_response};
use crate::{errors::ApiError, handlers::AppState};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::Deserialize;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/revenue/monthly", get(monthly_revenue))
        .route("/treatments/top", get(top_treatments))
        .route("/invoices/outstanding", get(outstanding_invoices))
        .route("/stock/low", get(low_stock))
        .route("/stock/expiring", get(expiring_batches))
}

#[derive(Debug, Deserialize)]
struct MonthlyRevenueQuery {
    /// Defaults to the current year
    year: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ExpiringQuery {
    /// Defaults to the configured expiry window
    within_days: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TopTreatmentsQuery {
    /// Defaults to the last 30 days
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    limit: Option<usize>,
}

async fn monthly_revenue(
    State(state): State<AppState>,
    Query(query): Query<MonthlyRevenueQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let rows = state
        .services
        .reports
        .monthly_revenue(year)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(rows))
}

async fn top_treatments(
    State(state): State<AppState>,
    Query(query): Query<TopTreatmentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let to = query.to.unwrap_or_else(|| Utc::now().date_naive());
    let from = query.from.unwrap_or_else(|| to - Duration::days(30));
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let rows = state
        .services
        .reports
        .top_treatments(from, to, limit)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(rows))
}

async fn outstanding_invoices(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state
        .services
        .reports
        .outstanding_invoices()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(rows))
}

async fn low_stock(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = state
        .services
        .reports
        .low_stock()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(rows))
}

async fn expiring_batches(
    State(state): State<AppState>,
    Query(query): Query<ExpiringQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state
        .services
        .reports
        .expiring_batches(query.within_days)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(rows))
}
