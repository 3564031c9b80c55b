//! Stock movements: deliveries in, usage/disposal out, and manual corrections.

use super::common::{
    created_response, map_service_error, paginated_response, success_response, validate_input,
    PaginationParams,
};
use crate::{
    auth::UserContext,
    errors::ApiError,
    handlers::AppState,
    services::{
        receiving::ReceiveDeliveryInput,
        stock_adjustments::StockAdjustmentInput,
        stock_out::{StockOutInput, StockOutReason},
    },
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/in", post(receive_delivery))
        .route("/in", get(list_deliveries))
        .route("/in/:id", get(get_delivery))
        .route("/out", post(record_stock_out))
        .route("/out", get(list_stock_outs))
        .route("/out/:id", get(get_stock_out))
        .route("/adjustments", post(adjust_stock))
        .route("/adjustments", get(list_stock_adjustments))
}

#[derive(Debug, Serialize)]
struct DeliveryDetail {
    #[serde(flatten)]
    delivery: crate::entities::stock_in_headers::Model,
    lines: Vec<crate::entities::stock_in_lines::Model>,
}

#[derive(Debug, Serialize)]
struct StockOutDetail {
    #[serde(flatten)]
    stock_out: crate::entities::stock_out_headers::Model,
    lines: Vec<crate::entities::stock_out_lines::Model>,
}

#[derive(Debug, Deserialize)]
struct DeliveryListQuery {
    supplier_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct StockOutListQuery {
    reason: Option<StockOutReason>,
}

#[derive(Debug, Deserialize)]
struct StockAdjustmentListQuery {
    item_id: Option<Uuid>,
}

async fn receive_delivery(
    State(state): State<AppState>,
    user: UserContext,
    Json(payload): Json<ReceiveDeliveryInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let delivery = state
        .services
        .receiving
        .receive_delivery(payload, (&user).into())
        .await
        .map_err(map_service_error)?;
    info!("Delivery received: {}", delivery.id);
    Ok(created_response(delivery))
}

async fn get_delivery(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (delivery, lines) = state
        .services
        .receiving
        .get_delivery(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(DeliveryDetail { delivery, lines }))
}

async fn list_deliveries(
    State(state): State<AppState>,
    Query(query): Query<DeliveryListQuery>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.normalized();
    let (rows, total) = state
        .services
        .receiving
        .list_deliveries(query.supplier_id, page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(paginated_response(rows, page, per_page, total))
}

async fn record_stock_out(
    State(state): State<AppState>,
    user: UserContext,
    Json(payload): Json<StockOutInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let stock_out = state
        .services
        .stock_out
        .record_stock_out(payload, (&user).into())
        .await
        .map_err(map_service_error)?;
    info!("Stock-out recorded: {}", stock_out.id);
    Ok(created_response(stock_out))
}

async fn get_stock_out(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (stock_out, lines) = state
        .services
        .stock_out
        .get_stock_out(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(StockOutDetail { stock_out, lines }))
}

async fn list_stock_outs(
    State(state): State<AppState>,
    Query(query): Query<StockOutListQuery>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.normalized();
    let (rows, total) = state
        .services
        .stock_out
        .list_stock_outs(query.reason, page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(paginated_response(rows, page, per_page, total))
}

async fn adjust_stock(
    State(state): State<AppState>,
    user: UserContext,
    Json(payload): Json<StockAdjustmentInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let adjustment = state
        .services
        .stock_adjustments
        .adjust_stock(payload, (&user).into())
        .await
        .map_err(map_service_error)?;
    info!("Stock adjusted: item {}", adjustment.item_id);
    Ok(created_response(adjustment))
}

async fn list_stock_adjustments(
    State(state): State<AppState>,
    Query(query): Query<StockAdjustmentListQuery>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.normalized();
    let (rows, total) = state
        .services
        .stock_adjustments
        .list_adjustments(query.item_id, page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(paginated_response(rows, page, per_page, total))
}
