use super::common::{
    created_response, map_service_error, paginated_response, success_response, validate_input,
    PaginationParams,
};
use crate::{
    auth::UserContext,
    errors::ApiError,
    handlers::AppState,
    services::purchase_orders::{
        CreatePurchaseOrderInput, PurchaseOrderFilter, PurchaseOrderStatus,
    },
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_purchase_order))
        .route("/", get(list_purchase_orders))
        .route("/:id", get(get_purchase_order))
        .route("/:id/cancel", post(cancel_purchase_order))
}

#[derive(Debug, Deserialize)]
struct PurchaseOrderListQuery {
    status: Option<PurchaseOrderStatus>,
    supplier_id: Option<Uuid>,
    /// Inclusive order-date range
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct PurchaseOrderDetail {
    #[serde(flatten)]
    purchase_order: crate::entities::purchase_orders::Model,
    lines: Vec<crate::entities::purchase_order_lines::Model>,
}

async fn create_purchase_order(
    State(state): State<AppState>,
    user: UserContext,
    Json(payload): Json<CreatePurchaseOrderInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let po = state
        .services
        .purchase_orders
        .create_purchase_order(payload, (&user).into())
        .await
        .map_err(map_service_error)?;
    info!("Purchase order created: {}", po.po_number);
    Ok(created_response(po))
}

async fn get_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (purchase_order, lines) = state
        .services
        .purchase_orders
        .get_purchase_order(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PurchaseOrderDetail {
        purchase_order,
        lines,
    }))
}

async fn list_purchase_orders(
    State(state): State<AppState>,
    Query(query): Query<PurchaseOrderListQuery>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.normalized();
    let filter = PurchaseOrderFilter {
        status: query.status,
        supplier_id: query.supplier_id,
        ordered_from: query.from,
        ordered_to: query.to,
    };
    let (rows, total) = state
        .services
        .purchase_orders
        .list_purchase_orders(filter, page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(paginated_response(rows, page, per_page, total))
}

async fn cancel_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: UserContext,
) -> Result<impl IntoResponse, ApiError> {
    let po = state
        .services
        .purchase_orders
        .cancel_purchase_order(id, (&user).into())
        .await
        .map_err(map_service_error)?;
    info!("Purchase order cancelled: {}", po.po_number);
    Ok(success_response(po))
}
