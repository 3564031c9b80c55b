use super::common::{
    created_response, map_service_error, paginated_response, success_response, validate_input,
    PaginationParams,
};
use crate::{
    auth::UserContext,
    errors::ApiError,
    handlers::AppState,
    services::items::{ItemFilter, ItemInput},
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_item))
        .route("/", get(list_items))
        .route("/:id", get(get_item))
        .route("/:id", put(update_item))
        .route("/:id", delete(deactivate_item))
}

#[derive(Debug, Serialize)]
struct ItemDetail {
    #[serde(flatten)]
    item: crate::entities::items::Model,
    batches: Vec<crate::entities::stock_batches::Model>,
}

async fn create_item(
    State(state): State<AppState>,
    _user: UserContext,
    Json(payload): Json<ItemInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let item = state
        .services
        .items
        .create_item(payload)
        .await
        .map_err(map_service_error)?;
    info!("Item created: {} ({})", item.id, item.sku);
    Ok(created_response(item))
}

async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (item, batches) = state
        .services
        .items
        .get_item_with_batches(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(ItemDetail { item, batches }))
}

async fn list_items(
    State(state): State<AppState>,
    Query(filter): Query<ItemFilter>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.normalized();
    let (rows, total) = state
        .services
        .items
        .list_items(filter, page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(paginated_response(rows, page, per_page, total))
}

async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: UserContext,
    Json(payload): Json<ItemInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let item = state
        .services
        .items
        .update_item(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(item))
}

async fn deactivate_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: UserContext,
) -> Result<impl IntoResponse, ApiError> {
    user.require_admin()?;
    let item = state
        .services
        .items
        .deactivate_item(id)
        .await
        .map_err(map_service_error)?;
    info!("Item deactivated: {}", id);
    Ok(success_response(item))
}
