use super::common::{
    created_response, map_service_error, paginated_response, success_response, validate_input,
    PaginationParams,
};
use crate::{
    auth::UserContext, errors::ApiError, handlers::AppState, services::suppliers::SupplierInput,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_supplier))
        .route("/", get(list_suppliers))
        .route("/:id", get(get_supplier))
        .route("/:id", put(update_supplier))
        .route("/:id", delete(deactivate_supplier))
}

#[derive(Debug, Deserialize)]
struct SupplierListQuery {
    search: Option<String>,
    #[serde(default)]
    include_inactive: bool,
}

async fn create_supplier(
    State(state): State<AppState>,
    _user: UserContext,
    Json(payload): Json<SupplierInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let supplier = state
        .services
        .suppliers
        .create_supplier(payload)
        .await
        .map_err(map_service_error)?;
    info!("Supplier created: {}", supplier.id);
    Ok(created_response(supplier))
}

async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let supplier = state
        .services
        .suppliers
        .get_supplier(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(supplier))
}

async fn list_suppliers(
    State(state): State<AppState>,
    Query(query): Query<SupplierListQuery>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.normalized();
    let (rows, total) = state
        .services
        .suppliers
        .list_suppliers(query.search, query.include_inactive, page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(paginated_response(rows, page, per_page, total))
}

async fn update_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: UserContext,
    Json(payload): Json<SupplierInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let supplier = state
        .services
        .suppliers
        .update_supplier(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(supplier))
}

async fn deactivate_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: UserContext,
) -> Result<impl IntoResponse, ApiError> {
    user.require_admin()?;
    let supplier = state
        .services
        .suppliers
        .deactivate_supplier(id)
        .await
        .map_err(map_service_error)?;
    info!("Supplier deactivated: {}", id);
    Ok(success_response(supplier))
}
