use super::common::{
    created_response, map_service_error, no_content_response, paginated_response,
    success_response, validate_input, PaginationParams,
};
use crate::{
    auth::UserContext, errors::ApiError, handlers::AppState, services::categories::CategoryInput,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use tracing::info;
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_category))
        .route("/", get(list_categories))
        .route("/:id", get(get_category))
        .route("/:id", put(update_category))
        .route("/:id", delete(delete_category))
}

async fn create_category(
    State(state): State<AppState>,
    _user: UserContext,
    Json(payload): Json<CategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let category = state
        .services
        .categories
        .create_category(payload)
        .await
        .map_err(map_service_error)?;
    info!("Category created: {}", category.id);
    Ok(created_response(category))
}

async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state
        .services
        .categories
        .get_category(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(category))
}

async fn list_categories(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.normalized();
    let (rows, total) = state
        .services
        .categories
        .list_categories(page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(paginated_response(rows, page, per_page, total))
}

async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: UserContext,
    Json(payload): Json<CategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let category = state
        .services
        .categories
        .update_category(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(category))
}

async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: UserContext,
) -> Result<impl IntoResponse, ApiError> {
    user.require_admin()?;
    state
        .services
        .categories
        .delete_category(id)
        .await
        .map_err(map_service_error)?;
    info!("Category deleted: {}", id);
    Ok(no_content_response())
}
