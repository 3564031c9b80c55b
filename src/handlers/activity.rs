use super::common::{map_service_error, paginated_response, PaginationParams};
use crate::{
    errors::ApiError, handlers::AppState, services::activity_log::ActivityFilter,
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_activity))
}

async fn list_activity(
    State(state): State<AppState>,
    Query(filter): Query<ActivityFilter>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.normalized();
    let (rows, total) = state
        .services
        .activity
        .list_activity(filter, page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(paginated_response(rows, page, per_page, total))
}
