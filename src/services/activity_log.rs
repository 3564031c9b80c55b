use std::sync::Arc;

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{entities::activity_logs, errors::ServiceError};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityFilter {
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub action: Option<String>,
}

/// Read side of the activity feed; writes happen in the event processor.
#[derive(Clone)]
pub struct ActivityLogService {
    db: Arc<DatabaseConnection>,
}

impl ActivityLogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list_activity(
        &self,
        filter: ActivityFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<activity_logs::Model>, u64), ServiceError> {
        let mut query = activity_logs::Entity::find();
        if let Some(entity_type) = filter.entity_type {
            query = query.filter(activity_logs::Column::EntityType.eq(entity_type));
        }
        if let Some(entity_id) = filter.entity_id {
            query = query.filter(activity_logs::Column::EntityId.eq(entity_id));
        }
        if let Some(actor_id) = filter.actor_id {
            query = query.filter(activity_logs::Column::ActorId.eq(actor_id));
        }
        if let Some(action) = filter.action {
            query = query.filter(activity_logs::Column::Action.eq(action));
        }
        let paginator = query
            .order_by_desc(activity_logs::Column::CreatedAt)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }
}
