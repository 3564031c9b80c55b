use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{items, stock_adjustments, stock_batches},
    errors::ServiceError,
    events::{Actor, Event, EventSender},
};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct StockAdjustmentInput {
    pub item_id: Uuid,
    /// Batch to correct; omit for item-level corrections
    pub batch_id: Option<Uuid>,
    /// Signed correction, e.g. -3 after a recount
    pub quantity_delta: i32,
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

/// Service for manual stock corrections
#[derive(Clone)]
pub struct StockAdjustmentService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl StockAdjustmentService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Applies a signed quantity correction. The adjustment row and the
    /// counter updates commit together; a correction that would push a batch
    /// or item negative is rejected.
    #[instrument(skip(self, input))]
    pub async fn adjust_stock(
        &self,
        input: StockAdjustmentInput,
        actor: Actor,
    ) -> Result<stock_adjustments::Model, ServiceError> {
        if input.quantity_delta == 0 {
            return Err(ServiceError::InvalidInput(
                "quantity_delta cannot be zero".into(),
            ));
        }

        let now = Utc::now();
        let txn = self.db.begin().await?;

        let item = items::Entity::find_by_id(input.item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", input.item_id)))?;

        if let Some(batch_id) = input.batch_id {
            let batch = stock_batches::Entity::find_by_id(batch_id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("Batch {} not found", batch_id)))?;
            if batch.item_id != input.item_id {
                return Err(ServiceError::InvalidInput(format!(
                    "Batch {} does not belong to item {}",
                    batch_id, input.item_id
                )));
            }
            let new_quantity = batch.quantity + input.quantity_delta;
            if new_quantity < 0 {
                return Err(ServiceError::InsufficientStock(format!(
                    "Batch {} holds {} unit(s); correction of {} would go negative",
                    batch.batch_no, batch.quantity, input.quantity_delta
                )));
            }
            let mut model: stock_batches::ActiveModel = batch.into();
            model.quantity = Set(new_quantity);
            model.updated_at = Set(now);
            model.update(&txn).await?;
        }

        let new_on_hand = item.quantity_on_hand + input.quantity_delta;
        if new_on_hand < 0 {
            return Err(ServiceError::InsufficientStock(format!(
                "Item holds {} unit(s); correction of {} would go negative",
                item.quantity_on_hand, input.quantity_delta
            )));
        }
        let mut model: items::ActiveModel = item.into();
        model.quantity_on_hand = Set(new_on_hand);
        model.updated_at = Set(now);
        model.update(&txn).await?;

        let adjustment_id = Uuid::new_v4();
        let row = stock_adjustments::ActiveModel {
            id: Set(adjustment_id),
            item_id: Set(input.item_id),
            batch_id: Set(input.batch_id),
            quantity_delta: Set(input.quantity_delta),
            reason: Set(input.reason.clone()),
            adjusted_by: Set(Some(actor.user_id)),
            created_at: Set(now),
        };
        let row = row.insert(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send(Event::StockAdjusted {
                adjustment_id,
                item_id: row.item_id,
                quantity_delta: row.quantity_delta,
                reason: row.reason.clone(),
                actor,
            })
            .await;

        Ok(row)
    }

    #[instrument(skip(self))]
    pub async fn list_adjustments(
        &self,
        item_id: Option<Uuid>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<stock_adjustments::Model>, u64), ServiceError> {
        let mut query = stock_adjustments::Entity::find();
        if let Some(item_id) = item_id {
            query = query.filter(stock_adjustments::Column::ItemId.eq(item_id));
        }
        let paginator = query
            .order_by_desc(stock_adjustments::Column::CreatedAt)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }
}
