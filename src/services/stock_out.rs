use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{items, stock_batches, stock_out_headers, stock_out_lines},
    errors::ServiceError,
    events::{Actor, Event, EventSender},
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StockOutReason {
    Usage,
    Expired,
    Damaged,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct StockOutLineInput {
    pub item_id: Uuid,
    pub batch_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct StockOutInput {
    pub reason: StockOutReason,
    #[validate(length(max = 100))]
    pub reference: Option<String>,
    #[validate(length(min = 1))]
    pub lines: Vec<StockOutLineInput>,
}

/// Service for consuming or disposing stock
#[derive(Clone)]
pub struct StockOutService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl StockOutService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Records a stock-out. Every line is checked against its batch inside the
    /// transaction; any shortfall rolls the whole request back.
    #[instrument(skip(self, input))]
    pub async fn record_stock_out(
        &self,
        input: StockOutInput,
        actor: Actor,
    ) -> Result<stock_out_headers::Model, ServiceError> {
        for line in &input.lines {
            if line.quantity < 1 {
                return Err(ServiceError::InvalidInput(
                    "line quantity must be at least 1".into(),
                ));
            }
        }

        let now = Utc::now();
        let stock_out_id = Uuid::new_v4();
        let reason = input.reason.to_string();
        let line_count = input.lines.len();

        let txn = self.db.begin().await?;

        let header = stock_out_headers::ActiveModel {
            id: Set(stock_out_id),
            reason: Set(reason.clone()),
            reference: Set(input.reference),
            recorded_by: Set(Some(actor.user_id)),
            recorded_at: Set(now),
            created_at: Set(now),
        };
        let header = header.insert(&txn).await?;

        for line in &input.lines {
            deduct_from_batch(&txn, line, now).await?;

            let row = stock_out_lines::ActiveModel {
                id: Set(Uuid::new_v4()),
                stock_out_id: Set(stock_out_id),
                item_id: Set(line.item_id),
                batch_id: Set(line.batch_id),
                quantity: Set(line.quantity),
            };
            row.insert(&txn).await?;
        }

        txn.commit().await?;

        self.event_sender
            .send(Event::StockOutRecorded {
                stock_out_id,
                reason,
                line_count,
                actor,
            })
            .await;

        Ok(header)
    }

    #[instrument(skip(self))]
    pub async fn get_stock_out(
        &self,
        id: Uuid,
    ) -> Result<(stock_out_headers::Model, Vec<stock_out_lines::Model>), ServiceError> {
        let header = stock_out_headers::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock-out {} not found", id)))?;
        let lines = stock_out_lines::Entity::find()
            .filter(stock_out_lines::Column::StockOutId.eq(id))
            .all(&*self.db)
            .await?;
        Ok((header, lines))
    }

    #[instrument(skip(self))]
    pub async fn list_stock_outs(
        &self,
        reason: Option<StockOutReason>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<stock_out_headers::Model>, u64), ServiceError> {
        let mut query = stock_out_headers::Entity::find();
        if let Some(reason) = reason {
            query = query.filter(stock_out_headers::Column::Reason.eq(reason.to_string()));
        }
        let paginator = query
            .order_by_desc(stock_out_headers::Column::RecordedAt)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }
}

/// Checks availability and decrements both the batch and the item counter.
async fn deduct_from_batch(
    txn: &DatabaseTransaction,
    line: &StockOutLineInput,
    now: chrono::DateTime<Utc>,
) -> Result<(), ServiceError> {
    let batch = stock_batches::Entity::find_by_id(line.batch_id)
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Batch {} not found", line.batch_id)))?;

    if batch.item_id != line.item_id {
        return Err(ServiceError::InvalidInput(format!(
            "Batch {} does not belong to item {}",
            line.batch_id, line.item_id
        )));
    }
    if batch.quantity < line.quantity {
        return Err(ServiceError::InsufficientStock(format!(
            "Batch {} holds {} unit(s), requested {}",
            batch.batch_no, batch.quantity, line.quantity
        )));
    }

    let new_batch_quantity = batch.quantity - line.quantity;
    let mut model: stock_batches::ActiveModel = batch.into();
    model.quantity = Set(new_batch_quantity);
    model.updated_at = Set(now);
    model.update(txn).await?;

    let item = items::Entity::find_by_id(line.item_id)
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", line.item_id)))?;
    let new_on_hand = item.quantity_on_hand - line.quantity;
    let mut model: items::ActiveModel = item.into();
    model.quantity_on_hand = Set(new_on_hand);
    model.updated_at = Set(now);
    model.update(txn).await?;

    Ok(())
}
