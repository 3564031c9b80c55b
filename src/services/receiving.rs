use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        items, purchase_order_lines, purchase_orders, stock_batches, stock_in_headers,
        stock_in_lines, suppliers,
    },
    errors::ServiceError,
    events::{Actor, Event, EventSender},
    services::purchase_orders::PurchaseOrderStatus,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReceiveLineInput {
    pub item_id: Uuid,
    #[validate(length(min = 1, max = 64))]
    pub batch_no: String,
    pub quantity: i32,
    pub unit_cost: Decimal,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReceiveDeliveryInput {
    pub supplier_id: Uuid,
    pub purchase_order_id: Option<Uuid>,
    #[validate(length(max = 100))]
    pub reference: Option<String>,
    #[validate(length(min = 1))]
    pub lines: Vec<ReceiveLineInput>,
}

/// Service for receiving supplier deliveries into stock
#[derive(Clone)]
pub struct ReceivingService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl ReceivingService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Records a delivery: header, lines, batch upserts, item quantities, and
    /// the linked purchase order all change in a single transaction.
    #[instrument(skip(self, input))]
    pub async fn receive_delivery(
        &self,
        input: ReceiveDeliveryInput,
        actor: Actor,
    ) -> Result<stock_in_headers::Model, ServiceError> {
        let supplier = suppliers::Entity::find_by_id(input.supplier_id)
            .one(&*self.db)
            .await?;
        if supplier.is_none() {
            return Err(ServiceError::InvalidInput(format!(
                "Supplier {} does not exist",
                input.supplier_id
            )));
        }

        for line in &input.lines {
            if line.quantity < 1 {
                return Err(ServiceError::InvalidInput(
                    "line quantity must be at least 1".into(),
                ));
            }
            if line.unit_cost < Decimal::ZERO {
                return Err(ServiceError::InvalidInput(
                    "unit_cost cannot be negative".into(),
                ));
            }
            let item = items::Entity::find_by_id(line.item_id).one(&*self.db).await?;
            if item.is_none() {
                return Err(ServiceError::InvalidInput(format!(
                    "Item {} does not exist",
                    line.item_id
                )));
            }
        }

        if let Some(po_id) = input.purchase_order_id {
            let po = purchase_orders::Entity::find_by_id(po_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::InvalidInput(format!("Purchase order {} does not exist", po_id))
                })?;
            if po.supplier_id != input.supplier_id {
                return Err(ServiceError::InvalidInput(
                    "Purchase order belongs to a different supplier".into(),
                ));
            }
            let status: PurchaseOrderStatus = po.status.parse().map_err(|_| {
                ServiceError::InternalError(format!("Bad PO status: {}", po.status))
            })?;
            if matches!(
                status,
                PurchaseOrderStatus::Received | PurchaseOrderStatus::Cancelled
            ) {
                return Err(ServiceError::InvalidOperation(format!(
                    "Cannot receive against a purchase order in status '{}'",
                    status
                )));
            }
        }

        let now = Utc::now();
        let stock_in_id = Uuid::new_v4();
        let supplier_id = input.supplier_id;
        let line_count = input.lines.len();

        let txn = self.db.begin().await?;

        let header = stock_in_headers::ActiveModel {
            id: Set(stock_in_id),
            supplier_id: Set(supplier_id),
            purchase_order_id: Set(input.purchase_order_id),
            reference: Set(input.reference),
            received_by: Set(Some(actor.user_id)),
            received_at: Set(now),
            created_at: Set(now),
        };
        let header = header.insert(&txn).await?;

        for line in &input.lines {
            let batch_id = upsert_batch(&txn, line, now).await?;

            let row = stock_in_lines::ActiveModel {
                id: Set(Uuid::new_v4()),
                stock_in_id: Set(stock_in_id),
                item_id: Set(line.item_id),
                batch_id: Set(batch_id),
                quantity: Set(line.quantity),
                unit_cost: Set(line.unit_cost),
            };
            row.insert(&txn).await?;

            increment_item_quantity(&txn, line.item_id, line.quantity).await?;
        }

        if let Some(po_id) = input.purchase_order_id {
            apply_delivery_to_purchase_order(&txn, po_id, &input.lines, now).await?;
        }

        txn.commit().await?;

        self.event_sender
            .send(Event::DeliveryReceived {
                stock_in_id,
                supplier_id,
                line_count,
                actor,
            })
            .await;

        Ok(header)
    }

    #[instrument(skip(self))]
    pub async fn get_delivery(
        &self,
        id: Uuid,
    ) -> Result<(stock_in_headers::Model, Vec<stock_in_lines::Model>), ServiceError> {
        let header = stock_in_headers::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Delivery {} not found", id)))?;
        let lines = stock_in_lines::Entity::find()
            .filter(stock_in_lines::Column::StockInId.eq(id))
            .all(&*self.db)
            .await?;
        Ok((header, lines))
    }

    #[instrument(skip(self))]
    pub async fn list_deliveries(
        &self,
        supplier_id: Option<Uuid>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<stock_in_headers::Model>, u64), ServiceError> {
        use sea_orm::PaginatorTrait;

        let mut query = stock_in_headers::Entity::find();
        if let Some(supplier_id) = supplier_id {
            query = query.filter(stock_in_headers::Column::SupplierId.eq(supplier_id));
        }
        let paginator = query
            .order_by_desc(stock_in_headers::Column::ReceivedAt)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }
}

/// Finds or creates the (item, batch_no) lot and adds the delivered quantity.
async fn upsert_batch(
    txn: &DatabaseTransaction,
    line: &ReceiveLineInput,
    now: chrono::DateTime<Utc>,
) -> Result<Uuid, ServiceError> {
    let existing = stock_batches::Entity::find()
        .filter(stock_batches::Column::ItemId.eq(line.item_id))
        .filter(stock_batches::Column::BatchNo.eq(line.batch_no.clone()))
        .one(txn)
        .await?;

    match existing {
        Some(batch) => {
            let batch_id = batch.id;
            let new_quantity = batch.quantity + line.quantity;
            let mut model: stock_batches::ActiveModel = batch.into();
            model.quantity = Set(new_quantity);
            model.unit_cost = Set(line.unit_cost);
            if line.expiry_date.is_some() {
                model.expiry_date = Set(line.expiry_date);
            }
            model.updated_at = Set(now);
            model.update(txn).await?;
            Ok(batch_id)
        }
        None => {
            let batch_id = Uuid::new_v4();
            let model = stock_batches::ActiveModel {
                id: Set(batch_id),
                item_id: Set(line.item_id),
                batch_no: Set(line.batch_no.clone()),
                quantity: Set(line.quantity),
                unit_cost: Set(line.unit_cost),
                expiry_date: Set(line.expiry_date),
                received_at: Set(now),
                created_at: Set(now),
                updated_at: Set(now),
            };
            model.insert(txn).await?;
            Ok(batch_id)
        }
    }
}

async fn increment_item_quantity(
    txn: &DatabaseTransaction,
    item_id: Uuid,
    delta: i32,
) -> Result<(), ServiceError> {
    let item = items::Entity::find_by_id(item_id)
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", item_id)))?;
    let new_quantity = item.quantity_on_hand + delta;
    let mut model: items::ActiveModel = item.into();
    model.quantity_on_hand = Set(new_quantity);
    model.updated_at = Set(Utc::now());
    model.update(txn).await?;
    Ok(())
}

/// Bumps received quantities on the PO lines matching delivered items, then
/// recomputes the order status.
async fn apply_delivery_to_purchase_order(
    txn: &DatabaseTransaction,
    po_id: Uuid,
    lines: &[ReceiveLineInput],
    now: chrono::DateTime<Utc>,
) -> Result<(), ServiceError> {
    let po_lines = purchase_order_lines::Entity::find()
        .filter(purchase_order_lines::Column::PurchaseOrderId.eq(po_id))
        .all(txn)
        .await?;

    let mut fully_received = true;
    for po_line in po_lines {
        let delivered: i32 = lines
            .iter()
            .filter(|l| l.item_id == po_line.item_id)
            .map(|l| l.quantity)
            .sum();

        let new_received = po_line.quantity_received + delivered;
        if new_received < po_line.quantity_ordered {
            fully_received = false;
        }
        if delivered > 0 {
            let mut model: purchase_order_lines::ActiveModel = po_line.into();
            model.quantity_received = Set(new_received);
            model.update(txn).await?;
        }
    }

    let new_status = if fully_received {
        PurchaseOrderStatus::Received
    } else {
        PurchaseOrderStatus::PartiallyReceived
    };

    let po = purchase_orders::Entity::find_by_id(po_id)
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Purchase order {} not found", po_id)))?;
    let mut model: purchase_orders::ActiveModel = po.into();
    model.status = Set(new_status.to_string());
    model.updated_at = Set(now);
    model.update(txn).await?;

    Ok(())
}
