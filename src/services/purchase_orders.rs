use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{items, purchase_order_lines, purchase_orders, suppliers},
    errors::ServiceError,
    events::{Actor, Event, EventSender},
};

/// Attempts at generating a unique PO number before giving up.
const PO_NUMBER_MAX_ATTEMPTS: u32 = 10;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    Pending,
    PartiallyReceived,
    Received,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PurchaseOrderLineInput {
    pub item_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub unit_cost: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePurchaseOrderInput {
    pub supplier_id: Uuid,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
    pub expected_at: Option<NaiveDate>,
    #[validate(length(min = 1))]
    pub lines: Vec<PurchaseOrderLineInput>,
}

/// Filters for the purchase order list; dates select on the order day
/// (inclusive).
#[derive(Debug, Clone, Default)]
pub struct PurchaseOrderFilter {
    pub status: Option<PurchaseOrderStatus>,
    pub supplier_id: Option<Uuid>,
    pub ordered_from: Option<NaiveDate>,
    pub ordered_to: Option<NaiveDate>,
}

/// Service for purchase orders
#[derive(Clone)]
pub struct PurchaseOrderService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl PurchaseOrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates a purchase order with its lines in one transaction.
    #[instrument(skip(self, input))]
    pub async fn create_purchase_order(
        &self,
        input: CreatePurchaseOrderInput,
        actor: Actor,
    ) -> Result<purchase_orders::Model, ServiceError> {
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

        let po_number = self.next_po_number().await?;
        let now = Utc::now();
        let po_id = Uuid::new_v4();

        let txn = self.db.begin().await?;

        let header = purchase_orders::ActiveModel {
            id: Set(po_id),
            po_number: Set(po_number.clone()),
            supplier_id: Set(input.supplier_id),
            status: Set(PurchaseOrderStatus::Pending.to_string()),
            notes: Set(input.notes),
            ordered_at: Set(Some(now)),
            expected_at: Set(input.expected_at),
            created_by: Set(Some(actor.user_id)),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let header = header.insert(&txn).await?;

        for line in input.lines {
            let row = purchase_order_lines::ActiveModel {
                id: Set(Uuid::new_v4()),
                purchase_order_id: Set(po_id),
                item_id: Set(line.item_id),
                quantity_ordered: Set(line.quantity),
                quantity_received: Set(0),
                unit_cost: Set(line.unit_cost),
            };
            row.insert(&txn).await?;
        }

        txn.commit().await?;

        self.event_sender
            .send(Event::PurchaseOrderCreated {
                purchase_order_id: po_id,
                po_number,
                actor,
            })
            .await;

        Ok(header)
    }

    #[instrument(skip(self))]
    pub async fn get_purchase_order(
        &self,
        id: Uuid,
    ) -> Result<(purchase_orders::Model, Vec<purchase_order_lines::Model>), ServiceError> {
        let header = purchase_orders::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Purchase order {} not found", id)))?;
        let lines = purchase_order_lines::Entity::find()
            .filter(purchase_order_lines::Column::PurchaseOrderId.eq(id))
            .all(&*self.db)
            .await?;
        Ok((header, lines))
    }

    #[instrument(skip(self))]
    pub async fn list_purchase_orders(
        &self,
        filter: PurchaseOrderFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<purchase_orders::Model>, u64), ServiceError> {
        let mut query = purchase_orders::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(purchase_orders::Column::Status.eq(status.to_string()));
        }
        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(purchase_orders::Column::SupplierId.eq(supplier_id));
        }
        if let Some(from) = filter.ordered_from {
            let start = from
                .and_hms_opt(0, 0, 0)
                .map(|dt| Utc.from_utc_datetime(&dt))
                .ok_or_else(|| ServiceError::InvalidInput("Bad from date".into()))?;
            query = query.filter(purchase_orders::Column::OrderedAt.gte(start));
        }
        if let Some(to) = filter.ordered_to {
            let end = to
                .succ_opt()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| Utc.from_utc_datetime(&dt))
                .ok_or_else(|| ServiceError::InvalidInput("Bad to date".into()))?;
            query = query.filter(purchase_orders::Column::OrderedAt.lt(end));
        }
        let paginator = query
            .order_by_desc(purchase_orders::Column::CreatedAt)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }

    /// Cancels a pending purchase order. Orders with received stock cannot be
    /// cancelled.
    #[instrument(skip(self))]
    pub async fn cancel_purchase_order(
        &self,
        id: Uuid,
        actor: Actor,
    ) -> Result<purchase_orders::Model, ServiceError> {
        let (header, _) = self.get_purchase_order(id).await?;
        let current: PurchaseOrderStatus = header
            .status
            .parse()
            .map_err(|_| ServiceError::InternalError(format!("Bad PO status: {}", header.status)))?;

        if current != PurchaseOrderStatus::Pending {
            return Err(ServiceError::InvalidOperation(format!(
                "Cannot cancel a purchase order in status '{}'",
                current
            )));
        }

        let old_status = header.status.clone();
        let mut model: purchase_orders::ActiveModel = header.into();
        model.status = Set(PurchaseOrderStatus::Cancelled.to_string());
        model.updated_at = Set(Utc::now());
        let updated = model.update(&*self.db).await?;

        self.event_sender
            .send(Event::PurchaseOrderStatusChanged {
                purchase_order_id: id,
                old_status,
                new_status: updated.status.clone(),
                actor,
            })
            .await;

        Ok(updated)
    }

    /// Generates the next PO number for today: `PO-YYYYMMDD-NNN` where NNN
    /// restarts at 001 each day. The existence check re-runs until a free
    /// number is found or the attempt budget is exhausted.
    async fn next_po_number(&self) -> Result<String, ServiceError> {
        let prefix = format!("PO-{}", Utc::now().format("%Y%m%d"));

        let today_count = purchase_orders::Entity::find()
            .filter(purchase_orders::Column::PoNumber.starts_with(&prefix))
            .count(&*self.db)
            .await?;

        for attempt in 0..PO_NUMBER_MAX_ATTEMPTS {
            let candidate = format!("{}-{:03}", prefix, today_count + 1 + u64::from(attempt));
            let taken = purchase_orders::Entity::find()
                .filter(purchase_orders::Column::PoNumber.eq(candidate.clone()))
                .one(&*self.db)
                .await?;
            if taken.is_none() {
                return Ok(candidate);
            }
        }

        Err(ServiceError::Conflict(
            "Could not allocate a purchase order number, please retry".into(),
        ))
    }
}
