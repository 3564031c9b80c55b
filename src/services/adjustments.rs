use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
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
    entities::{adjustments, invoices},
    errors::ServiceError,
    events::{Actor, Event, EventSender},
    services::{
        invoice_totals::AdjustmentKind,
        invoices::{load_totals, recompute_invoice_status, require_mutable},
    },
};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ApplyAdjustmentInput {
    pub kind: AdjustmentKind,
    pub amount: Decimal,
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

/// Service for invoice adjustments: discounts, write-offs, and refunds
#[derive(Clone)]
pub struct AdjustmentService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl AdjustmentService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Applies an adjustment to an invoice. No adjustment may push the balance
    /// below zero; refunds additionally may not exceed the amount paid.
    #[instrument(skip(self, input))]
    pub async fn apply_adjustment(
        &self,
        invoice_id: Uuid,
        input: ApplyAdjustmentInput,
        actor: Actor,
    ) -> Result<adjustments::Model, ServiceError> {
        if input.amount <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "adjustment amount must be positive".into(),
            ));
        }

        let invoice = invoices::Entity::find_by_id(invoice_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {} not found", invoice_id)))?;
        require_mutable(&invoice)?;

        let totals = load_totals(&*self.db, invoice_id).await?;
        if input.amount > totals.balance_due {
            return Err(ServiceError::InvalidOperation(format!(
                "Adjustment of {} exceeds balance due of {}",
                input.amount, totals.balance_due
            )));
        }
        if let AdjustmentKind::Refund = input.kind {
            let refundable = totals.total_paid - totals.total_refunds;
            if input.amount > refundable {
                return Err(ServiceError::InvalidOperation(format!(
                    "Refund of {} exceeds the refundable amount of {}",
                    input.amount, refundable
                )));
            }
        }

        let now = Utc::now();
        let adjustment_id = Uuid::new_v4();
        let kind = input.kind.to_string();
        let amount = input.amount;

        let txn = self.db.begin().await?;

        let row = adjustments::ActiveModel {
            id: Set(adjustment_id),
            invoice_id: Set(invoice_id),
            kind: Set(kind.clone()),
            amount: Set(input.amount),
            reason: Set(input.reason),
            applied_by: Set(Some(actor.user_id)),
            created_at: Set(now),
        };
        let row = row.insert(&txn).await?;

        recompute_invoice_status(&txn, invoice_id).await?;
        txn.commit().await?;

        self.event_sender
            .send(Event::AdjustmentApplied {
                invoice_id,
                adjustment_id,
                kind,
                amount,
                actor,
            })
            .await;

        Ok(row)
    }

    #[instrument(skip(self))]
    pub async fn list_adjustments(
        &self,
        invoice_id: Option<Uuid>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<adjustments::Model>, u64), ServiceError> {
        let mut query = adjustments::Entity::find();
        if let Some(invoice_id) = invoice_id {
            query = query.filter(adjustments::Column::InvoiceId.eq(invoice_id));
        }
        let paginator = query
            .order_by_desc(adjustments::Column::CreatedAt)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }
}
