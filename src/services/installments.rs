use std::sync::Arc;

use chrono::{NaiveDate, Utc};
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
    entities::{installments, invoices},
    errors::ServiceError,
    events::{Actor, Event, EventSender},
    services::invoices::{load_totals, require_mutable},
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    Pending,
    Paid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct InstallmentPartInput {
    pub due_date: NaiveDate,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateInstallmentPlanInput {
    #[validate(length(min = 2, max = 36))]
    pub parts: Vec<InstallmentPartInput>,
}

/// Service for installment plans
#[derive(Clone)]
pub struct InstallmentService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl InstallmentService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates an installment plan for an invoice. The parts must sum to the
    /// balance due at creation time, and an invoice can only carry one plan.
    #[instrument(skip(self, input))]
    pub async fn create_plan(
        &self,
        invoice_id: Uuid,
        input: CreateInstallmentPlanInput,
        actor: Actor,
    ) -> Result<Vec<installments::Model>, ServiceError> {
        let invoice = invoices::Entity::find_by_id(invoice_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {} not found", invoice_id)))?;
        require_mutable(&invoice)?;

        if input.parts.len() < 2 {
            return Err(ServiceError::InvalidInput(
                "An installment plan needs at least two parts".into(),
            ));
        }
        for part in &input.parts {
            if part.amount <= Decimal::ZERO {
                return Err(ServiceError::InvalidInput(
                    "installment amounts must be positive".into(),
                ));
            }
        }
        let mut sorted = input.parts.clone();
        sorted.sort_by_key(|p| p.due_date);

        let existing = installments::Entity::find()
            .filter(installments::Column::InvoiceId.eq(invoice_id))
            .count(&*self.db)
            .await?;
        if existing > 0 {
            return Err(ServiceError::Conflict(
                "Invoice already has an installment plan".into(),
            ));
        }

        let totals = load_totals(&*self.db, invoice_id).await?;
        let plan_total: Decimal = sorted.iter().map(|p| p.amount).sum();
        if plan_total != totals.balance_due {
            return Err(ServiceError::InvalidOperation(format!(
                "Plan total {} must equal the balance due of {}",
                plan_total, totals.balance_due
            )));
        }

        let now = Utc::now();
        let parts = sorted.len() as u32;
        let txn = self.db.begin().await?;

        let mut created = Vec::with_capacity(sorted.len());
        for (index, part) in sorted.into_iter().enumerate() {
            let row = installments::ActiveModel {
                id: Set(Uuid::new_v4()),
                invoice_id: Set(invoice_id),
                sequence: Set(index as i32 + 1),
                due_date: Set(part.due_date),
                amount: Set(part.amount),
                status: Set(InstallmentStatus::Pending.to_string()),
                payment_id: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            };
            created.push(row.insert(&txn).await?);
        }

        txn.commit().await?;

        self.event_sender
            .send(Event::InstallmentPlanCreated {
                invoice_id,
                parts,
                actor,
            })
            .await;

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list_for_invoice(
        &self,
        invoice_id: Uuid,
    ) -> Result<Vec<installments::Model>, ServiceError> {
        Ok(installments::Entity::find()
            .filter(installments::Column::InvoiceId.eq(invoice_id))
            .order_by_asc(installments::Column::Sequence)
            .all(&*self.db)
            .await?)
    }

    /// Pending installments due on or before `as_of`, oldest first.
    #[instrument(skip(self))]
    pub async fn list_overdue(
        &self,
        as_of: NaiveDate,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<installments::Model>, u64), ServiceError> {
        let paginator = installments::Entity::find()
            .filter(installments::Column::Status.eq(InstallmentStatus::Pending.to_string()))
            .filter(installments::Column::DueDate.lte(as_of))
            .order_by_asc(installments::Column::DueDate)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }
}
