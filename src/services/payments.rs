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
    entities::{installments, invoices, payments},
    errors::ServiceError,
    events::{Actor, Event, EventSender},
    services::{
        invoice_totals::PaymentMethod,
        invoices::{load_totals, recompute_invoice_status, require_mutable},
    },
};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RecordPaymentInput {
    pub amount: Decimal,
    pub method: PaymentMethod,
    #[validate(length(max = 100))]
    pub reference: Option<String>,
    /// Installment this payment settles, if any
    pub installment_id: Option<Uuid>,
}

/// Service for recording payments against invoices
#[derive(Clone)]
pub struct PaymentService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl PaymentService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Records a payment. Overpayment is rejected: the amount must not exceed
    /// the current balance due. Settling an installment, inserting the
    /// payment, and recomputing the status commit together.
    #[instrument(skip(self, input))]
    pub async fn record_payment(
        &self,
        invoice_id: Uuid,
        input: RecordPaymentInput,
        actor: Actor,
    ) -> Result<payments::Model, ServiceError> {
        if input.amount <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "payment amount must be positive".into(),
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
                "Payment of {} exceeds balance due of {}",
                input.amount, totals.balance_due
            )));
        }

        let now = Utc::now();
        let payment_id = Uuid::new_v4();
        let method = input.method.to_string();
        let amount = input.amount;

        let txn = self.db.begin().await?;

        let row = payments::ActiveModel {
            id: Set(payment_id),
            invoice_id: Set(invoice_id),
            amount: Set(input.amount),
            method: Set(method.clone()),
            reference: Set(input.reference),
            paid_at: Set(now),
            recorded_by: Set(Some(actor.user_id)),
            created_at: Set(now),
        };
        let row = row.insert(&txn).await?;

        if let Some(installment_id) = input.installment_id {
            settle_installment(&txn, invoice_id, installment_id, payment_id, now).await?;
        }

        recompute_invoice_status(&txn, invoice_id).await?;
        txn.commit().await?;

        self.event_sender
            .send(Event::PaymentRecorded {
                invoice_id,
                payment_id,
                amount,
                method,
                actor,
            })
            .await;

        Ok(row)
    }

    #[instrument(skip(self))]
    pub async fn list_payments(
        &self,
        invoice_id: Option<Uuid>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<payments::Model>, u64), ServiceError> {
        let mut query = payments::Entity::find();
        if let Some(invoice_id) = invoice_id {
            query = query.filter(payments::Column::InvoiceId.eq(invoice_id));
        }
        let paginator = query
            .order_by_desc(payments::Column::PaidAt)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }
}

async fn settle_installment<C: sea_orm::ConnectionTrait>(
    conn: &C,
    invoice_id: Uuid,
    installment_id: Uuid,
    payment_id: Uuid,
    now: chrono::DateTime<Utc>,
) -> Result<(), ServiceError> {
    let installment = installments::Entity::find_by_id(installment_id)
        .one(conn)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Installment {} not found", installment_id))
        })?;
    if installment.invoice_id != invoice_id {
        return Err(ServiceError::InvalidInput(
            "Installment belongs to a different invoice".into(),
        ));
    }
    if installment.payment_id.is_some() {
        return Err(ServiceError::InvalidOperation(
            "Installment is already settled".into(),
        ));
    }

    let mut model: installments::ActiveModel = installment.into();
    model.status = Set(crate::services::installments::InstallmentStatus::Paid.to_string());
    model.payment_id = Set(Some(payment_id));
    model.updated_at = Set(now);
    model.update(conn).await?;
    Ok(())
}
