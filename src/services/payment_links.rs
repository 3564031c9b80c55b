use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use strum::{Display, EnumString};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{invoices, payment_links, payments},
    errors::ServiceError,
    events::{Actor, Event, EventSender},
    services::{
        invoice_totals::PaymentMethod,
        invoices::{load_totals, recompute_invoice_status, require_mutable},
        paymongo::{GatewayLinkStatus, PaymentGatewayClient},
    },
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentLinkStatus {
    Unpaid,
    Paid,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePaymentLinkInput {
    /// Amount to collect; defaults to the full balance due
    pub amount: Option<Decimal>,
}

/// Service for gateway payment links. Confirmation is by manual polling, not
/// webhooks: the front desk clicks "check status" after the patient pays.
#[derive(Clone)]
pub struct PaymentLinkService {
    db: Arc<DatabaseConnection>,
    gateway: PaymentGatewayClient,
    event_sender: EventSender,
}

impl PaymentLinkService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        gateway: PaymentGatewayClient,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            gateway,
            event_sender,
        }
    }

    /// Requests a link from the gateway and stores it against the invoice.
    #[instrument(skip(self, input))]
    pub async fn create_payment_link(
        &self,
        invoice_id: Uuid,
        input: CreatePaymentLinkInput,
        actor: Actor,
    ) -> Result<payment_links::Model, ServiceError> {
        let invoice = invoices::Entity::find_by_id(invoice_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {} not found", invoice_id)))?;
        require_mutable(&invoice)?;

        let totals = load_totals(&*self.db, invoice_id).await?;
        let amount = input.amount.unwrap_or(totals.balance_due);
        if amount <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "link amount must be positive".into(),
            ));
        }
        if amount > totals.balance_due {
            return Err(ServiceError::InvalidOperation(format!(
                "Link amount {} exceeds balance due of {}",
                amount, totals.balance_due
            )));
        }

        let description = format!("Invoice {}", invoice.invoice_number);
        let link = self.gateway.create_link(amount, &description).await?;

        let now = Utc::now();
        let link_id = Uuid::new_v4();
        let model = payment_links::ActiveModel {
            id: Set(link_id),
            invoice_id: Set(invoice_id),
            provider_ref: Set(link.provider_ref),
            checkout_url: Set(link.checkout_url),
            qr_code_data: Set(link.qr_code_data),
            amount: Set(amount),
            status: Set(PaymentLinkStatus::Unpaid.to_string()),
            requested_at: Set(now),
            confirmed_at: Set(None),
            payment_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let row = model.insert(&*self.db).await?;

        self.event_sender
            .send(Event::PaymentLinkCreated {
                invoice_id,
                link_id,
                amount,
                actor,
            })
            .await;

        Ok(row)
    }

    /// Polls the gateway for a link's state. Confirming is idempotent: a link
    /// already marked paid is returned as-is without touching the invoice.
    ///
    /// A gateway payment older than the link's own `requested_at` is treated
    /// as stale (it belongs to an earlier checkout session) and ignored.
    #[instrument(skip(self))]
    pub async fn poll_payment_link(
        &self,
        link_id: Uuid,
    ) -> Result<payment_links::Model, ServiceError> {
        let link = payment_links::Entity::find_by_id(link_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Payment link {} not found", link_id)))?;

        if link.status == PaymentLinkStatus::Paid.to_string() {
            return Ok(link);
        }

        let remote = self.gateway.fetch_link(&link.provider_ref).await?;
        if remote.status != GatewayLinkStatus::Paid {
            return Ok(link);
        }

        let paid_at = match remote.paid_at {
            Some(ts) if ts >= link.requested_at => ts,
            Some(ts) => {
                warn!(
                    link_id = %link_id,
                    paid_at = %ts,
                    requested_at = %link.requested_at,
                    "Ignoring stale gateway confirmation"
                );
                return Ok(link);
            }
            // Paid but no timestamp from the gateway; accept with poll time
            None => Utc::now(),
        };

        let invoice_id = link.invoice_id;
        let amount = link.amount;
        let provider_ref = link.provider_ref.clone();
        let now = Utc::now();
        let payment_id = Uuid::new_v4();

        let txn = self.db.begin().await?;

        let payment = payments::ActiveModel {
            id: Set(payment_id),
            invoice_id: Set(invoice_id),
            amount: Set(amount),
            method: Set(PaymentMethod::Gateway.to_string()),
            reference: Set(Some(provider_ref)),
            paid_at: Set(paid_at),
            recorded_by: Set(None),
            created_at: Set(now),
        };
        payment.insert(&txn).await?;

        let mut model: payment_links::ActiveModel = link.into();
        model.status = Set(PaymentLinkStatus::Paid.to_string());
        model.confirmed_at = Set(Some(paid_at));
        model.payment_id = Set(Some(payment_id));
        model.updated_at = Set(now);
        let updated = model.update(&txn).await?;

        recompute_invoice_status(&txn, invoice_id).await?;
        txn.commit().await?;

        info!(link_id = %link_id, invoice_id = %invoice_id, "Payment link confirmed");
        self.event_sender
            .send(Event::PaymentLinkConfirmed {
                invoice_id,
                link_id,
                amount,
            })
            .await;

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn list_for_invoice(
        &self,
        invoice_id: Uuid,
    ) -> Result<Vec<payment_links::Model>, ServiceError> {
        Ok(payment_links::Entity::find()
            .filter(payment_links::Column::InvoiceId.eq(invoice_id))
            .order_by_desc(payment_links::Column::RequestedAt)
            .all(&*self.db)
            .await?)
    }
}
