//! Domain events and the activity-log processor.
//!
//! Services emit [`Event`]s over an mpsc channel after each state change.
//! The [`process_events`] task consumes them, logs them, and persists an
//! activity-log row per event so the dashboard's activity feed has an
//! authoritative server-side trail.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};
use uuid::Uuid;

use crate::entities::activity_logs;

/// Who performed the action, taken from the gateway identity headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Uuid,
    pub name: String,
}

impl From<&crate::auth::UserContext> for Actor {
    fn from(ctx: &crate::auth::UserContext) -> Self {
        Self {
            user_id: ctx.user_id,
            name: ctx.display_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Billing
    InvoiceCreated {
        invoice_id: Uuid,
        patient_id: Uuid,
        actor: Actor,
    },
    ChargeAdded {
        invoice_id: Uuid,
        description: String,
        amount: Decimal,
        actor: Actor,
    },
    InvoiceVoided {
        invoice_id: Uuid,
        actor: Actor,
    },
    PaymentRecorded {
        invoice_id: Uuid,
        payment_id: Uuid,
        amount: Decimal,
        method: String,
        actor: Actor,
    },
    AdjustmentApplied {
        invoice_id: Uuid,
        adjustment_id: Uuid,
        kind: String,
        amount: Decimal,
        actor: Actor,
    },
    InstallmentPlanCreated {
        invoice_id: Uuid,
        parts: u32,
        actor: Actor,
    },
    PaymentLinkCreated {
        invoice_id: Uuid,
        link_id: Uuid,
        amount: Decimal,
        actor: Actor,
    },
    PaymentLinkConfirmed {
        invoice_id: Uuid,
        link_id: Uuid,
        amount: Decimal,
    },

    // Inventory
    DeliveryReceived {
        stock_in_id: Uuid,
        supplier_id: Uuid,
        line_count: usize,
        actor: Actor,
    },
    StockOutRecorded {
        stock_out_id: Uuid,
        reason: String,
        line_count: usize,
        actor: Actor,
    },
    StockAdjusted {
        adjustment_id: Uuid,
        item_id: Uuid,
        quantity_delta: i32,
        reason: String,
        actor: Actor,
    },
    PurchaseOrderCreated {
        purchase_order_id: Uuid,
        po_number: String,
        actor: Actor,
    },
    PurchaseOrderStatusChanged {
        purchase_order_id: Uuid,
        old_status: String,
        new_status: String,
        actor: Actor,
    },
}

impl Event {
    /// (action, entity_type, entity_id, actor, details) for the activity log.
    fn activity_row(&self) -> (String, String, Uuid, Option<Actor>, serde_json::Value) {
        match self {
            Event::InvoiceCreated {
                invoice_id,
                patient_id,
                actor,
            } => (
                "invoice.created".into(),
                "invoice".into(),
                *invoice_id,
                Some(actor.clone()),
                json!({ "patient_id": patient_id }),
            ),
            Event::ChargeAdded {
                invoice_id,
                description,
                amount,
                actor,
            } => (
                "invoice.charge_added".into(),
                "invoice".into(),
                *invoice_id,
                Some(actor.clone()),
                json!({ "description": description, "amount": amount }),
            ),
            Event::InvoiceVoided { invoice_id, actor } => (
                "invoice.voided".into(),
                "invoice".into(),
                *invoice_id,
                Some(actor.clone()),
                json!({}),
            ),
            Event::PaymentRecorded {
                invoice_id,
                payment_id,
                amount,
                method,
                actor,
            } => (
                "payment.recorded".into(),
                "invoice".into(),
                *invoice_id,
                Some(actor.clone()),
                json!({ "payment_id": payment_id, "amount": amount, "method": method }),
            ),
            Event::AdjustmentApplied {
                invoice_id,
                adjustment_id,
                kind,
                amount,
                actor,
            } => (
                format!("adjustment.{}", kind),
                "invoice".into(),
                *invoice_id,
                Some(actor.clone()),
                json!({ "adjustment_id": adjustment_id, "amount": amount }),
            ),
            Event::InstallmentPlanCreated {
                invoice_id,
                parts,
                actor,
            } => (
                "installment_plan.created".into(),
                "invoice".into(),
                *invoice_id,
                Some(actor.clone()),
                json!({ "parts": parts }),
            ),
            Event::PaymentLinkCreated {
                invoice_id,
                link_id,
                amount,
                actor,
            } => (
                "payment_link.created".into(),
                "invoice".into(),
                *invoice_id,
                Some(actor.clone()),
                json!({ "link_id": link_id, "amount": amount }),
            ),
            Event::PaymentLinkConfirmed {
                invoice_id,
                link_id,
                amount,
            } => (
                "payment_link.confirmed".into(),
                "invoice".into(),
                *invoice_id,
                None,
                json!({ "link_id": link_id, "amount": amount }),
            ),
            Event::DeliveryReceived {
                stock_in_id,
                supplier_id,
                line_count,
                actor,
            } => (
                "stock.delivery_received".into(),
                "stock_in".into(),
                *stock_in_id,
                Some(actor.clone()),
                json!({ "supplier_id": supplier_id, "line_count": line_count }),
            ),
            Event::StockOutRecorded {
                stock_out_id,
                reason,
                line_count,
                actor,
            } => (
                "stock.out_recorded".into(),
                "stock_out".into(),
                *stock_out_id,
                Some(actor.clone()),
                json!({ "reason": reason, "line_count": line_count }),
            ),
            Event::StockAdjusted {
                adjustment_id,
                item_id,
                quantity_delta,
                reason,
                actor,
            } => (
                "stock.adjusted".into(),
                "item".into(),
                *item_id,
                Some(actor.clone()),
                json!({ "adjustment_id": adjustment_id, "quantity_delta": quantity_delta, "reason": reason }),
            ),
            Event::PurchaseOrderCreated {
                purchase_order_id,
                po_number,
                actor,
            } => (
                "purchase_order.created".into(),
                "purchase_order".into(),
                *purchase_order_id,
                Some(actor.clone()),
                json!({ "po_number": po_number }),
            ),
            Event::PurchaseOrderStatusChanged {
                purchase_order_id,
                old_status,
                new_status,
                actor,
            } => (
                "purchase_order.status_changed".into(),
                "purchase_order".into(),
                *purchase_order_id,
                Some(actor.clone()),
                json!({ "old_status": old_status, "new_status": new_status }),
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously. Failure to enqueue is reported but must
    /// never fail the originating request.
    pub async fn send(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            error!("Failed to enqueue event: {}", e);
        }
    }
}

/// Consumes events and persists activity-log rows until the channel closes.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>, db: Arc<DatabaseConnection>) {
    info!("Event processor started");
    while let Some(event) = receiver.recv().await {
        let (action, entity_type, entity_id, actor, details) = event.activity_row();
        info!(action = %action, entity_type = %entity_type, entity_id = %entity_id, "event");

        let row = activity_logs::ActiveModel {
            id: Set(Uuid::new_v4()),
            actor_id: Set(actor.as_ref().map(|a| a.user_id)),
            actor_name: Set(actor.map(|a| a.name)),
            action: Set(action),
            entity_type: Set(entity_type),
            entity_id: Set(entity_id),
            details: Set(Some(details.to_string())),
            created_at: Set(Utc::now()),
        };

        if let Err(e) = row.insert(&*db).await {
            error!("Failed to persist activity log entry: {}", e);
        }
    }
    info!("Event processor stopped");
}
