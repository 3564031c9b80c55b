use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{adjustments, installments, invoices, payments, treatment_charges},
    errors::ServiceError,
    events::{Actor, Event, EventSender},
    services::invoice_totals::{self, InvoiceStatus, InvoiceTotals},
};

/// Attempts at generating a unique invoice number before giving up.
const INVOICE_NUMBER_MAX_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChargeInput {
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateInvoiceInput {
    pub patient_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub patient_name: String,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
    pub charges: Vec<ChargeInput>,
}

/// Filters for the invoice list; dates select on the issue day (inclusive).
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub patient_id: Option<Uuid>,
    pub status: Option<InvoiceStatus>,
    pub issued_from: Option<NaiveDate>,
    pub issued_to: Option<NaiveDate>,
}

/// Full invoice view: header plus every row the totals derive from.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: invoices::Model,
    pub charges: Vec<treatment_charges::Model>,
    pub payments: Vec<payments::Model>,
    pub adjustments: Vec<adjustments::Model>,
    pub installments: Vec<installments::Model>,
    pub totals: InvoiceTotals,
}

/// Service for patient invoices
#[derive(Clone)]
pub struct InvoiceService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl InvoiceService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates an invoice with its initial charges in one transaction.
    #[instrument(skip(self, input))]
    pub async fn create_invoice(
        &self,
        input: CreateInvoiceInput,
        actor: Actor,
    ) -> Result<invoices::Model, ServiceError> {
        for charge in &input.charges {
            validate_charge(charge)?;
        }

        let invoice_number = self.next_invoice_number().await?;
        let now = Utc::now();
        let invoice_id = Uuid::new_v4();
        let patient_id = input.patient_id;

        let txn = self.db.begin().await?;

        let header = invoices::ActiveModel {
            id: Set(invoice_id),
            invoice_number: Set(invoice_number),
            patient_id: Set(input.patient_id),
            patient_name: Set(input.patient_name),
            status: Set(InvoiceStatus::Open.to_string()),
            notes: Set(input.notes),
            issued_at: Set(now),
            created_by: Set(Some(actor.user_id)),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let header = header.insert(&txn).await?;

        for charge in input.charges {
            let row = treatment_charges::ActiveModel {
                id: Set(Uuid::new_v4()),
                invoice_id: Set(invoice_id),
                description: Set(charge.description),
                quantity: Set(charge.quantity),
                unit_price: Set(charge.unit_price),
                created_at: Set(now),
            };
            row.insert(&txn).await?;
        }

        txn.commit().await?;

        self.event_sender
            .send(Event::InvoiceCreated {
                invoice_id,
                patient_id,
                actor,
            })
            .await;

        Ok(header)
    }

    /// Adds a treatment charge to an open invoice and recomputes its status.
    #[instrument(skip(self, input))]
    pub async fn add_charge(
        &self,
        invoice_id: Uuid,
        input: ChargeInput,
        actor: Actor,
    ) -> Result<treatment_charges::Model, ServiceError> {
        validate_charge(&input)?;
        let invoice = self.get_invoice(invoice_id).await?;
        require_mutable(&invoice)?;

        let now = Utc::now();
        let amount = input.unit_price * Decimal::from(input.quantity);
        let description = input.description.clone();

        let txn = self.db.begin().await?;

        let row = treatment_charges::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_id: Set(invoice_id),
            description: Set(input.description),
            quantity: Set(input.quantity),
            unit_price: Set(input.unit_price),
            created_at: Set(now),
        };
        let row = row.insert(&txn).await?;

        recompute_invoice_status(&txn, invoice_id).await?;
        txn.commit().await?;

        self.event_sender
            .send(Event::ChargeAdded {
                invoice_id,
                description,
                amount,
                actor,
            })
            .await;

        Ok(row)
    }

    #[instrument(skip(self))]
    pub async fn get_invoice(&self, id: Uuid) -> Result<invoices::Model, ServiceError> {
        invoices::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {} not found", id)))
    }

    /// Loads the invoice with every related row and its derived totals.
    #[instrument(skip(self))]
    pub async fn get_invoice_detail(&self, id: Uuid) -> Result<InvoiceDetail, ServiceError> {
        let invoice = self.get_invoice(id).await?;

        let charges = treatment_charges::Entity::find()
            .filter(treatment_charges::Column::InvoiceId.eq(id))
            .order_by_asc(treatment_charges::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        let payments = payments::Entity::find()
            .filter(payments::Column::InvoiceId.eq(id))
            .order_by_asc(payments::Column::PaidAt)
            .all(&*self.db)
            .await?;
        let adjustments = adjustments::Entity::find()
            .filter(adjustments::Column::InvoiceId.eq(id))
            .order_by_asc(adjustments::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        let installments = installments::Entity::find()
            .filter(installments::Column::InvoiceId.eq(id))
            .order_by_asc(installments::Column::Sequence)
            .all(&*self.db)
            .await?;

        let totals = invoice_totals::compute_totals(&charges, &payments, &adjustments);

        Ok(InvoiceDetail {
            invoice,
            charges,
            payments,
            adjustments,
            installments,
            totals,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_invoices(
        &self,
        filter: InvoiceFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<invoices::Model>, u64), ServiceError> {
        let mut query = invoices::Entity::find();
        if let Some(patient_id) = filter.patient_id {
            query = query.filter(invoices::Column::PatientId.eq(patient_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(invoices::Column::Status.eq(status.to_string()));
        }
        if let Some(from) = filter.issued_from {
            let start = from
                .and_hms_opt(0, 0, 0)
                .map(|dt| Utc.from_utc_datetime(&dt))
                .ok_or_else(|| ServiceError::InvalidInput("Bad from date".into()))?;
            query = query.filter(invoices::Column::IssuedAt.gte(start));
        }
        if let Some(to) = filter.issued_to {
            let end = to
                .succ_opt()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| Utc.from_utc_datetime(&dt))
                .ok_or_else(|| ServiceError::InvalidInput("Bad to date".into()))?;
            query = query.filter(invoices::Column::IssuedAt.lt(end));
        }
        let paginator = query
            .order_by_desc(invoices::Column::IssuedAt)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }

    /// Voids an invoice. Only invoices without recorded payments can be
    /// voided; paid money must be refunded through an adjustment instead.
    #[instrument(skip(self))]
    pub async fn void_invoice(
        &self,
        id: Uuid,
        actor: Actor,
    ) -> Result<invoices::Model, ServiceError> {
        let invoice = self.get_invoice(id).await?;
        require_mutable(&invoice)?;

        let paid = payments::Entity::find()
            .filter(payments::Column::InvoiceId.eq(id))
            .count(&*self.db)
            .await?;
        if paid > 0 {
            return Err(ServiceError::InvalidOperation(
                "Invoice has recorded payments; refund them before voiding".into(),
            ));
        }

        let mut model: invoices::ActiveModel = invoice.into();
        model.status = Set(InvoiceStatus::Void.to_string());
        model.updated_at = Set(Utc::now());
        let updated = model.update(&*self.db).await?;

        self.event_sender
            .send(Event::InvoiceVoided {
                invoice_id: id,
                actor,
            })
            .await;

        Ok(updated)
    }

    /// Generates the next invoice number for today: `INV-YYYYMMDD-NNN`.
    async fn next_invoice_number(&self) -> Result<String, ServiceError> {
        let prefix = format!("INV-{}", Utc::now().format("%Y%m%d"));

        let today_count = invoices::Entity::find()
            .filter(invoices::Column::InvoiceNumber.starts_with(&prefix))
            .count(&*self.db)
            .await?;

        for attempt in 0..INVOICE_NUMBER_MAX_ATTEMPTS {
            let candidate = format!("{}-{:03}", prefix, today_count + 1 + u64::from(attempt));
            let taken = invoices::Entity::find()
                .filter(invoices::Column::InvoiceNumber.eq(candidate.clone()))
                .one(&*self.db)
                .await?;
            if taken.is_none() {
                return Ok(candidate);
            }
        }

        Err(ServiceError::Conflict(
            "Could not allocate an invoice number, please retry".into(),
        ))
    }
}

fn validate_charge(charge: &ChargeInput) -> Result<(), ServiceError> {
    if charge.quantity < 1 {
        return Err(ServiceError::InvalidInput(
            "charge quantity must be at least 1".into(),
        ));
    }
    if charge.unit_price < Decimal::ZERO {
        return Err(ServiceError::InvalidInput(
            "unit_price cannot be negative".into(),
        ));
    }
    Ok(())
}

/// Rejects mutations against void invoices.
pub(crate) fn require_mutable(invoice: &invoices::Model) -> Result<(), ServiceError> {
    if invoice.status == InvoiceStatus::Void.to_string() {
        return Err(ServiceError::InvalidOperation(
            "Invoice is void and cannot be modified".into(),
        ));
    }
    Ok(())
}

/// Recomputes and stores the denormalized status from the invoice's rows.
/// Runs inside the caller's transaction so the status never drifts from the
/// data it is derived from.
pub(crate) async fn recompute_invoice_status<C: ConnectionTrait>(
    conn: &C,
    invoice_id: Uuid,
) -> Result<InvoiceStatus, ServiceError> {
    let invoice = invoices::Entity::find_by_id(invoice_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Invoice {} not found", invoice_id)))?;

    let charges = treatment_charges::Entity::find()
        .filter(treatment_charges::Column::InvoiceId.eq(invoice_id))
        .all(conn)
        .await?;
    let payment_rows = payments::Entity::find()
        .filter(payments::Column::InvoiceId.eq(invoice_id))
        .all(conn)
        .await?;
    let adjustment_rows = adjustments::Entity::find()
        .filter(adjustments::Column::InvoiceId.eq(invoice_id))
        .all(conn)
        .await?;

    let totals = invoice_totals::compute_totals(&charges, &payment_rows, &adjustment_rows);
    let is_void = invoice.status == InvoiceStatus::Void.to_string();
    let status = invoice_totals::derive_status(&totals, is_void);

    if invoice.status != status.to_string() {
        let mut model: invoices::ActiveModel = invoice.into();
        model.status = Set(status.to_string());
        model.updated_at = Set(Utc::now());
        model.update(conn).await?;
    }

    Ok(status)
}

/// Loads totals for one invoice outside a transaction.
pub(crate) async fn load_totals<C: ConnectionTrait>(
    conn: &C,
    invoice_id: Uuid,
) -> Result<InvoiceTotals, ServiceError> {
    let charges = treatment_charges::Entity::find()
        .filter(treatment_charges::Column::InvoiceId.eq(invoice_id))
        .all(conn)
        .await?;
    let payment_rows = payments::Entity::find()
        .filter(payments::Column::InvoiceId.eq(invoice_id))
        .all(conn)
        .await?;
    let adjustment_rows = adjustments::Entity::find()
        .filter(adjustments::Column::InvoiceId.eq(invoice_id))
        .all(conn)
        .await?;
    Ok(invoice_totals::compute_totals(
        &charges,
        &payment_rows,
        &adjustment_rows,
    ))
}
