use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::{invoices, items, payments, stock_batches, treatment_charges},
    errors::ServiceError,
    services::{invoice_totals, invoice_totals::InvoiceStatus},
};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MonthlyRevenueRow {
    pub month: u32,
    pub total: Decimal,
    pub payment_count: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TopTreatmentRow {
    pub description: String,
    pub times_charged: usize,
    pub total_billed: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OutstandingInvoiceRow {
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub patient_name: String,
    pub status: String,
    pub issued_at: DateTime<Utc>,
    pub balance_due: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LowStockRow {
    pub item_id: Uuid,
    pub sku: String,
    pub name: String,
    pub quantity_on_hand: i32,
    pub reorder_level: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExpiringBatchRow {
    pub batch_id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub batch_no: String,
    pub quantity: i32,
    pub expiry_date: NaiveDate,
}

/// Read-only reporting over billing and inventory
#[derive(Clone)]
pub struct ReportService {
    db: Arc<DatabaseConnection>,
    expiry_window_days: i64,
}

impl ReportService {
    pub fn new(db: Arc<DatabaseConnection>, expiry_window_days: i64) -> Self {
        Self {
            db,
            expiry_window_days,
        }
    }

    /// Collected revenue per month for one calendar year.
    #[instrument(skip(self))]
    pub async fn monthly_revenue(&self, year: i32) -> Result<Vec<MonthlyRevenueRow>, ServiceError> {
        let start = Utc
            .with_ymd_and_hms(year, 1, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| ServiceError::InvalidInput(format!("Bad year: {}", year)))?;
        let end = Utc
            .with_ymd_and_hms(year + 1, 1, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| ServiceError::InvalidInput(format!("Bad year: {}", year)))?;

        let rows = payments::Entity::find()
            .filter(payments::Column::PaidAt.gte(start))
            .filter(payments::Column::PaidAt.lt(end))
            .all(&*self.db)
            .await?;

        let mut months: Vec<MonthlyRevenueRow> = (1..=12)
            .map(|month| MonthlyRevenueRow {
                month,
                total: Decimal::ZERO,
                payment_count: 0,
            })
            .collect();
        for payment in rows {
            let index = payment.paid_at.month() as usize - 1;
            months[index].total += payment.amount;
            months[index].payment_count += 1;
        }
        Ok(months)
    }

    /// Most-billed treatments within a date range, by total billed.
    #[instrument(skip(self))]
    pub async fn top_treatments(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        limit: usize,
    ) -> Result<Vec<TopTreatmentRow>, ServiceError> {
        let start = from
            .and_hms_opt(0, 0, 0)
            .map(|dt| Utc.from_utc_datetime(&dt))
            .ok_or_else(|| ServiceError::InvalidInput("Bad from date".into()))?;
        let end = to
            .succ_opt()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| Utc.from_utc_datetime(&dt))
            .ok_or_else(|| ServiceError::InvalidInput("Bad to date".into()))?;

        let rows = treatment_charges::Entity::find()
            .filter(treatment_charges::Column::CreatedAt.gte(start))
            .filter(treatment_charges::Column::CreatedAt.lt(end))
            .all(&*self.db)
            .await?;

        let mut by_description: HashMap<String, TopTreatmentRow> = HashMap::new();
        for charge in rows {
            let total = charge.unit_price * Decimal::from(charge.quantity);
            let entry = by_description
                .entry(charge.description.clone())
                .or_insert_with(|| TopTreatmentRow {
                    description: charge.description,
                    times_charged: 0,
                    total_billed: Decimal::ZERO,
                });
            entry.times_charged += 1;
            entry.total_billed += total;
        }

        let mut result: Vec<TopTreatmentRow> = by_description.into_values().collect();
        result.sort_by(|a, b| b.total_billed.cmp(&a.total_billed));
        result.truncate(limit);
        Ok(result)
    }

    /// Open and partially paid invoices with their current balances, oldest
    /// first.
    #[instrument(skip(self))]
    pub async fn outstanding_invoices(&self) -> Result<Vec<OutstandingInvoiceRow>, ServiceError> {
        let headers = invoices::Entity::find()
            .filter(
                invoices::Column::Status.is_in([
                    InvoiceStatus::Open.to_string(),
                    InvoiceStatus::PartiallyPaid.to_string(),
                ]),
            )
            .order_by_asc(invoices::Column::IssuedAt)
            .all(&*self.db)
            .await?;

        let mut result = Vec::with_capacity(headers.len());
        for invoice in headers {
            let charges = treatment_charges::Entity::find()
                .filter(treatment_charges::Column::InvoiceId.eq(invoice.id))
                .all(&*self.db)
                .await?;
            let payment_rows = payments::Entity::find()
                .filter(payments::Column::InvoiceId.eq(invoice.id))
                .all(&*self.db)
                .await?;
            let adjustment_rows = crate::entities::adjustments::Entity::find()
                .filter(crate::entities::adjustments::Column::InvoiceId.eq(invoice.id))
                .all(&*self.db)
                .await?;
            let totals = invoice_totals::compute_totals(&charges, &payment_rows, &adjustment_rows);

            result.push(OutstandingInvoiceRow {
                invoice_id: invoice.id,
                invoice_number: invoice.invoice_number,
                patient_name: invoice.patient_name,
                status: invoice.status,
                issued_at: invoice.issued_at,
                balance_due: totals.balance_due,
            });
        }
        Ok(result)
    }

    /// Active items at or below their reorder level.
    #[instrument(skip(self))]
    pub async fn low_stock(&self) -> Result<Vec<LowStockRow>, ServiceError> {
        use sea_orm::sea_query::Expr;

        let rows = items::Entity::find()
            .filter(items::Column::IsActive.eq(true))
            .filter(
                Expr::col(items::Column::QuantityOnHand).lte(Expr::col(items::Column::ReorderLevel)),
            )
            .order_by_asc(items::Column::Name)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|item| LowStockRow {
                item_id: item.id,
                sku: item.sku,
                name: item.name,
                quantity_on_hand: item.quantity_on_hand,
                reorder_level: item.reorder_level,
            })
            .collect())
    }

    /// Non-empty batches expiring within the given window (defaults to the
    /// configured one), soonest first. Already-expired batches are included.
    #[instrument(skip(self))]
    pub async fn expiring_batches(
        &self,
        within_days: Option<i64>,
    ) -> Result<Vec<ExpiringBatchRow>, ServiceError> {
        let window = within_days.unwrap_or(self.expiry_window_days).max(0);
        let cutoff = Utc::now().date_naive() + Duration::days(window);

        let batches = stock_batches::Entity::find()
            .filter(stock_batches::Column::Quantity.gt(0))
            .filter(stock_batches::Column::ExpiryDate.is_not_null())
            .filter(stock_batches::Column::ExpiryDate.lte(cutoff))
            .order_by_asc(stock_batches::Column::ExpiryDate)
            .all(&*self.db)
            .await?;

        let mut result = Vec::with_capacity(batches.len());
        for batch in batches {
            let item = items::Entity::find_by_id(batch.item_id)
                .one(&*self.db)
                .await?;
            let item_name = item.map(|i| i.name).unwrap_or_default();
            if let Some(expiry_date) = batch.expiry_date {
                result.push(ExpiringBatchRow {
                    batch_id: batch.id,
                    item_id: batch.item_id,
                    item_name,
                    batch_no: batch.batch_no,
                    quantity: batch.quantity,
                    expiry_date,
                });
            }
        }
        Ok(result)
    }
}
