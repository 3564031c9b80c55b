//! Centralized invoice arithmetic.
//!
//! Every balance, subtotal, and status shown by the API comes from this
//! module. Handlers and sibling services must not re-derive any of these
//! figures from raw rows.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

use crate::entities::{adjustments, payments, treatment_charges};

/// Lifecycle of an invoice. Stored denormalized on the invoice row and
/// recomputed after every charge, payment, or adjustment mutation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Open,
    PartiallyPaid,
    Paid,
    Void,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    Discount,
    WriteOff,
    Refund,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Gateway,
}

/// Derived financial summary for one invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub total_discounts: Decimal,
    pub total_write_offs: Decimal,
    pub total_refunds: Decimal,
    pub total_paid: Decimal,
    pub balance_due: Decimal,
}

impl InvoiceTotals {
    pub fn zero() -> Self {
        Self {
            subtotal: Decimal::ZERO,
            total_discounts: Decimal::ZERO,
            total_write_offs: Decimal::ZERO,
            total_refunds: Decimal::ZERO,
            total_paid: Decimal::ZERO,
            balance_due: Decimal::ZERO,
        }
    }
}

/// Computes the full financial summary from an invoice's rows.
///
/// balance_due = subtotal - discounts - write_offs - refunds - payments
pub fn compute_totals(
    charges: &[treatment_charges::Model],
    payments: &[payments::Model],
    adjustments: &[adjustments::Model],
) -> InvoiceTotals {
    let subtotal: Decimal = charges
        .iter()
        .map(|c| c.unit_price * Decimal::from(c.quantity))
        .sum();

    let total_paid: Decimal = payments.iter().map(|p| p.amount).sum();

    let mut total_discounts = Decimal::ZERO;
    let mut total_write_offs = Decimal::ZERO;
    let mut total_refunds = Decimal::ZERO;
    for adj in adjustments {
        match adj.kind.parse::<AdjustmentKind>() {
            Ok(AdjustmentKind::Discount) => total_discounts += adj.amount,
            Ok(AdjustmentKind::WriteOff) => total_write_offs += adj.amount,
            Ok(AdjustmentKind::Refund) => total_refunds += adj.amount,
            // Unknown kinds are ignored rather than corrupting the balance
            Err(_) => {}
        }
    }

    let balance_due = subtotal - total_discounts - total_write_offs - total_refunds - total_paid;

    InvoiceTotals {
        subtotal,
        total_discounts,
        total_write_offs,
        total_refunds,
        total_paid,
        balance_due,
    }
}

/// Derives the status an invoice should carry given its totals. Void is
/// terminal and always wins.
pub fn derive_status(totals: &InvoiceTotals, is_void: bool) -> InvoiceStatus {
    if is_void {
        return InvoiceStatus::Void;
    }
    if totals.balance_due <= Decimal::ZERO && totals.subtotal > Decimal::ZERO {
        InvoiceStatus::Paid
    } else if totals.total_paid > Decimal::ZERO {
        InvoiceStatus::PartiallyPaid
    } else {
        InvoiceStatus::Open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn charge(quantity: i32, unit_price: Decimal) -> treatment_charges::Model {
        treatment_charges::Model {
            id: Uuid::new_v4(),
            invoice_id: Uuid::new_v4(),
            description: "Prophylaxis".into(),
            quantity,
            unit_price,
            created_at: Utc::now(),
        }
    }

    fn payment(amount: Decimal) -> payments::Model {
        payments::Model {
            id: Uuid::new_v4(),
            invoice_id: Uuid::new_v4(),
            amount,
            method: "cash".into(),
            reference: None,
            paid_at: Utc::now(),
            recorded_by: None,
            created_at: Utc::now(),
        }
    }

    fn adjustment(kind: &str, amount: Decimal) -> adjustments::Model {
        adjustments::Model {
            id: Uuid::new_v4(),
            invoice_id: Uuid::new_v4(),
            kind: kind.into(),
            amount,
            reason: "test".into(),
            applied_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_invoice_has_zero_totals() {
        let totals = compute_totals(&[], &[], &[]);
        assert_eq!(totals, InvoiceTotals::zero());
        assert_eq!(derive_status(&totals, false), InvoiceStatus::Open);
    }

    #[test]
    fn balance_subtracts_every_component() {
        let charges = vec![charge(2, dec!(500.00)), charge(1, dec!(1200.00))];
        let payments = vec![payment(dec!(600.00))];
        let adjustments = vec![
            adjustment("discount", dec!(100.00)),
            adjustment("write_off", dec!(50.00)),
            adjustment("refund", dec!(25.00)),
        ];

        let totals = compute_totals(&charges, &payments, &adjustments);
        assert_eq!(totals.subtotal, dec!(2200.00));
        assert_eq!(totals.total_discounts, dec!(100.00));
        assert_eq!(totals.total_write_offs, dec!(50.00));
        assert_eq!(totals.total_refunds, dec!(25.00));
        assert_eq!(totals.total_paid, dec!(600.00));
        assert_eq!(totals.balance_due, dec!(1425.00));
    }

    #[test]
    fn unknown_adjustment_kind_is_ignored() {
        let charges = vec![charge(1, dec!(100.00))];
        let adjustments = vec![adjustment("mystery", dec!(40.00))];
        let totals = compute_totals(&charges, &[], &adjustments);
        assert_eq!(totals.balance_due, dec!(100.00));
    }

    #[rstest::rstest]
    #[case::untouched(dec!(0.00), InvoiceStatus::Open)]
    #[case::partial(dec!(400.00), InvoiceStatus::PartiallyPaid)]
    #[case::settled(dec!(1000.00), InvoiceStatus::Paid)]
    #[case::overpaid(dec!(1200.00), InvoiceStatus::Paid)]
    fn status_transitions_follow_balance(#[case] paid: Decimal, #[case] expected: InvoiceStatus) {
        let charges = vec![charge(1, dec!(1000.00))];
        let payments = if paid.is_zero() {
            vec![]
        } else {
            vec![payment(paid)]
        };
        let totals = compute_totals(&charges, &payments, &[]);
        assert_eq!(derive_status(&totals, false), expected);
    }

    #[test]
    fn discount_alone_can_settle_an_invoice() {
        let charges = vec![charge(1, dec!(300.00))];
        let adjustments = vec![adjustment("discount", dec!(300.00))];
        let totals = compute_totals(&charges, &[], &adjustments);
        assert_eq!(totals.balance_due, Decimal::ZERO);
        assert_eq!(derive_status(&totals, false), InvoiceStatus::Paid);
    }

    #[test]
    fn void_wins_regardless_of_balance() {
        let charges = vec![charge(1, dec!(100.00))];
        let totals = compute_totals(&charges, &[payment(dec!(100.00))], &[]);
        assert_eq!(derive_status(&totals, true), InvoiceStatus::Void);
    }
}
