//! Property tests for the derived invoice arithmetic.

use chrono::Utc;
use clinic_admin_api::entities::{adjustments, payments, treatment_charges};
use clinic_admin_api::services::invoice_totals::{
    compute_totals, derive_status, InvoiceStatus,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

fn cents(raw: i64) -> Decimal {
    Decimal::new(raw, 2)
}

fn charge(quantity: i32, unit_price_cents: i64) -> treatment_charges::Model {
    treatment_charges::Model {
        id: Uuid::new_v4(),
        invoice_id: Uuid::nil(),
        description: "charge".into(),
        quantity,
        unit_price: cents(unit_price_cents),
        created_at: Utc::now(),
    }
}

fn payment(amount_cents: i64) -> payments::Model {
    payments::Model {
        id: Uuid::new_v4(),
        invoice_id: Uuid::nil(),
        amount: cents(amount_cents),
        method: "cash".into(),
        reference: None,
        paid_at: Utc::now(),
        recorded_by: None,
        created_at: Utc::now(),
    }
}

fn adjustment(kind: &str, amount_cents: i64) -> adjustments::Model {
    adjustments::Model {
        id: Uuid::new_v4(),
        invoice_id: Uuid::nil(),
        kind: kind.into(),
        amount: cents(amount_cents),
        reason: "test".into(),
        applied_by: None,
        created_at: Utc::now(),
    }
}

prop_compose! {
    fn arb_charges()(parts in prop::collection::vec((1..20i32, 1..500_000i64), 0..8))
        -> Vec<treatment_charges::Model>
    {
        parts.into_iter().map(|(q, p)| charge(q, p)).collect()
    }
}

prop_compose! {
    fn arb_payments()(amounts in prop::collection::vec(1..500_000i64, 0..8))
        -> Vec<payments::Model>
    {
        amounts.into_iter().map(payment).collect()
    }
}

prop_compose! {
    fn arb_adjustments()(rows in prop::collection::vec((0..3usize, 1..500_000i64), 0..8))
        -> Vec<adjustments::Model>
    {
        rows.into_iter()
            .map(|(kind, amount)| adjustment(["discount", "write_off", "refund"][kind], amount))
            .collect()
    }
}

proptest! {
    /// The balance is always the subtotal less every deduction and payment.
    #[test]
    fn balance_equation_holds(
        charges in arb_charges(),
        payments in arb_payments(),
        adjustments in arb_adjustments(),
    ) {
        let totals = compute_totals(&charges, &payments, &adjustments);

        let subtotal: Decimal = charges
            .iter()
            .map(|c| c.unit_price * Decimal::from(c.quantity))
            .sum();
        prop_assert_eq!(totals.subtotal, subtotal);
        prop_assert_eq!(
            totals.balance_due,
            totals.subtotal
                - totals.total_discounts
                - totals.total_write_offs
                - totals.total_refunds
                - totals.total_paid
        );
    }

    /// Derived status is consistent with the totals it comes from.
    #[test]
    fn status_tracks_totals(
        charges in arb_charges(),
        payments in arb_payments(),
        adjustments in arb_adjustments(),
    ) {
        let totals = compute_totals(&charges, &payments, &adjustments);
        let status = derive_status(&totals, false);

        match status {
            InvoiceStatus::Paid => {
                prop_assert!(totals.balance_due <= Decimal::ZERO);
                prop_assert!(totals.subtotal > Decimal::ZERO);
            }
            InvoiceStatus::PartiallyPaid => {
                prop_assert!(totals.total_paid > Decimal::ZERO);
                prop_assert!(totals.balance_due > Decimal::ZERO || totals.subtotal <= Decimal::ZERO);
            }
            InvoiceStatus::Open => {
                prop_assert_eq!(totals.total_paid, Decimal::ZERO);
            }
            InvoiceStatus::Void => prop_assert!(false, "void is never derived from totals"),
        }
    }

    /// Void always wins, whatever the money says.
    #[test]
    fn void_flag_overrides_totals(
        charges in arb_charges(),
        payments in arb_payments(),
    ) {
        let totals = compute_totals(&charges, &payments, &[]);
        prop_assert_eq!(derive_status(&totals, true), InvoiceStatus::Void);
    }

    /// Adjustment kinds the computation does not know are left out of totals.
    #[test]
    fn unknown_adjustment_kinds_are_ignored(amount in 1..500_000i64) {
        let rows = vec![adjustment("rebate", amount)];
        let totals = compute_totals(&[], &[], &rows);
        prop_assert_eq!(totals.total_discounts, Decimal::ZERO);
        prop_assert_eq!(totals.total_write_offs, Decimal::ZERO);
        prop_assert_eq!(totals.total_refunds, Decimal::ZERO);
    }
}
