//! # Settlement Arithmetic
//!
//! Aggregates everything a guest owes at checkout.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  room_charge_due = paid online? 0 : reservation total                   │
//! │  extra_charges   = Σ extra_charge.amount                                │
//! │  activities      = Σ activity.local_price × participants                │
//! │                                                                         │
//! │  final_total     = room_charge_due + extra_charges + activities         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Activities are always settled at their local price, regardless of the
//! guest's residency or of the price computed when the activity was booked.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

/// One scheduled activity as seen by settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityLine {
    pub local_price: Money,
    pub participants: i64,
}

impl ActivityLine {
    /// `None` when price × participants overflows.
    #[inline]
    pub fn total(&self) -> Option<Money> {
        self.local_price.multiply_quantity(self.participants)
    }
}

/// Checkout breakdown, returned to the front desk for the receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SettlementBreakdown {
    /// Recorded reservation total.
    pub room_total: Money,
    /// Sum of prior online / web payments.
    pub paid_online: Money,
    pub has_paid_online: bool,
    /// Room total, or zero when prepaid online.
    pub room_charge_due: Money,
    pub extra_charges_total: Money,
    pub activities_total: Money,
    /// Amount collected at reception.
    pub final_total: Money,
}

impl SettlementBreakdown {
    /// Computes the breakdown.
    ///
    /// Fails with `AmountOverflow` rather than wrapping, so a settlement can
    /// never complete with a negative or truncated total.
    ///
    /// ## Example
    /// ```rust
    /// use hotelier_core::money::Money;
    /// use hotelier_core::settlement::{ActivityLine, SettlementBreakdown};
    ///
    /// let breakdown = SettlementBreakdown::compute(
    ///     Money::from_major_minor(1000, 0),
    ///     Money::zero(),
    ///     &[Money::from_major_minor(200, 0), Money::from_major_minor(50, 0)],
    ///     &[ActivityLine { local_price: Money::from_major_minor(300, 0), participants: 1 }],
    /// )
    /// .unwrap();
    /// assert_eq!(breakdown.final_total, Money::from_major_minor(1550, 0));
    /// ```
    pub fn compute(
        room_total: Money,
        paid_online: Money,
        extra_charges: &[Money],
        activities: &[ActivityLine],
    ) -> CoreResult<Self> {
        let has_paid_online = paid_online.is_positive();
        let room_charge_due = if has_paid_online {
            Money::zero()
        } else {
            room_total
        };
        let extra_charges_total =
            Money::checked_sum(extra_charges.iter().copied()).ok_or(CoreError::AmountOverflow)?;
        let activities_total = activities
            .iter()
            .map(ActivityLine::total)
            .try_fold(Money::zero(), |acc, line| acc.checked_add(line?))
            .ok_or(CoreError::AmountOverflow)?;
        let final_total = Money::checked_sum([room_charge_due, extra_charges_total, activities_total])
            .ok_or(CoreError::AmountOverflow)?;

        Ok(SettlementBreakdown {
            room_total,
            paid_online,
            has_paid_online,
            room_charge_due,
            extra_charges_total,
            activities_total,
            final_total,
        })
    }

    /// Whether a reception payment row must be written.
    #[inline]
    pub fn requires_payment(&self) -> bool {
        self.final_total.is_positive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn lkr(major: i64) -> Money {
        Money::from_major_minor(major, 0)
    }

    #[test]
    fn test_unpaid_reservation_aggregates_everything() {
        let b = SettlementBreakdown::compute(
            lkr(1000),
            Money::zero(),
            &[lkr(200), lkr(50)],
            &[ActivityLine {
                local_price: lkr(300),
                participants: 1,
            }],
        )
        .unwrap();

        assert!(!b.has_paid_online);
        assert_eq!(b.room_charge_due, lkr(1000));
        assert_eq!(b.extra_charges_total, lkr(250));
        assert_eq!(b.activities_total, lkr(300));
        assert_eq!(b.final_total, lkr(1550));
        assert!(b.requires_payment());
    }

    #[test]
    fn test_prepaid_reservation_skips_room_charge() {
        let b = SettlementBreakdown::compute(lkr(1000), lkr(1000), &[lkr(75)], &[]).unwrap();

        assert!(b.has_paid_online);
        assert_eq!(b.room_charge_due, Money::zero());
        assert_eq!(b.final_total, lkr(75));
    }

    #[test]
    fn test_prepaid_without_extras_needs_no_payment() {
        let b = SettlementBreakdown::compute(lkr(1000), lkr(1000), &[], &[]).unwrap();
        assert_eq!(b.final_total, Money::zero());
        assert!(!b.requires_payment());
    }

    #[test]
    fn test_activity_participants_multiply() {
        let b = SettlementBreakdown::compute(
            Money::zero(),
            Money::zero(),
            &[],
            &[
                ActivityLine {
                    local_price: lkr(2500),
                    participants: 3,
                },
                ActivityLine {
                    local_price: lkr(100),
                    participants: 1,
                },
            ],
        )
        .unwrap();
        assert_eq!(b.activities_total, lkr(7600));
    }

    #[test]
    fn test_overflowing_charges_fail_instead_of_wrapping() {
        let half = Money::from_cents(i64::MAX / 2 + 1);
        let result = SettlementBreakdown::compute(lkr(1000), Money::zero(), &[half, half], &[]);
        assert!(matches!(result, Err(CoreError::AmountOverflow)));

        let result = SettlementBreakdown::compute(
            Money::zero(),
            Money::zero(),
            &[],
            &[ActivityLine {
                local_price: lkr(40),
                participants: i64::MAX / 10,
            }],
        );
        assert!(matches!(result, Err(CoreError::AmountOverflow)));

        // Each part fits; the grand total does not.
        let result = SettlementBreakdown::compute(
            Money::from_cents(i64::MAX - 10),
            Money::zero(),
            &[lkr(1)],
            &[],
        );
        assert!(matches!(result, Err(CoreError::AmountOverflow)));
    }
}
