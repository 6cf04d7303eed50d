// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Minor-unit rounding helpers shared by the balance calculator and the
//! settlement planner.
//!
//! Amounts are [`Decimal`] throughout. Every rounding step uses banker's
//! rounding (round half to even), the same mode [`Decimal::round_dp`] uses.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Number of decimal places in a minor unit (cents).
pub const MINOR_UNIT_DP: u32 = 2;

/// One minor unit.
pub const CENT: Decimal = dec!(0.01);

/// Amounts at or below this magnitude are treated as zero by the planner.
pub const EPSILON: Decimal = dec!(0.000000001);

const ONE_HUNDRED: Decimal = dec!(100);

/// Rounds to the nearest minor unit, half to even.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MINOR_UNIT_DP, RoundingStrategy::MidpointNearestEven)
}

/// Returns `true` when `amount` is indistinguishable from zero.
pub fn is_negligible(amount: Decimal) -> bool {
    amount.abs() <= EPSILON
}

/// Converts percentage points into the share of `amount` they represent,
/// rounded to the minor unit.
///
/// Returns `None` if the product does not fit in a [`Decimal`].
pub fn percentage_of(amount: Decimal, percent: Decimal) -> Option<Decimal> {
    amount
        .checked_mul(percent)?
        .checked_div(ONE_HUNDRED)
        .map(round_cents)
}

/// Sums `values`, or `None` on overflow.
pub fn checked_sum(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(value))
}

/// Returns `true` when `percentages` add up to exactly one hundred.
pub fn is_whole(percentages: impl IntoIterator<Item = Decimal>) -> bool {
    checked_sum(percentages) == Some(ONE_HUNDRED)
}

/// Splits `amount` into `parts` minor-unit shares that sum exactly to the
/// rounded amount.
///
/// Every share starts at `amount / parts` truncated to the cent; the
/// leftover cents are handed out one at a time from the front, so the first
/// shares may be one cent larger than the rest.
///
/// ```
/// use expense_ledger::money::split_evenly;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(
///     split_evenly(dec!(10.00), 3),
///     vec![dec!(3.34), dec!(3.33), dec!(3.33)]
/// );
/// ```
pub fn split_evenly(amount: Decimal, parts: usize) -> Vec<Decimal> {
    if parts == 0 {
        return Vec::new();
    }

    let amount = round_cents(amount);
    let count = Decimal::from(parts);
    let base = (amount / count).round_dp_with_strategy(MINOR_UNIT_DP, RoundingStrategy::ToZero);

    let mut shares = vec![base; parts];
    reconcile(&mut shares, amount);
    shares
}

/// Nudges `shares` one cent at a time, front to back, until they sum to
/// `target`.
///
/// Only whole cents are moved; a sub-cent difference is left alone. Does
/// nothing for an empty slice or when the sum overflows.
pub fn reconcile(shares: &mut [Decimal], target: Decimal) {
    if shares.is_empty() {
        return;
    }

    let Some(mut residue) =
        checked_sum(shares.iter().copied()).and_then(|sum| target.checked_sub(sum))
    else {
        return;
    };
    let step = if residue.is_sign_negative() { -CENT } else { CENT };

    let mut idx = 0;
    while residue.abs() >= CENT {
        shares[idx % shares.len()] += step;
        residue -= step;
        idx += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_cents_uses_bankers_rounding() {
        assert_eq!(round_cents(dec!(0.125)), dec!(0.12));
        assert_eq!(round_cents(dec!(0.135)), dec!(0.14));
        assert_eq!(round_cents(dec!(-0.125)), dec!(-0.12));
        assert_eq!(round_cents(dec!(2.999)), dec!(3.00));
    }

    #[test]
    fn epsilon_is_one_billionth() {
        assert_eq!(EPSILON, Decimal::new(1, 9));
        assert!(is_negligible(dec!(0.0000000005)));
        assert!(is_negligible(-EPSILON));
        assert!(!is_negligible(dec!(0.00000001)));
    }

    #[test]
    fn split_evenly_gives_extra_cents_to_the_front() {
        assert_eq!(
            split_evenly(dec!(10.00), 3),
            vec![dec!(3.34), dec!(3.33), dec!(3.33)]
        );
        assert_eq!(
            split_evenly(dec!(0.05), 3),
            vec![dec!(0.02), dec!(0.02), dec!(0.01)]
        );
    }

    #[test]
    fn split_evenly_exact_division() {
        assert_eq!(
            split_evenly(dec!(90.00), 3),
            vec![dec!(30.00), dec!(30.00), dec!(30.00)]
        );
    }

    #[test]
    fn split_evenly_rounds_amount_first() {
        let shares = split_evenly(dec!(1.005), 2);
        // 1.005 rounds half-even to 1.00
        assert_eq!(shares.iter().copied().sum::<Decimal>(), dec!(1.00));
    }

    #[test]
    fn split_evenly_zero_parts_is_empty() {
        assert!(split_evenly(dec!(10.00), 0).is_empty());
    }

    #[test]
    fn split_evenly_negative_amount() {
        assert_eq!(
            split_evenly(dec!(-10.00), 3),
            vec![dec!(-3.34), dec!(-3.33), dec!(-3.33)]
        );
    }

    #[test]
    fn reconcile_removes_overshoot() {
        let mut shares = vec![dec!(3.34), dec!(3.34), dec!(3.34)];
        reconcile(&mut shares, dec!(10.00));
        assert_eq!(shares, vec![dec!(3.33), dec!(3.33), dec!(3.34)]);
    }

    #[test]
    fn reconcile_ignores_sub_cent_residue() {
        let mut shares = vec![dec!(5.00)];
        reconcile(&mut shares, dec!(5.004));
        assert_eq!(shares, vec![dec!(5.00)]);
    }

    #[test]
    fn percentage_helpers() {
        assert_eq!(percentage_of(dec!(200.00), dec!(50)), Some(dec!(100.00)));
        assert_eq!(percentage_of(dec!(10.00), dec!(33.333)), Some(dec!(3.33)));
        assert!(is_whole([dec!(33.33), dec!(33.33), dec!(33.34)]));
        assert!(!is_whole([dec!(50), dec!(40)]));
    }

    #[test]
    fn percentage_of_overflow_is_none() {
        let absurd = Decimal::from_i128_with_scale(10i128.pow(24), 0);
        assert_eq!(percentage_of(dec!(100000000.00), absurd), None);
        assert_eq!(percentage_of(Decimal::MAX, dec!(200)), None);
    }

    #[test]
    fn overflowing_sums_are_not_whole() {
        assert_eq!(checked_sum([Decimal::MAX, Decimal::ONE]), None);
        assert_eq!(checked_sum([dec!(1.50), dec!(2.50)]), Some(dec!(4.00)));
        assert!(!is_whole([Decimal::MAX, Decimal::MAX, dec!(100)]));
    }

    #[test]
    fn reconcile_leaves_overflowing_shares_alone() {
        let mut shares = vec![Decimal::MAX, Decimal::MAX];
        reconcile(&mut shares, dec!(10.00));
        assert_eq!(shares, vec![Decimal::MAX, Decimal::MAX]);
    }
}
