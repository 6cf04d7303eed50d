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

//! Settlement planning.
//!
//! Turns balances into a short list of point-to-point transfers that zero
//! every balance, using greedy debt netting:
//!
//! 1. Offset the balances by every settlement already completed.
//! 2. Split members into debtors and creditors, each sorted smallest first.
//! 3. Walk both lists, transferring `min(owed, due)` at each step.
//!
//! The plan has at most `debtors + creditors - 1` entries. It is not
//! guaranteed to be the global minimum, but it is deterministic.

use crate::balance::Balances;
use crate::base::MemberId;
use crate::money::is_negligible;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A transfer of `amount` from one member to another.
///
/// As a plan entry it is a recommendation, recomputed on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub from: MemberId,
    pub to: MemberId,
    pub amount: Decimal,
}

impl Settlement {
    pub fn new(from: MemberId, to: MemberId, amount: Decimal) -> Self {
        Self { from, to, amount }
    }
}

/// A settlement that has actually been paid.
///
/// Records are append-only: once created they are never edited or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    #[serde(flatten)]
    pub settlement: Settlement,
    #[serde(default = "Utc::now")]
    pub settled_at: DateTime<Utc>,
}

impl SettlementRecord {
    pub fn new(settlement: Settlement, settled_at: DateTime<Utc>) -> Self {
        Self {
            settlement,
            settled_at,
        }
    }

    pub fn from(&self) -> MemberId {
        self.settlement.from
    }

    pub fn to(&self) -> MemberId {
        self.settlement.to
    }

    pub fn amount(&self) -> Decimal {
        self.settlement.amount
    }
}

/// Plans the transfers that would bring every balance to zero.
///
/// Completed settlements are applied first: the payer's balance rises and
/// the receiver's falls by the amount already paid. A completed record for a
/// member missing from `balances` still counts, starting that member at zero.
///
/// Transfers of [`EPSILON`](crate::money::EPSILON) or less are never
/// emitted. Never fails; settled
/// balances yield an empty plan.
///
/// # Example
///
/// ```
/// use expense_ledger::{compute_settlement_plan, Balances, MemberId, Settlement};
/// use rust_decimal_macros::dec;
///
/// let balances: Balances = [
///     (MemberId(1), dec!(60.00)),
///     (MemberId(2), dec!(-30.00)),
///     (MemberId(3), dec!(-30.00)),
/// ]
/// .into_iter()
/// .collect();
///
/// let plan = compute_settlement_plan(&balances, &[]);
/// assert_eq!(
///     plan,
///     vec![
///         Settlement::new(MemberId(2), MemberId(1), dec!(30.00)),
///         Settlement::new(MemberId(3), MemberId(1), dec!(30.00)),
///     ]
/// );
/// ```
pub fn compute_settlement_plan(
    balances: &Balances,
    completed: &[SettlementRecord],
) -> Vec<Settlement> {
    let mut working: BTreeMap<MemberId, Decimal> = balances.iter().collect();
    for record in completed {
        let from = working.entry(record.from()).or_insert(Decimal::ZERO);
        *from = from.saturating_add(record.amount());
        let to = working.entry(record.to()).or_insert(Decimal::ZERO);
        *to = to.saturating_sub(record.amount());
    }

    let mut debtors: Vec<(MemberId, Decimal)> = working
        .iter()
        .filter(|(_, balance)| **balance < Decimal::ZERO)
        .map(|(member, balance)| (*member, -*balance))
        .collect();
    let mut creditors: Vec<(MemberId, Decimal)> = working
        .iter()
        .filter(|(_, balance)| **balance > Decimal::ZERO)
        .map(|(member, balance)| (*member, *balance))
        .collect();

    // Stable sorts: equal amounts keep member id order.
    debtors.sort_by(|a, b| a.1.cmp(&b.1));
    creditors.sort_by(|a, b| a.1.cmp(&b.1));

    let mut plan = Vec::with_capacity(debtors.len() + creditors.len());
    let (mut d, mut c) = (0, 0);

    while d < debtors.len() && c < creditors.len() {
        let (debtor, owed) = &mut debtors[d];
        let (creditor, due) = &mut creditors[c];
        let amount = (*owed).min(*due);

        if !is_negligible(amount) {
            plan.push(Settlement::new(*debtor, *creditor, amount));
        }

        *owed -= amount;
        *due -= amount;

        if is_negligible(*owed) {
            d += 1;
        }
        if is_negligible(*due) {
            c += 1;
        }
    }

    tracing::trace!(
        debtors = debtors.len(),
        creditors = creditors.len(),
        transfers = plan.len(),
        "computed settlement plan"
    );

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn balances(entries: &[(u32, Decimal)]) -> Balances {
        entries
            .iter()
            .map(|(id, amount)| (MemberId(*id), *amount))
            .collect()
    }

    fn completed(from: u32, to: u32, amount: Decimal) -> SettlementRecord {
        SettlementRecord::new(
            Settlement::new(MemberId(from), MemberId(to), amount),
            Utc::now(),
        )
    }

    #[test]
    fn settled_balances_yield_empty_plan() {
        let plan = compute_settlement_plan(&balances(&[(1, dec!(0)), (2, dec!(0))]), &[]);
        assert!(plan.is_empty());
        assert!(compute_settlement_plan(&Balances::new(), &[]).is_empty());
    }

    #[test]
    fn smallest_debtor_pays_smallest_creditor_first() {
        let plan = compute_settlement_plan(
            &balances(&[
                (1, dec!(50.00)),
                (2, dec!(10.00)),
                (3, dec!(-40.00)),
                (4, dec!(-20.00)),
            ]),
            &[],
        );
        assert_eq!(
            plan,
            vec![
                Settlement::new(MemberId(4), MemberId(2), dec!(10.00)),
                Settlement::new(MemberId(4), MemberId(1), dec!(10.00)),
                Settlement::new(MemberId(3), MemberId(1), dec!(40.00)),
            ]
        );
    }

    #[test]
    fn exact_match_advances_both_sides() {
        let plan = compute_settlement_plan(
            &balances(&[
                (1, dec!(30.00)),
                (2, dec!(70.00)),
                (3, dec!(-30.00)),
                (4, dec!(-70.00)),
            ]),
            &[],
        );
        assert_eq!(
            plan,
            vec![
                Settlement::new(MemberId(3), MemberId(1), dec!(30.00)),
                Settlement::new(MemberId(4), MemberId(2), dec!(70.00)),
            ]
        );
    }

    #[test]
    fn completed_settlement_discharges_debt() {
        let plan = compute_settlement_plan(
            &balances(&[(1, dec!(-30.00)), (2, dec!(30.00))]),
            &[completed(1, 2, dec!(30.00))],
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn partial_completed_settlements_are_additive() {
        let plan = compute_settlement_plan(
            &balances(&[(1, dec!(-30.00)), (2, dec!(30.00))]),
            &[completed(1, 2, dec!(10.00)), completed(1, 2, dec!(5.00))],
        );
        assert_eq!(
            plan,
            vec![Settlement::new(MemberId(1), MemberId(2), dec!(15.00))]
        );
    }

    #[test]
    fn overpayment_reverses_direction() {
        let plan = compute_settlement_plan(
            &balances(&[(1, dec!(-30.00)), (2, dec!(30.00))]),
            &[completed(1, 2, dec!(40.00))],
        );
        assert_eq!(
            plan,
            vec![Settlement::new(MemberId(2), MemberId(1), dec!(10.00))]
        );
    }

    #[test]
    fn completed_settlement_for_unknown_member_still_counts() {
        let plan = compute_settlement_plan(
            &balances(&[(1, dec!(0))]),
            &[completed(1, 9, dec!(5.00))],
        );
        assert_eq!(
            plan,
            vec![Settlement::new(MemberId(9), MemberId(1), dec!(5.00))]
        );
    }

    #[test]
    fn noise_below_epsilon_is_suppressed() {
        let plan = compute_settlement_plan(
            &balances(&[(1, dec!(0.0000000001)), (2, dec!(-0.0000000001))]),
            &[],
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn transfer_of_exactly_epsilon_is_suppressed() {
        let epsilon = crate::money::EPSILON;
        let plan = compute_settlement_plan(&balances(&[(1, epsilon), (2, -epsilon)]), &[]);
        assert!(plan.is_empty());

        let above = epsilon * dec!(2);
        let plan = compute_settlement_plan(&balances(&[(1, above), (2, -above)]), &[]);
        assert_eq!(plan, vec![Settlement::new(MemberId(2), MemberId(1), above)]);
    }

    #[test]
    fn oversized_completed_records_saturate() {
        let plan = compute_settlement_plan(
            &balances(&[(1, Decimal::MAX), (2, dec!(0))]),
            &[completed(2, 1, Decimal::MAX), completed(2, 1, Decimal::MAX)],
        );
        assert_eq!(
            plan,
            vec![Settlement::new(MemberId(1), MemberId(2), Decimal::MAX)]
        );
    }

    #[test]
    fn record_serializes_flat() {
        let record = completed(1, 2, dec!(12.50));
        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["from"], 1);
        assert_eq!(json["to"], 2);
        assert_eq!(json["amount"], "12.50");
        assert!(json.get("settled_at").is_some());
    }
}
