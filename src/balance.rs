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

//! Balance calculation.
//!
//! Reduces a group's expense history to one signed balance per member:
//!
//! - **Positive**: the group owes the member.
//! - **Negative**: the member owes the group.
//! - **Zero**: settled.
//!
//! Each expense credits its payer with the full amount and debits every
//! participant their share, so the balances of a consistent history sum to
//! zero. Stale member references are skipped instead of failing the whole
//! computation.
//!
//! # Example
//!
//! ```
//! use expense_ledger::{compute_balances, Expense, ExpenseId, Member, MemberId, SplitPolicy};
//! use rust_decimal_macros::dec;
//!
//! let members = vec![
//!     Member::new(MemberId(1), "Alice"),
//!     Member::new(MemberId(2), "Bob"),
//! ];
//! let expenses = vec![Expense::new(
//!     ExpenseId(1),
//!     "Groceries",
//!     dec!(40.00),
//!     MemberId(1),
//!     vec![MemberId(1), MemberId(2)],
//!     SplitPolicy::Equal,
//! )];
//!
//! let balances = compute_balances(&members, &expenses);
//! assert_eq!(balances.get(MemberId(1)), Some(dec!(20.00)));
//! assert_eq!(balances.get(MemberId(2)), Some(dec!(-20.00)));
//! ```

use crate::base::MemberId;
use crate::expense::Expense;
use crate::member::Member;
use crate::money::round_cents;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::btree_map;

/// Net position of every member of a group, in member id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Balances(BTreeMap<MemberId, Decimal>);

impl Balances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, member: MemberId) -> Option<Decimal> {
        self.0.get(&member).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MemberId, Decimal)> + '_ {
        self.0.iter().map(|(member, balance)| (*member, *balance))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all balances. Zero for a consistent history. Saturates
    /// instead of overflowing.
    pub fn total(&self) -> Decimal {
        self.0
            .values()
            .fold(Decimal::ZERO, |acc, balance| acc.saturating_add(*balance))
    }

    /// Returns `true` when every balance is zero.
    pub fn is_settled(&self) -> bool {
        self.0.values().all(Decimal::is_zero)
    }
}

impl FromIterator<(MemberId, Decimal)> for Balances {
    fn from_iter<I: IntoIterator<Item = (MemberId, Decimal)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Balances {
    type Item = (MemberId, Decimal);
    type IntoIter = btree_map::IntoIter<MemberId, Decimal>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Computes every member's balance from the group's expenses.
///
/// Never fails. A payer or participant that is not in `members` is left out
/// of that expense; the equal-split divisor still counts them, so the known
/// members owe exactly what they would have owed otherwise. The result is
/// independent of expense order.
pub fn compute_balances(members: &[Member], expenses: &[Expense]) -> Balances {
    let mut balances: BTreeMap<MemberId, Decimal> = members
        .iter()
        .map(|member| (member.id, Decimal::ZERO))
        .collect();

    for expense in expenses {
        apply_expense(&mut balances, expense);
    }

    for balance in balances.values_mut() {
        *balance = round_cents(*balance);
    }

    Balances(balances)
}

fn apply_expense(balances: &mut BTreeMap<MemberId, Decimal>, expense: &Expense) {
    match balances.get_mut(&expense.payer) {
        Some(balance) => credit(balance, round_cents(expense.amount), expense),
        None => tracing::debug!(
            expense = %expense.id,
            payer = %expense.payer,
            "skipping credit to unknown payer"
        ),
    }

    for (participant, share) in expense.shares() {
        match balances.get_mut(&participant) {
            Some(balance) => credit(balance, -share, expense),
            None => tracing::debug!(
                expense = %expense.id,
                participant = %participant,
                "skipping debit of unknown participant"
            ),
        }
    }
}

/// Adds `delta` to `balance`, skipping it if the result would overflow.
fn credit(balance: &mut Decimal, delta: Decimal, expense: &Expense) {
    match balance.checked_add(delta) {
        Some(updated) => *balance = updated,
        None => tracing::debug!(
            expense = %expense.id,
            %delta,
            "skipping balance update that overflows"
        ),
    }
}
