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

//! Expenses and split policies.
//!
//! An [`Expense`] is paid in full by one member and divided among its
//! participants according to a [`SplitPolicy`]:
//!
//! - [`SplitPolicy::Equal`]: evenly, extra cents to the first participants
//! - [`SplitPolicy::Percentage`]: percentage points per participant
//! - [`SplitPolicy::Amount`]: a fixed amount per participant
//!
//! # Example
//!
//! ```
//! use expense_ledger::{Expense, ExpenseId, MemberId, SplitPolicy};
//! use rust_decimal_macros::dec;
//!
//! let expense = Expense::new(
//!     ExpenseId(1),
//!     "Dinner",
//!     dec!(10.00),
//!     MemberId(1),
//!     vec![MemberId(1), MemberId(2), MemberId(3)],
//!     SplitPolicy::Equal,
//! );
//!
//! let shares = expense.shares();
//! assert_eq!(shares[0], (MemberId(1), dec!(3.34)));
//! assert_eq!(shares[1], (MemberId(2), dec!(3.33)));
//! ```

use crate::base::{ExpenseId, MemberId};
use crate::money::{self, round_cents};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// How an expense is divided among its participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "shares", rename_all = "lowercase")]
pub enum SplitPolicy {
    Equal,
    /// Percentage points per participant, expected to total 100.
    Percentage(BTreeMap<MemberId, Decimal>),
    /// Absolute amount per participant, expected to total the expense amount.
    Amount(BTreeMap<MemberId, Decimal>),
}

impl SplitPolicy {
    /// Custom-split entries, if the policy has any.
    pub fn custom_shares(&self) -> Option<&BTreeMap<MemberId, Decimal>> {
        match self {
            Self::Equal => None,
            Self::Percentage(shares) | Self::Amount(shares) => Some(shares),
        }
    }
}

/// A shared expense recorded in a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub title: String,
    pub amount: Decimal,
    pub payer: MemberId,
    pub participants: Vec<MemberId>,
    pub split: SplitPolicy,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(
        id: ExpenseId,
        title: impl Into<String>,
        amount: Decimal,
        payer: MemberId,
        participants: Vec<MemberId>,
        split: SplitPolicy,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            amount,
            payer,
            participants,
            split,
            created_at: Utc::now(),
        }
    }

    /// Participants in list order with duplicates removed.
    pub fn distinct_participants(&self) -> Vec<MemberId> {
        let mut seen = HashSet::with_capacity(self.participants.len());
        self.participants
            .iter()
            .copied()
            .filter(|member| seen.insert(*member))
            .collect()
    }

    /// Returns `true` if `member` pays for or takes part in this expense.
    pub fn involves(&self, member: MemberId) -> bool {
        self.payer == member || self.participants.contains(&member)
    }

    /// The amount each participant owes for this expense, in participant order.
    ///
    /// Shares are whole cents. No membership checks happen here: shares are
    /// produced for every listed participant, and a participant missing from
    /// a custom-split map owes zero. An expense without participants has no
    /// shares, and a percentage share too large to represent is left out.
    pub fn shares(&self) -> Vec<(MemberId, Decimal)> {
        let participants = self.distinct_participants();
        if participants.is_empty() {
            return Vec::new();
        }

        let amounts = match &self.split {
            SplitPolicy::Equal => money::split_evenly(self.amount, participants.len()),
            SplitPolicy::Percentage(percentages) => {
                return self.percentage_shares(participants, percentages);
            }
            SplitPolicy::Amount(amounts) => participants
                .iter()
                .map(|member| round_cents(amounts.get(member).copied().unwrap_or(Decimal::ZERO)))
                .collect(),
        };

        participants.into_iter().zip(amounts).collect()
    }

    fn percentage_shares(
        &self,
        participants: Vec<MemberId>,
        percentages: &BTreeMap<MemberId, Decimal>,
    ) -> Vec<(MemberId, Decimal)> {
        let mut members = Vec::with_capacity(participants.len());
        let mut points = Vec::with_capacity(participants.len());
        let mut shares = Vec::with_capacity(participants.len());

        for member in participants {
            let percent = percentages.get(&member).copied().unwrap_or(Decimal::ZERO);
            match money::percentage_of(self.amount, percent) {
                Some(share) => {
                    members.push(member);
                    points.push(percent);
                    shares.push(share);
                }
                None => tracing::debug!(
                    expense = %self.id,
                    participant = %member,
                    %percent,
                    "skipping share that overflows"
                ),
            }
        }

        // Only a complete split is pulled back onto the amount; a partial
        // one is trusted as given.
        if money::is_whole(points.iter().copied()) {
            reconcile_nonzero(&mut shares, &points, round_cents(self.amount));
        }
        members.into_iter().zip(shares).collect()
    }
}

/// Reconciles only the shares whose weight is non-zero, so a participant on
/// 0% never picks up a rounding cent.
fn reconcile_nonzero(shares: &mut [Decimal], weights: &[Decimal], target: Decimal) {
    let mut weighted: Vec<Decimal> = shares
        .iter()
        .zip(weights)
        .filter(|(_, weight)| !weight.is_zero())
        .map(|(share, _)| *share)
        .collect();
    let fixed: Decimal = shares
        .iter()
        .zip(weights)
        .filter(|(_, weight)| weight.is_zero())
        .map(|(share, _)| *share)
        .sum();

    money::reconcile(&mut weighted, target - fixed);

    let mut adjusted = weighted.into_iter();
    for (share, weight) in shares.iter_mut().zip(weights) {
        if !weight.is_zero() {
            if let Some(value) = adjusted.next() {
                *share = value;
            }
        }
    }
}
