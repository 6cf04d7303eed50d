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

//! Group state.
//!
//! A [`Group`] owns one group's members, expenses, completed settlements and
//! activity log. Every operation takes the group's lock exactly once, so
//! concurrent mutations of the same group are serialized and a settlement
//! plan is always derived from a consistent view of the completed list.
//!
//! # Example
//!
//! ```
//! use expense_ledger::{Expense, ExpenseId, Group, GroupId, Member, MemberId, SplitPolicy};
//! use rust_decimal_macros::dec;
//!
//! let group = Group::new(GroupId(1), "Trip");
//! group.add_member(Member::new(MemberId(1), "Alice")).unwrap();
//! group.add_member(Member::new(MemberId(2), "Bob")).unwrap();
//! group
//!     .add_expense(Expense::new(
//!         ExpenseId(1),
//!         "Fuel",
//!         dec!(60.00),
//!         MemberId(1),
//!         vec![MemberId(1), MemberId(2)],
//!         SplitPolicy::Equal,
//!     ))
//!     .unwrap();
//!
//! let plan = group.settlement_plan();
//! assert_eq!(plan.len(), 1);
//! group.record_settlement(plan[0]).unwrap();
//! assert!(group.settlement_plan().is_empty());
//! ```

use crate::activity::{Activity, ActivityKind};
use crate::balance::{Balances, compute_balances};
use crate::base::{ExpenseId, GroupId, MemberId};
use crate::error::LedgerError;
use crate::expense::{Expense, SplitPolicy};
use crate::member::Member;
use crate::money::{self, round_cents};
use crate::settlement::{Settlement, SettlementRecord, compute_settlement_plan};
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

/// Owned copy of a group's state, for persistence hand-off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    #[serde(default)]
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub settlements: Vec<SettlementRecord>,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

#[derive(Debug)]
struct GroupData {
    name: String,
    members: Vec<Member>,
    expenses: Vec<Expense>,
    /// Append-only.
    settlements: Vec<SettlementRecord>,
    /// Append-only.
    activities: Vec<Activity>,
}

impl GroupData {
    fn new(name: String) -> Self {
        Self {
            name,
            members: Vec::new(),
            expenses: Vec::new(),
            settlements: Vec::new(),
            activities: Vec::new(),
        }
    }

    fn member_index(&self, id: MemberId) -> Option<usize> {
        self.members.iter().position(|member| member.id == id)
    }

    fn expense_index(&self, id: ExpenseId) -> Option<usize> {
        self.expenses.iter().position(|expense| expense.id == id)
    }

    fn has_member(&self, id: MemberId) -> bool {
        self.member_index(id).is_some()
    }

    fn log(&mut self, kind: ActivityKind) {
        self.activities.push(Activity::now(kind));
    }

    /// Checks an expense the way the entry form would before saving it.
    fn validate_expense(&self, expense: &Expense) -> Result<(), LedgerError> {
        if expense.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        if expense.participants.is_empty() {
            return Err(LedgerError::NoParticipants);
        }
        if !self.has_member(expense.payer) {
            return Err(LedgerError::UnknownMember(expense.payer));
        }
        if let Some(unknown) = expense
            .participants
            .iter()
            .find(|participant| !self.has_member(**participant))
        {
            return Err(LedgerError::UnknownMember(*unknown));
        }

        let Some(custom) = expense.split.custom_shares() else {
            return Ok(());
        };
        if custom
            .iter()
            .any(|(member, share)| !expense.participants.contains(member) || *share < Decimal::ZERO)
        {
            return Err(LedgerError::SplitMismatch);
        }

        let balanced = match &expense.split {
            SplitPolicy::Equal => true,
            SplitPolicy::Percentage(percentages) => money::is_whole(percentages.values().copied()),
            SplitPolicy::Amount(amounts) => {
                money::checked_sum(amounts.values().copied().map(round_cents))
                    == Some(round_cents(expense.amount))
            }
        };
        if !balanced {
            return Err(LedgerError::SplitMismatch);
        }

        Ok(())
    }

    fn validate_settlement(&self, settlement: &Settlement) -> Result<(), LedgerError> {
        if settlement.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        if settlement.from == settlement.to {
            return Err(LedgerError::SelfSettlement);
        }
        for member in [settlement.from, settlement.to] {
            if !self.has_member(member) {
                return Err(LedgerError::UnknownMember(member));
            }
        }
        Ok(())
    }
}

/// A group of people sharing expenses.
#[derive(Debug)]
pub struct Group {
    id: GroupId,
    inner: Mutex<GroupData>,
}

impl Group {
    pub fn new(id: GroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            inner: Mutex::new(GroupData::new(name.into())),
        }
    }

    /// Rebuilds a group from persisted state.
    ///
    /// Persisted data is trusted as-is; stale references are tolerated by
    /// the balance calculation rather than rejected here.
    pub fn restore(snapshot: GroupSnapshot) -> Self {
        Self {
            id: snapshot.id,
            inner: Mutex::new(GroupData {
                name: snapshot.name,
                members: snapshot.members,
                expenses: snapshot.expenses,
                settlements: snapshot.settlements,
                activities: snapshot.activities,
            }),
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn name(&self) -> String {
        self.inner.lock().name.clone()
    }

    pub fn member(&self, id: MemberId) -> Option<Member> {
        let data = self.inner.lock();
        data.member_index(id).map(|idx| data.members[idx].clone())
    }

    pub fn members(&self) -> Vec<Member> {
        self.inner.lock().members.clone()
    }

    pub fn expenses(&self) -> Vec<Expense> {
        self.inner.lock().expenses.clone()
    }

    /// Completed settlements, oldest first.
    pub fn settlements(&self) -> Vec<SettlementRecord> {
        self.inner.lock().settlements.clone()
    }

    /// Audit log, oldest first.
    pub fn activities(&self) -> Vec<Activity> {
        self.inner.lock().activities.clone()
    }

    pub fn snapshot(&self) -> GroupSnapshot {
        let data = self.inner.lock();
        GroupSnapshot {
            id: self.id,
            name: data.name.clone(),
            members: data.members.clone(),
            expenses: data.expenses.clone(),
            settlements: data.settlements.clone(),
            activities: data.activities.clone(),
        }
    }

    /// Current balance of every member.
    pub fn balances(&self) -> Balances {
        let data = self.inner.lock();
        compute_balances(&data.members, &data.expenses)
    }

    /// Transfers that would settle the group, after completed settlements.
    pub fn settlement_plan(&self) -> Vec<Settlement> {
        let data = self.inner.lock();
        let balances = compute_balances(&data.members, &data.expenses);
        compute_settlement_plan(&balances, &data.settlements)
    }

    /// # Errors
    ///
    /// [`LedgerError::DuplicateMember`] if the ID is taken.
    pub fn add_member(&self, member: Member) -> Result<(), LedgerError> {
        let mut data = self.inner.lock();
        if data.has_member(member.id) {
            return Err(LedgerError::DuplicateMember(member.id));
        }

        data.log(ActivityKind::MemberAdded {
            member: member.id,
            name: member.name.clone(),
        });
        data.members.push(member);
        Ok(())
    }

    /// # Errors
    ///
    /// [`LedgerError::MemberNotFound`] for an unknown member.
    pub fn rename_member(&self, id: MemberId, name: impl Into<String>) -> Result<(), LedgerError> {
        let mut data = self.inner.lock();
        let idx = data
            .member_index(id)
            .ok_or(LedgerError::MemberNotFound(id))?;

        let name = name.into();
        let previous = std::mem::replace(&mut data.members[idx].name, name.clone());
        data.log(ActivityKind::MemberRenamed {
            member: id,
            from: previous,
            to: name,
        });
        Ok(())
    }

    /// Removes a member who no longer appears in any expense.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::MemberNotFound`] for an unknown member.
    /// - [`LedgerError::MemberInUse`] if an expense still refers to them.
    pub fn remove_member(&self, id: MemberId) -> Result<Member, LedgerError> {
        let mut data = self.inner.lock();
        let idx = data
            .member_index(id)
            .ok_or(LedgerError::MemberNotFound(id))?;
        if data.expenses.iter().any(|expense| expense.involves(id)) {
            return Err(LedgerError::MemberInUse(id));
        }

        let member = data.members.remove(idx);
        data.log(ActivityKind::MemberRemoved {
            member: id,
            name: member.name.clone(),
        });
        Ok(member)
    }

    /// # Errors
    ///
    /// - [`LedgerError::DuplicateExpense`] if the ID is taken.
    /// - [`LedgerError::InvalidAmount`] for a zero or negative amount.
    /// - [`LedgerError::NoParticipants`] for an empty participant list.
    /// - [`LedgerError::UnknownMember`] if payer or a participant is not a member.
    /// - [`LedgerError::SplitMismatch`] if a custom split does not add up.
    pub fn add_expense(&self, expense: Expense) -> Result<(), LedgerError> {
        let mut data = self.inner.lock();
        if data.expense_index(expense.id).is_some() {
            return Err(LedgerError::DuplicateExpense(expense.id));
        }
        data.validate_expense(&expense)?;

        data.log(ActivityKind::ExpenseAdded {
            expense: expense.id,
            title: expense.title.clone(),
            amount: expense.amount,
        });
        data.expenses.push(expense);
        Ok(())
    }

    /// Replaces the expense with the same ID.
    ///
    /// # Errors
    ///
    /// [`LedgerError::ExpenseNotFound`] for an unknown expense, otherwise the
    /// same checks as [`Group::add_expense`].
    pub fn update_expense(&self, expense: Expense) -> Result<(), LedgerError> {
        let mut data = self.inner.lock();
        let idx = data
            .expense_index(expense.id)
            .ok_or(LedgerError::ExpenseNotFound(expense.id))?;
        data.validate_expense(&expense)?;

        data.log(ActivityKind::ExpenseUpdated {
            expense: expense.id,
            title: expense.title.clone(),
            amount: expense.amount,
        });
        data.expenses[idx] = expense;
        Ok(())
    }

    /// # Errors
    ///
    /// [`LedgerError::ExpenseNotFound`] for an unknown expense.
    pub fn remove_expense(&self, id: ExpenseId) -> Result<Expense, LedgerError> {
        let mut data = self.inner.lock();
        let idx = data
            .expense_index(id)
            .ok_or(LedgerError::ExpenseNotFound(id))?;

        let expense = data.expenses.remove(idx);
        data.log(ActivityKind::ExpenseRemoved {
            expense: id,
            title: expense.title.clone(),
        });
        Ok(expense)
    }

    /// Records that `settlement` has been paid.
    ///
    /// The record is appended under the group lock, so concurrent calls are
    /// never lost. Earlier plans are unaffected; every later plan accounts
    /// for it.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] for a zero or negative amount.
    /// - [`LedgerError::SelfSettlement`] if `from` and `to` are the same.
    /// - [`LedgerError::UnknownMember`] if either side is not a member.
    pub fn record_settlement(&self, settlement: Settlement) -> Result<SettlementRecord, LedgerError> {
        let mut data = self.inner.lock();
        data.validate_settlement(&settlement)?;

        let record = SettlementRecord::new(settlement, Utc::now());
        data.settlements.push(record);
        data.log(ActivityKind::SettlementRecorded {
            from: settlement.from,
            to: settlement.to,
            amount: settlement.amount,
        });

        tracing::info!(
            group = %self.id,
            from = %settlement.from,
            to = %settlement.to,
            amount = %settlement.amount,
            "settlement recorded"
        );
        Ok(record)
    }
}

impl Serialize for Group {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let data = self.inner.lock();
        let mut state = serializer.serialize_struct("Group", 6)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("name", &data.name)?;
        state.serialize_field("members", &data.members)?;
        state.serialize_field("expenses", &data.expenses)?;
        state.serialize_field("settlements", &data.settlements)?;
        state.serialize_field("activities", &data.activities)?;
        state.end()
    }
}
