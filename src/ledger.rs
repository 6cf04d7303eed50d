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

//! Multi-group store.
//!
//! The [`Ledger`] holds every group and exposes the three operations the
//! surrounding application needs:
//!
//! | Operation | Result |
//! |-----------|--------|
//! | [`Ledger::compute_balances`] | per-member balance, 2 dp |
//! | [`Ledger::compute_settlement_plan`] | ordered transfers |
//! | [`Ledger::record_settlement_completed`] | appends a completed settlement |
//!
//! # Thread Safety
//!
//! Groups live in a [`DashMap`], so different groups are accessed in
//! parallel. Within a group, each [`Group`] serializes its own mutations.

use crate::balance::Balances;
use crate::base::GroupId;
use crate::error::LedgerError;
use crate::group::Group;
use crate::settlement::{Settlement, SettlementRecord};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Store of expense-sharing groups.
///
/// # Invariants
///
/// - Group IDs are unique.
/// - Completed settlements are only ever appended.
/// - Balances and plans are derived on every call, never stored.
pub struct Ledger {
    groups: DashMap<GroupId, Group>,
}

impl Ledger {
    /// Creates a ledger with no groups.
    pub fn new() -> Self {
        Ledger {
            groups: DashMap::new(),
        }
    }

    /// Creates an empty group.
    ///
    /// # Errors
    ///
    /// [`LedgerError::DuplicateGroup`] if the ID is taken.
    pub fn create_group(&self, id: GroupId, name: impl Into<String>) -> Result<(), LedgerError> {
        self.insert_group(Group::new(id, name))
    }

    /// Adds an existing group, e.g. one restored from storage.
    ///
    /// # Errors
    ///
    /// [`LedgerError::DuplicateGroup`] if the ID is taken.
    pub fn insert_group(&self, group: Group) -> Result<(), LedgerError> {
        // Entry API keeps check-and-insert atomic.
        match self.groups.entry(group.id()) {
            Entry::Occupied(_) => Err(LedgerError::DuplicateGroup(group.id())),
            Entry::Vacant(entry) => {
                entry.insert(group);
                Ok(())
            }
        }
    }

    /// Retrieves a group by ID.
    pub fn group(&self, id: &GroupId) -> Option<dashmap::mapref::one::Ref<'_, GroupId, Group>> {
        self.groups.get(id)
    }

    /// Returns an iterator over all groups.
    pub fn groups(&self) -> impl Iterator<Item = dashmap::mapref::multiple::RefMulti<'_, GroupId, Group>> {
        self.groups.iter()
    }

    /// # Errors
    ///
    /// [`LedgerError::GroupNotFound`] for an unknown group.
    pub fn compute_balances(&self, id: &GroupId) -> Result<Balances, LedgerError> {
        Ok(self.existing(id)?.balances())
    }

    /// # Errors
    ///
    /// [`LedgerError::GroupNotFound`] for an unknown group.
    pub fn compute_settlement_plan(&self, id: &GroupId) -> Result<Vec<Settlement>, LedgerError> {
        Ok(self.existing(id)?.settlement_plan())
    }

    /// Records a paid settlement against a group.
    ///
    /// # Errors
    ///
    /// [`LedgerError::GroupNotFound`] for an unknown group, otherwise see
    /// [`Group::record_settlement`].
    pub fn record_settlement_completed(
        &self,
        id: &GroupId,
        settlement: Settlement,
    ) -> Result<SettlementRecord, LedgerError> {
        self.existing(id)?.record_settlement(settlement)
    }

    fn existing(
        &self,
        id: &GroupId,
    ) -> Result<dashmap::mapref::one::Ref<'_, GroupId, Group>, LedgerError> {
        self.groups.get(id).ok_or(LedgerError::GroupNotFound(*id))
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
