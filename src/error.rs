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

//! Error types for group mutations.
//!
//! Balance and plan computations never fail; only mutations of a group's
//! state are checked.

use crate::base::{ExpenseId, GroupId, MemberId};
use thiserror::Error;

/// Group and ledger mutation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Referenced group does not exist
    #[error("group {0} not found")]
    GroupNotFound(GroupId),

    /// A group with this ID already exists
    #[error("duplicate group ID {0}")]
    DuplicateGroup(GroupId),

    /// A member with this ID already exists in the group
    #[error("duplicate member ID {0}")]
    DuplicateMember(MemberId),

    /// Referenced member does not exist
    #[error("member {0} not found")]
    MemberNotFound(MemberId),

    /// Member still pays for or takes part in an expense
    #[error("member {0} is referenced by an expense")]
    MemberInUse(MemberId),

    /// An expense with this ID already exists in the group
    #[error("duplicate expense ID {0}")]
    DuplicateExpense(ExpenseId),

    /// Referenced expense does not exist
    #[error("expense {0} not found")]
    ExpenseNotFound(ExpenseId),

    /// Amount is zero or negative
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// Expense has no participants
    #[error("expense has no participants")]
    NoParticipants,

    /// Expense or settlement refers to someone outside the group
    #[error("unknown member {0}")]
    UnknownMember(MemberId),

    /// Custom split does not add up to 100% or to the expense amount
    #[error("custom split does not add up")]
    SplitMismatch,

    /// Settlement from a member to themselves
    #[error("cannot settle with oneself")]
    SelfSettlement,
}
