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

//! Append-only audit trail of group mutations.

use crate::base::{ExpenseId, MemberId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What happened to a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityKind {
    MemberAdded {
        member: MemberId,
        name: String,
    },
    MemberRenamed {
        member: MemberId,
        from: String,
        to: String,
    },
    MemberRemoved {
        member: MemberId,
        name: String,
    },
    ExpenseAdded {
        expense: ExpenseId,
        title: String,
        amount: Decimal,
    },
    ExpenseUpdated {
        expense: ExpenseId,
        title: String,
        amount: Decimal,
    },
    ExpenseRemoved {
        expense: ExpenseId,
        title: String,
    },
    SettlementRecorded {
        from: MemberId,
        to: MemberId,
        amount: Decimal,
    },
}

impl ActivityKind {
    /// Short machine-friendly name of the event, e.g. `expense_added`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MemberAdded { .. } => "member_added",
            Self::MemberRenamed { .. } => "member_renamed",
            Self::MemberRemoved { .. } => "member_removed",
            Self::ExpenseAdded { .. } => "expense_added",
            Self::ExpenseUpdated { .. } => "expense_updated",
            Self::ExpenseRemoved { .. } => "expense_removed",
            Self::SettlementRecorded { .. } => "settlement_recorded",
        }
    }
}

/// A timestamped audit event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: ActivityKind,
}

impl Activity {
    pub fn now(kind: ActivityKind) -> Self {
        Self { at: Utc::now(), kind }
    }
}
