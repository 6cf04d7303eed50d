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

//! # Expense Ledger
//!
//! This library tracks shared expenses within groups of people, works out who
//! owes whom, and suggests a short list of payments that settles everyone.
//!
//! ## Core Components
//!
//! - [`compute_balances`]: reduces expenses to one signed balance per member
//! - [`compute_settlement_plan`]: greedy debt netting over those balances
//! - [`Group`]: owns one group's state and serializes its mutations
//! - [`Ledger`]: concurrent store of many groups
//! - [`LedgerError`]: error types for rejected mutations
//!
//! ## Example
//!
//! ```
//! use expense_ledger::{
//!     ExpenseId, Expense, GroupId, Ledger, Member, MemberId, Settlement, SplitPolicy,
//! };
//! use rust_decimal_macros::dec;
//!
//! let ledger = Ledger::new();
//! ledger.create_group(GroupId(1), "Weekend").unwrap();
//!
//! {
//!     let group = ledger.group(&GroupId(1)).unwrap();
//!     for (id, name) in [(1, "A"), (2, "B"), (3, "C")] {
//!         group.add_member(Member::new(MemberId(id), name)).unwrap();
//!     }
//!     group
//!         .add_expense(Expense::new(
//!             ExpenseId(1),
//!             "Cabin",
//!             dec!(90.00),
//!             MemberId(1),
//!             vec![MemberId(1), MemberId(2), MemberId(3)],
//!             SplitPolicy::Equal,
//!         ))
//!         .unwrap();
//! }
//!
//! let balances = ledger.compute_balances(&GroupId(1)).unwrap();
//! assert_eq!(balances.get(MemberId(1)), Some(dec!(60.00)));
//!
//! let plan = ledger.compute_settlement_plan(&GroupId(1)).unwrap();
//! assert_eq!(plan[0], Settlement::new(MemberId(2), MemberId(1), dec!(30.00)));
//! assert_eq!(plan[1], Settlement::new(MemberId(3), MemberId(1), dec!(30.00)));
//! ```
//!
//! ## Numeric Model
//!
//! Amounts are [`rust_decimal::Decimal`]. Shares are whole cents, rounded
//! half to even; an uneven equal split gives the extra cents to the first
//! participants in list order.
//!
//! ## Thread Safety
//!
//! Balance and plan computation are pure. Recording a settlement is the one
//! mutation on the settlement path, and it is serialized per group.

pub mod activity;
mod balance;
mod base;
pub mod error;
mod expense;
mod group;
mod ledger;
mod member;
pub mod money;
mod settlement;

pub use activity::{Activity, ActivityKind};
pub use balance::{Balances, compute_balances};
pub use base::{ExpenseId, GroupId, MemberId};
pub use error::LedgerError;
pub use expense::{Expense, SplitPolicy};
pub use group::{Group, GroupSnapshot};
pub use ledger::Ledger;
pub use member::Member;
pub use settlement::{Settlement, SettlementRecord, compute_settlement_plan};
