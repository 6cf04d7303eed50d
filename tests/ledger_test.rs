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

//! Ledger public API integration tests.

use expense_ledger::{
    Expense, ExpenseId, Group, GroupId, Ledger, LedgerError, Member, MemberId, Settlement,
    SplitPolicy,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn make_member(id: u32) -> Member {
    Member::new(MemberId(id), format!("member-{id}"))
}

fn make_equal(id: u64, amount: Decimal, payer: u32, participants: &[u32]) -> Expense {
    Expense::new(
        ExpenseId(id),
        format!("expense {id}"),
        amount,
        MemberId(payer),
        participants.iter().copied().map(MemberId).collect(),
        SplitPolicy::Equal,
    )
}

fn make_settlement(from: u32, to: u32, amount: Decimal) -> Settlement {
    Settlement::new(MemberId(from), MemberId(to), amount)
}

/// A ledger with one group where member 1 paid 90.00 for members 1, 2 and 3.
fn ledger_with_dinner(group_id: GroupId) -> Ledger {
    let ledger = Ledger::new();
    ledger.create_group(group_id, "Dinner club").unwrap();
    {
        let group = ledger.group(&group_id).unwrap();
        for id in 1..=3 {
            group.add_member(make_member(id)).unwrap();
        }
        group
            .add_expense(make_equal(1, dec!(90.00), 1, &[1, 2, 3]))
            .unwrap();
    }
    ledger
}

#[test]
fn create_group_rejects_duplicate() {
    let ledger = Ledger::new();
    ledger.create_group(GroupId(1), "first").unwrap();
    assert_eq!(
        ledger.create_group(GroupId(1), "second"),
        Err(LedgerError::DuplicateGroup(GroupId(1)))
    );
    assert_eq!(ledger.group(&GroupId(1)).unwrap().name(), "first");
}

#[test]
fn operations_on_unknown_group_fail() {
    let ledger = Ledger::new();
    let missing = GroupId(42);

    assert_eq!(
        ledger.compute_balances(&missing),
        Err(LedgerError::GroupNotFound(missing))
    );
    assert_eq!(
        ledger.compute_settlement_plan(&missing),
        Err(LedgerError::GroupNotFound(missing))
    );
    assert_eq!(
        ledger.record_settlement_completed(&missing, make_settlement(1, 2, dec!(1.00))),
        Err(LedgerError::GroupNotFound(missing))
    );
}

#[test]
fn compute_balances_by_group() {
    let ledger = ledger_with_dinner(GroupId(1));
    let balances = ledger.compute_balances(&GroupId(1)).unwrap();

    assert_eq!(balances.get(MemberId(1)), Some(dec!(60.00)));
    assert_eq!(balances.get(MemberId(2)), Some(dec!(-30.00)));
    assert_eq!(balances.get(MemberId(3)), Some(dec!(-30.00)));
}

#[test]
fn settle_whole_plan_through_ledger() {
    let group_id = GroupId(1);
    let ledger = ledger_with_dinner(group_id);

    let plan = ledger.compute_settlement_plan(&group_id).unwrap();
    assert_eq!(plan.len(), 2);

    for settlement in plan {
        ledger
            .record_settlement_completed(&group_id, settlement)
            .unwrap();
    }

    assert!(ledger.compute_settlement_plan(&group_id).unwrap().is_empty());
    let group = ledger.group(&group_id).unwrap();
    assert_eq!(group.settlements().len(), 2);
}

#[test]
fn groups_are_independent() {
    let ledger = ledger_with_dinner(GroupId(1));
    ledger.create_group(GroupId(2), "Other").unwrap();
    {
        let other = ledger.group(&GroupId(2)).unwrap();
        other.add_member(make_member(1)).unwrap();
        other.add_member(make_member(2)).unwrap();
    }

    ledger
        .record_settlement_completed(&GroupId(2), make_settlement(1, 2, dec!(5.00)))
        .unwrap();

    assert_eq!(ledger.compute_settlement_plan(&GroupId(1)).unwrap().len(), 2);
    assert_eq!(
        ledger.compute_settlement_plan(&GroupId(2)).unwrap(),
        vec![make_settlement(2, 1, dec!(5.00))]
    );
    assert_eq!(ledger.groups().count(), 2);
}

#[test]
fn insert_restored_group() {
    let source = ledger_with_dinner(GroupId(1));
    let snapshot = source.group(&GroupId(1)).unwrap().snapshot();

    let ledger = Ledger::new();
    ledger.insert_group(Group::restore(snapshot)).unwrap();
    assert_eq!(
        ledger.compute_balances(&GroupId(1)).unwrap(),
        source.compute_balances(&GroupId(1)).unwrap()
    );
    assert_eq!(
        ledger.insert_group(Group::new(GroupId(1), "clash")),
        Err(LedgerError::DuplicateGroup(GroupId(1)))
    );
}
