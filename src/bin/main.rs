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

use clap::{Parser, Subcommand};
use csv::Writer;
use expense_ledger::{
    ActivityKind, Group, GroupSnapshot, LedgerError, MemberId, Settlement, SettlementRecord,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use thiserror::Error;

/// Expense Ledger - Balances and settlement plans for a group
///
/// Reads a group from a JSON file and writes CSV to stdout.
#[derive(Parser, Debug)]
#[command(name = "expense-ledger")]
#[command(about = "Balances and settlement plans for shared group expenses", long_about = None)]
struct Args {
    /// Path to the group JSON file
    ///
    /// Holds `name`, `members`, `expenses`, `settlements` and `activities`.
    /// Example: cargo run -- trip.json plan > plan.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Log filter, e.g. `info` or `expense_ledger=debug`
    #[arg(long, env = "EXPENSE_LEDGER_LOG", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every member's balance
    Balances,
    /// Print the transfers that would settle the group
    Plan,
    /// Record a completed settlement and save it back to FILE
    Settle {
        #[arg(long)]
        from: u32,
        #[arg(long)]
        to: u32,
        #[arg(long)]
        amount: Decimal,
    },
    /// Print the group's activity log
    Activity,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("cannot access '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid group file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot write output: {0}")]
    Csv(#[from] csv::Error),
    #[error("settlement rejected: {0}")]
    Ledger(#[from] LedgerError),
}

fn main() {
    let args = Args::parse();
    init_logging(&args.log_level);

    let group = match open_group(&args.input) {
        Ok(group) => group,
        Err(e) => {
            eprintln!("Error loading group: {}", e);
            process::exit(1);
        }
    };

    let stdout = std::io::stdout();
    let result = match args.command {
        Command::Balances => write_balances(&group, stdout.lock()).map_err(CliError::from),
        Command::Plan => write_plan(&group, stdout.lock()).map_err(CliError::from),
        Command::Activity => write_activity(&group, stdout.lock()).map_err(CliError::from),
        Command::Settle { from, to, amount } => {
            settle(&group, &args.input, Settlement::new(MemberId(from), MemberId(to), amount))
                .and_then(|record| write_records(&group, &[record], stdout.lock()).map_err(CliError::from))
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Installs a stderr subscriber so stdout stays machine-readable.
fn init_logging(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_group(path: &Path) -> Result<Group, CliError> {
    let file = File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(load_group(BufReader::new(file))?)
}

/// Loads a group from its JSON snapshot.
///
/// Stored data is not re-validated. A history whose balances do not net to
/// zero (a custom split that does not add up) is reported but still loaded.
pub fn load_group<R: Read>(reader: R) -> Result<Group, serde_json::Error> {
    let snapshot: GroupSnapshot = serde_json::from_reader(reader)?;
    let group = Group::restore(snapshot);

    let total = group.balances().total();
    if !total.is_zero() {
        tracing::warn!(group = %group.id(), %total, "balances do not sum to zero");
    }
    Ok(group)
}

/// Records `settlement` and writes the updated group back to `path`.
///
/// The group is written to a sibling `.tmp` file and renamed over `path`,
/// so a failed write leaves the previous file in place.
fn settle(group: &Group, path: &Path, settlement: Settlement) -> Result<SettlementRecord, CliError> {
    let record = group
        .record_settlement(settlement)
        .inspect_err(|e| tracing::warn!(error = %e, "settlement rejected"))?;

    let tmp = temp_path(path);
    let saved = write_group(group, &tmp).and_then(|()| {
        fs::rename(&tmp, path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })
    });
    if let Err(e) = saved {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(record)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

fn write_group(group: &Group, path: &Path) -> Result<(), CliError> {
    let io_error = |source| CliError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, group)?;
    writer.flush().map_err(io_error)?;
    writer.get_ref().sync_all().map_err(io_error)?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct BalanceRow<'a> {
    member: MemberId,
    name: &'a str,
    balance: Decimal,
}

#[derive(Debug, Serialize)]
struct TransferRow<'a> {
    from: MemberId,
    from_name: &'a str,
    to: MemberId,
    to_name: &'a str,
    amount: Decimal,
}

#[derive(Debug, Serialize)]
struct ActivityRow {
    at: String,
    kind: &'static str,
    detail: String,
}

fn member_names(group: &Group) -> HashMap<MemberId, String> {
    group
        .members()
        .into_iter()
        .map(|member| (member.id, member.name))
        .collect()
}

/// Write member balances as CSV.
///
/// # CSV Format
///
/// Columns: `member, name, balance`
///
/// ```csv
/// member,name,balance
/// 1,Alice,60.00
/// 2,Bob,-30.00
/// ```
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_balances<W: Write>(group: &Group, writer: W) -> Result<(), csv::Error> {
    let names = member_names(group);
    let mut wtr = Writer::from_writer(writer);

    for (member, balance) in group.balances().iter() {
        wtr.serialize(BalanceRow {
            member,
            name: names.get(&member).map(String::as_str).unwrap_or_default(),
            balance,
        })?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write the settlement plan as CSV.
///
/// # CSV Format
///
/// Columns: `from, from_name, to, to_name, amount`
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_plan<W: Write>(group: &Group, writer: W) -> Result<(), csv::Error> {
    let plan = group.settlement_plan();
    write_transfers(&member_names(group), plan.iter(), writer)
}

fn write_records<W: Write>(
    group: &Group,
    records: &[SettlementRecord],
    writer: W,
) -> Result<(), csv::Error> {
    write_transfers(
        &member_names(group),
        records.iter().map(|record| &record.settlement),
        writer,
    )
}

fn write_transfers<'a, W: Write>(
    names: &HashMap<MemberId, String>,
    transfers: impl Iterator<Item = &'a Settlement>,
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    let name = |member: &MemberId| names.get(member).map(String::as_str).unwrap_or_default();

    let mut written = 0;
    for transfer in transfers {
        wtr.serialize(TransferRow {
            from: transfer.from,
            from_name: name(&transfer.from),
            to: transfer.to,
            to_name: name(&transfer.to),
            amount: transfer.amount,
        })?;
        written += 1;
    }
    if written == 0 {
        // Serializing nothing writes no header either.
        wtr.write_record(["from", "from_name", "to", "to_name", "amount"])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write the activity log as CSV, oldest first.
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_activity<W: Write>(group: &Group, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for activity in group.activities() {
        wtr.serialize(ActivityRow {
            at: activity.at.to_rfc3339(),
            kind: activity.kind.name(),
            detail: describe(&activity.kind),
        })?;
    }

    wtr.flush()?;
    Ok(())
}

fn describe(kind: &ActivityKind) -> String {
    match kind {
        ActivityKind::MemberAdded { member, name } => format!("{name} ({member}) joined"),
        ActivityKind::MemberRenamed { member, from, to } => {
            format!("{from} ({member}) renamed to {to}")
        }
        ActivityKind::MemberRemoved { member, name } => format!("{name} ({member}) left"),
        ActivityKind::ExpenseAdded {
            expense,
            title,
            amount,
        } => format!("added expense {expense} '{title}' for {amount}"),
        ActivityKind::ExpenseUpdated {
            expense,
            title,
            amount,
        } => format!("updated expense {expense} '{title}' to {amount}"),
        ActivityKind::ExpenseRemoved { expense, title } => {
            format!("removed expense {expense} '{title}'")
        }
        ActivityKind::SettlementRecorded { from, to, amount } => {
            format!("{from} paid {to} {amount}")
        }
    }
}
