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

use clap::{Args as ClapArgs, Parser, Subcommand};
use csv::Writer;
use fund_ledger_rs::{
    CallerContext, ExpenseSplit, Ledger, LedgerError, MemoryStore, NewParticipant, NewPayment,
    Participant, ParticipantId, ParticipantUpdate, PaymentId, PaymentMethod, PaymentRecord,
    PaymentStatus, PaymentUpdate, Period,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Fund Ledger - Track contributions to a shared fund
///
/// Every command runs as the identity given by `--caller`. The identity is
/// trusted as-is: authenticate before invoking this tool.
#[derive(Parser, Debug)]
#[command(name = "fund-ledger")]
#[command(about = "A contribution ledger for a shared fund", long_about = None)]
struct Args {
    /// Path to the JSON ledger snapshot
    #[arg(long, env = "FUND_LEDGER_STORE", default_value = "fund-ledger.json")]
    store: PathBuf,

    /// Participant ID of the caller
    #[arg(long, env = "FUND_LEDGER_CALLER")]
    caller: Option<ParticipantId>,

    /// Act with administrator rights
    #[arg(long, env = "FUND_LEDGER_ADMIN")]
    admin: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage participants (admin)
    #[command(subcommand)]
    Participant(ParticipantCommand),

    /// Declare your own payment for a period
    Declare {
        #[arg(long)]
        period: Period,
        #[arg(long)]
        amount: Decimal,
        /// bank_transfer, mobile_payment or other
        #[arg(long, default_value = "bank_transfer")]
        method: PaymentMethod,
        #[arg(long)]
        reason: Option<String>,
    },

    /// List payments (your own unless admin)
    Payments {
        #[arg(long)]
        participant: Option<ParticipantId>,
    },

    /// Inspect or edit a single payment
    #[command(subcommand)]
    Payment(PaymentCommand),

    /// Confirm every pending payment of a period (admin)
    ConfirmMonth {
        /// Period as YYYY-MM
        period: String,
    },

    /// Split an expense across participants (admin)
    Split {
        /// Participants taking a share
        #[arg(long, required = true, value_delimiter = ',')]
        participants: Vec<ParticipantId>,
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        reason: String,
        /// Weighted split entry `ID=WEIGHT`; unlisted participants weigh 1
        #[arg(long = "weight", value_parser = parse_weight)]
        weights: Vec<(ParticipantId, Decimal)>,
    },

    /// Show contribution indicators of a participant
    Kpi {
        #[arg(long)]
        participant: Option<ParticipantId>,
        #[arg(long)]
        year: Option<i32>,
    },

    /// Show the fund-wide indicator table (admin)
    Kpis {
        #[arg(long)]
        year: Option<i32>,
    },

    /// Read or change fund configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Export payments as CSV to stdout
    Export {
        /// Only this participant's payments (defaults to your own unless admin)
        #[arg(long)]
        participant: Option<ParticipantId>,
    },
}

#[derive(Subcommand, Debug)]
enum ParticipantCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// First period owed, YYYY-MM
        #[arg(long)]
        start: Option<Period>,
    },
    List,
    Update {
        id: ParticipantId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        active: Option<bool>,
        #[arg(long)]
        start: Option<Period>,
    },
    /// Soft delete; payment history is kept
    Deactivate { id: ParticipantId },
}

#[derive(Subcommand, Debug)]
enum PaymentCommand {
    Show {
        id: PaymentId,
    },
    Update(PaymentEdit),
    Confirm {
        id: PaymentId,
    },
    Delete {
        id: PaymentId,
    },
}

#[derive(ClapArgs, Debug)]
struct PaymentEdit {
    id: PaymentId,
    #[arg(long)]
    amount: Option<Decimal>,
    #[arg(long)]
    method: Option<PaymentMethod>,
    #[arg(long)]
    reason: Option<String>,
    #[arg(long)]
    note: Option<String>,
    #[arg(long)]
    status: Option<PaymentStatus>,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    Show,
    Set { key: String, value: String },
}

fn main() {
    let args = Args::parse();
    init_tracing(args.json_logs);

    let store = match MemoryStore::load(&args.store) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error loading ledger '{}': {}", args.store.display(), e);
            process::exit(1);
        }
    };
    let ledger = Ledger::new(store);

    // Bootstrapping an empty ledger needs an admin without a participant record.
    let caller = CallerContext {
        participant_id: args.caller.unwrap_or(ParticipantId(uuid::Uuid::nil())),
        is_admin: args.admin,
    };
    if args.caller.is_none() && !args.admin {
        eprintln!("Error: --caller is required unless acting as --admin");
        process::exit(1);
    }

    let mutated = match run(&ledger, &caller, args.command, std::io::stdout()) {
        Ok(mutated) => mutated,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if mutated {
        if let Err(e) = ledger.store().save(&args.store) {
            eprintln!("Error saving ledger '{}': {}", args.store.display(), e);
            process::exit(1);
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// Errors surfaced by the command runner.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("output failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("output failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs one command. Returns whether the ledger changed and must be saved.
fn run<W: Write>(
    ledger: &Ledger,
    caller: &CallerContext,
    command: Command,
    mut out: W,
) -> Result<bool, CliError> {
    let current_year = ledger.current_period().year();

    match command {
        Command::Participant(command) => match command {
            ParticipantCommand::Add { name, email, start } => {
                let mut participant = NewParticipant::new(name, email);
                participant.start_period = start;
                let participant = ledger.add_participant(caller, participant)?;
                print_json(&mut out, &participant)?;
                Ok(true)
            }
            ParticipantCommand::List => {
                print_json(&mut out, &ledger.list_participants(caller)?)?;
                Ok(false)
            }
            ParticipantCommand::Update {
                id,
                name,
                email,
                active,
                start,
            } => {
                let update = ParticipantUpdate {
                    name,
                    email,
                    active,
                    start_period: start.map(Some),
                };
                print_json(&mut out, &ledger.update_participant(caller, id, update)?)?;
                Ok(true)
            }
            ParticipantCommand::Deactivate { id } => {
                print_json(&mut out, &ledger.deactivate_participant(caller, id)?)?;
                Ok(true)
            }
        },
        Command::Declare {
            period,
            amount,
            method,
            reason,
        } => {
            let payment = NewPayment {
                period,
                amount,
                method,
                reason,
            };
            print_json(&mut out, &ledger.declare_payment(caller, payment)?)?;
            Ok(true)
        }
        Command::Payments { participant } => {
            print_json(&mut out, &ledger.list_payments(caller, participant)?)?;
            Ok(false)
        }
        Command::Payment(command) => match command {
            PaymentCommand::Show { id } => {
                print_json(&mut out, &ledger.payment(caller, id)?)?;
                Ok(false)
            }
            PaymentCommand::Update(edit) => {
                let update = PaymentUpdate {
                    amount: edit.amount,
                    method: edit.method,
                    reason: edit.reason,
                    admin_note: edit.note,
                    status: edit.status,
                };
                print_json(&mut out, &ledger.update_payment(caller, edit.id, update)?)?;
                Ok(true)
            }
            PaymentCommand::Confirm { id } => {
                print_json(&mut out, &ledger.confirm_payment(caller, id)?)?;
                Ok(true)
            }
            PaymentCommand::Delete { id } => {
                ledger.delete_payment(caller, id)?;
                Ok(true)
            }
        },
        Command::ConfirmMonth { period } => {
            let count = ledger.confirm_month(caller, &period)?;
            print_json(&mut out, &serde_json::json!({ "confirmed": count }))?;
            Ok(count > 0)
        }
        Command::Split {
            participants,
            amount,
            reason,
            weights,
        } => {
            let split = if weights.is_empty() {
                ExpenseSplit::equal(participants, amount, reason)
            } else {
                ExpenseSplit::weighted(participants, amount, reason, weights.into_iter().collect())
            };
            let count = ledger.split_expense(caller, split)?;
            print_json(&mut out, &serde_json::json!({ "created": count }))?;
            Ok(true)
        }
        Command::Kpi { participant, year } => {
            let participant = participant.unwrap_or(caller.participant_id);
            let kpi =
                ledger.participant_kpi(caller, participant, year.unwrap_or(current_year))?;
            print_json(&mut out, &kpi)?;
            Ok(false)
        }
        Command::Kpis { year } => {
            print_json(&mut out, &ledger.fund_kpis(caller, year.unwrap_or(current_year))?)?;
            Ok(false)
        }
        Command::Config(ConfigCommand::Show) => {
            print_json(&mut out, &ledger.config()?)?;
            Ok(false)
        }
        Command::Config(ConfigCommand::Set { key, value }) => {
            ledger.set_config(caller, &key, &value)?;
            Ok(true)
        }
        Command::Export { participant } => {
            // Participants export their own ledger by default.
            let participant = match participant {
                None if !caller.is_admin => Some(caller.participant_id),
                other => other,
            };
            let records = ledger.list_payments(caller, participant)?;
            let names = participant_names(ledger, caller, &records)?;
            write_payments(&records, &names, out)?;
            Ok(false)
        }
    }
}

fn print_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Display names for the owners of `records`.
fn participant_names(
    ledger: &Ledger,
    caller: &CallerContext,
    records: &[PaymentRecord],
) -> Result<HashMap<ParticipantId, String>, LedgerError> {
    let participants: Vec<Participant> = if caller.is_admin {
        ledger.list_participants(caller)?
    } else {
        records
            .first()
            .map(|r| ledger.participant(caller, r.participant_id))
            .transpose()?
            .into_iter()
            .collect()
    };
    Ok(participants.into_iter().map(|p| (p.id, p.name)).collect())
}

/// Row of the CSV export.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    participant: &'a str,
    period: Period,
    amount: Decimal,
    method: PaymentMethod,
    status: PaymentStatus,
    created_at: String,
    reason: &'a str,
    admin_note: &'a str,
}

/// Write payments to a CSV writer.
///
/// # CSV Format
///
/// Columns: `participant, period, amount, method, status, created_at, reason, admin_note`
///
/// # Example
///
/// ```csv
/// participant,period,amount,method,status,created_at,reason,admin_note
/// Alice,2025-03,50.00,bank_transfer,confirmed,2025-03-02T09:00:00+00:00,,
/// Bob,2025-03,33.35,expense_deduction,pending,2025-03-05T18:30:00+00:00,team dinner,
/// ```
fn write_payments<W: Write>(
    records: &[PaymentRecord],
    names: &HashMap<ParticipantId, String>,
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for record in records {
        wtr.serialize(CsvRow {
            participant: names
                .get(&record.participant_id)
                .map(String::as_str)
                .unwrap_or("unknown"),
            period: record.period,
            amount: record.amount,
            method: record.method,
            status: record.status,
            created_at: record.created_at.to_rfc3339(),
            reason: record.reason.as_deref().unwrap_or_default(),
            admin_note: record.admin_note.as_deref().unwrap_or_default(),
        })?;
    }

    wtr.flush()?;
    Ok(())
}

/// Parses a `ID=WEIGHT` pair.
fn parse_weight(raw: &str) -> Result<(ParticipantId, Decimal), String> {
    let (id, weight) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ID=WEIGHT, got '{raw}'"))?;
    let id = id.parse().map_err(|e| format!("invalid participant id: {e}"))?;
    let weight = weight
        .trim()
        .parse()
        .map_err(|e| format!("invalid weight: {e}"))?;
    Ok((id, weight))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fund_ledger_rs::FixedClock;
    use rust_decimal_macros::dec;

    fn setup() -> (Ledger<MemoryStore, FixedClock>, CallerContext, ParticipantId) {
        let ledger = Ledger::with_clock(MemoryStore::new(), FixedClock::on(2025, 3, 10).unwrap());
        let admin = CallerContext::admin(ParticipantId::new());
        let alice = ledger
            .add_participant(&admin, NewParticipant::new("Alice", "alice@fund.ch"))
            .unwrap();
        (ledger, admin, alice.id)
    }

    #[test]
    fn parse_weight_pair() {
        let id = ParticipantId::new();
        assert_eq!(parse_weight(&format!("{id}=2.5")).unwrap(), (id, dec!(2.5)));
        assert!(parse_weight("nope").is_err());
        assert!(parse_weight(&format!("{id}=x")).is_err());
    }

    #[test]
    fn write_payments_to_csv() {
        let (ledger, admin, alice) = setup();
        let caller = CallerContext::participant(alice);
        let payment = NewPayment::new(
            "2025-03".parse().unwrap(),
            dec!(50.00),
            PaymentMethod::BankTransfer,
        )
        .with_reason("march, on time");
        ledger.declare_payment(&caller, payment).unwrap();

        let records = ledger.list_payments(&admin, None).unwrap();
        let names = HashMap::from([(alice, "Alice".to_string())]);
        let mut output = Vec::new();
        write_payments(&records, &names, &mut output).unwrap();

        let output = String::from_utf8(output).unwrap();
        let mut lines = output.lines();
        assert_eq!(
            lines.next(),
            Some("participant,period,amount,method,status,created_at,reason,admin_note")
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("Alice,2025-03,50.00,bank_transfer,pending,"));
        assert!(row.contains("\"march, on time\""));
    }

    #[test]
    fn export_defaults_to_own_payments() {
        let ledger = Ledger::new(MemoryStore::new());
        let admin = CallerContext::admin(ParticipantId::new());
        let alice = ledger
            .add_participant(&admin, NewParticipant::new("Alice", "alice@fund.ch"))
            .unwrap()
            .id;
        let bob = ledger
            .add_participant(&admin, NewParticipant::new("Bob", "bob@fund.ch"))
            .unwrap()
            .id;
        for (who, amount) in [(alice, dec!(50)), (bob, dec!(40))] {
            let payment =
                NewPayment::new("2025-02".parse().unwrap(), amount, PaymentMethod::Other);
            ledger
                .declare_payment(&CallerContext::participant(who), payment)
                .unwrap();
        }

        let mut output = Vec::new();
        let mutated = run(
            &ledger,
            &CallerContext::participant(alice),
            Command::Export { participant: None },
            &mut output,
        )
        .unwrap();
        assert!(!mutated);

        let output = String::from_utf8(output).unwrap();
        assert_eq!(output.lines().count(), 2);
        assert!(output.contains("\nAlice,2025-02,50,other,"));
        assert!(!output.contains("Bob"));
    }

    /// Accepts everything except a lone newline.
    struct NewlineRejecter;

    impl Write for NewlineRejecter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if buf == b"\n" {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            } else {
                Ok(buf.len())
            }
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn print_json_reports_write_failures() {
        let result = print_json(&mut NewlineRejecter, &1);
        assert!(matches!(result, Err(CliError::Io(_))));
    }

    #[test]
    fn unknown_owner_is_labelled() {
        let (ledger, admin, alice) = setup();
        let caller = CallerContext::participant(alice);
        let payment = NewPayment::new("2025-02".parse().unwrap(), dec!(5), PaymentMethod::Other);
        ledger.declare_payment(&caller, payment).unwrap();

        let records = ledger.list_payments(&admin, None).unwrap();
        let mut output = Vec::new();
        write_payments(&records, &HashMap::new(), &mut output).unwrap();
        assert!(String::from_utf8(output).unwrap().contains("\nunknown,2025-02,5,other,"));
    }
}
