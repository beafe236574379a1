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

//! # Fund Ledger
//!
//! This library tracks monthly contributions owed by a group of participants
//! to a shared fund and reconciles them into progress indicators.
//!
//! ## Core Components
//!
//! - [`Ledger`]: Entry point checking rights and orchestrating every operation
//! - [`LedgerStore`]: Storage seam, with [`MemoryStore`] as the reference implementation
//! - [`kpi`]: Per-participant and fund-wide indicators
//! - [`ExpenseSplit`]: Spreads a one-off cost into pending expense records
//! - [`round_up_005`]: Rounds amounts up to the next 0.05
//! - [`LedgerError`]: Error types for ledger operations
//!
//! ## Example
//!
//! ```
//! use fund_ledger_rs::{
//!     CallerContext, FixedClock, Ledger, MemoryStore, NewParticipant, NewPayment,
//!     ParticipantId, PaymentMethod,
//! };
//! use rust_decimal_macros::dec;
//!
//! let ledger = Ledger::with_clock(MemoryStore::new(), FixedClock::on(2025, 3, 10).unwrap());
//! let admin = CallerContext::admin(ParticipantId::new());
//! ledger.set_config(&admin, "monthly_due_amount", "50").unwrap();
//!
//! let alice = ledger
//!     .add_participant(&admin, NewParticipant::new("Alice", "alice@fund.ch"))
//!     .unwrap();
//! let caller = CallerContext::participant(alice.id);
//!
//! // Declare and confirm March
//! let period = "2025-03".parse().unwrap();
//! ledger
//!     .declare_payment(&caller, NewPayment::new(period, dec!(50), PaymentMethod::BankTransfer))
//!     .unwrap();
//! assert_eq!(ledger.confirm_month(&admin, "2025-03").unwrap(), 1);
//!
//! let kpi = ledger.participant_kpi(&caller, alice.id, 2025).unwrap();
//! assert_eq!(kpi.confirmed_year_total, dec!(50));
//! assert_eq!(kpi.remaining_this_period, dec!(0));
//! ```
//!
//! ## Thread Safety
//!
//! [`MemoryStore`] serialises writes per table, so a [`Ledger`] can be shared
//! between threads behind an `Arc`.

mod base;
pub mod caller;
pub mod clock;
pub mod config;
pub mod error;
pub mod expense;
pub mod kpi;
mod ledger;
pub mod memory_store;
pub mod money;
pub mod participant;
pub mod payment;
pub mod period;
pub mod store;

pub use base::{ParticipantId, PaymentId};
pub use caller::CallerContext;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::FundConfig;
pub use error::{ErrorKind, LedgerError};
pub use expense::{ExpenseSplit, SplitStrategy};
pub use kpi::{ParticipantKpi, ParticipantProgress};
pub use ledger::Ledger;
pub use memory_store::{MemoryStore, Snapshot};
pub use money::round_up_005;
pub use participant::{NewParticipant, Participant, ParticipantUpdate};
pub use payment::{NewPayment, PaymentMethod, PaymentRecord, PaymentStatus, PaymentUpdate};
pub use period::Period;
pub use store::{LedgerStore, PaymentQuery};
