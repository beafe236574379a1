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

//! Contribution ledger.
//!
//! The [`Ledger`] is the entry point for every operation. It checks the
//! caller's rights, validates input, reads a consistent configuration
//! snapshot and delegates persistence to a [`LedgerStore`].
//!
//! # Operations
//!
//! | Operation | Who | Effect |
//! |-----------|-----|--------|
//! | [`declare_payment`](Ledger::declare_payment) | participant | pending record, one per period |
//! | [`confirm_payment`](Ledger::confirm_payment) | admin | pending → confirmed |
//! | [`confirm_month`](Ledger::confirm_month) | admin | every pending record of a period → confirmed |
//! | [`split_expense`](Ledger::split_expense) | admin | one pending expense record per participant |
//! | [`update_payment`](Ledger::update_payment) / [`delete_payment`](Ledger::delete_payment) | admin | edit / hard delete |
//! | [`participant_kpi`](Ledger::participant_kpi) | owner or admin | own indicators |
//! | [`fund_kpis`](Ledger::fund_kpis) | admin | table of active participants |

use crate::base::{ParticipantId, PaymentId};
use crate::caller::CallerContext;
use crate::clock::{Clock, SystemClock};
use crate::config::{self, FundConfig};
use crate::error::LedgerError;
use crate::expense::ExpenseSplit;
use crate::kpi::{self, ParticipantKpi, ParticipantProgress};
use crate::memory_store::MemoryStore;
use crate::participant::{NewParticipant, Participant, ParticipantUpdate};
use crate::payment::{NewPayment, PaymentRecord, PaymentStatus, PaymentUpdate};
use crate::period::Period;
use crate::store::{LedgerStore, PaymentQuery};

/// Contribution ledger over a store `S`, reading time from `C`.
///
/// # Invariants
///
/// - At most one declared record per participant and period.
/// - Amounts are never negative.
/// - Status only moves from pending to confirmed.
/// - Multi-record writes are all-or-nothing.
pub struct Ledger<S = MemoryStore, C = SystemClock> {
    store: S,
    clock: C,
}

impl<S: LedgerStore> Ledger<S, SystemClock> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: SystemClock,
        }
    }
}

impl Default for Ledger<MemoryStore, SystemClock> {
    fn default() -> Self {
        Self::new(MemoryStore::new())
    }
}

impl<S: LedgerStore, C: Clock> Ledger<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn current_period(&self) -> Period {
        self.clock.current_period()
    }

    // === Configuration ===

    /// Reads a configuration snapshot.
    pub fn config(&self) -> Result<FundConfig, LedgerError> {
        Ok(FundConfig::from_map(&self.store.config()?))
    }

    /// Sets a configuration value (admin only).
    ///
    /// # Errors
    ///
    /// [`LedgerError::Validation`] for an empty key or a due amount that is
    /// not a non-negative decimal.
    pub fn set_config(
        &self,
        caller: &CallerContext,
        key: &str,
        value: &str,
    ) -> Result<(), LedgerError> {
        caller.require_admin()?;
        let key = key.trim();
        if key.is_empty() {
            return Err(LedgerError::validation("configuration key required"));
        }
        if key == config::MONTHLY_DUE_AMOUNT && config::parse_due_amount(value).is_none() {
            return Err(LedgerError::validation(format!(
                "invalid {key} '{value}': expected a non-negative amount"
            )));
        }
        self.store.set_config(key, value.trim())?;
        tracing::info!(key, value, "configuration updated");
        Ok(())
    }

    // === Participants ===

    pub fn add_participant(
        &self,
        caller: &CallerContext,
        participant: NewParticipant,
    ) -> Result<Participant, LedgerError> {
        caller.require_admin()?;
        let participant = participant.into_participant(self.clock.now())?;
        self.store.insert_participant(participant.clone())?;
        tracing::info!(participant = %participant.id, name = %participant.name, "participant added");
        Ok(participant)
    }

    pub fn update_participant(
        &self,
        caller: &CallerContext,
        id: ParticipantId,
        update: ParticipantUpdate,
    ) -> Result<Participant, LedgerError> {
        caller.require_admin()?;
        let participant = self.store.update_participant(id, update)?;
        tracing::info!(participant = %id, active = participant.active, "participant updated");
        Ok(participant)
    }

    /// Soft delete: the participant stops counting, their payments stay.
    pub fn deactivate_participant(
        &self,
        caller: &CallerContext,
        id: ParticipantId,
    ) -> Result<Participant, LedgerError> {
        self.update_participant(
            caller,
            id,
            ParticipantUpdate {
                active: Some(false),
                ..Default::default()
            },
        )
    }

    pub fn list_participants(
        &self,
        caller: &CallerContext,
    ) -> Result<Vec<Participant>, LedgerError> {
        caller.require_admin()?;
        self.store.participants()
    }

    pub fn participant(
        &self,
        caller: &CallerContext,
        id: ParticipantId,
    ) -> Result<Participant, LedgerError> {
        caller.require_access(id)?;
        self.store
            .participant(id)?
            .ok_or(LedgerError::ParticipantNotFound(id))
    }

    fn active_participant(&self, id: ParticipantId) -> Result<Participant, LedgerError> {
        let participant = self
            .store
            .participant(id)?
            .ok_or(LedgerError::ParticipantNotFound(id))?;
        if !participant.active {
            return Err(LedgerError::InactiveParticipant(id));
        }
        Ok(participant)
    }

    // === Payments ===

    /// Records the caller's own contribution for a period as pending.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::DuplicatePeriod`] - The caller already declared this period.
    /// - [`LedgerError::Validation`] - Negative amount or expense-deduction method.
    /// - [`LedgerError::InactiveParticipant`] - The caller was deactivated.
    pub fn declare_payment(
        &self,
        caller: &CallerContext,
        payment: NewPayment,
    ) -> Result<PaymentRecord, LedgerError> {
        self.active_participant(caller.participant_id)?;
        let record = payment.into_record(caller.participant_id, self.clock.now())?;
        let record = self.store.insert_payment(record)?;
        tracing::info!(
            participant = %record.participant_id,
            period = %record.period,
            amount = %record.amount,
            "payment declared"
        );
        Ok(record)
    }

    /// Lists payments ordered by period.
    ///
    /// Without a filter a participant gets their own records and an
    /// administrator gets everything.
    pub fn list_payments(
        &self,
        caller: &CallerContext,
        participant: Option<ParticipantId>,
    ) -> Result<Vec<PaymentRecord>, LedgerError> {
        let query = match participant {
            Some(id) => {
                caller.require_access(id)?;
                PaymentQuery::all().participant(id)
            }
            None if caller.is_admin => PaymentQuery::all(),
            None => PaymentQuery::all().participant(caller.participant_id),
        };
        self.store.payments(&query)
    }

    pub fn payment(
        &self,
        caller: &CallerContext,
        id: PaymentId,
    ) -> Result<PaymentRecord, LedgerError> {
        let record = self
            .store
            .payment(id)?
            .ok_or(LedgerError::PaymentNotFound(id))?;
        caller.require_access(record.participant_id)?;
        Ok(record)
    }

    pub fn update_payment(
        &self,
        caller: &CallerContext,
        id: PaymentId,
        update: PaymentUpdate,
    ) -> Result<PaymentRecord, LedgerError> {
        caller.require_admin()?;
        let record = self.store.update_payment(id, &update)?;
        tracing::info!(payment = %id, status = %record.status, "payment updated");
        Ok(record)
    }

    /// Confirms a single payment. Confirming a confirmed payment is a no-op.
    pub fn confirm_payment(
        &self,
        caller: &CallerContext,
        id: PaymentId,
    ) -> Result<PaymentRecord, LedgerError> {
        self.update_payment(
            caller,
            id,
            PaymentUpdate {
                status: Some(PaymentStatus::Confirmed),
                ..Default::default()
            },
        )
    }

    /// Hard delete.
    pub fn delete_payment(&self, caller: &CallerContext, id: PaymentId) -> Result<(), LedgerError> {
        caller.require_admin()?;
        self.store.delete_payment(id)?;
        tracing::info!(payment = %id, "payment deleted");
        Ok(())
    }

    /// Confirms every pending payment of `period` (`YYYY-MM`) at once.
    ///
    /// Returns the number of records that changed; calling it again for the
    /// same period returns `0`.
    pub fn confirm_month(&self, caller: &CallerContext, period: &str) -> Result<usize, LedgerError> {
        caller.require_admin()?;
        let period: Period = period.parse()?;
        let count = self.store.confirm_period(period)?;
        tracing::info!(%period, count, "month confirmed");
        Ok(count)
    }

    /// Splits an expense into pending expense-deduction records dated in the
    /// current period. Returns the number of records created.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Validation`] - Empty selection, blank reason, non-positive
    ///   amount or weight.
    /// - [`LedgerError::ParticipantNotFound`] / [`LedgerError::InactiveParticipant`] -
    ///   A selected participant cannot take a share.
    ///
    /// Nothing is written when any of these occurs.
    pub fn split_expense(
        &self,
        caller: &CallerContext,
        split: ExpenseSplit,
    ) -> Result<usize, LedgerError> {
        caller.require_admin()?;
        split.validate()?;
        for id in split.selected() {
            self.active_participant(id)?;
        }

        let period = self.clock.current_period();
        let reason = split.reason.trim().to_string();
        let records = split.into_records(period, self.clock.now())?;
        let count = self.store.insert_payments(records)?;
        tracing::info!(%period, count, reason = %reason, "expense split");
        Ok(count)
    }

    // === Indicators ===

    /// Indicators of one participant for `year`.
    pub fn participant_kpi(
        &self,
        caller: &CallerContext,
        participant: ParticipantId,
        year: i32,
    ) -> Result<ParticipantKpi, LedgerError> {
        caller.require_access(participant)?;
        let config = self.config()?;
        let records = self
            .store
            .payments(&PaymentQuery::all().participant(participant))?;
        let kpi = kpi::participant_kpi(&records, &config, year, self.clock.current_period())?;
        tracing::debug!(%participant, year, ?kpi, "participant kpi computed");
        Ok(kpi)
    }

    /// Fund-wide table of active participants for `year` (admin only).
    pub fn fund_kpis(
        &self,
        caller: &CallerContext,
        year: i32,
    ) -> Result<Vec<ParticipantProgress>, LedgerError> {
        caller.require_admin()?;
        let config = self.config()?;
        let participants = self.store.participants()?;
        let records = self.store.payments(&PaymentQuery::all().year(year))?;
        let table = kpi::fund_kpis(
            &participants,
            &records,
            &config,
            year,
            self.clock.current_period(),
        )?;
        tracing::debug!(year, rows = table.len(), "fund kpis computed");
        Ok(table)
    }
}
