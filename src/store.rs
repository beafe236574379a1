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

//! Storage seam for participants, payments and configuration.
//!
//! The ledger talks to persistence only through [`LedgerStore`]. An
//! implementation is the single synchronisation point for concurrent
//! callers and must uphold the guarantees listed on each method.

use crate::base::{ParticipantId, PaymentId};
use crate::error::LedgerError;
use crate::participant::{Participant, ParticipantUpdate};
use crate::payment::{PaymentRecord, PaymentStatus, PaymentUpdate};
use crate::period::Period;
use std::collections::HashMap;

/// Filter for payment listings. Empty fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaymentQuery {
    pub participant: Option<ParticipantId>,
    pub period: Option<Period>,
    pub year: Option<i32>,
    pub status: Option<PaymentStatus>,
}

impl PaymentQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn participant(mut self, id: ParticipantId) -> Self {
        self.participant = Some(id);
        self
    }

    pub fn period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn status(mut self, status: PaymentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, record: &PaymentRecord) -> bool {
        self.participant.is_none_or(|id| record.participant_id == id)
            && self.period.is_none_or(|period| record.period == period)
            && self.year.is_none_or(|year| record.period.in_year(year))
            && self.status.is_none_or(|status| record.status == status)
    }
}

/// Durable storage used by the ledger.
pub trait LedgerStore: Send + Sync {
    /// All participants, active or not.
    fn participants(&self) -> Result<Vec<Participant>, LedgerError>;

    fn participant(&self, id: ParticipantId) -> Result<Option<Participant>, LedgerError>;

    /// # Errors
    ///
    /// [`LedgerError::DuplicateEmail`] if the email is taken (case-insensitive).
    fn insert_participant(&self, participant: Participant) -> Result<(), LedgerError>;

    fn update_participant(
        &self,
        id: ParticipantId,
        update: ParticipantUpdate,
    ) -> Result<Participant, LedgerError>;

    /// Matching payments ordered by period, then creation time.
    fn payments(&self, query: &PaymentQuery) -> Result<Vec<PaymentRecord>, LedgerError>;

    fn payment(&self, id: PaymentId) -> Result<Option<PaymentRecord>, LedgerError>;

    /// Inserts a single record.
    ///
    /// The check for an existing declared record of the same participant and
    /// period is atomic with the insert: of two racing declarations exactly
    /// one succeeds.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::DuplicatePeriod`] - A declared record already holds the slot.
    /// - [`LedgerError::ParticipantNotFound`] - Owner does not exist.
    fn insert_payment(&self, record: PaymentRecord) -> Result<PaymentRecord, LedgerError>;

    /// Inserts all records or none of them. Returns the number inserted.
    fn insert_payments(&self, records: Vec<PaymentRecord>) -> Result<usize, LedgerError>;

    /// # Errors
    ///
    /// [`LedgerError::PaymentNotFound`] or the validation error raised by the update.
    fn update_payment(
        &self,
        id: PaymentId,
        update: &PaymentUpdate,
    ) -> Result<PaymentRecord, LedgerError>;

    /// Hard delete.
    fn delete_payment(&self, id: PaymentId) -> Result<(), LedgerError>;

    /// Flips every pending record of `period` to confirmed in one step and
    /// returns how many changed. No reader observes a partial result.
    fn confirm_period(&self, period: Period) -> Result<usize, LedgerError>;

    fn config(&self) -> Result<HashMap<String, String>, LedgerError>;

    fn set_config(&self, key: &str, value: &str) -> Result<(), LedgerError>;
}
