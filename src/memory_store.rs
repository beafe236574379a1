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

//! In-memory store with JSON snapshot persistence.
//!
//! Participants and payments each live behind a [`RwLock`]. Every write
//! (a single insert, a batch, a period confirmation) happens under one
//! write guard, so readers see either none or all of it. When both tables
//! are needed the participant lock is always taken first.
//!
//! # Example
//!
//! ```
//! use fund_ledger_rs::{LedgerStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! store.set_config("monthly_due_amount", "50").unwrap();
//! assert_eq!(store.config().unwrap()["monthly_due_amount"], "50");
//! ```

use crate::base::{ParticipantId, PaymentId};
use crate::error::LedgerError;
use crate::money::check_amount;
use crate::participant::{Participant, ParticipantUpdate};
use crate::payment::{PaymentRecord, PaymentUpdate};
use crate::period::Period;
use crate::store::{LedgerStore, PaymentQuery};
use dashmap::DashMap;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Default)]
struct ParticipantTable {
    by_id: HashMap<ParticipantId, Participant>,
    /// Normalised email to owner.
    emails: HashMap<String, ParticipantId>,
}

impl ParticipantTable {
    fn insert(&mut self, participant: Participant) -> Result<(), LedgerError> {
        if self.by_id.contains_key(&participant.id) {
            return Err(LedgerError::Store(format!(
                "participant id collision: {}",
                participant.id
            )));
        }
        match self.emails.entry(participant.email_key()) {
            Entry::Occupied(_) => Err(LedgerError::DuplicateEmail(participant.email)),
            Entry::Vacant(entry) => {
                entry.insert(participant.id);
                self.by_id.insert(participant.id, participant);
                Ok(())
            }
        }
    }

    /// Fails unless `id` exists and is active.
    fn require_active(&self, id: ParticipantId) -> Result<(), LedgerError> {
        match self.by_id.get(&id) {
            Some(participant) if participant.active => Ok(()),
            Some(_) => Err(LedgerError::InactiveParticipant(id)),
            None => Err(LedgerError::ParticipantNotFound(id)),
        }
    }

    fn update(
        &mut self,
        id: ParticipantId,
        update: ParticipantUpdate,
    ) -> Result<Participant, LedgerError> {
        let current = self
            .by_id
            .get(&id)
            .ok_or(LedgerError::ParticipantNotFound(id))?;
        let mut updated = current.clone();
        update.apply(&mut updated)?;

        let old_key = current.email_key();
        let new_key = updated.email_key();
        if new_key != old_key {
            if self.emails.contains_key(&new_key) {
                return Err(LedgerError::DuplicateEmail(updated.email));
            }
            self.emails.remove(&old_key);
            self.emails.insert(new_key, id);
        }
        self.by_id.insert(id, updated.clone());
        Ok(updated)
    }
}

#[derive(Debug, Default)]
struct PaymentTable {
    records: HashMap<PaymentId, PaymentRecord>,
    /// Declared record holding each (participant, period) slot.
    declared: HashMap<(ParticipantId, Period), PaymentId>,
}

impl PaymentTable {
    fn insert(&mut self, record: PaymentRecord) -> Result<(), LedgerError> {
        if self.records.contains_key(&record.id) {
            return Err(LedgerError::Store(format!("payment id collision: {}", record.id)));
        }
        if record.is_declared() {
            match self.declared.entry((record.participant_id, record.period)) {
                Entry::Occupied(_) => {
                    return Err(LedgerError::DuplicatePeriod {
                        participant: record.participant_id,
                        period: record.period,
                    });
                }
                Entry::Vacant(entry) => {
                    entry.insert(record.id);
                }
            }
        }
        self.records.insert(record.id, record);
        Ok(())
    }

    fn remove(&mut self, id: PaymentId) -> Option<PaymentRecord> {
        let record = self.records.remove(&id)?;
        let slot = (record.participant_id, record.period);
        if self.declared.get(&slot) == Some(&id) {
            self.declared.remove(&slot);
        }
        Some(record)
    }

    fn sorted(&self, query: &PaymentQuery) -> Vec<PaymentRecord> {
        let mut records: Vec<PaymentRecord> = self
            .records
            .values()
            .filter(|record| query.matches(record))
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            (a.period, a.created_at, a.id).cmp(&(b.period, b.created_at, b.id))
        });
        records
    }
}

/// On-disk representation of a [`MemoryStore`].
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub participants: Vec<Participant>,
    pub payments: Vec<PaymentRecord>,
    pub config: BTreeMap<String, String>,
}

/// Reference [`LedgerStore`] keeping everything in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    participants: RwLock<ParticipantTable>,
    payments: RwLock<PaymentTable>,
    config: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store, re-checking email and declared-period uniqueness.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, LedgerError> {
        let corrupt = |err: LedgerError| LedgerError::Store(format!("corrupt snapshot: {err}"));

        let mut participants = ParticipantTable::default();
        for participant in snapshot.participants {
            participants.insert(participant).map_err(corrupt)?;
        }

        let mut payments = PaymentTable::default();
        for record in snapshot.payments {
            if !participants.by_id.contains_key(&record.participant_id) {
                return Err(corrupt(LedgerError::ParticipantNotFound(
                    record.participant_id,
                )));
            }
            if record.amount < Decimal::ZERO {
                return Err(corrupt(LedgerError::validation("negative amount")));
            }
            check_amount(record.amount).map_err(corrupt)?;
            payments.insert(record).map_err(corrupt)?;
        }

        Ok(Self {
            participants: RwLock::new(participants),
            payments: RwLock::new(payments),
            config: snapshot.config.into_iter().collect(),
        })
    }

    pub fn snapshot(&self) -> Snapshot {
        let participants = self.participants.read();
        let payments = self.payments.read();

        let mut snapshot = Snapshot {
            participants: participants.by_id.values().cloned().collect(),
            payments: payments.sorted(&PaymentQuery::all()),
            config: self
                .config
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect(),
        };
        snapshot
            .participants
            .sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        snapshot
    }

    /// Loads a store from a JSON snapshot. A missing file yields an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no snapshot, starting empty");
            return Ok(Self::new());
        }
        let file = File::open(path)?;
        let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))?;
        Self::from_snapshot(snapshot)
    }

    /// Writes a JSON snapshot next to `path`, then renames it into place.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LedgerError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let temp_path = path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&temp_path)?);
            serde_json::to_writer_pretty(&mut writer, &self.snapshot())?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&temp_path, path)?;
        tracing::debug!(path = %path.display(), "snapshot saved");
        Ok(())
    }
}

impl LedgerStore for MemoryStore {
    fn participants(&self) -> Result<Vec<Participant>, LedgerError> {
        let mut participants: Vec<Participant> =
            self.participants.read().by_id.values().cloned().collect();
        participants.sort_by(|a, b| (&a.name, a.created_at).cmp(&(&b.name, b.created_at)));
        Ok(participants)
    }

    fn participant(&self, id: ParticipantId) -> Result<Option<Participant>, LedgerError> {
        Ok(self.participants.read().by_id.get(&id).cloned())
    }

    fn insert_participant(&self, participant: Participant) -> Result<(), LedgerError> {
        self.participants.write().insert(participant)
    }

    fn update_participant(
        &self,
        id: ParticipantId,
        update: ParticipantUpdate,
    ) -> Result<Participant, LedgerError> {
        self.participants.write().update(id, update)
    }

    fn payments(&self, query: &PaymentQuery) -> Result<Vec<PaymentRecord>, LedgerError> {
        Ok(self.payments.read().sorted(query))
    }

    fn payment(&self, id: PaymentId) -> Result<Option<PaymentRecord>, LedgerError> {
        Ok(self.payments.read().records.get(&id).cloned())
    }

    fn insert_payment(&self, record: PaymentRecord) -> Result<PaymentRecord, LedgerError> {
        let participants = self.participants.read();
        participants.require_active(record.participant_id)?;
        self.payments.write().insert(record.clone())?;
        Ok(record)
    }

    fn insert_payments(&self, records: Vec<PaymentRecord>) -> Result<usize, LedgerError> {
        let participants = self.participants.read();
        let mut payments = self.payments.write();

        let mut inserted: Vec<PaymentId> = Vec::with_capacity(records.len());
        for record in records {
            let id = record.id;
            let result = participants
                .require_active(record.participant_id)
                .and_then(|()| payments.insert(record));
            if let Err(err) = result {
                // Roll back before the guard is released.
                for id in inserted {
                    payments.remove(id);
                }
                tracing::debug!(payment = %id, error = %err, "batch insert rolled back");
                return Err(err);
            }
            inserted.push(id);
        }
        Ok(inserted.len())
    }

    fn update_payment(
        &self,
        id: PaymentId,
        update: &PaymentUpdate,
    ) -> Result<PaymentRecord, LedgerError> {
        let mut payments = self.payments.write();
        let record = payments
            .records
            .get_mut(&id)
            .ok_or(LedgerError::PaymentNotFound(id))?;
        let mut updated = record.clone();
        update.apply(&mut updated)?;
        *record = updated.clone();
        Ok(updated)
    }

    fn delete_payment(&self, id: PaymentId) -> Result<(), LedgerError> {
        self.payments
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or(LedgerError::PaymentNotFound(id))
    }

    fn confirm_period(&self, period: Period) -> Result<usize, LedgerError> {
        let mut payments = self.payments.write();
        let confirmed = payments
            .records
            .values_mut()
            .filter(|record| record.period == period)
            .map(|record| record.confirm())
            .filter(|changed| *changed)
            .count();
        Ok(confirmed)
    }

    fn config(&self) -> Result<HashMap<String, String>, LedgerError> {
        Ok(self
            .config
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect())
    }

    fn set_config(&self, key: &str, value: &str) -> Result<(), LedgerError> {
        self.config.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
