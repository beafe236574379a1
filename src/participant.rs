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

//! Fund participants.

use crate::base::ParticipantId;
use crate::error::LedgerError;
use crate::period::Period;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A member of the fund expected to contribute every period.
///
/// Deactivated participants are excluded from the fund-wide KPI table and
/// from expense splits, but their payment history is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub email: String,
    pub active: bool,
    /// First period the participant owes. `None` means since the beginning.
    pub start_period: Option<Period>,
    pub created_at: DateTime<Utc>,
}

impl Participant {
    /// Email comparison key; addresses are unique case-insensitively.
    pub fn email_key(&self) -> String {
        normalize_email(&self.email)
    }
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Input for registering a participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewParticipant {
    pub name: String,
    pub email: String,
    pub start_period: Option<Period>,
}

impl NewParticipant {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            start_period: None,
        }
    }

    pub fn starting(mut self, period: Period) -> Self {
        self.start_period = Some(period);
        self
    }

    pub(crate) fn into_participant(
        self,
        created_at: DateTime<Utc>,
    ) -> Result<Participant, LedgerError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(LedgerError::validation("name required"));
        }
        let email = self.email.trim().to_string();
        validate_email(&email)?;

        Ok(Participant {
            id: ParticipantId::new(),
            name,
            email,
            active: true,
            start_period: self.start_period,
            created_at,
        })
    }
}

/// Partial update of a participant; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub active: Option<bool>,
    /// `Some(None)` clears the start period.
    pub start_period: Option<Option<Period>>,
}

impl ParticipantUpdate {
    pub(crate) fn apply(self, participant: &mut Participant) -> Result<(), LedgerError> {
        if let Some(name) = self.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(LedgerError::validation("name required"));
            }
            participant.name = name.to_string();
        }
        if let Some(email) = self.email {
            let email = email.trim();
            validate_email(email)?;
            participant.email = email.to_string();
        }
        if let Some(active) = self.active {
            participant.active = active;
        }
        if let Some(start_period) = self.start_period {
            participant.start_period = start_period;
        }
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<(), LedgerError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(LedgerError::validation(format!("invalid email '{email}'"))),
    }
}
