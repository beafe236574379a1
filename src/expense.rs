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

//! Expense splitting.
//!
//! An administrator spreads a one-off cost over a chosen set of
//! participants. Each share is rounded up to the next 0.05 on its own, so
//! the fund may collect slightly more than the total but never less.
//!
//! # Example
//!
//! ```
//! use fund_ledger_rs::{ExpenseSplit, ParticipantId};
//! use rust_decimal_macros::dec;
//!
//! let people = [ParticipantId::new(), ParticipantId::new(), ParticipantId::new()];
//! let split = ExpenseSplit::equal(people, dec!(100), "team dinner");
//! let shares = split.shares().unwrap();
//! assert!(shares.iter().all(|(_, amount)| *amount == dec!(33.35)));
//! ```

use crate::base::{ParticipantId, PaymentId};
use crate::error::LedgerError;
use crate::money::{check_amount, round_up_005};
use crate::payment::{PaymentMethod, PaymentRecord, PaymentStatus};
use crate::period::Period;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Largest weight accepted in a weighted split.
pub const MAX_WEIGHT: Decimal = dec!(1000000);

/// How the total is divided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "weights", rename_all = "lowercase")]
pub enum SplitStrategy {
    Equal,
    /// Proportional to the weights; participants missing from the map weigh 1.
    Weighted(HashMap<ParticipantId, Decimal>),
}

/// A request to split an expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseSplit {
    pub participants: Vec<ParticipantId>,
    pub total_amount: Decimal,
    pub reason: String,
    pub strategy: SplitStrategy,
}

impl ExpenseSplit {
    pub fn equal(
        participants: impl IntoIterator<Item = ParticipantId>,
        total_amount: Decimal,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            participants: participants.into_iter().collect(),
            total_amount,
            reason: reason.into(),
            strategy: SplitStrategy::Equal,
        }
    }

    pub fn weighted(
        participants: impl IntoIterator<Item = ParticipantId>,
        total_amount: Decimal,
        reason: impl Into<String>,
        weights: HashMap<ParticipantId, Decimal>,
    ) -> Self {
        Self {
            participants: participants.into_iter().collect(),
            total_amount,
            reason: reason.into(),
            strategy: SplitStrategy::Weighted(weights),
        }
    }

    /// Selected participants without repeats, in request order.
    pub fn selected(&self) -> Vec<ParticipantId> {
        let mut seen = HashSet::new();
        self.participants
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Checks the request before anything is written.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.participants.is_empty() {
            return Err(LedgerError::validation("select at least one participant"));
        }
        if self.reason.trim().is_empty() {
            return Err(LedgerError::validation("reason required"));
        }
        if self.total_amount <= Decimal::ZERO {
            return Err(LedgerError::validation("amount must be positive"));
        }
        check_amount(self.total_amount)?;
        if let SplitStrategy::Weighted(weights) = &self.strategy {
            if weights.values().any(|w| *w <= Decimal::ZERO) {
                return Err(LedgerError::validation("weights must be positive"));
            }
            if weights.values().any(|w| *w > MAX_WEIGHT) {
                return Err(LedgerError::validation(format!(
                    "weights must not exceed {MAX_WEIGHT}"
                )));
            }
        }
        Ok(())
    }

    /// Rounded share of every selected participant.
    pub fn shares(&self) -> Result<Vec<(ParticipantId, Decimal)>, LedgerError> {
        self.validate()?;
        let selected = self.selected();

        let shares: Vec<(ParticipantId, Decimal)> = match &self.strategy {
            SplitStrategy::Equal => {
                let per_share = round_up_005(self.total_amount / Decimal::from(selected.len()));
                selected.into_iter().map(|id| (id, per_share)).collect()
            }
            SplitStrategy::Weighted(weights) => {
                let out_of_range = || LedgerError::validation("split amount out of range");
                let weight_of = |id: &ParticipantId| weights.get(id).copied().unwrap_or(Decimal::ONE);
                let total_weight = selected
                    .iter()
                    .map(weight_of)
                    .try_fold(Decimal::ZERO, |sum, w| sum.checked_add(w))
                    .ok_or_else(out_of_range)?;
                selected
                    .into_iter()
                    .map(|id| {
                        // Multiply before dividing so exact shares stay exact.
                        let share = weight_of(&id)
                            .checked_mul(self.total_amount)
                            .and_then(|scaled| scaled.checked_div(total_weight))
                            .ok_or_else(out_of_range)?;
                        Ok((id, round_up_005(share)))
                    })
                    .collect::<Result<Vec<_>, LedgerError>>()?
            }
        };
        Ok(shares)
    }

    /// Builds one pending expense-deduction record per share.
    pub(crate) fn into_records(
        self,
        period: Period,
        created_at: DateTime<Utc>,
    ) -> Result<Vec<PaymentRecord>, LedgerError> {
        let reason = self.reason.trim().to_string();
        let records = self
            .shares()?
            .into_iter()
            .map(|(participant_id, amount)| PaymentRecord {
                id: PaymentId::new(),
                participant_id,
                period,
                amount,
                method: PaymentMethod::ExpenseDeduction,
                reason: Some(reason.clone()),
                status: PaymentStatus::Pending,
                admin_note: None,
                created_at,
            })
            .collect();
        Ok(records)
    }
}
