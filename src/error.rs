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

//! Error types for ledger operations.
//!
//! Every variant belongs to one coarse [`ErrorKind`] so that a transport
//! wrapping the ledger can map failures without matching on each variant.

use crate::base::{ParticipantId, PaymentId};
use crate::period::Period;
use thiserror::Error;

/// Ledger operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),

    /// A self-declared payment already exists for this participant and period
    #[error("a payment is already declared for {period}")]
    DuplicatePeriod {
        participant: ParticipantId,
        period: Period,
    },

    /// Email address is already used by another participant
    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    /// Referenced payment does not exist
    #[error("payment not found: {0}")]
    PaymentNotFound(PaymentId),

    /// Referenced participant does not exist
    #[error("participant not found: {0}")]
    ParticipantNotFound(ParticipantId),

    /// Participant has been deactivated
    #[error("participant is inactive: {0}")]
    InactiveParticipant(ParticipantId),

    /// Caller lacks the rights for this operation
    #[error("administrator access required")]
    Forbidden,

    /// Underlying persistence failure
    #[error("store error: {0}")]
    Store(String),
}

/// Coarse error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Forbidden,
    Store,
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::InactiveParticipant(_) => ErrorKind::Validation,
            Self::DuplicatePeriod { .. } | Self::DuplicateEmail(_) => ErrorKind::Conflict,
            Self::PaymentNotFound(_) | Self::ParticipantNotFound(_) => ErrorKind::NotFound,
            Self::Forbidden => ErrorKind::Forbidden,
            Self::Store(_) => ErrorKind::Store,
        }
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Store(err.to_string())
    }
}
