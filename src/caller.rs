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

//! Caller identity.
//!
//! The ledger does not authenticate anyone. Whoever wraps it passes the
//! already-authenticated identity in a [`CallerContext`], and every
//! operation checks the rights it needs against it.

use crate::base::ParticipantId;
use crate::error::LedgerError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerContext {
    pub participant_id: ParticipantId,
    pub is_admin: bool,
}

impl CallerContext {
    pub fn participant(participant_id: ParticipantId) -> Self {
        Self {
            participant_id,
            is_admin: false,
        }
    }

    pub fn admin(participant_id: ParticipantId) -> Self {
        Self {
            participant_id,
            is_admin: true,
        }
    }

    pub fn require_admin(&self) -> Result<(), LedgerError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(LedgerError::Forbidden)
        }
    }

    /// Participants may see their own records; administrators see everyone's.
    pub fn require_access(&self, participant_id: ParticipantId) -> Result<(), LedgerError> {
        if self.is_admin || self.participant_id == participant_id {
            Ok(())
        } else {
            Err(LedgerError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_is_not_admin() {
        let caller = CallerContext::participant(ParticipantId::new());
        assert_eq!(caller.require_admin(), Err(LedgerError::Forbidden));
        assert!(CallerContext::admin(ParticipantId::new()).require_admin().is_ok());
    }

    #[test]
    fn access_is_own_records_or_admin() {
        let me = ParticipantId::new();
        let other = ParticipantId::new();
        let caller = CallerContext::participant(me);
        assert!(caller.require_access(me).is_ok());
        assert_eq!(caller.require_access(other), Err(LedgerError::Forbidden));
        assert!(CallerContext::admin(me).require_access(other).is_ok());
    }
}
