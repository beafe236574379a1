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

//! Payment records.
//!
//! A record follows a two-state lifecycle:
//! - [`Pending`] → [`Confirmed`] (individually or via bulk month confirmation)
//!
//! There is no way back from [`Confirmed`].
//!
//! [`Pending`]: PaymentStatus::Pending
//! [`Confirmed`]: PaymentStatus::Confirmed

use crate::base::{ParticipantId, PaymentId};
use crate::error::LedgerError;
use crate::money::check_amount;
use crate::period::Period;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Confirmed,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
        })
    }
}

impl FromStr for PaymentStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            other => Err(LedgerError::validation(format!("unknown status '{other}'"))),
        }
    }
}

/// How a contribution was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    MobilePayment,
    /// Share of an expense split. Only created by the expense splitter.
    ExpenseDeduction,
    Other,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BankTransfer => "bank_transfer",
            Self::MobilePayment => "mobile_payment",
            Self::ExpenseDeduction => "expense_deduction",
            Self::Other => "other",
        })
    }
}

impl FromStr for PaymentMethod {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "bank_transfer" | "bank" => Ok(Self::BankTransfer),
            "mobile_payment" | "mobile" => Ok(Self::MobilePayment),
            "expense_deduction" | "expense" => Ok(Self::ExpenseDeduction),
            "other" => Ok(Self::Other),
            other => Err(LedgerError::validation(format!("unknown payment method '{other}'"))),
        }
    }
}

/// A single contribution owed by a participant for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub participant_id: ParticipantId,
    pub period: Period,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reason: Option<String>,
    pub status: PaymentStatus,
    pub admin_note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PaymentRecord {
    /// Whether the record was declared by the participant rather than
    /// produced by an expense split. Only declared records are subject to
    /// the one-per-period rule.
    pub fn is_declared(&self) -> bool {
        self.method != PaymentMethod::ExpenseDeduction
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == PaymentStatus::Confirmed
    }

    /// Moves a pending record to confirmed. Returns `false` if it already was.
    pub fn confirm(&mut self) -> bool {
        match self.status {
            PaymentStatus::Pending => {
                self.status = PaymentStatus::Confirmed;
                true
            }
            PaymentStatus::Confirmed => false,
        }
    }
}

/// Input for a self-declared payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPayment {
    pub period: Period,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reason: Option<String>,
}

impl NewPayment {
    pub fn new(period: Period, amount: Decimal, method: PaymentMethod) -> Self {
        Self {
            period,
            amount,
            method,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub(crate) fn into_record(
        self,
        participant_id: ParticipantId,
        created_at: DateTime<Utc>,
    ) -> Result<PaymentRecord, LedgerError> {
        if self.amount < Decimal::ZERO {
            return Err(LedgerError::validation("amount must not be negative"));
        }
        check_amount(self.amount)?;
        if self.method == PaymentMethod::ExpenseDeduction {
            return Err(LedgerError::validation(
                "expense deductions are created by expense splits only",
            ));
        }
        Ok(PaymentRecord {
            id: PaymentId::new(),
            participant_id,
            period: self.period,
            amount: self.amount,
            method: self.method,
            reason: non_blank(self.reason),
            status: PaymentStatus::Pending,
            admin_note: None,
            created_at,
        })
    }
}

/// Administrative edit of a payment; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentUpdate {
    pub amount: Option<Decimal>,
    pub method: Option<PaymentMethod>,
    pub reason: Option<String>,
    pub admin_note: Option<String>,
    pub status: Option<PaymentStatus>,
}

impl PaymentUpdate {
    /// Applies the update to `record`, leaving it untouched on error.
    pub fn apply(&self, record: &mut PaymentRecord) -> Result<(), LedgerError> {
        if let Some(amount) = self.amount {
            if amount < Decimal::ZERO {
                return Err(LedgerError::validation("amount must not be negative"));
            }
            check_amount(amount)?;
        }
        if let Some(method) = self.method {
            if (method == PaymentMethod::ExpenseDeduction) == record.is_declared() {
                return Err(LedgerError::validation(
                    "cannot change a payment into or out of an expense deduction",
                ));
            }
        }
        if self.status == Some(PaymentStatus::Pending) && record.is_confirmed() {
            return Err(LedgerError::validation(
                "a confirmed payment cannot return to pending",
            ));
        }
        if !record.is_declared()
            && self.reason.as_deref().is_some_and(|r| r.trim().is_empty())
        {
            return Err(LedgerError::validation("reason required"));
        }

        if let Some(amount) = self.amount {
            record.amount = amount;
        }
        if let Some(method) = self.method {
            record.method = method;
        }
        if let Some(reason) = &self.reason {
            record.reason = non_blank(Some(reason.clone()));
        }
        if let Some(note) = &self.admin_note {
            record.admin_note = non_blank(Some(note.clone()));
        }
        if self.status == Some(PaymentStatus::Confirmed) {
            record.confirm();
        }
        Ok(())
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pending_record(method: PaymentMethod) -> PaymentRecord {
        let payment = NewPayment::new("2025-03".parse().unwrap(), dec!(50), PaymentMethod::Other);
        let mut record = payment.into_record(ParticipantId::new(), Utc::now()).unwrap();
        record.method = method;
        if method == PaymentMethod::ExpenseDeduction {
            record.reason = Some("dinner".into());
        }
        record
    }

    #[test]
    fn declared_payment_starts_pending() {
        let record = pending_record(PaymentMethod::BankTransfer);
        assert_eq!(record.status, PaymentStatus::Pending);
        assert!(record.is_declared());
        assert_eq!(record.admin_note, None);
    }

    #[test]
    fn declaration_rejects_negative_amount_and_expense_method() {
        let period = "2025-03".parse().unwrap();
        let negative = NewPayment::new(period, dec!(-1), PaymentMethod::Other);
        assert!(negative.into_record(ParticipantId::new(), Utc::now()).is_err());

        let expense = NewPayment::new(period, dec!(10), PaymentMethod::ExpenseDeduction);
        assert!(expense.into_record(ParticipantId::new(), Utc::now()).is_err());
    }

    #[test]
    fn declaration_rejects_oversized_or_sub_cent_amounts() {
        let period = "2025-03".parse().unwrap();
        for amount in [Decimal::MAX, dec!(1000000000.01), dec!(10.005)] {
            let payment = NewPayment::new(period, amount, PaymentMethod::Other);
            assert!(
                matches!(
                    payment.into_record(ParticipantId::new(), Utc::now()),
                    Err(LedgerError::Validation(_))
                ),
                "{amount}"
            );
        }
    }

    #[test]
    fn update_rejects_oversized_amount() {
        let mut record = pending_record(PaymentMethod::BankTransfer);
        let update = PaymentUpdate {
            amount: Some(Decimal::MAX),
            ..Default::default()
        };
        assert!(matches!(update.apply(&mut record), Err(LedgerError::Validation(_))));
        assert_eq!(record.amount, dec!(50));
    }

    #[test]
    fn blank_reason_is_dropped() {
        let payment = NewPayment::new("2025-03".parse().unwrap(), dec!(5), PaymentMethod::Other)
            .with_reason("   ");
        let record = payment.into_record(ParticipantId::new(), Utc::now()).unwrap();
        assert_eq!(record.reason, None);
    }

    #[test]
    fn confirm_is_one_way() {
        let mut record = pending_record(PaymentMethod::MobilePayment);
        assert!(record.confirm());
        assert!(!record.confirm());
        assert!(record.is_confirmed());

        let revert = PaymentUpdate {
            status: Some(PaymentStatus::Pending),
            ..Default::default()
        };
        assert!(revert.apply(&mut record).is_err());
        assert!(record.is_confirmed());
    }

    #[test]
    fn update_cannot_cross_expense_boundary() {
        let mut declared = pending_record(PaymentMethod::BankTransfer);
        let to_expense = PaymentUpdate {
            method: Some(PaymentMethod::ExpenseDeduction),
            ..Default::default()
        };
        assert!(to_expense.apply(&mut declared).is_err());

        let mut expense = pending_record(PaymentMethod::ExpenseDeduction);
        let to_other = PaymentUpdate {
            method: Some(PaymentMethod::Other),
            ..Default::default()
        };
        assert!(to_other.apply(&mut expense).is_err());
    }

    #[test]
    fn expense_reason_cannot_be_cleared() {
        let mut expense = pending_record(PaymentMethod::ExpenseDeduction);
        let clear = PaymentUpdate {
            reason: Some(" ".into()),
            ..Default::default()
        };
        assert_eq!(
            clear.apply(&mut expense),
            Err(LedgerError::validation("reason required"))
        );
        assert_eq!(expense.reason.as_deref(), Some("dinner"));
    }

    #[test]
    fn update_applies_fields() {
        let mut record = pending_record(PaymentMethod::BankTransfer);
        PaymentUpdate {
            amount: Some(dec!(45.50)),
            admin_note: Some("received late".into()),
            status: Some(PaymentStatus::Confirmed),
            ..Default::default()
        }
        .apply(&mut record)
        .unwrap();

        assert_eq!(record.amount, dec!(45.50));
        assert_eq!(record.admin_note.as_deref(), Some("received late"));
        assert!(record.is_confirmed());
    }

    #[test]
    fn enums_parse_from_text() {
        assert_eq!("bank-transfer".parse::<PaymentMethod>().unwrap(), PaymentMethod::BankTransfer);
        assert_eq!("MOBILE".parse::<PaymentMethod>().unwrap(), PaymentMethod::MobilePayment);
        assert_eq!("confirmed".parse::<PaymentStatus>().unwrap(), PaymentStatus::Confirmed);
        assert!("cash".parse::<PaymentMethod>().is_err());
    }
}
