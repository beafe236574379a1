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

//! Contribution indicators.
//!
//! Pure functions over payment records and a [`FundConfig`] snapshot. The
//! ledger reads the records once per call and hands them in, so a whole
//! table is computed against a single view of the store.
//!
//! | Indicator | Definition |
//! |-----------|------------|
//! | confirmed year total | sum of confirmed amounts with a period in `year` |
//! | pending year total | sum of pending amounts with a period in `year` |
//! | remaining this period | `max(0, due - confirmed in current period)` |
//! | expected to date | `due × months due in year` |
//! | missing | `max(0, expected - confirmed year total)` |
//! | progress | `confirmed / expected × 100`, `0` when nothing is expected; not clamped |
//! | late | some elapsed month of `year` has no confirmed record at all |

use crate::base::ParticipantId;
use crate::config::FundConfig;
use crate::error::LedgerError;
use crate::participant::Participant;
use crate::payment::{PaymentRecord, PaymentStatus};
use crate::period::Period;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Indicators shown to a participant about their own contributions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantKpi {
    pub confirmed_year_total: Decimal,
    pub pending_year_total: Decimal,
    pub remaining_this_period: Decimal,
}

/// One row of the fund-wide table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantProgress {
    pub participant_id: ParticipantId,
    pub name: String,
    pub confirmed_year_total: Decimal,
    pub pending_total: Decimal,
    pub missing: Decimal,
    /// Raw percentage; may exceed 100.
    pub progress_pct: Decimal,
    pub is_late: bool,
}

/// Number of months of `year` that are due as of `current`.
///
/// The current month counts as due. Past years are fully due, future
/// years not at all.
pub fn months_due(year: i32, current: Period) -> u32 {
    match year.cmp(&current.year()) {
        std::cmp::Ordering::Less => 12,
        std::cmp::Ordering::Equal => current.month(),
        std::cmp::Ordering::Greater => 0,
    }
}

/// Number of leading months of `year` checked for arrears as of `current`.
///
/// Only months strictly before the current one can be in arrears.
pub fn months_elapsed(year: i32, current: Period) -> u32 {
    match year.cmp(&current.year()) {
        std::cmp::Ordering::Less => 12,
        std::cmp::Ordering::Equal => current.month() - 1,
        std::cmp::Ordering::Greater => 0,
    }
}

/// Computes a participant's own indicators.
///
/// `records` are that participant's payments; records of other periods
/// than `year` and `current` are ignored.
///
/// # Errors
///
/// [`LedgerError::Store`] if the stored amounts overflow when summed.
pub fn participant_kpi(
    records: &[PaymentRecord],
    config: &FundConfig,
    year: i32,
    current: Period,
) -> Result<ParticipantKpi, LedgerError> {
    let totals = YearTotals::sum(records.iter(), year)?;
    let confirmed_this_period = checked_sum(
        records
            .iter()
            .filter(|r| r.period == current && r.status == PaymentStatus::Confirmed),
    )?;

    Ok(ParticipantKpi {
        confirmed_year_total: totals.confirmed,
        pending_year_total: totals.pending,
        remaining_this_period: config
            .monthly_due_amount
            .checked_sub(confirmed_this_period)
            .ok_or_else(overflow)?
            .max(Decimal::ZERO),
    })
}

/// Computes the fund-wide table for the active participants.
///
/// Every row uses the same `config`, regardless of the participant's own
/// start period.
///
/// # Errors
///
/// [`LedgerError::Store`] if the stored amounts overflow when summed.
pub fn fund_kpis(
    participants: &[Participant],
    records: &[PaymentRecord],
    config: &FundConfig,
    year: i32,
    current: Period,
) -> Result<Vec<ParticipantProgress>, LedgerError> {
    let mut by_participant: HashMap<ParticipantId, Vec<&PaymentRecord>> = HashMap::new();
    for record in records.iter().filter(|r| r.period.in_year(year)) {
        by_participant
            .entry(record.participant_id)
            .or_default()
            .push(record);
    }

    let expected = config
        .monthly_due_amount
        .checked_mul(Decimal::from(months_due(year, current)))
        .ok_or_else(overflow)?;
    let elapsed = months_elapsed(year, current);

    participants
        .iter()
        .filter(|p| p.active)
        .map(|participant| {
            let own = by_participant
                .get(&participant.id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let totals = YearTotals::sum(own.iter().copied(), year)?;

            let progress_pct = if expected > Decimal::ZERO {
                totals
                    .confirmed
                    .checked_mul(dec!(100))
                    .and_then(|scaled| scaled.checked_div(expected))
                    .ok_or_else(overflow)?
            } else {
                Decimal::ZERO
            };
            let missing = expected
                .checked_sub(totals.confirmed)
                .ok_or_else(overflow)?
                .max(Decimal::ZERO);

            Ok(ParticipantProgress {
                participant_id: participant.id,
                name: participant.name.clone(),
                confirmed_year_total: totals.confirmed,
                pending_total: totals.pending,
                missing,
                progress_pct,
                is_late: is_late(own, year, elapsed),
            })
        })
        .collect()
}

/// Scans `year-01 ..= year-{elapsed}` in order, stopping at the first
/// month without any confirmed record. The amount does not matter.
fn is_late(records: &[&PaymentRecord], year: i32, elapsed: u32) -> bool {
    let confirmed: HashSet<Period> = records
        .iter()
        .filter(|r| r.status == PaymentStatus::Confirmed)
        .map(|r| r.period)
        .collect();
    Period::months_of(year, elapsed).any(|month| !confirmed.contains(&month))
}

fn overflow() -> LedgerError {
    LedgerError::Store("amount overflow while computing indicators".to_string())
}

fn checked_sum<'a>(
    mut records: impl Iterator<Item = &'a PaymentRecord>,
) -> Result<Decimal, LedgerError> {
    records
        .try_fold(Decimal::ZERO, |sum, r| sum.checked_add(r.amount))
        .ok_or_else(overflow)
}

#[derive(Debug, Default)]
struct YearTotals {
    confirmed: Decimal,
    pending: Decimal,
}

impl YearTotals {
    fn sum<'a>(
        records: impl Iterator<Item = &'a PaymentRecord>,
        year: i32,
    ) -> Result<Self, LedgerError> {
        records
            .filter(|r| r.period.in_year(year))
            .try_fold(Self::default(), |mut totals, r| {
                let slot = match r.status {
                    PaymentStatus::Confirmed => &mut totals.confirmed,
                    PaymentStatus::Pending => &mut totals.pending,
                };
                *slot = slot.checked_add(r.amount).ok_or_else(overflow)?;
                Ok(totals)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(s: &str) -> Period {
        s.parse().unwrap()
    }

    #[test]
    fn months_due_by_year() {
        let current = period("2025-06");
        assert_eq!(months_due(2025, current), 6);
        assert_eq!(months_due(2024, current), 12);
        assert_eq!(months_due(2026, current), 0);
    }

    #[test]
    fn months_elapsed_excludes_current_month() {
        assert_eq!(months_elapsed(2025, period("2025-04")), 3);
        assert_eq!(months_elapsed(2025, period("2025-01")), 0);
        assert_eq!(months_elapsed(2024, period("2025-01")), 12);
        assert_eq!(months_elapsed(2026, period("2025-01")), 0);
    }

    fn record(owner: ParticipantId, p: &str, amount: Decimal, status: PaymentStatus) -> PaymentRecord {
        PaymentRecord {
            id: crate::base::PaymentId::new(),
            participant_id: owner,
            period: period(p),
            amount,
            method: crate::payment::PaymentMethod::Other,
            reason: None,
            status,
            admin_note: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn overflowing_totals_are_errors() {
        let owner = ParticipantId::new();
        let records = vec![
            record(owner, "2025-01", Decimal::MAX, PaymentStatus::Confirmed),
            record(owner, "2025-02", Decimal::MAX, PaymentStatus::Confirmed),
        ];
        let config = FundConfig::default();
        let current = period("2025-03");

        assert!(matches!(
            participant_kpi(&records, &config, 2025, current),
            Err(LedgerError::Store(_))
        ));

        let participant = crate::participant::NewParticipant::new("Alice", "alice@fund.ch")
            .into_participant(chrono::Utc::now())
            .unwrap();
        let records: Vec<PaymentRecord> = records
            .into_iter()
            .map(|r| PaymentRecord {
                participant_id: participant.id,
                ..r
            })
            .collect();
        assert!(matches!(
            fund_kpis(&[participant], &records, &config, 2025, current),
            Err(LedgerError::Store(_))
        ));
    }

    #[test]
    fn no_records_means_not_late_in_january() {
        assert!(!is_late(&[], 2025, months_elapsed(2025, period("2025-01"))));
        assert!(is_late(&[], 2025, months_elapsed(2025, period("2025-02"))));
    }
}
