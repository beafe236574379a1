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

//! Due periods.
//!
//! A [`Period`] is the calendar month a contribution is owed for, written
//! `YYYY-MM`. It is independent of the wall-clock time a record was created.

use crate::error::LedgerError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar month identifier (`YYYY-MM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, LedgerError> {
        if !(1..=12).contains(&month) || !(0..=9999).contains(&year) {
            return Err(LedgerError::validation(format!(
                "invalid period '{year:04}-{month:02}': expected YYYY-MM"
            )));
        }
        Ok(Self { year, month })
    }

    /// The period containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn in_year(&self, year: i32) -> bool {
        self.year == year
    }

    /// Periods `year-01` through `year-{last_month}`, in order.
    pub fn months_of(year: i32, last_month: u32) -> impl Iterator<Item = Period> {
        (1..=last_month.min(12)).map(move |month| Period { year, month })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(LedgerError::validation("period required"));
        }
        let invalid = || LedgerError::validation(format!("invalid period '{s}': expected YYYY-MM"));

        let bytes = s.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' {
            return Err(invalid());
        }
        let (year, month) = (&s[..4], &s[5..]);
        if !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self { year, month })
    }
}

impl TryFrom<String> for Period {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_period() {
        let period: Period = "2025-03".parse().unwrap();
        assert_eq!(period.year(), 2025);
        assert_eq!(period.month(), 3);
        assert_eq!(period.to_string(), "2025-03");
    }

    #[test]
    fn rejects_malformed_periods() {
        for input in ["", "2025", "2025-3", "2025-13", "2025-00", "25-03", "2025/03", "20a5-03", "2025-03-01"] {
            let result = input.parse::<Period>();
            assert!(
                matches!(result, Err(LedgerError::Validation(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn empty_period_has_dedicated_message() {
        assert_eq!(
            "  ".parse::<Period>(),
            Err(LedgerError::validation("period required"))
        );
    }

    #[test]
    fn orders_chronologically() {
        let a: Period = "2024-12".parse().unwrap();
        let b: Period = "2025-01".parse().unwrap();
        let c: Period = "2025-02".parse().unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn of_date_takes_year_and_month() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 30).unwrap();
        assert_eq!(Period::of(date).to_string(), "2025-04");
    }

    #[test]
    fn months_of_yields_prefix_of_year() {
        let months: Vec<String> = Period::months_of(2025, 3).map(|p| p.to_string()).collect();
        assert_eq!(months, ["2025-01", "2025-02", "2025-03"]);
        assert_eq!(Period::months_of(2025, 0).count(), 0);
        assert_eq!(Period::months_of(2025, 40).count(), 12);
    }

    #[test]
    fn serializes_as_string() {
        let period: Period = "2025-11".parse().unwrap();
        assert_eq!(serde_json::to_string(&period).unwrap(), "\"2025-11\"");
        let back: Period = serde_json::from_str("\"2025-11\"").unwrap();
        assert_eq!(back, period);
        assert!(serde_json::from_str::<Period>("\"2025-1\"").is_err());
    }
}
