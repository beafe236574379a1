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

//! Fund configuration snapshot.
//!
//! The store keeps configuration as a flat string map. Computations take a
//! [`FundConfig`] parsed once from that map so every participant in one pass
//! sees the same due amount.

use crate::money::check_amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

pub const MONTHLY_DUE_AMOUNT: &str = "monthly_due_amount";
pub const CURRENCY: &str = "currency";
pub const TITLE: &str = "title";

const DEFAULT_CURRENCY: &str = "CHF";
const DEFAULT_TITLE: &str = "Fund";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundConfig {
    /// Amount each participant owes per period.
    pub monthly_due_amount: Decimal,
    /// Display only.
    pub currency: String,
    /// Display only.
    pub title: String,
}

impl Default for FundConfig {
    fn default() -> Self {
        Self {
            monthly_due_amount: Decimal::ZERO,
            currency: DEFAULT_CURRENCY.to_string(),
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl FundConfig {
    /// Builds a snapshot from raw key/value pairs.
    ///
    /// A missing due amount counts as zero. An unparseable or negative one
    /// also counts as zero and is logged.
    pub fn from_map(values: &HashMap<String, String>) -> Self {
        let defaults = Self::default();

        let monthly_due_amount = match values.get(MONTHLY_DUE_AMOUNT) {
            None => Decimal::ZERO,
            Some(raw) => parse_due_amount(raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "ignoring invalid {MONTHLY_DUE_AMOUNT}");
                Decimal::ZERO
            }),
        };

        Self {
            monthly_due_amount,
            currency: non_empty(values.get(CURRENCY)).unwrap_or(defaults.currency),
            title: non_empty(values.get(TITLE)).unwrap_or(defaults.title),
        }
    }
}

/// Parses a due amount, accepting only non-negative amounts within the
/// input bounds of [`check_amount`].
pub fn parse_due_amount(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim())
        .ok()
        .filter(|amount| *amount >= Decimal::ZERO && check_amount(*amount).is_ok())
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
