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

//! Money rounding and bounds.
//!
//! Amounts are [`Decimal`] throughout, so rounding never suffers binary
//! floating-point drift.

use crate::error::LedgerError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Rounding step.
const STEP: Decimal = dec!(0.05);

/// Scale at which monetary amounts are stored.
pub const MONEY_SCALE: u32 = 2;

/// Largest amount accepted on input.
pub const MAX_AMOUNT: Decimal = dec!(1000000000);

/// Rounds `amount` up to the next multiple of 0.05.
///
/// Already aligned amounts are returned unchanged (`12.30` stays `12.30`,
/// `12.301` becomes `12.35`). The result carries two decimal places.
/// Callers only pass non-negative amounts.
pub fn round_up_005(amount: Decimal) -> Decimal {
    debug_assert!(amount >= Decimal::ZERO, "rounding a negative amount: {amount}");
    let remainder = amount % STEP;
    let mut rounded = if remainder.is_zero() {
        amount
    } else {
        amount - remainder + STEP
    };
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Checks that an input amount is at most [`MAX_AMOUNT`] with at most two
/// decimal places. The sign is checked by callers.
pub fn check_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount > MAX_AMOUNT {
        return Err(LedgerError::validation(format!(
            "amount must not exceed {MAX_AMOUNT}"
        )));
    }
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(LedgerError::validation(
            "amount must not have more than 2 decimal places",
        ));
    }
    Ok(())
}
