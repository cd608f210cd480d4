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

//! Daily ledger.
//!
//! One [`DailyLedger`] exists per calendar day that has seen a checkout. It is
//! append-only: line items are pushed in checkout order and the grand total
//! grows by the sum of every batch.
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use order_ledger_rs::{DailyLedger, FoodId, LedgerDate, LineItem};
//! use rust_decimal_macros::dec;
//!
//! let mut ledger = DailyLedger::new(LedgerDate::from_ymd(2024, 5, 1).unwrap());
//! ledger.append(vec![LineItem {
//!     food_id: FoodId(1),
//!     food_name: "Burger".into(),
//!     quantity: 2,
//!     line_total: dec!(10.00),
//!     created_at: Utc::now(),
//! }]).unwrap();
//! assert_eq!(ledger.grand_total(), dec!(10.00));
//! ```

use crate::OrderError;
use crate::base::{FoodId, LedgerDate};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A priced checkout line, snapshotted at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub food_id: FoodId,
    pub food_name: String,
    pub quantity: u32,
    /// Unit price times quantity.
    #[serde(rename = "total")]
    pub line_total: Decimal,
    pub created_at: DateTime<Utc>,
}

/// All checkout lines of one calendar day and their running total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLedger {
    date: LedgerDate,
    line_items: Vec<LineItem>,
    grand_total: Decimal,
}

impl DailyLedger {
    pub fn new(date: LedgerDate) -> Self {
        Self {
            date,
            line_items: Vec::new(),
            grand_total: Decimal::ZERO,
        }
    }

    pub fn date(&self) -> LedgerDate {
        self.date
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn grand_total(&self) -> Decimal {
        self.grand_total
    }

    pub fn len(&self) -> usize {
        self.line_items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }

    /// Whether every line total is non-negative and the stored total equals
    /// their sum.
    pub fn is_balanced(&self) -> bool {
        self.line_items.iter().all(|l| l.line_total >= Decimal::ZERO)
            && checked_sum(self.line_items.iter().map(|l| l.line_total)) == Some(self.grand_total)
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.is_balanced(),
            "Invariant violated: grand total {} does not match line items of {}",
            self.grand_total,
            self.date
        );
        debug_assert!(
            self.grand_total >= Decimal::ZERO,
            "Invariant violated: grand total went negative: {}",
            self.grand_total
        );
    }

    /// Appends `lines` in order and returns the sum they added.
    ///
    /// # Errors
    ///
    /// [`OrderError::AmountOverflow`] if a line total is negative or the new
    /// grand total does not fit in a `Decimal`. The ledger is unchanged.
    pub fn append(&mut self, lines: Vec<LineItem>) -> Result<Decimal, OrderError> {
        if let Some(line) = lines.iter().find(|l| l.line_total < Decimal::ZERO) {
            return Err(OrderError::AmountOverflow(format!(
                "negative line total {} for {}",
                line.line_total, line.food_name
            )));
        }
        let overflow = || {
            OrderError::AmountOverflow(format!("grand total of {} exceeds the supported range", self.date))
        };
        let added = checked_sum(lines.iter().map(|l| l.line_total)).ok_or_else(overflow)?;
        let grand_total = self.grand_total.checked_add(added).ok_or_else(overflow)?;

        self.line_items.extend(lines);
        self.grand_total = grand_total;
        self.assert_invariants();
        Ok(added)
    }

    /// Rolls back to an earlier state captured as `(len(), grand_total())`.
    pub(crate) fn truncate(&mut self, len: usize, grand_total: Decimal) {
        self.line_items.truncate(len);
        self.grand_total = grand_total;
        self.assert_invariants();
    }
}

/// Sum of `amounts`, `None` if it leaves the range of `Decimal`.
pub(crate) fn checked_sum<I>(amounts: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
}
