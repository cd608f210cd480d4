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

//! Sales aggregation over daily ledgers.
//!
//! Two query shapes:
//!
//! - [`summarize`]: one day's line items grouped by food name, highest revenue
//!   first.
//! - [`trailing_week`]: the seven days ending at a reference date, one entry
//!   per day whether or not anything sold.
//!
//! A day without a ledger is not an error here; it aggregates to nothing.

use crate::OrderError;
use crate::base::LedgerDate;
use crate::ledger::{DailyLedger, checked_sum};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// Number of days in a trailing week, reference day included.
pub const TRAILING_DAYS: u64 = 7;

/// Quantity and revenue of one food name within a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub food_name: String,
    pub total_quantity: u64,
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: LedgerDate,
    pub items: Vec<ItemSummary>,
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySales {
    pub date: LedgerDate,
    pub total_sales: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySales {
    /// Ascending by date, always [`TRAILING_DAYS`] long.
    pub series: Vec<DaySales>,
    pub sum_total: Decimal,
}

/// Groups a day's line items by exact food name.
///
/// Groups are ordered by revenue, descending. Equal revenues keep the order
/// in which their names first appear in the ledger.
pub fn summarize(date: LedgerDate, ledger: Option<&DailyLedger>) -> DailySummary {
    let mut items: Vec<ItemSummary> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for line in ledger.map(DailyLedger::line_items).unwrap_or_default() {
        let slot = *index.entry(line.food_name.as_str()).or_insert_with(|| {
            items.push(ItemSummary {
                food_name: line.food_name.clone(),
                total_quantity: 0,
                total_revenue: Decimal::ZERO,
            });
            items.len() - 1
        });
        let item = &mut items[slot];
        item.total_quantity += u64::from(line.quantity);
        item.total_revenue += line.line_total;
    }

    // sort_by is stable, which keeps first-seen order among ties.
    items.sort_by(|a, b| b.total_revenue.cmp(&a.total_revenue));

    let total_revenue = items.iter().map(|i| i.total_revenue).sum();
    if let Some(ledger) = ledger {
        debug_assert_eq!(
            total_revenue,
            ledger.grand_total(),
            "summary of {date} disagrees with stored grand total"
        );
    }

    DailySummary {
        date,
        items,
        total_revenue,
    }
}

/// Builds the zero-filled sales series for `reference - 6 ..= reference`.
///
/// `grand_total_of` returns the stored grand total of a day, or `None` when
/// the day has no ledger. Fails with [`OrderError::AmountOverflow`] when the
/// seven totals do not add up within `Decimal`.
pub fn trailing_week<F>(reference: LedgerDate, mut grand_total_of: F) -> Result<WeeklySales, OrderError>
where
    F: FnMut(LedgerDate) -> Result<Option<Decimal>, OrderError>,
{
    let series = (0..TRAILING_DAYS)
        .rev()
        .map(|offset| -> Result<DaySales, OrderError> {
            let date = reference.days_before(offset);
            let total_sales = grand_total_of(date)?.unwrap_or(Decimal::ZERO);
            Ok(DaySales { date, total_sales })
        })
        .collect::<Result<Vec<_>, OrderError>>()?;

    let sum_total = checked_sum(series.iter().map(|d| d.total_sales)).ok_or_else(|| {
        OrderError::AmountOverflow(format!("sales of the week ending {reference}"))
    })?;
    Ok(WeeklySales { series, sum_total })
}
