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

//! Cart validation and pricing.
//!
//! Checkout is reject-before-apply: [`price_cart`] checks every entry and
//! resolves every price before anything is written, so a cart with one bad
//! entry leaves the ledger untouched.

use crate::OrderError;
use crate::base::{FoodId, LedgerDate};
use crate::catalog::CatalogStore;
use crate::ledger::LineItem;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One requested food and quantity.
///
/// Quantity is signed so out-of-range values reach validation instead of
/// failing deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub food_id: FoodId,
    pub quantity: i64,
}

impl CartEntry {
    pub fn new(food_id: FoodId, quantity: i64) -> Self {
        Self { food_id, quantity }
    }
}

/// What a checkout did to the day's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub date: LedgerDate,
    pub appended: Vec<LineItem>,
    pub grand_total: Decimal,
}

impl CheckoutReceipt {
    /// Sum of the appended line totals.
    pub fn cart_total(&self) -> Decimal {
        self.appended.iter().map(|l| l.line_total).sum()
    }
}

fn validated_quantity(entry: &CartEntry) -> Result<u32, OrderError> {
    u32::try_from(entry.quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or(OrderError::InvalidQuantity {
            food_id: entry.food_id,
            quantity: entry.quantity,
        })
}

/// Validates `cart` and prices it against `catalog`.
///
/// Lines come back in cart order, each stamped with `now`.
///
/// # Errors
///
/// - [`OrderError::EmptyCart`] - `cart` has no entries.
/// - [`OrderError::InvalidQuantity`] - first entry whose quantity is not a positive `u32`.
/// - [`OrderError::UnknownFood`] - first entry whose food id is not in the catalog.
/// - [`OrderError::AmountOverflow`] - a line total does not fit in a `Decimal`.
/// - [`OrderError::CatalogUnavailable`] - the catalog lookup itself failed.
pub fn price_cart(
    catalog: &dyn CatalogStore,
    cart: &[CartEntry],
    now: DateTime<Utc>,
) -> Result<Vec<LineItem>, OrderError> {
    if cart.is_empty() {
        return Err(OrderError::EmptyCart);
    }

    // Structural checks first so a malformed cart never costs catalog lookups.
    let quantities = cart
        .iter()
        .map(validated_quantity)
        .collect::<Result<Vec<u32>, _>>()?;

    cart.iter()
        .zip(quantities)
        .map(|(entry, quantity)| -> Result<LineItem, OrderError> {
            let food = catalog
                .find(entry.food_id)?
                .ok_or(OrderError::UnknownFood(entry.food_id))?;
            let line_total = food
                .price
                .checked_mul(Decimal::from(quantity))
                .ok_or_else(|| {
                    OrderError::AmountOverflow(format!(
                        "{} x {} for food {}",
                        food.price, quantity, food.id
                    ))
                })?;
            Ok(LineItem {
                food_id: food.id,
                food_name: food.name,
                quantity,
                line_total,
                created_at: now,
            })
        })
        .collect()
}
