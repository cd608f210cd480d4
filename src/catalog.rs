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

//! Food catalog.
//!
//! The catalog is read-shared by every checkout. Checkout only needs
//! [`CatalogStore::find`]; the CRUD surface on [`Catalog`] backs the food
//! management endpoints.

use crate::OrderError;
use crate::base::FoodId;
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, Trim};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{info, warn};

/// A sellable food item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    pub id: FoodId,
    pub name: String,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Price lookup used by checkout.
pub trait CatalogStore: Send + Sync {
    /// Returns `Ok(None)` for an unknown id and `Err` only when the lookup
    /// itself failed.
    fn find(&self, food_id: FoodId) -> Result<Option<FoodItem>, OrderError>;
}

/// In-memory catalog.
#[derive(Debug)]
pub struct Catalog {
    foods: DashMap<FoodId, FoodItem>,
    next_id: AtomicU32,
}

/// Trims the name and checks both fields.
fn validate(name: &str, price: Decimal) -> Result<String, OrderError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(OrderError::InvalidFood("name must not be empty".into()));
    }
    if price < Decimal::ZERO {
        return Err(OrderError::InvalidFood(format!(
            "price must not be negative (got {price})"
        )));
    }
    Ok(name.to_string())
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            foods: DashMap::new(),
            next_id: AtomicU32::new(1),
        }
    }

    /// All foods in ascending id order.
    pub fn list(&self) -> Vec<FoodItem> {
        let mut foods: Vec<FoodItem> = self.foods.iter().map(|f| f.value().clone()).collect();
        foods.sort_by_key(|f| f.id);
        foods
    }

    pub fn get(&self, food_id: FoodId) -> Option<FoodItem> {
        self.foods.get(&food_id).map(|f| f.value().clone())
    }

    pub fn len(&self) -> usize {
        self.foods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }

    /// Adds a food and assigns it the next id.
    ///
    /// # Errors
    ///
    /// [`OrderError::InvalidFood`] if the trimmed name is empty or the price
    /// is negative.
    pub fn add(&self, name: &str, price: Decimal) -> Result<FoodItem, OrderError> {
        let name = validate(name, price)?;
        let id = FoodId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let now = Utc::now();
        let food = FoodItem {
            id,
            name,
            price,
            created_at: now,
            updated_at: now,
        };
        self.foods.insert(id, food.clone());
        info!(food_id = %id, name = %food.name, price = %food.price, "food added");
        Ok(food)
    }

    /// Replaces name and price of an existing food.
    ///
    /// Ledgers keep the name and price they recorded at checkout.
    pub fn update(&self, food_id: FoodId, name: &str, price: Decimal) -> Result<FoodItem, OrderError> {
        let name = validate(name, price)?;
        let mut food = self
            .foods
            .get_mut(&food_id)
            .ok_or(OrderError::UnknownFood(food_id))?;
        food.name = name;
        food.price = price;
        food.updated_at = Utc::now();
        info!(food_id = %food_id, name = %food.name, price = %food.price, "food updated");
        Ok(food.clone())
    }

    pub fn remove(&self, food_id: FoodId) -> Result<FoodItem, OrderError> {
        let (_, food) = self
            .foods
            .remove(&food_id)
            .ok_or(OrderError::UnknownFood(food_id))?;
        info!(food_id = %food_id, name = %food.name, "food removed");
        Ok(food)
    }

    /// Seeds the catalog from a `name,price` CSV.
    ///
    /// Malformed rows and rows failing validation are skipped with a warning.
    /// Returns the number of foods added.
    ///
    /// # Example
    ///
    /// ```csv
    /// name,price
    /// Burger,5.00
    /// Fries,2.00
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a CSV error only if the header itself cannot be read.
    pub fn load_csv<R: Read>(&self, reader: R) -> Result<usize, csv::Error> {
        let mut rdr = ReaderBuilder::new()
            .trim(Trim::All)
            .has_headers(true)
            .from_reader(reader);
        rdr.headers()?;

        let mut added = 0;
        for (row, result) in rdr.deserialize::<CsvFood>().enumerate() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    warn!(row = row + 1, error = %e, "skipping malformed catalog row");
                    continue;
                }
            };
            match self.add(&record.name, record.price) {
                Ok(_) => added += 1,
                Err(e) => warn!(row = row + 1, error = %e, "skipping invalid catalog row"),
            }
        }
        Ok(added)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore for Catalog {
    fn find(&self, food_id: FoodId) -> Result<Option<FoodItem>, OrderError> {
        Ok(self.get(food_id))
    }
}

#[derive(Debug, Deserialize)]
struct CsvFood {
    name: String,
    price: Decimal,
}
