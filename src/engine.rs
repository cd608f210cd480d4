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

//! Order processing engine.
//!
//! The [`Engine`] is the central component that turns carts into ledger
//! entries and answers the sales queries. It owns no state itself: prices come
//! from a [`CatalogStore`], ledgers live in a [`LedgerStore`], and "today"
//! comes from a [`Clock`].
//!
//! # Checkout
//!
//! 1. Resolve today's UTC date from the clock.
//! 2. Validate and price the whole cart (no writes yet).
//! 3. Append all priced lines to today's ledger in one atomic store call.
//!
//! # Thread Safety
//!
//! All methods take `&self`. Concurrent checkouts on the same day are
//! serialized by the store's per-day lock; checkouts on different days do not
//! contend.

use crate::catalog::CatalogStore;
use crate::checkout::{CartEntry, CheckoutReceipt, price_cart};
use crate::clock::{Clock, SystemClock};
use crate::ledger::{DailyLedger, LineItem};
use crate::store::{LedgerStore, MemoryLedgerStore};
use crate::summary::{self, DailySummary, WeeklySales};
use crate::{LedgerDate, OrderError};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Checkout processor and aggregation engine.
///
/// # Invariants
///
/// - A failed checkout appends nothing.
/// - Every ledger's grand total equals the sum of its line totals.
/// - Queries never read the clock; only [`Engine::checkout`] and
///   [`Engine::today`] do.
pub struct Engine {
    catalog: Arc<dyn CatalogStore>,
    ledgers: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
}

impl Engine {
    /// Creates an engine over the given stores, using the wall clock.
    pub fn new(catalog: Arc<dyn CatalogStore>, ledgers: Arc<dyn LedgerStore>) -> Self {
        Engine {
            catalog,
            ledgers,
            clock: Arc::new(SystemClock),
        }
    }

    /// Creates an engine with in-memory ledgers.
    pub fn in_memory(catalog: Arc<dyn CatalogStore>) -> Self {
        Self::new(catalog, Arc::new(MemoryLedgerStore::new()))
    }

    /// Replaces the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The current UTC calendar day.
    pub fn today(&self) -> LedgerDate {
        self.clock.today()
    }

    /// Prices `cart` and appends it to today's ledger.
    ///
    /// # Errors
    ///
    /// - [`OrderError::EmptyCart`] - Cart has no entries.
    /// - [`OrderError::InvalidQuantity`] - A quantity is not a positive integer.
    /// - [`OrderError::UnknownFood`] - A food id is not in the catalog.
    /// - [`OrderError::CatalogUnavailable`] - Catalog lookup failed.
    /// - [`OrderError::AmountOverflow`] - A line or the day's grand total would
    ///   leave the range of `Decimal`.
    /// - [`OrderError::StorageUnavailable`] - The ledger could not be persisted.
    ///
    /// In every error case today's ledger is left as it was.
    pub fn checkout(&self, cart: &[CartEntry]) -> Result<CheckoutReceipt, OrderError> {
        let now = self.clock.now();
        let date = LedgerDate::from_utc(now);

        let lines = price_cart(self.catalog.as_ref(), cart, now).inspect_err(|e| {
            if matches!(e, OrderError::CatalogUnavailable(_)) {
                error!(%date, error = %e, "checkout failed");
            } else {
                warn!(%date, error = %e, "checkout rejected");
            }
        })?;

        let outcome = self.ledgers.append(date, lines).inspect_err(|e| {
            if matches!(e, OrderError::AmountOverflow(_)) {
                warn!(%date, error = %e, "checkout rejected");
            }
        })?;
        let receipt = CheckoutReceipt {
            date: outcome.date,
            appended: outcome.appended,
            grand_total: outcome.grand_total,
        };
        info!(
            %date,
            lines = receipt.appended.len(),
            cart_total = %receipt.cart_total(),
            grand_total = %receipt.grand_total,
            "checkout applied"
        );
        Ok(receipt)
    }

    /// Snapshot of the ledger of `date`, if any checkout happened that day.
    pub fn ledger(&self, date: LedgerDate) -> Result<Option<DailyLedger>, OrderError> {
        self.ledgers.load(date)
    }

    /// Line items of `date` in checkout order; empty for a day with no ledger.
    pub fn order_lines(&self, date: LedgerDate) -> Result<Vec<LineItem>, OrderError> {
        let lines = self
            .ledgers
            .load(date)?
            .map(|ledger| ledger.line_items().to_vec())
            .unwrap_or_default();
        debug!(%date, lines = lines.len(), "order lines read");
        Ok(lines)
    }

    /// Per-food totals of `date`, highest revenue first.
    pub fn daily_summary(&self, date: LedgerDate) -> Result<DailySummary, OrderError> {
        let ledger = self.ledgers.load(date)?;
        Ok(summary::summarize(date, ledger.as_ref()))
    }

    /// Sales of the seven days ending at `reference`, zero-filled.
    pub fn trailing_week(&self, reference: LedgerDate) -> Result<WeeklySales, OrderError> {
        summary::trailing_week(reference, |date| {
            Ok(self.ledgers.load(date)?.map(|ledger| ledger.grand_total()))
        })
    }
}
