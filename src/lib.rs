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

//! # Order Ledger
//!
//! This library provides the backend of a small restaurant ordering system:
//! a food catalog, checkout into per-day sales ledgers, and sales queries over
//! those ledgers.
//!
//! ## Core Components
//!
//! - [`Engine`]: Checkout processor and aggregation engine
//! - [`DailyLedger`]: All line items of one calendar day and their grand total
//! - [`LedgerStore`]: Ledger persistence with atomic per-day appends
//! - [`Catalog`]: Food items and their current prices
//! - [`Role`]: Access tiers gating the sales queries
//! - [`OrderError`]: Error types for checkout and aggregation failures
//!
//! ## Example
//!
//! ```
//! use order_ledger_rs::{CartEntry, Catalog, Engine, FixedClock, LedgerDate};
//! use rust_decimal_macros::dec;
//! use std::sync::Arc;
//!
//! let catalog = Catalog::new();
//! let burger = catalog.add("Burger", dec!(5.00)).unwrap();
//! let fries = catalog.add("Fries", dec!(2.00)).unwrap();
//!
//! let day = LedgerDate::from_ymd(2024, 5, 1).unwrap();
//! let engine = Engine::in_memory(Arc::new(catalog)).with_clock(Arc::new(FixedClock::at(day)));
//!
//! let receipt = engine
//!     .checkout(&[CartEntry::new(burger.id, 2), CartEntry::new(fries.id, 3)])
//!     .unwrap();
//! assert_eq!(receipt.grand_total, dec!(16.00));
//!
//! let summary = engine.daily_summary(day).unwrap();
//! assert_eq!(summary.items[0].food_name, "Burger");
//! assert_eq!(summary.total_revenue, dec!(16.00));
//!
//! let week = engine.trailing_week(day).unwrap();
//! assert_eq!(week.series.len(), 7);
//! assert_eq!(week.sum_total, dec!(16.00));
//! ```
//!
//! ## Thread Safety
//!
//! Concurrent checkouts on the same day never lose an update: each day's
//! ledger is appended under its own lock.

pub mod auth;
mod base;
pub mod catalog;
pub mod checkout;
mod clock;
pub mod config;
mod engine;
pub mod error;
pub mod ledger;
pub mod server;
pub mod store;
pub mod summary;

pub use auth::{AuthGate, Feature, FeatureSet, Principal, Role, TokenRoster};
pub use base::{FoodId, LedgerDate};
pub use catalog::{Catalog, CatalogStore, FoodItem};
pub use checkout::{CartEntry, CheckoutReceipt};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use engine::Engine;
pub use error::{AuthError, ErrorKind, OrderError};
pub use ledger::{DailyLedger, LineItem};
pub use store::{AppendOutcome, FileLedgerStore, LedgerStore, MemoryLedgerStore};
pub use summary::{DailySummary, DaySales, ItemSummary, WeeklySales};
