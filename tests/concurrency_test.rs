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

//! Concurrency tests for checkout and ledger reads.
//!
//! These tests hammer the per-day ledger locks from many threads and verify
//! that no increment is lost. A watchdog thread uses parking_lot's built-in
//! deadlock detector (enabled through the `deadlock_detection` dev feature)
//! to fail fast if the lock order ever forms a cycle.

use order_ledger_rs::{
    CartEntry, Catalog, Clock, Engine, FileLedgerStore, FixedClock, FoodId, LedgerDate,
    LedgerStore, MemoryLedgerStore,
};
use parking_lot::deadlock;
use rayon::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

/// Spawns a watchdog that panics if parking_lot reports a deadlock.
///
/// Returns a flag that stops the watchdog when set.
fn start_deadlock_watchdog() -> Arc<AtomicBool> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    thread::spawn(move || {
        while !flag.load(Ordering::Relaxed) {
            thread::sleep(Duration::from_millis(50));
            let deadlocks = deadlock::check_deadlock();
            if !deadlocks.is_empty() {
                for (i, threads) in deadlocks.iter().enumerate() {
                    eprintln!("Deadlock #{i}");
                    for t in threads {
                        eprintln!("Thread {:?}\n{:?}", t.thread_id(), t.backtrace());
                    }
                }
                panic!("deadlock detected");
            }
        }
    });
    stop
}

fn menu() -> Arc<Catalog> {
    let catalog = Catalog::new();
    catalog.add("Burger", dec!(5.00)).unwrap();
    catalog.add("Fries", dec!(2.00)).unwrap();
    catalog.add("Soda", dec!(1.25)).unwrap();
    Arc::new(catalog)
}

fn day(d: u32) -> LedgerDate {
    LedgerDate::from_ymd(2024, 5, d).unwrap()
}

/// Clock that reports a day chosen per thread, so one engine can write
/// several days at once.
struct RotatingClock {
    counter: AtomicU64,
    days: u32,
}

impl Clock for RotatingClock {
    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        FixedClock::at(day(1 + (n % u64::from(self.days)) as u32)).now()
    }
}

#[test]
fn concurrent_checkouts_same_day_lose_nothing() {
    let stop = start_deadlock_watchdog();
    let engine = Engine::in_memory(menu()).with_clock(Arc::new(FixedClock::at(day(1))));

    const CHECKOUTS: usize = 2_000;
    let receipts: Vec<_> = (0..CHECKOUTS)
        .into_par_iter()
        .map(|i| {
            let cart = [
                CartEntry::new(FoodId(1), 1),
                CartEntry::new(FoodId((i % 3) as u32 + 1), 2),
            ];
            engine.checkout(&cart).unwrap()
        })
        .collect();

    let expected: Decimal = receipts.iter().map(|r| r.cart_total()).sum();
    let ledger = engine.ledger(day(1)).unwrap().unwrap();
    assert_eq!(ledger.len(), CHECKOUTS * 2);
    assert_eq!(ledger.grand_total(), expected);
    assert!(ledger.is_balanced());

    // The largest grand total seen by any checkout is the final one.
    let max_seen = receipts.iter().map(|r| r.grand_total).max().unwrap();
    assert_eq!(max_seen, ledger.grand_total());

    stop.store(true, Ordering::Relaxed);
}

#[test]
fn each_checkout_lines_stay_contiguous() {
    let engine = Engine::in_memory(menu()).with_clock(Arc::new(FixedClock::at(day(1))));

    thread::scope(|s| {
        for t in 0..8u32 {
            let engine = &engine;
            s.spawn(move || {
                for _ in 0..200 {
                    // Quantity tags the thread so its lines can be found again.
                    let cart = [
                        CartEntry::new(FoodId(1), i64::from(t) + 1),
                        CartEntry::new(FoodId(2), i64::from(t) + 1),
                        CartEntry::new(FoodId(3), i64::from(t) + 1),
                    ];
                    engine.checkout(&cart).unwrap();
                }
            });
        }
    });

    let ledger = engine.ledger(day(1)).unwrap().unwrap();
    assert_eq!(ledger.len(), 8 * 200 * 3);
    for chunk in ledger.line_items().chunks(3) {
        let ids: Vec<u32> = chunk.iter().map(|l| l.food_id.0).collect();
        assert_eq!(ids, vec![1, 2, 3], "a checkout was interleaved with another");
        assert!(chunk.iter().all(|l| l.quantity == chunk[0].quantity));
    }
}

#[test]
fn concurrent_checkouts_across_days_with_readers() {
    let stop = start_deadlock_watchdog();
    let clock = Arc::new(RotatingClock {
        counter: AtomicU64::new(0),
        days: 5,
    });
    let engine = Engine::in_memory(menu()).with_clock(clock);
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        // Readers run summaries and weekly rollups while writers append.
        for _ in 0..4 {
            s.spawn(|| {
                while !done.load(Ordering::Relaxed) {
                    for d in 1..=5 {
                        let ledger = engine.ledger(day(d)).unwrap();
                        let summary = engine.daily_summary(day(d)).unwrap();
                        if let Some(ledger) = ledger {
                            assert!(ledger.is_balanced());
                        }
                        assert!(summary.total_revenue >= Decimal::ZERO);
                    }
                    let week = engine.trailing_week(day(7)).unwrap();
                    assert_eq!(week.series.len(), 7);
                }
            });
        }

        (0..5_000).into_par_iter().for_each(|_| {
            engine.checkout(&[CartEntry::new(FoodId(3), 4)]).unwrap();
        });
        done.store(true, Ordering::Relaxed);
    });

    let week = engine.trailing_week(day(5)).unwrap();
    assert_eq!(week.sum_total, dec!(5.00) * Decimal::from(5_000));
    for d in 1..=5 {
        assert_eq!(engine.ledger(day(d)).unwrap().unwrap().len(), 1_000);
    }

    stop.store(true, Ordering::Relaxed);
}

#[test]
fn file_store_concurrent_appends_are_durable() {
    let tmp = tempfile::tempdir().unwrap();
    {
        let store: Arc<dyn LedgerStore> = Arc::new(FileLedgerStore::open(tmp.path()).unwrap());
        let engine = Engine::new(menu(), store).with_clock(Arc::new(FixedClock::at(day(2))));
        (0..200).into_par_iter().for_each(|_| {
            engine.checkout(&[CartEntry::new(FoodId(2), 1)]).unwrap();
        });
    }

    let reopened = FileLedgerStore::open(tmp.path()).unwrap();
    let ledger = reopened.load(day(2)).unwrap().unwrap();
    assert_eq!(ledger.len(), 200);
    assert_eq!(ledger.grand_total(), dec!(400.00));
}

#[test]
fn memory_store_direct_appends_from_threads() {
    let store = MemoryLedgerStore::new();
    let catalog = menu();
    let burger = catalog.get(FoodId(1)).unwrap();

    thread::scope(|s| {
        for _ in 0..16 {
            s.spawn(|| {
                for _ in 0..100 {
                    let line = order_ledger_rs::LineItem {
                        food_id: burger.id,
                        food_name: burger.name.clone(),
                        quantity: 1,
                        line_total: burger.price,
                        created_at: chrono::Utc::now(),
                    };
                    store.append(day(9), vec![line]).unwrap();
                }
            });
        }
    });

    let ledger = store.load(day(9)).unwrap().unwrap();
    assert_eq!(ledger.len(), 1_600);
    assert_eq!(ledger.grand_total(), dec!(8000.00));
}
