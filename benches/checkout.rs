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

//! Benchmarks for checkout and the sales queries.
//!
//! Run with: cargo bench
//!
//! Benchmarks include:
//! - Single-threaded checkout
//! - Parallel checkouts on one day and across days
//! - Daily summary and trailing week over large ledgers

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use order_ledger_rs::{
    CartEntry, Catalog, Clock, Engine, FixedClock, FoodId, LedgerDate,
};
use rayon::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

// =============================================================================
// Helper Functions
// =============================================================================

const FOODS: u32 = 20;

fn day() -> LedgerDate {
    LedgerDate::from_ymd(2024, 5, 1).unwrap()
}

fn menu() -> Arc<Catalog> {
    let catalog = Catalog::new();
    for i in 0..FOODS {
        catalog
            .add(&format!("Food {i}"), Decimal::new(150 + i64::from(i) * 25, 2))
            .unwrap();
    }
    Arc::new(catalog)
}

fn engine() -> Engine {
    Engine::in_memory(menu()).with_clock(Arc::new(FixedClock::at(day())))
}

fn make_cart(seed: u32) -> Vec<CartEntry> {
    (0..3)
        .map(|k| CartEntry::new(FoodId((seed + k) % FOODS + 1), i64::from(k + 1)))
        .collect()
}

/// Clock spreading checkouts round-robin over a week.
struct WeekClock(AtomicU64);

impl Clock for WeekClock {
    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        let n = self.0.fetch_add(1, Ordering::Relaxed) % 7;
        FixedClock::at(day().days_before(n)).now()
    }
}

// =============================================================================
// Single-Threaded Benchmarks
// =============================================================================

fn bench_single_checkout(c: &mut Criterion) {
    c.bench_function("single_checkout", |b| {
        let engine = engine();
        let mut seed = 0u32;
        b.iter(|| {
            let cart = make_cart(seed);
            seed = seed.wrapping_add(1);
            engine.checkout(black_box(&cart)).unwrap();
        })
    });
}

fn bench_checkout_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("checkout_throughput");

    for count in [100, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter(|| {
                let engine = engine();
                for i in 0..count {
                    engine.checkout(&make_cart(i as u32)).unwrap();
                }
            })
        });
    }

    group.finish();
}

fn bench_rejected_checkout(c: &mut Criterion) {
    c.bench_function("rejected_checkout", |b| {
        let engine = engine();
        let cart = vec![
            CartEntry::new(FoodId(1), 2),
            CartEntry::new(FoodId(FOODS + 1), 1),
        ];
        b.iter(|| {
            assert!(engine.checkout(black_box(&cart)).is_err());
        })
    });
}

// =============================================================================
// Multi-Threaded Benchmarks
// =============================================================================

fn bench_parallel_same_day(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_same_day");

    for count in [1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter(|| {
                let engine = engine();
                (0..count).into_par_iter().for_each(|i: u32| {
                    engine.checkout(&make_cart(i)).unwrap();
                });
            })
        });
    }

    group.finish();
}

fn bench_parallel_across_days(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_across_days");
    let count = 10_000u32;
    group.throughput(Throughput::Elements(u64::from(count)));
    group.bench_function("week", |b| {
        b.iter(|| {
            let engine =
                Engine::in_memory(menu()).with_clock(Arc::new(WeekClock(AtomicU64::new(0))));
            (0..count).into_par_iter().for_each(|i| {
                engine.checkout(&make_cart(i)).unwrap();
            });
        })
    });
    group.finish();
}

// =============================================================================
// Query Benchmarks
// =============================================================================

fn bench_daily_summary(c: &mut Criterion) {
    let mut group = c.benchmark_group("daily_summary");

    for lines in [1_000u32, 10_000, 100_000].iter() {
        let engine = engine();
        for i in 0..lines / 3 {
            engine.checkout(&make_cart(i)).unwrap();
        }
        group.throughput(Throughput::Elements(u64::from(*lines)));
        group.bench_with_input(BenchmarkId::from_parameter(lines), lines, |b, _| {
            b.iter(|| black_box(engine.daily_summary(day()).unwrap()))
        });
    }

    group.finish();
}

fn bench_trailing_week(c: &mut Criterion) {
    let engine = Engine::in_memory(menu()).with_clock(Arc::new(WeekClock(AtomicU64::new(0))));
    for i in 0..7_000 {
        engine.checkout(&make_cart(i)).unwrap();
    }

    c.bench_function("trailing_week", |b| {
        b.iter(|| black_box(engine.trailing_week(black_box(day())).unwrap()))
    });
}

criterion_group!(
    single_threaded,
    bench_single_checkout,
    bench_checkout_throughput,
    bench_rejected_checkout,
);

criterion_group!(multi_threaded, bench_parallel_same_day, bench_parallel_across_days,);

criterion_group!(queries, bench_daily_summary, bench_trailing_week,);

criterion_main!(single_threaded, multi_threaded, queries);
