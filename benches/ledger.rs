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

//! Benchmarks for the contribution ledger.
//!
//! Run with: cargo bench
//!
//! Benchmarks include:
//! - Declaring payments, single and multi-threaded
//! - Month confirmation over growing tables
//! - Expense splits
//! - Fund indicators scaling with the number of participants

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use fund_ledger_rs::{
    CallerContext, ExpenseSplit, FixedClock, Ledger, MemoryStore, NewParticipant, NewPayment,
    ParticipantId, PaymentMethod, Period,
};
use rayon::prelude::*;
use rust_decimal_macros::dec;

// =============================================================================
// Helper Functions
// =============================================================================

fn admin() -> CallerContext {
    CallerContext::admin(ParticipantId::new())
}

fn ledger_with(participants: usize) -> (Ledger<MemoryStore, FixedClock>, Vec<ParticipantId>) {
    let clock = FixedClock::on(2025, 12, 15).expect("valid date");
    let ledger = Ledger::with_clock(MemoryStore::new(), clock);
    let ids = (0..participants)
        .map(|i| {
            ledger
                .add_participant(
                    &admin(),
                    NewParticipant::new(format!("Member {i}"), format!("member{i}@fund.ch")),
                )
                .unwrap()
                .id
        })
        .collect();
    ledger
        .set_config(&admin(), "monthly_due_amount", "50")
        .unwrap();
    (ledger, ids)
}

fn declare_year(ledger: &Ledger<MemoryStore, FixedClock>, ids: &[ParticipantId]) {
    for id in ids {
        for month in 1..=12 {
            ledger
                .declare_payment(
                    &CallerContext::participant(*id),
                    NewPayment::new(
                        Period::new(2025, month).unwrap(),
                        dec!(50),
                        PaymentMethod::BankTransfer,
                    ),
                )
                .unwrap();
        }
    }
}

// =============================================================================
// Declarations
// =============================================================================

fn bench_declare(c: &mut Criterion) {
    c.bench_function("declare_single", |b| {
        b.iter_batched(
            || ledger_with(1),
            |(ledger, ids)| {
                ledger
                    .declare_payment(
                        &CallerContext::participant(ids[0]),
                        black_box(NewPayment::new(
                            Period::new(2025, 3).unwrap(),
                            dec!(50),
                            PaymentMethod::MobilePayment,
                        )),
                    )
                    .unwrap();
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_declare_concurrent(c: &mut Criterion) {
    let mut group = c.benchmark_group("declare_concurrent");

    for count in [100, 1_000].iter() {
        group.throughput(Throughput::Elements(*count as u64 * 12));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter_batched(
                || ledger_with(count),
                |(ledger, ids)| {
                    ids.par_iter().for_each(|id| {
                        for month in 1..=12 {
                            ledger
                                .declare_payment(
                                    &CallerContext::participant(*id),
                                    NewPayment::new(
                                        Period::new(2025, month).unwrap(),
                                        dec!(50),
                                        PaymentMethod::BankTransfer,
                                    ),
                                )
                                .unwrap();
                        }
                    });
                    black_box(&ledger);
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

// =============================================================================
// Confirmation and Splits
// =============================================================================

fn bench_confirm_month(c: &mut Criterion) {
    let mut group = c.benchmark_group("confirm_month");

    for count in [10, 100, 1_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter_batched(
                || {
                    let (ledger, ids) = ledger_with(count);
                    declare_year(&ledger, &ids);
                    ledger
                },
                |ledger| {
                    let confirmed = ledger.confirm_month(&admin(), "2025-06").unwrap();
                    assert_eq!(confirmed, count);
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_split_expense(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_expense");

    for count in [3, 30, 300].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let (ledger, ids) = ledger_with(count);
            b.iter(|| {
                ledger
                    .split_expense(
                        &admin(),
                        black_box(ExpenseSplit::equal(ids.clone(), dec!(100), "hall rental")),
                    )
                    .unwrap();
            })
        });
    }
    group.finish();
}

// =============================================================================
// Indicators
// =============================================================================

fn bench_fund_kpis(c: &mut Criterion) {
    let mut group = c.benchmark_group("fund_kpis");

    for count in [10, 100, 1_000].iter() {
        let (ledger, ids) = ledger_with(*count);
        declare_year(&ledger, &ids);
        ledger.confirm_month(&admin(), "2025-01").unwrap();

        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| black_box(ledger.fund_kpis(&admin(), 2025).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_declare,
    bench_declare_concurrent,
    bench_confirm_month,
    bench_split_expense,
    bench_fund_kpis,
);
criterion_main!(benches);
