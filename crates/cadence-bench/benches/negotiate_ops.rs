//! Criterion benchmarks for step negotiation across in-process ranks.

use cadence_engine::{GlobalStepNegotiator, StepStats};
use cadence_parallel::{Communicator, LocalGroup};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::thread;

fn negotiate_group(n: usize) {
    thread::scope(|s| {
        for comm in LocalGroup::new(n) {
            s.spawn(move || {
                let dt = 0.01 * (comm.rank().0 + 1) as f64;
                let local = StepStats::from_candidates(&[dt, 2.0 * dt]).unwrap();
                black_box(GlobalStepNegotiator::new(&comm).negotiate(local).unwrap());
            });
        }
    });
}

fn bench_negotiate_4_ranks(c: &mut Criterion) {
    c.bench_function("negotiate_4_ranks", |b| b.iter(|| negotiate_group(4)));
}

fn bench_negotiate_16_ranks(c: &mut Criterion) {
    c.bench_function("negotiate_16_ranks", |b| b.iter(|| negotiate_group(16)));
}

criterion_group!(benches, bench_negotiate_4_ranks, bench_negotiate_16_ranks);
criterion_main!(benches);
