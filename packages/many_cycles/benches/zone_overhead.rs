//! Benchmarks to measure the overhead of opening and closing profile zones.
//!
//! The zones measured here do no work of their own, so everything measured is profiler
//! overhead that also gets added to every real zone.

#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use many_cycles::{AnchorId, Profiler, read_cycle_counter, zone};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("many_cycles_zone_overhead");

    group.bench_function("baseline_empty", |b| {
        b.iter(|| {
            black_box(());
        });
    });

    group.bench_function("read_cycle_counter", |b| {
        b.iter(|| black_box(read_cycle_counter()));
    });

    let profiler = Profiler::new();
    let outer = AnchorId::new(1);
    let inner = AnchorId::new(2);

    profiler.begin_profile();

    group.bench_function("explicit_zone_empty", |b| {
        b.iter(|| {
            let _zone = profiler.open_zone("empty", outer, 0);
            black_box(());
        });
    });

    group.bench_function("explicit_zone_nested_empty", |b| {
        b.iter(|| {
            let _outer = profiler.open_zone("outer", outer, 0);
            let _inner = profiler.open_zone("inner", inner, 64);
            black_box(());
        });
    });

    group.bench_function("macro_zone_empty", |b| {
        b.iter(|| {
            zone!("macro");
            black_box(());
        });
    });

    group.finish();

    // Only the overhead matters here, the report itself is discarded.
    drop(profiler.end_profile());
    drop(many_cycles::end_profile());
}
