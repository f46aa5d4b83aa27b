//! Criterion benchmarks for the single-byte monitor-switch codec.
//!
//! The codec sits on the broadcast hot path (once per accepted switch, once
//! per client on the receiving side), so it should stay in the nanosecond
//! range.
//!
//! Run with:
//! ```bash
//! cargo bench --package sunmonlok-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sunmonlok_core::protocol::{decode_monitor_switch, encode_monitor_switch, MAX_MONITOR_ID};
use sunmonlok_core::MonitorId;

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    group.bench_function("monitor_id", |b| {
        b.iter(|| encode_monitor_switch(black_box(MonitorId::new(3))))
    });

    // Rejection path
    group.bench_function("out_of_range", |b| {
        b.iter(|| encode_monitor_switch(black_box(42i64)))
    });

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    group.bench_function("valid", |b| {
        b.iter(|| decode_monitor_switch(black_box(&[MAX_MONITOR_ID])))
    });

    group.bench_function("malformed", |b| {
        b.iter(|| decode_monitor_switch(black_box(&[1, 2])))
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
