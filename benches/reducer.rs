//! Benchmarks for tick parsing and snapshot reduction

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gold_ticker::feed::{FinnhubFeed, RawTick};
use gold_ticker::snapshot::{reduce, PriceSnapshot};
use rust_decimal_macros::dec;

fn benchmark_parse_trade(c: &mut Criterion) {
    let msg = r#"{"type":"trade","data":[{"s":"OANDA:XAU_USD","p":2846.15,"t":1704067200123,"v":3}]}"#;

    c.bench_function("parse_trade_message", |b| {
        b.iter(|| FinnhubFeed::parse_message(black_box(msg)))
    });
}

fn benchmark_reduce(c: &mut Criterion) {
    let previous = PriceSnapshot::seed(
        dec!(2845.32),
        dec!(2847.90),
        dec!(2838.15),
        dec!(45200),
        Utc::now(),
    );
    let tick = RawTick::new(dec!(2846.10), Utc::now()).with_volume(dec!(2));

    c.bench_function("reduce_tick", |b| {
        b.iter(|| reduce(black_box(&previous), black_box(&tick)))
    });
}

criterion_group!(benches, benchmark_parse_trade, benchmark_reduce);
criterion_main!(benches);
