//! Criterion benchmarks for the receive hot path.
//!
//! The driver thread calls into the rx ring once per delivery, so the cost of a single
//! `feed` or `write_slots`/`commit` bounds the sample rate the core can sustain.
//!
//! Key metrics:
//! - Feed throughput for typical burst sizes
//! - Extractor throughput over a full rx buffer
//! - Transmit cursor advance
//!
//! Run with: cargo bench --bench rx_feed

use channel_sounder::data::{RxRingBuffer, TxRingBuffer, Waveform};
use channel_sounder::measurement::{measurement_pipeline, WindowGeometry};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

const CHANNELS: usize = 2;
const WIDTH: usize = 4;

/// Benchmark copying one delivery into the rx ring.
///
/// A consumer drains every handed-off buffer inline, so the measurement covers the
/// copy, the fill bookkeeping and the handoff itself.
fn rx_feed_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("rx_feed");

    for burst in [500usize, 2_000, 8_000] {
        let rx = RxRingBuffer::new(CHANNELS, WIDTH, burst, 1_000_000, false).unwrap();
        let block = vec![vec![0x5Au8; burst * WIDTH]; CHANNELS];

        group.throughput(Throughput::Bytes((burst * WIDTH * CHANNELS) as u64));
        group.bench_with_input(BenchmarkId::new("feed", burst), &burst, |b, &burst| {
            b.iter(|| {
                let outcome = rx.feed(black_box(&block), burst);
                rx.buffers()
                    .wait_and_consume(Duration::ZERO, || true, || {}, |_, n| n);
                black_box(outcome);
            });
        });
    }

    group.finish();
}

/// Benchmark the zero-copy path where the driver writes into the ring directly.
fn rx_write_slots(c: &mut Criterion) {
    let burst = 2_000;
    let rx = RxRingBuffer::new(CHANNELS, WIDTH, burst, 1_000_000, false).unwrap();

    c.bench_function("rx_write_slots_commit", |b| {
        b.iter(|| {
            let mut slots = rx.write_slots();
            for ch in 0..CHANNELS {
                slots.channel_mut(ch).fill(0xA5);
            }
            let outcome = slots.commit(burst);
            rx.buffers()
                .wait_and_consume(Duration::ZERO, || true, || {}, |_, n| n);
            black_box(outcome);
        });
    });
}

/// Benchmark window extraction over one full rx buffer.
fn extractor_throughput(c: &mut Criterion) {
    let temp_dir = tempfile::tempdir().unwrap();
    let geometry = WindowGeometry::new(500, 25_000, 10_000).unwrap();
    let (mut extractor, _saver) =
        measurement_pipeline(CHANNELS, WIDTH, geometry, temp_dir.path(), false);

    let samples = 1_000_000;
    let block = vec![vec![0u8; samples * WIDTH]; CHANNELS];

    let mut group = c.benchmark_group("extractor");
    group.throughput(Throughput::Elements(samples as u64));
    group.bench_function("feed_1M_samples", |b| {
        b.iter(|| {
            black_box(extractor.feed(black_box(&block), samples));
        });
    });
    group.finish();
}

/// Benchmark the transmit cursor advance, called once per tx request.
fn tx_read_slots(c: &mut Criterion) {
    let mut tx = TxRingBuffer::new(
        CHANNELS,
        WIDTH,
        2_000,
        25_000_000,
        Waveform::Sine { tone_hz: 1_000_000 },
        false,
    )
    .unwrap();

    c.bench_function("tx_read_slots", |b| {
        b.iter(|| {
            let slots = tx.read_slots(black_box(1_999));
            black_box(slots.channel(0).len());
        });
    });
}

criterion_group!(
    benches,
    rx_feed_throughput,
    rx_write_slots,
    extractor_throughput,
    tx_read_slots
);
criterion_main!(benches);
