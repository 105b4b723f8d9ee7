//! Criterion benchmarks for packet construction and the sender hot path.
//!
//! Run with:
//! ```bash
//! cargo bench --package lkvm-core --bench packet_bench
//! ```

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lkvm_core::input::mouse::scale_absolute;
use lkvm_core::transport::mock::RecordingSink;
use lkvm_core::{checksum, CommandCode, Frame, MediaKey, Modifiers, MouseSender};

// ── Fixtures ──────────────────────────────────────────────────────────────────

fn frame_fixtures() -> Vec<(&'static str, Frame)> {
    vec![
        (
            "key_down",
            Frame::new(
                CommandCode::KeyboardGeneral,
                vec![Modifiers::SHIFT.bits(), 0, 0x04, 0x05, 0, 0, 0, 0],
            ),
        ),
        (
            "media",
            Frame::new(CommandCode::KeyboardMedia, MediaKey::VolumeUp.payload()),
        ),
        (
            "mouse_abs",
            Frame::new(
                CommandCode::MouseAbsolute,
                vec![0x02, 0x01, 0x00, 0x08, 0x00, 0x08, 0x00],
            ),
        ),
        (
            "mouse_rel",
            Frame::new(CommandCode::MouseRelative, vec![0x01, 0x00, 0x05, 0xFB, 0x00]),
        ),
    ]
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    for (name, frame) in frame_fixtures() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &frame, |b, f| {
            b.iter(|| black_box(f.encode()))
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for (name, frame) in frame_fixtures() {
        let bytes = frame.encode();
        group.bench_with_input(BenchmarkId::from_parameter(name), &bytes, |b, bytes| {
            b.iter(|| black_box(Frame::decode(black_box(bytes))))
        });
    }
    group.finish();
}

fn bench_checksum(c: &mut Criterion) {
    let body = [0x57, 0xAB, 0x00, 0x02, 0x08, 0x02, 0x00, 0x04, 0x05, 0, 0, 0, 0];
    c.bench_function("checksum", |b| b.iter(|| black_box(checksum(black_box(&body)))));
}

fn bench_scale_absolute(c: &mut Criterion) {
    c.bench_function("scale_absolute", |b| {
        b.iter(|| black_box(scale_absolute(black_box(1234), black_box(1920))))
    });
}

fn bench_relative_move(c: &mut Criterion) {
    let sink = Arc::new(RecordingSink::new());
    let mouse = MouseSender::new(sink.clone());
    c.bench_function("mouse_move_relative", |b| {
        b.iter(|| {
            mouse.move_relative(black_box(7), black_box(-3)).ok();
            sink.clear();
        })
    });
}

criterion_group!(
    benches,
    bench_encode,
    bench_decode,
    bench_checksum,
    bench_scale_absolute,
    bench_relative_move
);
criterion_main!(benches);
