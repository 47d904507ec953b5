//! Pacing benchmark: Measure queue withdrawal and per-frame cost.
//!
//! Target: < 1µs per frame at any backlog

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use inkstream::{ContentQueue, PacingConfig, PacingScheduler};
use std::time::Duration;

fn queue_withdraw(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_withdraw");

    for (name, text) in [("ascii", "x".repeat(10_000)), ("mixed", "é☕👍🏽a".repeat(2_500))] {
        group.bench_with_input(BenchmarkId::new("step_3", name), &text, |b, text| {
            b.iter(|| {
                let mut queue = ContentQueue::new();
                queue.push(text.as_str());
                while !queue.is_empty() {
                    black_box(queue.withdraw(3));
                }
            });
        });
    }

    group.finish();
}

fn scheduler_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler_frame");

    for backlog in [100, 1_000, 5_000] {
        group.bench_with_input(BenchmarkId::new("backlog", backlog), &backlog, |b, &backlog| {
            let mut scheduler = PacingScheduler::new(PacingConfig::default());
            let mut queue = ContentQueue::new();
            scheduler.ensure_scheduled();
            let mut frame = 0u32;

            b.iter(|| {
                if queue.queued_chars() < backlog / 2 {
                    queue.push("y".repeat(backlog));
                }
                frame = frame.wrapping_add(1);
                black_box(scheduler.on_frame(Duration::from_millis(16) * frame, &mut queue))
            });
        });
    }

    group.finish();
}

fn fragment_burst(c: &mut Criterion) {
    c.bench_function("push_1000_fragments", |b| {
        b.iter(|| {
            let mut queue = ContentQueue::new();
            for i in 0..1_000 {
                queue.push(format!("token{i} "));
            }
            black_box(queue.queued_chars())
        });
    });
}

criterion_group!(benches, queue_withdraw, scheduler_frame, fragment_burst);
criterion_main!(benches);
