//! Performance benchmarks for busline
//!
//! Tracks steady-state dispatch cost and the cost of registering instances of
//! a listener type whose invocation paths are already cached.

use busline::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub trait BenchEvent: Event {}
pub trait BenchListener: Send + Sync {}

type BenchBus = EventBus<dyn BenchEvent, dyn BenchListener>;

pub struct SimpleEvent {
    pub id: u64,
}

impl BenchEvent for SimpleEvent {}

pub struct UnhandledEvent;

impl BenchEvent for UnhandledEvent {}

#[derive(Default)]
pub struct Accumulator {
    total: AtomicU64,
}

impl BenchListener for Accumulator {}

#[listener(events = dyn BenchEvent, family = dyn BenchListener)]
impl Accumulator {
    #[subscribe]
    pub fn on_simple(&self, event: &SimpleEvent) {
        self.total.fetch_add(event.id, Ordering::Relaxed);
    }
}

fn bench_bus() -> BenchBus {
    new_event_bus().expect("families are trait objects")
}

fn benchmark_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");

    for handler_count in [1usize, 10, 100].iter() {
        group.bench_with_input(
            BenchmarkId::new("fire_event", handler_count),
            handler_count,
            |b, &handler_count| {
                let bus = bench_bus();
                let listeners: Vec<Arc<Accumulator>> = (0..handler_count)
                    .map(|_| Arc::new(Accumulator::default()))
                    .collect();
                for listener in &listeners {
                    bus.register_listener(listener).unwrap();
                }

                let event = SimpleEvent { id: 1 };
                b.iter(|| {
                    bus.fire_event(black_box(&event));
                });
            },
        );
    }

    group.bench_function("fire_unhandled", |b| {
        let bus = bench_bus();
        bus.register_listener(&Arc::new(Accumulator::default()))
            .unwrap();
        b.iter(|| {
            bus.fire_event(black_box(&UnhandledEvent));
        });
    });

    group.finish();
}

fn benchmark_registration(c: &mut Criterion) {
    let mut group = c.benchmark_group("registration");

    group.bench_function("register_unregister_cached_path", |b| {
        let bus = bench_bus();
        // Keeps the domain and its path alive between iterations.
        let resident = Arc::new(Accumulator::default());
        bus.register_listener(&resident).unwrap();

        b.iter(|| {
            let listener = Arc::new(Accumulator::default());
            bus.register_listener(black_box(&listener)).unwrap();
            bus.unregister_listener(&listener);
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_dispatch, benchmark_registration);
criterion_main!(benches);
