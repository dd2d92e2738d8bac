//! # Flightline Dispatch Benchmarks
//!
//! The hot paths a host calls every frame:
//!
//! | Path | Work per call |
//! |------|---------------|
//! | Typed publish | priority-ordered handlers, cancel check after each |
//! | Capability multicast | one isolated call per module, one log line each |
//! | Detector tick | rule evaluation for every loaded vessel and pair |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fl_01_telemetry_detector::{
    BusEventSink, MemoryEventSink, StaticThresholds, TelemetryDetector, TelemetryDetectorApi,
    Thresholds,
};
use shared_bus::{EventBus, Module};
use shared_types::{
    CustomEvent, ModuleResult, NullLogSink, Priority, TickSnapshot, VesselPhysicsEvents, VesselRef,
    VesselState, Vec3,
};
use std::sync::Arc;
use std::time::Duration;

struct Listener(String);

impl VesselPhysicsEvents for Listener {
    fn on_high_speed(&self, _vessel: &VesselRef, speed: f64) -> ModuleResult {
        black_box(speed);
        Ok(())
    }
}

impl Module for Listener {
    fn name(&self) -> &str {
        &self.0
    }
    fn as_vessel_physics(&self) -> Option<&(dyn VesselPhysicsEvents + 'static)> {
        Some(self)
    }
}

fn bus_with_listeners(count: usize) -> Arc<EventBus> {
    let bus = Arc::new(EventBus::new(Arc::new(NullLogSink)));
    for i in 0..count {
        let _ = bus.register_module(Arc::new(Listener(format!("listener-{i}"))));
    }
    bus
}

/// A swarm of vessels spread along a line, `spacing` meters apart.
fn swarm(tick: u64, vessels: u64, spacing: f64) -> TickSnapshot {
    (0..vessels).fold(TickSnapshot::new(tick), |snapshot, id| {
        snapshot.with_vessel(
            VesselState::new(id, format!("vessel-{id}"))
                .with_altitude(70_000.0 + tick as f64)
                .with_speed(900.0 + tick as f64)
                .with_resource("LiquidFuel", 400.0 - tick as f64)
                .with_position(Vec3::new(id as f64 * spacing, 0.0, 0.0)),
        )
    })
}

// ============================================================================
// Typed publish
// ============================================================================

fn bench_typed_publish(c: &mut Criterion) {
    let mut group = c.benchmark_group("bus-typed-publish");

    for handlers in [1usize, 8, 32] {
        let bus = bus_with_listeners(0);
        for i in 0..handlers {
            let priority = match i % 3 {
                0 => Priority::High,
                1 => Priority::Normal,
                _ => Priority::Low,
            };
            let _ = bus.subscribe::<CustomEvent, _>("bench", priority, false, |event| {
                black_box(&event.name);
                Ok(())
            });
        }

        group.throughput(Throughput::Elements(handlers as u64));
        group.bench_with_input(BenchmarkId::new("custom_event", handlers), &bus, |b, bus| {
            b.iter(|| {
                let mut event = CustomEvent::new("countdown");
                black_box(bus.publish(&mut event).is_ok())
            })
        });
    }

    group.finish();
}

// ============================================================================
// Capability multicast
// ============================================================================

fn bench_capability_multicast(c: &mut Criterion) {
    let mut group = c.benchmark_group("bus-capability-multicast");
    let vessel = VesselRef::new(1, "Hopper");

    for modules in [1usize, 10, 50] {
        let bus = bus_with_listeners(modules);

        group.throughput(Throughput::Elements(modules as u64));
        group.bench_with_input(BenchmarkId::new("on_high_speed", modules), &bus, |b, bus| {
            b.iter(|| {
                let report = bus.multicast::<dyn VesselPhysicsEvents, _>(
                    "on_high_speed",
                    format_args!("{vessel}, 1500.0"),
                    |m| m.on_high_speed(&vessel, 1500.0),
                );
                black_box(report.invoked)
            })
        });
    }

    group.finish();
}

// ============================================================================
// Detector tick
// ============================================================================

fn bench_detector_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("detector-tick");
    group.measurement_time(Duration::from_secs(5));

    for vessels in [1u64, 10, 50] {
        let snapshots: Vec<TickSnapshot> = (0..100).map(|t| swarm(t, vessels, 5_000.0)).collect();

        group.throughput(Throughput::Elements(vessels));
        group.bench_with_input(
            BenchmarkId::new("memory_sink", vessels),
            &snapshots,
            |b, snapshots| {
                let mut detector = TelemetryDetector::new(
                    Arc::new(StaticThresholds::new(Thresholds::default())),
                    Arc::new(MemoryEventSink::new()),
                );
                let mut frames = snapshots.iter().cycle();
                b.iter(|| {
                    let snapshot = frames.next().unwrap_or(&snapshots[0]);
                    black_box(detector.process_tick(snapshot).events.len())
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("bus_sink", vessels),
            &snapshots,
            |b, snapshots| {
                let bus = bus_with_listeners(10);
                let mut detector = TelemetryDetector::new(
                    Arc::new(StaticThresholds::new(Thresholds::default())),
                    Arc::new(BusEventSink::new(bus)),
                );
                let mut frames = snapshots.iter().cycle();
                b.iter(|| {
                    let snapshot = frames.next().unwrap_or(&snapshots[0]);
                    black_box(detector.process_tick(snapshot).delivered)
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_typed_publish,
    bench_capability_multicast,
    bench_detector_tick,
);

criterion_main!(benches);
