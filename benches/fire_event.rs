//! Benchmarks for registry lookups and event firing.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use ccg_triggers::core::{EntityId, Value};
use ccg_triggers::effects::{EffectDef, UpdateFn};
use ccg_triggers::engine::TriggerEngine;
use ccg_triggers::triggers::{Event, EventType, PolicyExpr, Registry, Timing, TriggerDef};

// =============================================================================
// Test Data Generation
// =============================================================================

fn create_registry(trigger_count: usize) -> Registry {
    let mut registry = Registry::new();
    for i in 0..trigger_count {
        let event_type = if i % 2 == 0 { "entity/damaged" } else { "entity/healed" };
        let def = TriggerDef::new(event_type)
            .with_timing(Timing::PHASES[i % Timing::PHASES.len()])
            .with_priority((i % 7) as i32)
            .with_condition(PolicyExpr::bound("target_id", "self"))
            .with_effect(EffectDef::update_in(["hp"], UpdateFn::Dec));
        registry = registry
            .register(def, format!("card-{i}"), "p1", Some(EntityId::new(format!("e{}", i % 4))))
            .0;
    }
    registry
}

fn create_state() -> Value {
    [("hp", Value::from(1_000))].into_iter().collect()
}

// =============================================================================
// Registry Benchmarks
// =============================================================================

fn bench_register(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry_register");

    for size in [10, 100, 1_000] {
        let registry = create_registry(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &registry, |b, registry| {
            b.iter(|| {
                black_box(registry.register(TriggerDef::new("entity/damaged"), "card-x", "p1", None))
            });
        });
    }

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry_lookup");
    let event_type = EventType::from("entity/damaged");

    for size in [10, 100, 1_000] {
        let registry = create_registry(size);
        group.throughput(Throughput::Elements(size as u64 / 2));
        group.bench_with_input(BenchmarkId::from_parameter(size), &registry, |b, registry| {
            b.iter(|| black_box(registry.get_triggers_for_event(&event_type)));
        });
    }

    group.finish();
}

// =============================================================================
// Engine Benchmarks
// =============================================================================

fn bench_fire_event(c: &mut Criterion) {
    let mut group = c.benchmark_group("fire_event");
    let engine = TriggerEngine::builtin();
    let state = create_state();
    let event = Event::new("entity/damaged")
        .with_field("target_id", "e0")
        .with_field("amount", 1);

    for size in [10, 100, 1_000] {
        let registry = create_registry(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &registry, |b, registry| {
            b.iter(|| black_box(engine.fire_event(&state, registry, &event)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_register, bench_lookup, bench_fire_event);
criterion_main!(benches);
