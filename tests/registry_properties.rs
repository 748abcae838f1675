//! Property tests for the trigger registry and event ordering.

use ccg_triggers::core::Value;
use ccg_triggers::effects::{EffectDef, UpdateFn};
use ccg_triggers::engine::TriggerEngine;
use ccg_triggers::triggers::{Event, EventType, Registry, Timing, TriggerDef, TriggerId};
use proptest::prelude::*;

const EVENT_TYPES: [&str; 3] = ["entity/damaged", "entity/healed", "turn/started"];

/// One registry operation.
#[derive(Clone, Debug)]
enum Op {
    Register {
        events: Vec<usize>,
        timing: Timing,
        priority: i32,
        once: bool,
    },
    /// Unregister the n-th registered id (modulo the number of ids seen).
    Unregister(usize),
}

fn arb_timing() -> impl Strategy<Value = Timing> {
    prop::sample::select(Timing::PHASES.to_vec())
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (
            prop::collection::vec(0..EVENT_TYPES.len(), 1..=3),
            arb_timing(),
            -5i32..5,
            any::<bool>(),
        )
            .prop_map(|(events, timing, priority, once)| Op::Register {
                events,
                timing,
                priority,
                once,
            }),
        1 => any::<usize>().prop_map(Op::Unregister),
    ]
}

fn def_for(events: &[usize], timing: Timing, priority: i32, once: bool) -> TriggerDef {
    let mut def = TriggerDef::new(EVENT_TYPES[events[0]])
        .with_timing(timing)
        .with_priority(priority)
        .with_effect(EffectDef::update_in(["count"], UpdateFn::Inc));
    for &e in &events[1..] {
        def = def.also_on(EVENT_TYPES[e]);
    }
    if once {
        def = def.once();
    }
    def
}

fn apply_ops(ops: &[Op]) -> (Registry, Vec<TriggerId>) {
    let mut registry = Registry::new();
    let mut ids = Vec::new();
    for op in ops {
        match op {
            Op::Register {
                events,
                timing,
                priority,
                once,
            } => {
                let (next, id) =
                    registry.register(def_for(events, *timing, *priority, *once), "src", "p1", None);
                registry = next;
                ids.push(id);
            }
            Op::Unregister(n) if !ids.is_empty() => {
                registry = registry.unregister(ids[n % ids.len()]);
            }
            Op::Unregister(_) => {}
        }
    }
    (registry, ids)
}

proptest! {
    /// The event index always mirrors the trigger map.
    #[test]
    fn index_stays_consistent(ops in prop::collection::vec(arb_op(), 0..40)) {
        let (registry, _) = apply_ops(&ops);
        prop_assert!(registry.index_is_consistent());
    }

    /// Ids are unique and increase in registration order.
    #[test]
    fn ids_increase(ops in prop::collection::vec(arb_op(), 0..40)) {
        let (_, ids) = apply_ops(&ops);
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    /// Lookups come back sorted by priority, then registration order.
    #[test]
    fn lookups_are_priority_ordered(ops in prop::collection::vec(arb_op(), 0..40)) {
        let (registry, _) = apply_ops(&ops);
        for event_type in EVENT_TYPES {
            let triggers = registry.get_triggers_for_event(&EventType::from(event_type));
            let keys: Vec<(i32, TriggerId)> = triggers.iter().map(|t| (t.priority, t.id)).collect();
            let mut sorted = keys.clone();
            sorted.sort();
            prop_assert_eq!(keys, sorted);
            prop_assert!(triggers.iter().all(|t| t.listens_for(&EventType::from(event_type))));
        }
    }

    /// Unregistering twice is the same as unregistering once.
    #[test]
    fn unregister_is_idempotent(ops in prop::collection::vec(arb_op(), 1..30), pick in any::<usize>()) {
        let (registry, ids) = apply_ops(&ops);
        prop_assume!(!ids.is_empty());
        let id = ids[pick % ids.len()];

        let once = registry.unregister(id);
        let twice = once.unregister(id);
        prop_assert_eq!(&once, &twice);
        prop_assert!(!once.contains(id));
        prop_assert!(once.index_is_consistent());
    }

    /// Every fired one-shot is gone afterwards, and nothing else is.
    #[test]
    fn fired_once_triggers_are_removed(ops in prop::collection::vec(arb_op(), 0..30), event_index in 0..EVENT_TYPES.len()) {
        let (registry, _) = apply_ops(&ops);
        let engine = TriggerEngine::builtin();
        let result = engine.fire_event(&Value::map(), &registry, &Event::new(EVENT_TYPES[event_index]));

        for r in &result.results {
            let was_once = registry.get_trigger(r.trigger_id).is_some_and(|t| t.once);
            prop_assert_eq!(r.removed, r.fired && was_once);
            prop_assert_eq!(result.registry.contains(r.trigger_id), !r.removed);
        }
        prop_assert_eq!(
            registry.len() - result.registry.len(),
            result.results.iter().filter(|r| r.removed).count()
        );
        prop_assert!(result.registry.index_is_consistent());
    }

    /// At most one `Instead` trigger is processed per event.
    #[test]
    fn at_most_one_replacement(ops in prop::collection::vec(arb_op(), 0..30), event_index in 0..EVENT_TYPES.len()) {
        let (registry, _) = apply_ops(&ops);
        let engine = TriggerEngine::builtin();
        let result = engine.fire_event(&Value::map(), &registry, &Event::new(EVENT_TYPES[event_index]));

        let replacements = result
            .results
            .iter()
            .filter(|r| registry.get_trigger(r.trigger_id).is_some_and(|t| t.timing == Timing::Instead))
            .count();
        prop_assert!(replacements <= 1);
        prop_assert_eq!(
            result.state.get("count").and_then(Value::as_int).unwrap_or(0),
            result.fired().count() as i64
        );
    }
}
