//! Firing events through the timing phases.
//!
//! `fire_event` is a small state machine over the four phases:
//!
//! 1. `Before`: every matching trigger, in priority order. If any of them
//!    prevents the event, processing stops here (optionally still running
//!    `At`, see [`EngineConfig`](crate::core::EngineConfig)).
//! 2. `Instead`: only the first matching trigger. Replacement effects are
//!    exclusive.
//! 3. `After`: every matching trigger.
//! 4. `At`: every matching trigger; the bookkeeping checkpoint.
//!
//! Response triggers never run automatically. They are split off before the
//! phases and handed back to the caller, who can fire a chosen one with
//! `fire_response`.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::core::State;
use crate::effects::EffectApplicator;
use crate::triggers::{ConditionEvaluator, Event, Registry, Timing, Trigger, TriggerId};

use super::processor::{GroupResult, TriggerOutcome, TriggerResult};
use super::TriggerEngine;

/// Everything that happened while firing one event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireEventResult {
    /// State after all phases.
    pub state: State,
    /// Registry after one-shot removals.
    pub registry: Registry,
    /// The event that was fired.
    pub event: Event,
    /// Per-trigger results: before, instead, after, at.
    pub results: Vec<TriggerResult>,
    /// A `Before` trigger prevented the event.
    pub prevented: bool,
    /// Response triggers offered to the caller. `None` when prevented.
    pub response_triggers: Option<Vec<Trigger>>,
}

impl FireEventResult {
    /// Results for triggers that fired.
    pub fn fired(&self) -> impl Iterator<Item = &TriggerResult> {
        self.results.iter().filter(|r| r.fired)
    }

    /// Result for a specific trigger, if it was processed.
    #[must_use]
    pub fn result_for(&self, id: TriggerId) -> Option<&TriggerResult> {
        self.results.iter().find(|r| r.trigger_id == id)
    }
}

/// Triggers matching one event, split by how they are processed.
struct Matched {
    automatic: Vec<Trigger>,
    responses: Vec<Trigger>,
}

impl Matched {
    fn new(registry: &Registry, event: &Event) -> Self {
        let (responses, automatic) = registry
            .get_triggers_for_event(&event.event_type)
            .into_iter()
            .partition(|t| t.response);
        Self { automatic, responses }
    }

    /// Triggers for one phase, still in priority order.
    fn phase(&self, timing: Timing) -> Vec<Trigger> {
        self.automatic
            .iter()
            .filter(|t| t.timing == timing)
            .cloned()
            .collect()
    }
}

impl<E, A> TriggerEngine<E, A>
where
    E: ConditionEvaluator,
    A: EffectApplicator,
{
    /// Fire `event` against `registry`, starting from `state`.
    ///
    /// Pure: the inputs are untouched and the next state and registry are
    /// returned in the result.
    #[instrument(level = "debug", skip_all, fields(event_type = %event.event_type))]
    pub fn fire_event(&self, state: &State, registry: &Registry, event: &Event) -> FireEventResult {
        let matched = Matched::new(registry, event);

        let before = self.process_trigger_group(state, registry, &matched.phase(Timing::Before), event);
        if before.prevented {
            return self.finish_prevented(before, &matched, event);
        }

        // Only the first replacement acts
        let mut instead_phase = matched.phase(Timing::Instead);
        instead_phase.truncate(1);
        let instead = self.process_trigger_group(&before.state, &before.registry, &instead_phase, event);

        let after = self.process_trigger_group(&instead.state, &instead.registry, &matched.phase(Timing::After), event);
        let at = self.process_trigger_group(&after.state, &after.registry, &matched.phase(Timing::At), event);

        let response_triggers = self.offer_responses(matched.responses, &at.state, event);

        let mut results = before.results;
        results.extend(instead.results);
        results.extend(after.results);
        results.extend(at.results);

        debug!(
            processed = results.len(),
            responses = response_triggers.len(),
            "event resolved"
        );

        FireEventResult {
            state: at.state,
            registry: at.registry,
            event: event.clone(),
            results,
            prevented: false,
            response_triggers: Some(response_triggers),
        }
    }

    fn finish_prevented(&self, before: GroupResult, matched: &Matched, event: &Event) -> FireEventResult {
        let GroupResult {
            state,
            registry,
            mut results,
            ..
        } = before;

        let (state, registry) = if self.config.run_at_when_prevented {
            let at = self.process_trigger_group(&state, &registry, &matched.phase(Timing::At), event);
            results.extend(at.results);
            (at.state, at.registry)
        } else {
            (state, registry)
        };

        debug!(processed = results.len(), "event prevented");

        FireEventResult {
            state,
            registry,
            event: event.clone(),
            results,
            prevented: true,
            response_triggers: None,
        }
    }

    fn offer_responses(&self, responses: Vec<Trigger>, state: &State, event: &Event) -> Vec<Trigger> {
        if !self.config.filter_responses {
            return responses;
        }
        responses
            .into_iter()
            .filter(|t| self.evaluate_condition(t, event, state).is_satisfied())
            .collect()
    }

    /// Fire a response trigger the caller chose from `response_triggers`.
    ///
    /// Runs through the same condition/effect/one-shot handling as automatic
    /// triggers. Returns `None` if the trigger is not registered, is not a
    /// response trigger, or does not listen for this event type. Automatic
    /// triggers only ever run inside `fire_event`'s phases.
    pub fn fire_response(
        &self,
        state: &State,
        registry: &Registry,
        trigger_id: TriggerId,
        event: &Event,
    ) -> Option<TriggerOutcome> {
        let Some(trigger) = registry.get_trigger(trigger_id) else {
            debug!(trigger = %trigger_id, "response trigger not registered");
            return None;
        };
        if !trigger.response {
            debug!(trigger = %trigger_id, "not a response trigger");
            return None;
        }
        if !trigger.listens_for(&event.event_type) {
            debug!(trigger = %trigger_id, event_type = %event.event_type, "response trigger does not match event");
            return None;
        }
        Some(self.process_trigger(state, registry, trigger, event))
    }
}
