//! Single-trigger processing and trigger groups.
//!
//! `process_trigger` is the unit of work: evaluate one trigger's condition,
//! apply its effect if satisfied, and drop it from the registry if it is a
//! one-shot. `process_trigger_group` folds that over a phase's triggers,
//! passing each trigger the state and registry the previous one produced.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::State;
use crate::effects::{EffectApplicator, EffectContext, EffectResult};
use crate::triggers::{
    build_document, ConditionEvaluator, ConditionResult, EvalContext, Event, Registry, Trigger,
    TriggerId,
};

use super::TriggerEngine;

/// What happened to one trigger during an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerResult {
    pub trigger_id: TriggerId,
    /// The effect was applied.
    pub fired: bool,
    pub condition_result: ConditionResult,
    /// Present only when the trigger fired.
    pub effect_result: Option<EffectResult>,
    /// The trigger was a one-shot and has been unregistered.
    pub removed: bool,
}

impl TriggerResult {
    /// Did the effect ask for the event to be prevented?
    #[must_use]
    pub fn prevented(&self) -> bool {
        self.effect_result.as_ref().is_some_and(|r| r.prevented)
    }
}

/// State and registry after processing one trigger, plus its result.
#[derive(Clone, Debug)]
pub struct TriggerOutcome {
    pub state: State,
    pub registry: Registry,
    pub result: TriggerResult,
}

/// State and registry after processing a group of triggers.
#[derive(Clone, Debug)]
pub struct GroupResult {
    pub state: State,
    pub registry: Registry,
    pub results: Vec<TriggerResult>,
    /// Sticky: set once any trigger in the group prevented the event.
    pub prevented: bool,
}

impl GroupResult {
    fn start(state: State, registry: Registry) -> Self {
        Self {
            state,
            registry,
            results: Vec::new(),
            prevented: false,
        }
    }

    fn push(mut self, outcome: TriggerOutcome) -> Self {
        self.prevented |= outcome.result.prevented();
        self.state = outcome.state;
        self.registry = outcome.registry;
        self.results.push(outcome.result);
        self
    }
}

impl<E, A> TriggerEngine<E, A>
where
    E: ConditionEvaluator,
    A: EffectApplicator,
{
    /// Evaluate a trigger's condition for `event`.
    ///
    /// A trigger without a condition is `Satisfied` without consulting the
    /// evaluator.
    pub fn evaluate_condition(&self, trigger: &Trigger, event: &Event, state: &State) -> ConditionResult {
        let Some(condition) = &trigger.condition else {
            return ConditionResult::Satisfied;
        };
        let document = build_document(trigger, event);
        trace!(trigger = %trigger.id, ?document, "evaluating condition");
        self.evaluator
            .evaluate(condition, &document, &EvalContext::new(event, state))
    }

    /// Apply a trigger's effect to `state`.
    pub fn apply_effect(&self, state: &State, trigger: &Trigger, event: &Event) -> EffectResult {
        let ctx = EffectContext::new(state, event, trigger);
        self.applicator.apply(state, &trigger.effect, &ctx)
    }

    /// Process one trigger: condition, effect, one-shot removal.
    pub fn process_trigger(
        &self,
        state: &State,
        registry: &Registry,
        trigger: &Trigger,
        event: &Event,
    ) -> TriggerOutcome {
        let condition_result = self.evaluate_condition(trigger, event, state);

        match condition_result {
            ConditionResult::Satisfied => {}
            ConditionResult::Conflict | ConditionResult::Open => {
                debug!(trigger = %trigger.id, condition = %condition_result, "trigger did not fire");
                return TriggerOutcome {
                    state: state.clone(),
                    registry: registry.clone(),
                    result: TriggerResult {
                        trigger_id: trigger.id,
                        fired: false,
                        condition_result,
                        effect_result: None,
                        removed: false,
                    },
                };
            }
        }

        let effect_result = self.apply_effect(state, trigger, event);
        let registry = if trigger.once {
            registry.unregister(trigger.id)
        } else {
            registry.clone()
        };

        debug!(
            trigger = %trigger.id,
            name = %trigger.name,
            timing = %trigger.timing,
            applied = effect_result.applied.len(),
            failed = effect_result.failed.len(),
            prevented = effect_result.prevented,
            removed = trigger.once,
            "trigger fired"
        );

        TriggerOutcome {
            state: effect_result.state.clone(),
            registry,
            result: TriggerResult {
                trigger_id: trigger.id,
                fired: true,
                condition_result,
                effect_result: Some(effect_result),
                removed: trigger.once,
            },
        }
    }

    /// Process triggers in the given order, threading state and registry.
    ///
    /// Prevention does not stop the group; it is only reported.
    pub fn process_trigger_group(
        &self,
        state: &State,
        registry: &Registry,
        triggers: &[Trigger],
        event: &Event,
    ) -> GroupResult {
        triggers.iter().fold(
            GroupResult::start(state.clone(), registry.clone()),
            |acc, trigger| {
                let outcome = self.process_trigger(&acc.state, &acc.registry, trigger, event);
                acc.push(outcome)
            },
        )
    }
}
