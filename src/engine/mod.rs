//! Event processing engine.
//!
//! [`TriggerEngine`] ties the pieces together: it asks the [`Registry`] for
//! matching triggers, checks conditions through a [`ConditionEvaluator`],
//! applies effects through an [`EffectApplicator`], and threads the resulting
//! state and registry through the four timing phases.
//!
//! The engine holds no game state of its own. Every operation takes the
//! current `(state, registry)` pair and returns the next one, so a single
//! engine can serve any number of games, threads or search branches.
//!
//! ## Example Usage
//!
//! ```
//! use ccg_triggers::core::{EntityId, Value};
//! use ccg_triggers::effects::{EffectDef, UpdateFn};
//! use ccg_triggers::engine::TriggerEngine;
//! use ccg_triggers::triggers::{Event, Registry, TriggerDef};
//!
//! let engine = TriggerEngine::builtin();
//!
//! let def = TriggerDef::new("entity/damaged")
//!     .with_effect(EffectDef::update_in(["hp"], UpdateFn::Dec));
//! let (registry, _) = Registry::new().register(def, "ability-1", "p1", Some(EntityId::new("e1")));
//!
//! let state: Value = [("hp", Value::from(10))].into_iter().collect();
//! let event = Event::new("entity/damaged")
//!     .with_field("target_id", "e1")
//!     .with_field("amount", 5);
//!
//! let result = engine.fire_event(&state, &registry, &event);
//! assert_eq!(result.state.get("hp"), Some(&Value::from(9)));
//! assert!(result.results[0].fired);
//! ```
//!
//! [`Registry`]: crate::triggers::Registry
//! [`ConditionEvaluator`]: crate::triggers::ConditionEvaluator
//! [`EffectApplicator`]: crate::effects::EffectApplicator

mod fire;
mod processor;

pub use fire::FireEventResult;
pub use processor::{GroupResult, TriggerOutcome, TriggerResult};

use crate::core::EngineConfig;
use crate::effects::EffectHandlers;
use crate::triggers::PolicyEvaluator;

/// The trigger engine: a condition evaluator, an effect applicator, and
/// configuration.
#[derive(Clone, Debug)]
pub struct TriggerEngine<E = PolicyEvaluator, A = EffectHandlers> {
    evaluator: E,
    applicator: A,
    config: EngineConfig,
}

impl TriggerEngine {
    /// Engine with the built-in evaluator and effect handlers.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(PolicyEvaluator, EffectHandlers::builtin())
    }
}

impl Default for TriggerEngine {
    fn default() -> Self {
        Self::builtin()
    }
}

impl<E, A> TriggerEngine<E, A> {
    /// Create an engine from its collaborators, with default configuration.
    pub fn new(evaluator: E, applicator: A) -> Self {
        Self {
            evaluator,
            applicator,
            config: EngineConfig::default(),
        }
    }

    /// Replace the configuration (builder pattern).
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    #[must_use]
    pub fn applicator(&self) -> &A {
        &self.applicator
    }
}
