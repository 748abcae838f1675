//! # ccg-triggers
//!
//! A deterministic, game-agnostic reactive trigger engine for card game
//! abilities.
//!
//! ## Design Principles
//!
//! 1. **Game-Agnostic**: No hardcoded event types, state keys or effects.
//!    Games name their events and give meaning to state paths.
//!
//! 2. **Pure Values**: The engine keeps no state between calls. Every
//!    operation takes `(state, registry)` and returns the next pair, so
//!    resolution is reproducible and replayable.
//!
//! 3. **Open Collaborators**: Conditions and effects are consumed through
//!    traits. The built-in evaluator and effect handlers cover the common
//!    cases; games plug in their own where needed.
//!
//! ## Architecture
//!
//! - **Persistent Data Structures**: O(1) cloning via `im-rs`, so threading
//!   state and registry snapshots through every trigger is cheap.
//!
//! - **Three-Valued Conditions**: `Satisfied`, `Conflict`, `Open`. Only
//!   `Satisfied` fires.
//!
//! - **Timing Phases**: `Before` (may prevent), `Instead` (exclusive),
//!   `After`, `At` (checkpoint).
//!
//! ## Modules
//!
//! - `core`: Values, paths, entity ids, configuration
//! - `triggers`: Events, trigger definitions, registry, documents, conditions
//! - `effects`: Effect definitions and the effect applicator
//! - `engine`: Trigger processing and the `fire_event` state machine

pub mod core;
pub mod triggers;
pub mod effects;
pub mod engine;

// Re-export commonly used types
pub use crate::core::{EngineConfig, EntityId, Path, PathError, State, Value};

pub use crate::triggers::{
    build_document, ConditionEvaluator, ConditionResult, Document, EvalContext, Event, EventType,
    PolicyEvaluator, PolicyExpr, Registry, Timing, Trigger, TriggerDef, TriggerId,
};

pub use crate::effects::{
    EffectApplicator, EffectContext, EffectDef, EffectError, EffectFailure, EffectHandlers,
    EffectResult, ErrorKind, UpdateFn,
};

pub use crate::engine::{FireEventResult, GroupResult, TriggerEngine, TriggerOutcome, TriggerResult};
