//! Trigger system for event-driven abilities.
//!
//! Triggers allow cards and abilities to respond to domain events. The system
//! is game-agnostic - games define their own event types and register
//! triggers accordingly.
//!
//! ## Key Components
//!
//! - [`EventType`]: Opaque identifier for event types (game-defined)
//! - [`Event`]: An event that occurred, with named fields
//! - [`TriggerDef`] / [`Trigger`]: What an ability listens for and does
//! - [`Registry`]: Persistent storage and lookup for triggers
//! - [`build_document`]: Flattens trigger bindings and event fields
//! - [`PolicyExpr`] / [`ConditionEvaluator`]: Three-valued conditions
//!
//! ## Example Usage
//!
//! ```
//! use ccg_triggers::core::EntityId;
//! use ccg_triggers::effects::{EffectDef, UpdateFn};
//! use ccg_triggers::triggers::{EventType, PolicyExpr, Registry, Timing, TriggerDef};
//!
//! const DAMAGED: EventType = EventType::from_static("entity/damaged");
//!
//! // "When this creature is damaged, it loses 1 extra hp"
//! let def = TriggerDef::new(DAMAGED)
//!     .with_timing(Timing::After)
//!     .with_condition(PolicyExpr::bound("target_id", "self"))
//!     .with_effect(EffectDef::update_in(["hp"], UpdateFn::Dec));
//!
//! let (registry, id) = Registry::new().register(def, "ability-1", "p1", Some(EntityId::new("e1")));
//!
//! let matching = registry.get_triggers_for_event(&DAMAGED);
//! assert_eq!(matching.len(), 1);
//! assert_eq!(matching[0].id, id);
//! ```

mod condition;
mod document;
mod event;
mod registry;
mod trigger;

pub use condition::{ConditionEvaluator, ConditionResult, EvalContext, PolicyEvaluator, PolicyExpr};
pub use document::{
    build_document, Document, EVENT_TYPE_KEY, OWNER_KEY, RESERVED_KEYS, SELF_KEY, SOURCE_KEY,
};
pub use event::{Event, EventType, TYPE_KEY};
pub use registry::Registry;
pub use trigger::{Timing, Trigger, TriggerDef, TriggerId};
