//! Trigger definitions.
//!
//! A [`TriggerDef`] is what a card or ability declares: which event types it
//! listens for, in which phase, under which condition, with which effect. The
//! [`Registry`](super::Registry) turns a definition plus its bindings into a
//! [`Trigger`] with a fresh id.

use im::OrdSet;
use serde::{Deserialize, Serialize};

use crate::core::EntityId;
use crate::effects::EffectDef;

use super::condition::PolicyExpr;
use super::event::EventType;

/// Unique identifier for a trigger.
///
/// Assigned by the registry, never by the caller. Ids are allocated in
/// increasing order, so comparing ids compares registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TriggerId(pub u64);

impl TriggerId {
    /// Create a trigger ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TriggerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Trigger({})", self.0)
    }
}

/// When in the event resolution process the trigger fires.
///
/// Phases run in declaration order: `Before`, `Instead`, `After`, `At`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Timing {
    /// Before the event resolves; may prevent it.
    Before,
    /// Instead of the event (replacement). Only one fires per event.
    Instead,
    /// After the event resolves (most common).
    #[default]
    After,
    /// Checkpoint phase for bookkeeping that follows every event.
    At,
}

impl Timing {
    /// All phases, in resolution order.
    pub const PHASES: [Timing; 4] = [Timing::Before, Timing::Instead, Timing::After, Timing::At];
}

impl std::fmt::Display for Timing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Timing::Before => "before",
            Timing::Instead => "instead",
            Timing::After => "after",
            Timing::At => "at",
        };
        f.write_str(name)
    }
}

/// A trigger as declared by an ability, before registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDef {
    /// Human-readable name (for debugging).
    pub name: String,

    /// Event types this trigger listens for.
    pub event_types: OrdSet<EventType>,

    /// When in resolution this trigger fires.
    pub timing: Timing,

    /// Condition checked against the evaluation document. `None` always fires.
    pub condition: Option<PolicyExpr>,

    /// Effect applied when the trigger fires.
    pub effect: EffectDef,

    /// Remove the trigger after it fires once.
    pub once: bool,

    /// Ordering within a phase (lower fires first).
    pub priority: i32,

    /// Marks a replacement ability. Carried for the host; the engine's
    /// replacement semantics come from `Timing::Instead`.
    pub replacement: bool,

    /// Never auto-fire; surface to the caller as a choice.
    pub response: bool,
}

impl TriggerDef {
    /// Create a definition listening for one event type.
    ///
    /// Defaults: `After` timing, no condition, `noop` effect, priority 0.
    pub fn new(event_type: impl Into<EventType>) -> Self {
        let mut event_types = OrdSet::new();
        event_types.insert(event_type.into());
        Self {
            name: String::new(),
            event_types,
            timing: Timing::default(),
            condition: None,
            effect: EffectDef::noop(),
            once: false,
            priority: 0,
            replacement: false,
            response: false,
        }
    }

    /// Set the debug name (builder pattern).
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add an event type to listen for (builder pattern).
    #[must_use]
    pub fn also_on(mut self, event_type: impl Into<EventType>) -> Self {
        self.event_types.insert(event_type.into());
        self
    }

    /// Set the timing (builder pattern).
    #[must_use]
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Set the condition (builder pattern).
    #[must_use]
    pub fn with_condition(mut self, condition: PolicyExpr) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Set the effect (builder pattern).
    #[must_use]
    pub fn with_effect(mut self, effect: EffectDef) -> Self {
        self.effect = effect;
        self
    }

    /// Set priority (builder pattern). Lower priority fires first.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Make this a one-shot trigger (builder pattern).
    #[must_use]
    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    /// Mark as a replacement ability (builder pattern).
    #[must_use]
    pub fn as_replacement(mut self) -> Self {
        self.replacement = true;
        self
    }

    /// Make this a response trigger (builder pattern).
    #[must_use]
    pub fn as_response(mut self) -> Self {
        self.response = true;
        self
    }
}

/// A registered trigger.
///
/// Immutable once created; "updating" a trigger means unregistering it and
/// registering a new definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    /// Unique identifier, assigned at registration.
    pub id: TriggerId,

    /// Human-readable name (for debugging).
    pub name: String,

    /// The ability or card that created this trigger.
    pub source: EntityId,

    /// The player who controls this trigger.
    pub owner: EntityId,

    /// The entity the ability is attached to, if any.
    #[serde(rename = "self")]
    pub self_id: Option<EntityId>,

    pub event_types: OrdSet<EventType>,
    pub timing: Timing,
    pub condition: Option<PolicyExpr>,
    pub effect: EffectDef,
    pub once: bool,
    pub priority: i32,
    pub replacement: bool,
    pub response: bool,
}

impl Trigger {
    /// Build a trigger from a definition and its bindings.
    pub(crate) fn from_def(
        id: TriggerId,
        def: TriggerDef,
        source: EntityId,
        owner: EntityId,
        self_id: Option<EntityId>,
    ) -> Self {
        Self {
            id,
            name: def.name,
            source,
            owner,
            self_id,
            event_types: def.event_types,
            timing: def.timing,
            condition: def.condition,
            effect: def.effect,
            once: def.once,
            priority: def.priority,
            replacement: def.replacement,
            response: def.response,
        }
    }

    /// Does this trigger listen for `event_type`?
    #[must_use]
    pub fn listens_for(&self, event_type: &EventType) -> bool {
        self.event_types.contains(event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_id() {
        let id = TriggerId::new(5);
        assert_eq!(id.raw(), 5);
        assert_eq!(format!("{}", id), "Trigger(5)");
        assert!(TriggerId::new(1) < TriggerId::new(2));
    }

    #[test]
    fn test_timing_order() {
        assert_eq!(Timing::default(), Timing::After);
        assert_eq!(
            Timing::PHASES,
            [Timing::Before, Timing::Instead, Timing::After, Timing::At]
        );
        assert_eq!(Timing::Instead.to_string(), "instead");
    }

    #[test]
    fn test_def_builder() {
        let def = TriggerDef::new("entity/damaged")
            .named("Retaliate")
            .also_on("entity/destroyed")
            .also_on("entity/damaged")
            .with_timing(Timing::Before)
            .with_condition(PolicyExpr::Always)
            .with_effect(EffectDef::prevent())
            .with_priority(-2)
            .once()
            .as_replacement()
            .as_response();

        assert_eq!(def.name, "Retaliate");
        assert_eq!(def.event_types.len(), 2);
        assert_eq!(def.timing, Timing::Before);
        assert_eq!(def.condition, Some(PolicyExpr::Always));
        assert_eq!(def.effect, EffectDef::prevent());
        assert_eq!(def.priority, -2);
        assert!(def.once && def.replacement && def.response);
    }

    #[test]
    fn test_from_def_binds_entities() {
        let def = TriggerDef::new("turn/started").with_priority(4);
        let trigger = Trigger::from_def(
            TriggerId::new(9),
            def,
            EntityId::new("ability-1"),
            EntityId::new("p1"),
            Some(EntityId::new("e1")),
        );

        assert_eq!(trigger.id, TriggerId::new(9));
        assert_eq!(trigger.source, EntityId::new("ability-1"));
        assert_eq!(trigger.owner, EntityId::new("p1"));
        assert_eq!(trigger.self_id, Some(EntityId::new("e1")));
        assert_eq!(trigger.priority, 4);
        assert!(trigger.listens_for(&EventType::new("turn/started")));
        assert!(!trigger.listens_for(&EventType::new("turn/ended")));
    }
}
