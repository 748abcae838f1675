//! Domain events.
//!
//! Events represent things that happen during a game. The engine provides
//! the event infrastructure; games decide which event types exist.
//!
//! ## Design Philosophy
//!
//! Event types are game-defined, not hardcoded. The engine doesn't know about
//! "damage dealt" or "card drawn" - games name their event types and fire
//! them at the appropriate time. Events are ephemeral: the caller builds one
//! per `fire_event` call and the engine never stores it.

use std::borrow::Cow;

use im::OrdMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::Value;

/// Event type identifier. Games define what event types exist.
///
/// The engine doesn't interpret these - they're opaque names, conventionally
/// namespaced like `"entity/damaged"`. Static names can be declared as
/// constants:
///
/// ```
/// use ccg_triggers::triggers::EventType;
///
/// const DAMAGED: EventType = EventType::from_static("entity/damaged");
/// assert_eq!(DAMAGED.as_str(), "entity/damaged");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventType(Cow<'static, str>);

impl EventType {
    /// Create an event type from any string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Create an event type from a static string (usable in `const`).
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Get the type name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for EventType {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EventType({})", self.0)
    }
}

/// Wire key holding the event type. Not usable as a field name.
pub const TYPE_KEY: &str = "type";

/// A domain event with contextual data.
///
/// Besides its type an event carries arbitrary named fields (`target_id`,
/// `amount`, ...). Fields are copied into the evaluation document of every
/// trigger that listens for the event type. A field is never named `type`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// The type of event.
    #[serde(rename = "type")]
    pub event_type: EventType,

    /// Domain fields, in key order.
    #[serde(flatten)]
    fields: OrdMap<String, Value>,
}

impl Event {
    /// Create a new event with just a type.
    pub fn new(event_type: impl Into<EventType>) -> Self {
        Self {
            event_type: event_type.into(),
            fields: OrdMap::new(),
        }
    }

    /// Add a field (builder pattern).
    ///
    /// The key `type` is reserved for the event type and is ignored.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key == TYPE_KEY {
            debug!(event_type = %self.event_type, "ignoring field named `type`");
            return self;
        }
        self.fields.insert(key, value.into());
        self
    }

    /// All domain fields, in key order.
    #[must_use]
    pub fn fields(&self) -> &OrdMap<String, Value> {
        &self.fields
    }

    /// Get a field by name.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get an integer field, or a default.
    #[must_use]
    pub fn int(&self, key: &str, default: i64) -> i64 {
        self.field(key).and_then(Value::as_int).unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAMAGED: EventType = EventType::from_static("entity/damaged");

    #[test]
    fn test_event_type() {
        assert_eq!(DAMAGED, EventType::new("entity/damaged"));
        assert_eq!(format!("{}", DAMAGED), "EventType(entity/damaged)");
    }

    #[test]
    fn test_event_builder() {
        let event = Event::new(DAMAGED)
            .with_field("target_id", "e1")
            .with_field("amount", 5);

        assert_eq!(event.event_type, DAMAGED);
        assert_eq!(event.field("target_id"), Some(&Value::from("e1")));
        assert_eq!(event.int("amount", 0), 5);
        assert_eq!(event.int("missing", -1), -1);
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::new("turn/started").with_field("player", "p2");
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"turn/started","player":"p2"}"#);

        let deserialized: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deserialized);
    }

    #[test]
    fn test_type_is_not_a_field() {
        let event = Event::new(DAMAGED)
            .with_field("type", "x")
            .with_field("amount", 2);

        assert_eq!(event.field("type"), None);
        assert_eq!(event.fields().len(), 1);

        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"entity/damaged","amount":2}"#);
        let deserialized: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deserialized);
    }
}
