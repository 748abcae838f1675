//! Evaluation documents.
//!
//! A document is the flat map a condition is checked against: the event's
//! fields plus the trigger's bindings. Conditions never see the trigger or
//! event structs directly.

use im::OrdMap;
use serde::{Deserialize, Serialize};

use crate::core::{Path, Value};

use super::event::Event;
use super::trigger::Trigger;

/// Key holding the trigger's `self` binding.
pub const SELF_KEY: &str = "self";
/// Key holding the trigger's owner.
pub const OWNER_KEY: &str = "owner";
/// Key holding the trigger's source.
pub const SOURCE_KEY: &str = "source";
/// Key holding the event type name.
pub const EVENT_TYPE_KEY: &str = "event_type";

/// Keys the event cannot overwrite.
pub const RESERVED_KEYS: [&str; 4] = [SELF_KEY, OWNER_KEY, SOURCE_KEY, EVENT_TYPE_KEY];

/// Flattened trigger bindings and event fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(OrdMap<String, Value>);

impl Document {
    /// Get a top-level entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Resolve a key that may be a dotted path into nested maps.
    ///
    /// Nil counts as absent.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        let found = match self.0.get(key) {
            Some(value) => Some(value),
            None => {
                let path = Path::dotted(key);
                let (head, rest) = path.split_first()?;
                let rest: Path = rest.iter().cloned().collect();
                self.0.get(head.as_str()).and_then(|root| root.get_in(&rest))
            }
        };
        found.filter(|v| !v.is_nil())
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Convert into a map value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Map(self.0)
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Build the evaluation document for `trigger` reacting to `event`.
///
/// Event fields are copied first; the reserved keys are written last so event
/// data can never shadow a binding. An unbound `self` is stored as nil.
#[must_use]
pub fn build_document(trigger: &Trigger, event: &Event) -> Document {
    let mut doc = event.fields().clone();
    doc.insert(
        SELF_KEY.to_string(),
        trigger.self_id.as_ref().map_or(Value::Nil, |id| id.to_value()),
    );
    doc.insert(OWNER_KEY.to_string(), trigger.owner.to_value());
    doc.insert(SOURCE_KEY.to_string(), trigger.source.to_value());
    doc.insert(
        EVENT_TYPE_KEY.to_string(),
        Value::from(event.event_type.as_str()),
    );
    Document(doc)
}
