//! Entity identification.
//!
//! Triggers are bound to the entities that own them: the `source` ability or
//! card that created the trigger, the `owner` who controls it, and optionally
//! the `self` entity the ability is attached to. The engine never looks inside
//! these ids; it only copies them into evaluation documents and effect
//! contexts, and compares them when removing a source's triggers.
//!
//! ## Usage
//!
//! ```
//! use ccg_triggers::core::EntityId;
//!
//! let creature = EntityId::new("e1");
//! assert_eq!(creature.as_str(), "e1");
//! assert_eq!(creature, EntityId::from("e1"));
//! ```

use serde::{Deserialize, Serialize};

use super::value::Value;

/// Identifier for any game entity (player, card, ability, token).
///
/// Ids are host-chosen strings so they can be carried verbatim into condition
/// documents and save files.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create an entity id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into a document value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Str(self.0.clone())
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&EntityId> for EntityId {
    fn from(id: &EntityId) -> Self {
        id.clone()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}
