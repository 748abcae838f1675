//! Trigger registry.
//!
//! The registry stores triggers and indexes them by event type. It is a
//! persistent value: every operation returns a new `Registry` and leaves the
//! receiver untouched, so callers can keep old snapshots for replay or search.
//! Both maps are `im` collections, which makes those snapshots O(1) to clone.

use std::sync::atomic::{AtomicU64, Ordering};

use im::{OrdMap, OrdSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::EntityId;

use super::event::EventType;
use super::trigger::{Trigger, TriggerDef, TriggerId};

/// Process-wide id source, so ids never collide across registries.
static NEXT_TRIGGER_ID: AtomicU64 = AtomicU64::new(1);

fn allocate_id(at_least: u64) -> TriggerId {
    NEXT_TRIGGER_ID.fetch_max(at_least, Ordering::Relaxed);
    TriggerId::new(NEXT_TRIGGER_ID.fetch_add(1, Ordering::Relaxed))
}

/// Registry for triggers.
///
/// Invariant: a trigger id is in `index_by_event[e]` for exactly the event
/// types `e` the trigger listens for, and buckets are never empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    /// All registered triggers.
    triggers: OrdMap<TriggerId, Trigger>,

    /// Index by event type for fast lookup.
    index_by_event: OrdMap<EventType, OrdSet<TriggerId>>,
}

impl Registry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a trigger definition bound to its source, owner and `self`.
    ///
    /// Returns the new registry and the id assigned to the trigger.
    pub fn register(
        &self,
        def: TriggerDef,
        source: impl Into<EntityId>,
        owner: impl Into<EntityId>,
        self_id: Option<EntityId>,
    ) -> (Registry, TriggerId) {
        // Registries restored from a save file may hold ids from another process.
        let floor = self.triggers.get_max().map_or(0, |(id, _)| id.raw() + 1);
        let id = allocate_id(floor);
        let trigger = Trigger::from_def(id, def, source.into(), owner.into(), self_id);

        let mut next = self.clone();
        for event_type in &trigger.event_types {
            let bucket = next
                .index_by_event
                .get(event_type)
                .cloned()
                .unwrap_or_default();
            next.index_by_event.insert(event_type.clone(), bucket.update(id));
        }

        debug!(
            trigger = %id,
            name = %trigger.name,
            timing = %trigger.timing,
            priority = trigger.priority,
            "registered trigger"
        );
        next.triggers.insert(id, trigger);
        (next, id)
    }

    /// Unregister a trigger. Unknown ids are ignored.
    #[must_use]
    pub fn unregister(&self, id: TriggerId) -> Registry {
        let mut next = self.clone();
        let Some(trigger) = next.triggers.remove(&id) else {
            trace!(trigger = %id, "unregister of unknown trigger ignored");
            return next;
        };

        for event_type in &trigger.event_types {
            if let Some(bucket) = next.index_by_event.get_mut(event_type) {
                bucket.remove(&id);
                if bucket.is_empty() {
                    next.index_by_event.remove(event_type);
                }
            }
        }

        debug!(trigger = %id, name = %trigger.name, "unregistered trigger");
        next
    }

    /// Remove all triggers created by a source (the ability or card left play).
    #[must_use]
    pub fn unregister_by_source(&self, source: &EntityId) -> Registry {
        self.triggers
            .values()
            .filter(|t| &t.source == source)
            .map(|t| t.id)
            .fold(self.clone(), |registry, id| registry.unregister(id))
    }

    /// Triggers listening for `event_type`, in firing order.
    ///
    /// Sorted ascending by priority; equal priorities keep registration order.
    #[must_use]
    pub fn get_triggers_for_event(&self, event_type: &EventType) -> Vec<Trigger> {
        let Some(ids) = self.index_by_event.get(event_type) else {
            return Vec::new();
        };

        let mut triggers: Vec<Trigger> = ids
            .iter()
            .filter_map(|id| self.triggers.get(id))
            .cloned()
            .collect();
        triggers.sort_by_key(|t| (t.priority, t.id));
        triggers
    }

    /// Get a trigger by ID.
    #[must_use]
    pub fn get_trigger(&self, id: TriggerId) -> Option<&Trigger> {
        self.triggers.get(&id)
    }

    /// All triggers, in registration order.
    #[must_use]
    pub fn get_triggers(&self) -> Vec<Trigger> {
        self.triggers.values().cloned().collect()
    }

    /// Triggers created by a source entity.
    pub fn triggers_for_source(&self, source: &EntityId) -> Vec<&Trigger> {
        self.triggers
            .values()
            .filter(|t| &t.source == source)
            .collect()
    }

    /// Is a trigger with this id registered?
    #[must_use]
    pub fn contains(&self, id: TriggerId) -> bool {
        self.triggers.contains_key(&id)
    }

    /// Event types that currently have at least one trigger.
    pub fn event_types(&self) -> impl Iterator<Item = &EventType> {
        self.index_by_event.keys()
    }

    /// Get total trigger count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Iterate all triggers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Trigger> {
        self.triggers.values()
    }

    /// Check the index invariant. Used by tests.
    #[doc(hidden)]
    #[must_use]
    pub fn index_is_consistent(&self) -> bool {
        let forward = self.triggers.values().all(|t| {
            t.event_types.iter().all(|e| {
                self.index_by_event
                    .get(e)
                    .is_some_and(|bucket| bucket.contains(&t.id))
            })
        });
        let backward = self.index_by_event.iter().all(|(event_type, bucket)| {
            !bucket.is_empty()
                && bucket.iter().all(|id| {
                    self.triggers
                        .get(id)
                        .is_some_and(|t| t.listens_for(event_type))
                })
        });
        forward && backward
    }
}
