//! Engine configuration.
//!
//! Hosts configure the engine once at startup. The defaults reproduce the
//! standard resolution rules; each switch exists for games whose rules text
//! needs a different checkpoint behaviour.

use serde::{Deserialize, Serialize};

/// Configuration for [`TriggerEngine`](crate::engine::TriggerEngine).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Run the `At` phase even when a `Before` trigger prevented the event.
    ///
    /// Off by default: a prevented event short-circuits every later phase.
    /// Games that use `At` for turn/phase bookkeeping which must happen
    /// whether or not the action resolved can turn this on.
    pub run_at_when_prevented: bool,

    /// Only surface response triggers whose condition is currently satisfied.
    ///
    /// Off by default: every matching response trigger is offered to the
    /// caller and its condition is checked when the caller picks it.
    pub filter_responses: bool,
}

impl EngineConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the `At` checkpoint even for prevented events (builder pattern).
    #[must_use]
    pub fn with_run_at_when_prevented(mut self, enabled: bool) -> Self {
        self.run_at_when_prevented = enabled;
        self
    }

    /// Pre-filter response triggers by their condition (builder pattern).
    #[must_use]
    pub fn with_filter_responses(mut self, enabled: bool) -> Self {
        self.filter_responses = enabled;
        self
    }
}
