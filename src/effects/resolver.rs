//! Effect resolution - applying effects to state.
//!
//! The engine only knows the [`EffectApplicator`] contract: given a state, an
//! effect and its context, produce an [`EffectResult`]. Applicators never
//! fail past this boundary; failures become entries in `failed` and the state
//! falls back to the last value that was successfully produced.
//!
//! [`EffectHandlers`] is the built-in applicator: an open table from effect
//! type name to handler function. Games add effect kinds by registering
//! handlers, without touching the engine.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::{EntityId, State, Value};
use crate::triggers::{Event, Trigger};

use super::effect::{EffectDef, UpdateFn};
use super::error::{EffectError, ErrorKind};

/// Everything an effect may look at while it is applied.
#[derive(Clone, Copy, Debug)]
pub struct EffectContext<'a> {
    /// State the effect is applied to.
    pub state: &'a State,
    /// The event being processed.
    pub event: &'a Event,
    /// The trigger that fired.
    pub trigger: &'a Trigger,
    /// The trigger's `self` binding.
    pub self_id: Option<&'a EntityId>,
    /// The trigger's owner.
    pub owner: &'a EntityId,
    /// The trigger's source.
    pub source: &'a EntityId,
    /// How many composite effects enclose this one.
    pub depth: usize,
}

impl<'a> EffectContext<'a> {
    /// Build the context for `trigger` reacting to `event`.
    pub fn new(state: &'a State, event: &'a Event, trigger: &'a Trigger) -> Self {
        Self {
            state,
            event,
            trigger,
            self_id: trigger.self_id.as_ref(),
            owner: &trigger.owner,
            source: &trigger.source,
            depth: 0,
        }
    }

    /// Same context over a newer state (used when threading a sequence).
    #[must_use]
    pub fn with_state<'b>(&self, state: &'b State) -> EffectContext<'b>
    where
        'a: 'b,
    {
        EffectContext {
            state,
            event: self.event,
            trigger: self.trigger,
            self_id: self.self_id,
            owner: self.owner,
            source: self.source,
            depth: self.depth,
        }
    }

    /// Context for a child of a composite effect.
    #[must_use]
    pub fn nested(self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self
        }
    }
}

/// An effect that could not be applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectFailure {
    pub effect: EffectDef,
    pub error_kind: ErrorKind,
    pub message: String,
}

impl EffectFailure {
    fn from_error(effect: &EffectDef, err: EffectError) -> Self {
        Self {
            effect: effect.clone(),
            error_kind: err.kind,
            message: err.message,
        }
    }
}

/// Result of applying an effect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectResult {
    /// State after the effect.
    pub state: State,
    /// Effects that were applied, innermost first.
    pub applied: Vec<EffectDef>,
    /// Effects that failed.
    pub failed: Vec<EffectFailure>,
    /// Work a handler deferred to the host. Not interpreted by the engine.
    pub pending: Vec<EffectDef>,
    /// The effect asks for the triggering event to be prevented.
    pub prevented: bool,
}

impl EffectResult {
    /// Nothing applied, nothing failed.
    #[must_use]
    pub fn unchanged(state: State) -> Self {
        Self {
            state,
            applied: Vec::new(),
            failed: Vec::new(),
            pending: Vec::new(),
            prevented: false,
        }
    }

    /// `effect` applied, producing `state`.
    #[must_use]
    pub fn applied(state: State, effect: &EffectDef) -> Self {
        Self {
            applied: vec![effect.clone()],
            ..Self::unchanged(state)
        }
    }

    /// `effect` failed; `state` is the fallback.
    #[must_use]
    pub fn failed(state: State, failure: EffectFailure) -> Self {
        Self {
            failed: vec![failure],
            ..Self::unchanged(state)
        }
    }

    /// Defer `effect` to the host (builder pattern).
    #[must_use]
    pub fn with_pending(mut self, effect: EffectDef) -> Self {
        self.pending.push(effect);
        self
    }

    /// Mark as preventing the event (builder pattern).
    #[must_use]
    pub fn with_prevented(mut self) -> Self {
        self.prevented = true;
        self
    }

    /// No failures.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Fold a later step into this result. The later state wins.
    pub fn absorb(&mut self, step: EffectResult) {
        self.state = step.state;
        self.applied.extend(step.applied);
        self.failed.extend(step.failed);
        self.pending.extend(step.pending);
        self.prevented |= step.prevented;
    }
}

/// Applies effects to state.
///
/// Implementations must not panic; failures are reported in the result.
pub trait EffectApplicator {
    fn apply(&self, state: &State, effect: &EffectDef, ctx: &EffectContext<'_>) -> EffectResult;
}

/// A handler for one effect kind.
///
/// Receives the handler table so composite kinds can apply children.
pub type EffectHandler = Arc<
    dyn Fn(&EffectHandlers, &State, &EffectDef, &EffectContext<'_>) -> Result<EffectResult, EffectError>
        + Send
        + Sync,
>;

/// Open table of effect handlers keyed by effect type name.
#[derive(Clone)]
pub struct EffectHandlers {
    handlers: FxHashMap<String, EffectHandler>,
    catch_panics: bool,
}

impl Default for EffectHandlers {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for EffectHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("EffectHandlers")
            .field("kinds", &kinds)
            .field("catch_panics", &self.catch_panics)
            .finish()
    }
}

impl EffectHandlers {
    /// An empty table: every effect is an unknown no-op.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handlers: FxHashMap::default(),
            catch_panics: true,
        }
    }

    /// The built-in kinds: `assoc_in`, `update_in`, `sequence`, `noop`, `prevent`.
    #[must_use]
    pub fn builtin() -> Self {
        Self::empty()
            .with_handler(EffectDef::ASSOC_IN, apply_assoc_in)
            .with_handler(EffectDef::UPDATE_IN, apply_update_in)
            .with_handler(EffectDef::SEQUENCE, apply_sequence)
            .with_handler(EffectDef::NOOP, |_, state, effect, _| {
                Ok(EffectResult::applied(state.clone(), effect))
            })
            .with_handler(EffectDef::PREVENT, |_, state, effect, _| {
                Ok(EffectResult::applied(state.clone(), effect).with_prevented())
            })
    }

    /// Add or replace the handler for an effect kind.
    pub fn register<F>(&mut self, effect_type: impl Into<String>, handler: F)
    where
        F: Fn(&EffectHandlers, &State, &EffectDef, &EffectContext<'_>) -> Result<EffectResult, EffectError>
            + Send
            + Sync
            + 'static,
    {
        self.handlers.insert(effect_type.into(), Arc::new(handler));
    }

    /// Add or replace a handler (builder pattern).
    #[must_use]
    pub fn with_handler<F>(mut self, effect_type: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&EffectHandlers, &State, &EffectDef, &EffectContext<'_>) -> Result<EffectResult, EffectError>
            + Send
            + Sync
            + 'static,
    {
        self.register(effect_type, handler);
        self
    }

    /// Let handler panics propagate instead of recording them (builder pattern).
    ///
    /// Useful under a debugger; the default catches them.
    #[must_use]
    pub fn without_panic_capture(mut self) -> Self {
        self.catch_panics = false;
        self
    }

    /// Is there a handler for this kind?
    #[must_use]
    pub fn handles(&self, effect_type: &str) -> bool {
        self.handlers.contains_key(effect_type)
    }

    fn run(
        &self,
        handler: &EffectHandler,
        state: &State,
        effect: &EffectDef,
        ctx: &EffectContext<'_>,
    ) -> Result<EffectResult, EffectError> {
        if !self.catch_panics {
            return handler(self, state, effect, ctx);
        }
        panic::catch_unwind(AssertUnwindSafe(|| handler(self, state, effect, ctx)))
            .unwrap_or_else(|payload| Err(EffectError::failed(panic_message(payload.as_ref()))))
    }
}

impl EffectApplicator for EffectHandlers {
    fn apply(&self, state: &State, effect: &EffectDef, ctx: &EffectContext<'_>) -> EffectResult {
        let Some(handler) = self.handlers.get(effect.effect_type.as_str()) else {
            debug!(effect_type = %effect.effect_type, "no handler for effect type, skipping");
            return EffectResult::unchanged(state.clone());
        };

        match self.run(handler, state, effect, ctx) {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    effect_type = %effect.effect_type,
                    trigger = %ctx.trigger.id,
                    error = %err,
                    "effect failed"
                );
                EffectResult::failed(state.clone(), EffectFailure::from_error(effect, err))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("effect panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("effect panicked: {msg}")
    } else {
        "effect panicked".to_string()
    }
}

fn apply_assoc_in(
    _: &EffectHandlers,
    state: &State,
    effect: &EffectDef,
    _: &EffectContext<'_>,
) -> Result<EffectResult, EffectError> {
    let path = effect.path_param("path")?;
    let value = effect.param("value").cloned().unwrap_or_default();
    let next = state.assoc_in(&path, value)?;
    Ok(EffectResult::applied(next, effect))
}

fn apply_update_in(
    _: &EffectHandlers,
    state: &State,
    effect: &EffectDef,
    _: &EffectContext<'_>,
) -> Result<EffectResult, EffectError> {
    let path = effect.path_param("path")?;
    let f = match effect.param("f").and_then(Value::as_str) {
        Some(name) => UpdateFn::parse(name)?,
        None => {
            return Err(EffectError::new(
                ErrorKind::UnknownFunction,
                "missing `f` parameter",
            ))
        }
    };
    let arg = effect.int_param("arg");

    let next = state.update_in(&path, |current| {
        let n = match current {
            None => 0,
            Some(Value::Int(n)) => *n,
            Some(other) => {
                return Err(EffectError::invalid_value(format!(
                    "`{path}` holds {}, not an int",
                    other.type_name()
                )))
            }
        };
        f.apply(n, arg).map(Value::Int)
    })?;
    Ok(EffectResult::applied(next, effect))
}

/// Deepest `sequence` nesting that is applied.
pub const MAX_SEQUENCE_DEPTH: usize = 64;

/// Children are applied in order; there is no rollback, so children that
/// succeeded before a failure stay applied and later children still run.
fn apply_sequence(
    handlers: &EffectHandlers,
    state: &State,
    effect: &EffectDef,
    ctx: &EffectContext<'_>,
) -> Result<EffectResult, EffectError> {
    if ctx.depth >= MAX_SEQUENCE_DEPTH {
        return Err(EffectError::failed(format!(
            "sequence nested deeper than {MAX_SEQUENCE_DEPTH}"
        )));
    }
    let mut acc = EffectResult::unchanged(state.clone());
    for child in &effect.effects {
        let step = handlers.apply(&acc.state, child, &ctx.with_state(&acc.state).nested());
        acc.absorb(step);
    }
    Ok(acc)
}
