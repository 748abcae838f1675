//! Effect definitions.
//!
//! Effects are data: a type name, named parameters, and (for composite
//! effects) child effects. What a type name *does* is decided by whichever
//! [`EffectApplicator`](super::EffectApplicator) the engine is given; the
//! built-in [`EffectHandlers`](super::EffectHandlers) understand the kinds
//! listed on [`EffectDef`].

use im::OrdMap;
use serde::{Deserialize, Serialize};

use crate::core::{Path, Value};

use super::error::{EffectError, ErrorKind};

/// An effect a trigger applies when it fires.
///
/// ## Built-in kinds
///
/// - `assoc_in {path, value}`: store a value at a path
/// - `update_in {path, f, arg?}`: apply an [`UpdateFn`] to the integer at a path
/// - `sequence [effects]`: apply child effects in order
/// - `noop`: do nothing
/// - `prevent`: do nothing, but mark the event as prevented
///
/// Games add their own kinds by registering handlers; any other type name is
/// treated as a no-op by the built-in handlers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectDef {
    /// Effect kind, used to look up the handler.
    #[serde(rename = "type")]
    pub effect_type: String,

    /// Named parameters.
    #[serde(default, skip_serializing_if = "OrdMap::is_empty")]
    pub params: OrdMap<String, Value>,

    /// Child effects (for composite kinds).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<EffectDef>,
}

impl EffectDef {
    pub const ASSOC_IN: &'static str = "assoc_in";
    pub const UPDATE_IN: &'static str = "update_in";
    pub const SEQUENCE: &'static str = "sequence";
    pub const NOOP: &'static str = "noop";
    pub const PREVENT: &'static str = "prevent";

    /// Create an effect of the given kind with no parameters.
    pub fn new(effect_type: impl Into<String>) -> Self {
        Self {
            effect_type: effect_type.into(),
            params: OrdMap::new(),
            effects: Vec::new(),
        }
    }

    /// Add a parameter (builder pattern).
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add a child effect (builder pattern).
    #[must_use]
    pub fn with_child(mut self, effect: EffectDef) -> Self {
        self.effects.push(effect);
        self
    }

    /// Create an effect storing `value` at `path`.
    pub fn assoc_in(path: impl Into<Path>, value: impl Into<Value>) -> Self {
        Self::new(Self::ASSOC_IN)
            .with_param("path", path.into().to_value())
            .with_param("value", value)
    }

    /// Create an effect applying `f` to the integer at `path`.
    pub fn update_in(path: impl Into<Path>, f: UpdateFn) -> Self {
        Self::new(Self::UPDATE_IN)
            .with_param("path", path.into().to_value())
            .with_param("f", f.name())
    }

    /// Create an effect applying `f` with an argument (`add`, `sub`, `max`, `min`).
    pub fn update_in_by(path: impl Into<Path>, f: UpdateFn, arg: i64) -> Self {
        Self::update_in(path, f).with_param("arg", arg)
    }

    /// Create a sequence of effects.
    pub fn sequence(effects: impl IntoIterator<Item = EffectDef>) -> Self {
        Self {
            effects: effects.into_iter().collect(),
            ..Self::new(Self::SEQUENCE)
        }
    }

    /// Create an effect that does nothing.
    pub fn noop() -> Self {
        Self::new(Self::NOOP)
    }

    /// Create an effect that prevents the event.
    pub fn prevent() -> Self {
        Self::new(Self::PREVENT)
    }

    /// Get a parameter.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// Get an integer parameter.
    #[must_use]
    pub fn int_param(&self, key: &str) -> Option<i64> {
        self.param(key).and_then(Value::as_int)
    }

    /// Get a required path parameter.
    pub fn path_param(&self, key: &str) -> Result<Path, EffectError> {
        let value = self.param(key).ok_or_else(|| {
            EffectError::new(ErrorKind::InvalidPath, format!("missing `{key}` parameter"))
        })?;
        Path::from_value(value).ok_or_else(|| {
            EffectError::new(
                ErrorKind::InvalidPath,
                format!("`{key}` must be a list of strings, got {}", value.type_name()),
            )
        })
    }
}

/// Named integer update functions for `update_in`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateFn {
    Inc,
    Dec,
    Add,
    Sub,
    Negate,
    Max,
    Min,
}

impl UpdateFn {
    /// Name as stored in effect parameters.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            UpdateFn::Inc => "inc",
            UpdateFn::Dec => "dec",
            UpdateFn::Add => "add",
            UpdateFn::Sub => "sub",
            UpdateFn::Negate => "negate",
            UpdateFn::Max => "max",
            UpdateFn::Min => "min",
        }
    }

    /// Parse a function name.
    pub fn parse(name: &str) -> Result<Self, EffectError> {
        match name {
            "inc" => Ok(UpdateFn::Inc),
            "dec" => Ok(UpdateFn::Dec),
            "add" | "+" => Ok(UpdateFn::Add),
            "sub" | "-" => Ok(UpdateFn::Sub),
            "negate" => Ok(UpdateFn::Negate),
            "max" => Ok(UpdateFn::Max),
            "min" => Ok(UpdateFn::Min),
            other => Err(EffectError::new(
                ErrorKind::UnknownFunction,
                format!("unknown update function `{other}`"),
            )),
        }
    }

    /// Apply to `current`. Binary functions require `arg`.
    pub fn apply(self, current: i64, arg: Option<i64>) -> Result<i64, EffectError> {
        let required = || {
            arg.ok_or_else(|| {
                EffectError::invalid_value(format!("`{}` requires an `arg` parameter", self.name()))
            })
        };
        let result = match self {
            UpdateFn::Inc => current.checked_add(1),
            UpdateFn::Dec => current.checked_sub(1),
            UpdateFn::Add => current.checked_add(required()?),
            UpdateFn::Sub => current.checked_sub(required()?),
            UpdateFn::Negate => current.checked_neg(),
            UpdateFn::Max => Some(current.max(required()?)),
            UpdateFn::Min => Some(current.min(required()?)),
        };
        result.ok_or_else(|| EffectError::invalid_value(format!("`{}` overflowed", self.name())))
    }
}

impl std::fmt::Display for UpdateFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
