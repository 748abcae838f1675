//! Effect system for trigger actions.
//!
//! Effects are what triggers *do* once their condition holds:
//! - [`EffectDef`]: Data describing an effect (type name + parameters)
//! - [`EffectApplicator`]: The contract the engine applies effects through
//! - [`EffectHandlers`]: Built-in applicator, an open handler table
//!
//! ## Design Philosophy
//!
//! The effect system is intentionally small and game-agnostic. Built-in
//! kinds only read and write paths in the state value; games give those
//! paths meaning and register handlers for anything richer.

mod effect;
mod error;
mod resolver;

pub use effect::{EffectDef, UpdateFn};
pub use error::{EffectError, ErrorKind};
pub use resolver::{
    EffectApplicator, EffectContext, EffectFailure, EffectHandler, EffectHandlers, EffectResult,
    MAX_SEQUENCE_DEPTH,
};
