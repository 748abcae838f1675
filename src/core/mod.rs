//! Core engine types: values, paths, entity ids, configuration.
//!
//! This module contains the game-agnostic building blocks every other module
//! threads around. Games give meaning to state keys; the core never does.

pub mod entity;
pub mod value;
pub mod config;

pub use entity::EntityId;
pub use value::{Path, PathError, State, Value};
pub use config::EngineConfig;
