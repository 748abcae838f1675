//! Effect failures.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::PathError;

/// Category of an effect failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The handler failed or panicked.
    EffectFailed,
    /// A path parameter was missing or could not be walked.
    InvalidPath,
    /// A value had the wrong type or was out of range.
    InvalidValue,
    /// An `update_in` function name is not known.
    UnknownFunction,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::EffectFailed => "effect failed",
            ErrorKind::InvalidPath => "invalid path",
            ErrorKind::InvalidValue => "invalid value",
            ErrorKind::UnknownFunction => "unknown function",
        };
        f.write_str(name)
    }
}

/// Error returned by an effect handler.
///
/// Never escapes the effect boundary: the applicator turns it into an
/// [`EffectFailure`](super::EffectFailure) entry.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct EffectError {
    pub kind: ErrorKind,
    pub message: String,
}

impl EffectError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Generic handler failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EffectFailed, message)
    }

    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidValue, message)
    }
}

impl From<PathError> for EffectError {
    fn from(err: PathError) -> Self {
        Self::new(ErrorKind::InvalidPath, err.to_string())
    }
}
