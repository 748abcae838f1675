//! Dynamic values for state, event fields and evaluation documents.
//!
//! The engine is game-agnostic, so everything it threads through triggers is
//! a [`Value`]: a small JSON-like tree whose maps and lists are `im`
//! persistent collections. Cloning a `Value` is O(1), which is what lets every
//! engine operation return a *new* state instead of mutating the caller's.
//!
//! ## Paths
//!
//! Nested values are addressed with a [`Path`] of map keys. The path
//! operations mirror the usual persistent-map trio:
//!
//! - [`Value::get_in`]: read a nested value
//! - [`Value::assoc_in`]: set a nested value, creating intermediate maps
//! - [`Value::update_in`]: replace a nested value with a function of itself
//!
//! ```
//! use ccg_triggers::core::{Path, Value};
//!
//! let state: Value = [("hp", Value::from(10))].into_iter().collect();
//! let path = Path::from(["hp"]);
//!
//! let next = state
//!     .update_in(&path, |hp| Ok::<_, ccg_triggers::core::PathError>(Value::from(hp.and_then(Value::as_int).unwrap_or(0) - 1)))
//!     .unwrap();
//!
//! assert_eq!(next.get_in(&path), Some(&Value::from(9)));
//! // The original is untouched.
//! assert_eq!(state.get_in(&path), Some(&Value::from(10)));
//! ```

use im::{OrdMap, Vector};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

/// Shared game state threaded through trigger processing.
///
/// Games decide the shape; most use a map at the root.
pub type State = Value;

/// A dynamically typed, persistent value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent / null.
    #[default]
    Nil,
    /// Boolean flag.
    Bool(bool),
    /// Integer (all numeric state is integral for determinism).
    Int(i64),
    /// String or keyword.
    Str(String),
    /// Ordered list.
    List(Vector<Value>),
    /// String-keyed map, iterated in key order.
    Map(OrdMap<String, Value>),
}

impl Value {
    /// An empty map.
    #[must_use]
    pub fn map() -> Self {
        Self::Map(OrdMap::new())
    }

    /// Short type name, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&Vector<Value>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&OrdMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key if this is a map.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Read the value at `path`. The empty path returns `self`.
    #[must_use]
    pub fn get_in(&self, path: &Path) -> Option<&Value> {
        path.iter()
            .try_fold(self, |current, segment| current.get(segment))
    }

    /// Return a copy of `self` with `value` stored at `path`.
    ///
    /// Missing or nil intermediate entries become empty maps. Descending
    /// through any other non-map value is an error.
    pub fn assoc_in(&self, path: &Path, value: Value) -> Result<Value, PathError> {
        if path.is_empty() {
            return Err(PathError::Empty);
        }
        self.assoc_at(path, value)
    }

    fn assoc_at(&self, segments: &[String], value: Value) -> Result<Value, PathError> {
        let Some((head, rest)) = segments.split_first() else {
            return Ok(value);
        };
        let mut map = self.map_for_segment(head)?;
        let child = map.get(head).cloned().unwrap_or_default();
        map.insert(head.clone(), child.assoc_at(rest, value)?);
        Ok(Value::Map(map))
    }

    /// Return a copy of `self` with the value at `path` replaced by `f(old)`.
    ///
    /// `f` receives `None` when nothing is stored at the path yet.
    pub fn update_in<E, F>(&self, path: &Path, f: F) -> Result<Value, E>
    where
        E: From<PathError>,
        F: FnOnce(Option<&Value>) -> Result<Value, E>,
    {
        if path.is_empty() {
            return Err(PathError::Empty.into());
        }
        self.update_at(path, f)
    }

    fn update_at<E, F>(&self, segments: &[String], f: F) -> Result<Value, E>
    where
        E: From<PathError>,
        F: FnOnce(Option<&Value>) -> Result<Value, E>,
    {
        let Some((head, rest)) = segments.split_first() else {
            return f(Some(self));
        };
        let mut map = self.map_for_segment(head)?;
        let updated = match (map.get(head), rest.is_empty()) {
            (current, true) => f(current.filter(|v| !v.is_nil()))?,
            (Some(child), false) => child.update_at(rest, f)?,
            (None, false) => Value::Nil.update_at(rest, f)?,
        };
        map.insert(head.clone(), updated);
        Ok(Value::Map(map))
    }

    fn map_for_segment(&self, segment: &str) -> Result<OrdMap<String, Value>, PathError> {
        match self {
            Value::Map(map) => Ok(map.clone()),
            Value::Nil => Ok(OrdMap::new()),
            other => Err(PathError::NotAMap {
                segment: segment.to_string(),
                found: other.type_name(),
            }),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<OrdMap<String, Value>> for Value {
    fn from(map: OrdMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Failure to walk or rebuild a nested value.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path must have at least one segment")]
    Empty,

    #[error("cannot descend into {found} at segment `{segment}`")]
    NotAMap { segment: String, found: &'static str },
}

/// A sequence of map keys addressing a nested value.
///
/// SmallVec keeps the common 1-3 segment paths off the heap.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(SmallVec<[String; 4]>);

impl Path {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `"a.b.c"` into a three-segment path.
    #[must_use]
    pub fn dotted(path: &str) -> Self {
        path.split('.')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Append a segment (builder pattern).
    #[must_use]
    pub fn push(mut self, segment: impl Into<String>) -> Self {
        self.0.push(segment.into());
        self
    }

    /// Encode as a list value, for storing inside effect parameters.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::List(self.0.iter().cloned().map(Value::Str).collect())
    }

    /// Decode from a list of strings, or a single dotted string.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(Self::dotted(s)),
            Value::List(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => None,
        }
    }
}

impl std::ops::Deref for Path {
    type Target = [String];

    fn deref(&self) -> &[String] {
        &self.0
    }
}

impl FromIterator<String> for Path {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[&str; N]> for Path {
    fn from(segments: [&str; N]) -> Self {
        segments.iter().map(|s| s.to_string()).collect()
    }
}

impl From<&[&str]> for Path {
    fn from(segments: &[&str]) -> Self {
        segments.iter().map(|s| s.to_string()).collect()
    }
}

impl From<&str> for Path {
    fn from(path: &str) -> Self {
        Self::dotted(path)
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hp_state(hp: i64) -> Value {
        [("hp", Value::from(hp))].into_iter().collect()
    }

    #[test]
    fn test_get_in_nested() {
        let inner: Value = [("hp", Value::from(3))].into_iter().collect();
        let state: Value = [("e1", inner)].into_iter().collect();

        assert_eq!(state.get_in(&Path::from(["e1", "hp"])), Some(&Value::Int(3)));
        assert_eq!(state.get_in(&Path::from(["e2", "hp"])), None);
        assert_eq!(state.get_in(&Path::new()), Some(&state));
    }

    #[test]
    fn test_assoc_in_creates_maps() {
        let state = Value::map();
        let next = state
            .assoc_in(&Path::from(["a", "b"]), Value::from(true))
            .unwrap();

        assert_eq!(next.get_in(&Path::from("a.b")), Some(&Value::Bool(true)));
        assert_eq!(state, Value::map());
    }

    #[test]
    fn test_assoc_in_through_scalar_fails() {
        let state = hp_state(10);
        let err = state
            .assoc_in(&Path::from(["hp", "max"]), Value::from(1))
            .unwrap_err();

        assert_eq!(
            err,
            PathError::NotAMap {
                segment: "max".to_string(),
                found: "int"
            }
        );
    }

    #[test]
    fn test_empty_path_rejected() {
        assert_eq!(
            Value::map().assoc_in(&Path::new(), Value::Nil),
            Err(PathError::Empty)
        );
    }

    #[test]
    fn test_update_in_passes_none_for_missing() {
        let next = Value::map()
            .update_in(&Path::from(["count"]), |current| {
                assert!(current.is_none());
                Ok::<_, PathError>(Value::from(1))
            })
            .unwrap();

        assert_eq!(next.get("count"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_update_in_keeps_siblings() {
        let state: Value = [("hp", Value::from(10)), ("armor", Value::from(2))]
            .into_iter()
            .collect();

        let next = state
            .update_in(&Path::from(["hp"]), |hp| {
                Ok::<_, PathError>(Value::from(hp.and_then(Value::as_int).unwrap_or(0) - 1))
            })
            .unwrap();

        assert_eq!(next.get("hp"), Some(&Value::Int(9)));
        assert_eq!(next.get("armor"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_path_value_encoding() {
        let path = Path::from(["players", "p1", "life"]);
        assert_eq!(Path::from_value(&path.to_value()), Some(path.clone()));
        assert_eq!(Path::from_value(&Value::from("players.p1.life")), Some(path));
        assert_eq!(Path::from_value(&Value::from(3)), None);
    }

    #[test]
    fn test_json_shape() {
        let state = hp_state(10);
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"hp":10}"#);

        let parsed: Value = serde_json::from_str(r#"{"hp":10,"tags":["a"],"dead":false,"x":null}"#).unwrap();
        assert_eq!(parsed.get("hp"), Some(&Value::Int(10)));
        assert_eq!(parsed.get("dead"), Some(&Value::Bool(false)));
        assert_eq!(parsed.get("x"), Some(&Value::Nil));
        assert_eq!(parsed.get("tags").and_then(Value::as_list).map(|l| l.len()), Some(1));
    }
}
