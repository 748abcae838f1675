//! Trigger conditions.
//!
//! Conditions decide whether a trigger fires, by checking a [`PolicyExpr`]
//! against the trigger's evaluation [`Document`]. The engine consumes any
//! evaluator through the [`ConditionEvaluator`] trait; [`PolicyEvaluator`] is
//! the built-in one.
//!
//! ## Three-valued results
//!
//! Evaluation yields a [`ConditionResult`], not a `bool`:
//!
//! - `Satisfied`: the condition holds, the trigger fires
//! - `Conflict`: the condition is false for this document
//! - `Open`: the document lacks data needed to decide
//!
//! Only `Satisfied` fires. `Open` is a conservative "no", kept distinct from
//! `Conflict` so hosts can see *why* a trigger stayed quiet.

use serde::{Deserialize, Serialize};

use crate::core::{State, Value};

use super::document::Document;
use super::event::Event;

/// Outcome of evaluating a condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionResult {
    /// The condition holds.
    Satisfied,
    /// The condition is false.
    Conflict,
    /// Not enough data to decide.
    Open,
}

impl ConditionResult {
    /// True only for `Satisfied`.
    #[must_use]
    pub fn is_satisfied(self) -> bool {
        match self {
            ConditionResult::Satisfied => true,
            ConditionResult::Conflict | ConditionResult::Open => false,
        }
    }

    /// Three-valued AND.
    #[must_use]
    pub fn and(self, other: ConditionResult) -> ConditionResult {
        match (self, other) {
            (ConditionResult::Conflict, _) | (_, ConditionResult::Conflict) => ConditionResult::Conflict,
            (ConditionResult::Open, _) | (_, ConditionResult::Open) => ConditionResult::Open,
            (ConditionResult::Satisfied, ConditionResult::Satisfied) => ConditionResult::Satisfied,
        }
    }

    /// Three-valued OR.
    #[must_use]
    pub fn or(self, other: ConditionResult) -> ConditionResult {
        match (self, other) {
            (ConditionResult::Satisfied, _) | (_, ConditionResult::Satisfied) => ConditionResult::Satisfied,
            (ConditionResult::Open, _) | (_, ConditionResult::Open) => ConditionResult::Open,
            (ConditionResult::Conflict, ConditionResult::Conflict) => ConditionResult::Conflict,
        }
    }

    /// Three-valued NOT. `Open` stays `Open`.
    #[must_use]
    pub fn negate(self) -> ConditionResult {
        match self {
            ConditionResult::Satisfied => ConditionResult::Conflict,
            ConditionResult::Conflict => ConditionResult::Satisfied,
            ConditionResult::Open => ConditionResult::Open,
        }
    }

    fn from_bool(holds: bool) -> ConditionResult {
        if holds {
            ConditionResult::Satisfied
        } else {
            ConditionResult::Conflict
        }
    }
}

impl std::fmt::Display for ConditionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConditionResult::Satisfied => "satisfied",
            ConditionResult::Conflict => "conflict",
            ConditionResult::Open => "open",
        };
        f.write_str(name)
    }
}

/// A condition expression over document keys.
///
/// Keys may be dotted paths into nested maps (`"target.hp"`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyExpr {
    // === Comparisons ===

    /// Key equals value.
    Eq(String, Value),

    /// Key differs from value.
    NotEq(String, Value),

    /// Integer at key is greater than N.
    Gt(String, i64),

    /// Integer at key is at least N.
    Gte(String, i64),

    /// Integer at key is less than N.
    Lt(String, i64),

    /// Integer at key is at most N.
    Lte(String, i64),

    /// Key equals one of the values.
    In(String, Vec<Value>),

    /// Key is present and not nil. Never `Open`.
    Exists(String),

    /// Two keys hold equal values ("the target is me").
    Bound(String, String),

    // === Combinators ===

    /// All expressions hold.
    All(Vec<PolicyExpr>),

    /// At least one expression holds.
    Any(Vec<PolicyExpr>),

    /// Expression does not hold.
    Not(Box<PolicyExpr>),

    // === Special ===

    /// Always holds.
    Always,

    /// Never holds.
    Never,
}

impl PolicyExpr {
    /// Create an equality condition.
    pub fn eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(key.into(), value.into())
    }

    /// Create a minimum value condition.
    pub fn at_least(key: impl Into<String>, min: i64) -> Self {
        Self::Gte(key.into(), min)
    }

    /// Create a maximum value condition.
    pub fn at_most(key: impl Into<String>, max: i64) -> Self {
        Self::Lte(key.into(), max)
    }

    /// Create a condition requiring two keys to be equal.
    pub fn bound(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self::Bound(left.into(), right.into())
    }

    /// Create an AND condition.
    pub fn all(exprs: impl IntoIterator<Item = PolicyExpr>) -> Self {
        Self::All(exprs.into_iter().collect())
    }

    /// Create an OR condition.
    pub fn any(exprs: impl IntoIterator<Item = PolicyExpr>) -> Self {
        Self::Any(exprs.into_iter().collect())
    }

    /// Negate this condition.
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Add another condition with AND.
    pub fn and(self, other: PolicyExpr) -> Self {
        match self {
            Self::All(mut exprs) => {
                exprs.push(other);
                Self::All(exprs)
            }
            _ => Self::All(vec![self, other]),
        }
    }

    /// Add another condition with OR.
    pub fn or(self, other: PolicyExpr) -> Self {
        match self {
            Self::Any(mut exprs) => {
                exprs.push(other);
                Self::Any(exprs)
            }
            _ => Self::Any(vec![self, other]),
        }
    }
}

/// Extra context available to evaluators.
#[derive(Clone, Copy, Debug)]
pub struct EvalContext<'a> {
    /// The event being processed.
    pub event: &'a Event,
    /// Current state (read-only).
    pub state: &'a State,
}

impl<'a> EvalContext<'a> {
    /// Create a new context.
    pub fn new(event: &'a Event, state: &'a State) -> Self {
        Self { event, state }
    }
}

/// Something that can decide a condition.
///
/// Implemented by [`PolicyEvaluator`] and by any closure with the same shape,
/// so hosts can plug in an external constraint solver.
pub trait ConditionEvaluator {
    /// Evaluate `condition` against `document`.
    fn evaluate(
        &self,
        condition: &PolicyExpr,
        document: &Document,
        ctx: &EvalContext<'_>,
    ) -> ConditionResult;
}

impl<F> ConditionEvaluator for F
where
    F: Fn(&PolicyExpr, &Document, &EvalContext<'_>) -> ConditionResult,
{
    fn evaluate(
        &self,
        condition: &PolicyExpr,
        document: &Document,
        ctx: &EvalContext<'_>,
    ) -> ConditionResult {
        self(condition, document, ctx)
    }
}

/// Built-in evaluator for [`PolicyExpr`].
///
/// Combinators nested deeper than [`PolicyEvaluator::MAX_DEPTH`] evaluate to
/// `Open`, so a hostile expression tree cannot exhaust the stack.
#[derive(Clone, Copy, Debug, Default)]
pub struct PolicyEvaluator;

impl PolicyEvaluator {
    /// Deepest combinator nesting that is evaluated.
    pub const MAX_DEPTH: usize = 64;

    fn compare(document: &Document, key: &str, test: impl Fn(i64) -> bool) -> ConditionResult {
        match document.lookup(key) {
            None => ConditionResult::Open,
            Some(Value::Int(n)) => ConditionResult::from_bool(test(*n)),
            Some(_) => ConditionResult::Conflict,
        }
    }

    fn check(expr: &PolicyExpr, document: &Document, depth: usize) -> ConditionResult {
        if depth > Self::MAX_DEPTH {
            return ConditionResult::Open;
        }
        match expr {
            PolicyExpr::Eq(key, expected) => match document.lookup(key) {
                None => ConditionResult::Open,
                Some(actual) => ConditionResult::from_bool(actual == expected),
            },

            PolicyExpr::NotEq(key, expected) => match document.lookup(key) {
                None => ConditionResult::Open,
                Some(actual) => ConditionResult::from_bool(actual != expected),
            },

            PolicyExpr::Gt(key, n) => Self::compare(document, key, |v| v > *n),
            PolicyExpr::Gte(key, n) => Self::compare(document, key, |v| v >= *n),
            PolicyExpr::Lt(key, n) => Self::compare(document, key, |v| v < *n),
            PolicyExpr::Lte(key, n) => Self::compare(document, key, |v| v <= *n),

            PolicyExpr::In(key, options) => match document.lookup(key) {
                None => ConditionResult::Open,
                Some(actual) => ConditionResult::from_bool(options.contains(actual)),
            },

            PolicyExpr::Exists(key) => ConditionResult::from_bool(document.lookup(key).is_some()),

            PolicyExpr::Bound(left, right) => match (document.lookup(left), document.lookup(right)) {
                (Some(a), Some(b)) => ConditionResult::from_bool(a == b),
                _ => ConditionResult::Open,
            },

            PolicyExpr::All(exprs) => exprs
                .iter()
                .fold(ConditionResult::Satisfied, |acc, e| acc.and(Self::check(e, document, depth + 1))),

            PolicyExpr::Any(exprs) => exprs
                .iter()
                .fold(ConditionResult::Conflict, |acc, e| acc.or(Self::check(e, document, depth + 1))),

            PolicyExpr::Not(inner) => Self::check(inner, document, depth + 1).negate(),

            PolicyExpr::Always => ConditionResult::Satisfied,

            PolicyExpr::Never => ConditionResult::Conflict,
        }
    }
}

impl ConditionEvaluator for PolicyEvaluator {
    fn evaluate(
        &self,
        condition: &PolicyExpr,
        document: &Document,
        _ctx: &EvalContext<'_>,
    ) -> ConditionResult {
        Self::check(condition, document, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(entries: &[(&str, Value)]) -> Document {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn eval(expr: &PolicyExpr, document: &Document) -> ConditionResult {
        let event = Event::new("test/event");
        let state = Value::map();
        PolicyEvaluator.evaluate(expr, document, &EvalContext::new(&event, &state))
    }

    #[test]
    fn test_equality() {
        let d = doc(&[("target_id", Value::from("e1")), ("self", Value::from("e1"))]);

        assert_eq!(eval(&PolicyExpr::eq("target_id", "e1"), &d), ConditionResult::Satisfied);
        assert_eq!(eval(&PolicyExpr::eq("target_id", "e2"), &d), ConditionResult::Conflict);
        assert_eq!(eval(&PolicyExpr::eq("missing", "e1"), &d), ConditionResult::Open);
        assert_eq!(
            eval(&PolicyExpr::NotEq("target_id".into(), Value::from("e2")), &d),
            ConditionResult::Satisfied
        );
        assert_eq!(eval(&PolicyExpr::bound("target_id", "self"), &d), ConditionResult::Satisfied);
        assert_eq!(eval(&PolicyExpr::bound("target_id", "owner"), &d), ConditionResult::Open);
    }

    #[test]
    fn test_value_comparisons() {
        let d = doc(&[("amount", Value::from(5)), ("name", Value::from("bolt"))]);

        assert_eq!(eval(&PolicyExpr::at_least("amount", 5), &d), ConditionResult::Satisfied);
        assert_eq!(eval(&PolicyExpr::at_least("amount", 6), &d), ConditionResult::Conflict);
        assert_eq!(eval(&PolicyExpr::at_most("amount", 4), &d), ConditionResult::Conflict);
        assert_eq!(eval(&PolicyExpr::Gt("amount".into(), 4), &d), ConditionResult::Satisfied);
        assert_eq!(eval(&PolicyExpr::Lt("amount".into(), 5), &d), ConditionResult::Conflict);
        assert_eq!(eval(&PolicyExpr::at_least("missing", 1), &d), ConditionResult::Open);
        // Type mismatch is a definite "no", not missing data
        assert_eq!(eval(&PolicyExpr::at_least("name", 1), &d), ConditionResult::Conflict);
    }

    #[test]
    fn test_membership_and_existence() {
        let d = doc(&[("kind", Value::from("fire")), ("nothing", Value::Nil)]);

        let elemental = PolicyExpr::In("kind".into(), vec![Value::from("fire"), Value::from("ice")]);
        assert_eq!(eval(&elemental, &d), ConditionResult::Satisfied);
        assert_eq!(eval(&PolicyExpr::Exists("kind".into()), &d), ConditionResult::Satisfied);
        assert_eq!(eval(&PolicyExpr::Exists("nothing".into()), &d), ConditionResult::Conflict);
        assert_eq!(eval(&PolicyExpr::Exists("absent".into()), &d), ConditionResult::Conflict);
    }

    #[test]
    fn test_three_valued_combinators() {
        let d = doc(&[("amount", Value::from(5))]);
        let yes = PolicyExpr::at_least("amount", 1);
        let no = PolicyExpr::at_least("amount", 10);
        let open = PolicyExpr::at_least("missing", 1);

        assert_eq!(eval(&PolicyExpr::all([yes.clone(), open.clone()]), &d), ConditionResult::Open);
        assert_eq!(eval(&PolicyExpr::all([no.clone(), open.clone()]), &d), ConditionResult::Conflict);
        assert_eq!(eval(&PolicyExpr::any([yes.clone(), open.clone()]), &d), ConditionResult::Satisfied);
        assert_eq!(eval(&PolicyExpr::any([no.clone(), open.clone()]), &d), ConditionResult::Open);
        assert_eq!(eval(&no.clone().negate(), &d), ConditionResult::Satisfied);
        assert_eq!(eval(&open.negate(), &d), ConditionResult::Open);

        assert_eq!(eval(&PolicyExpr::All(vec![]), &d), ConditionResult::Satisfied);
        assert_eq!(eval(&PolicyExpr::Any(vec![]), &d), ConditionResult::Conflict);
    }

    #[test]
    fn test_nesting_limit_is_open() {
        let d = Document::default();
        let nest = |depth: usize| (0..depth).fold(PolicyExpr::Always, |e, _| PolicyExpr::all([e]));

        assert_eq!(eval(&nest(PolicyEvaluator::MAX_DEPTH), &d), ConditionResult::Satisfied);
        assert_eq!(eval(&nest(PolicyEvaluator::MAX_DEPTH + 1), &d), ConditionResult::Open);

        // Deep enough to overflow the stack without the limit
        let deep = (0..100_000).fold(PolicyExpr::Never, |e, _| e.negate());
        assert_eq!(eval(&deep, &d), ConditionResult::Open);
        // Drop iteratively so teardown doesn't recurse either
        let mut next = Some(deep);
        while let Some(PolicyExpr::Not(inner)) = next.take() {
            next = Some(*inner);
        }
    }

    #[test]
    fn test_always_never() {
        let d = Document::default();
        assert_eq!(eval(&PolicyExpr::Always, &d), ConditionResult::Satisfied);
        assert_eq!(eval(&PolicyExpr::Never, &d), ConditionResult::Conflict);
    }

    #[test]
    fn test_only_satisfied_fires() {
        assert!(ConditionResult::Satisfied.is_satisfied());
        assert!(!ConditionResult::Conflict.is_satisfied());
        assert!(!ConditionResult::Open.is_satisfied());
    }

    #[test]
    fn test_function_evaluator() {
        fn always_open(_: &PolicyExpr, _: &Document, _: &EvalContext<'_>) -> ConditionResult {
            ConditionResult::Open
        }
        let event = Event::new("test/event");
        let state = Value::map();
        let ctx = EvalContext::new(&event, &state);

        assert_eq!(
            always_open.evaluate(&PolicyExpr::Always, &Document::default(), &ctx),
            ConditionResult::Open
        );
    }

    #[test]
    fn test_builder_methods() {
        let expr = PolicyExpr::eq("kind", "fire")
            .and(PolicyExpr::at_least("amount", 3))
            .and(PolicyExpr::bound("target_id", "self"));

        if let PolicyExpr::All(exprs) = expr {
            assert_eq!(exprs.len(), 3);
        } else {
            panic!("Expected All condition");
        }
    }

    #[test]
    fn test_expr_serialization() {
        let expr = PolicyExpr::all([
            PolicyExpr::eq("target_id", "e1"),
            PolicyExpr::at_least("amount", 5),
        ]);

        let json = serde_json::to_string(&expr).unwrap();
        let deserialized: PolicyExpr = serde_json::from_str(&json).unwrap();
        assert_eq!(expr, deserialized);
    }
}
