//! Pattern evaluation - First-match clause selection.
//!
//! This is the matching evaluator the engine sits on top of. It knows nothing
//! about rendering or caching: it tests arms in declaration order and yields
//! whatever the first matching arm's thunk returns.
//!
//! # Pattern
//!
//! [`Pattern`] is deliberately small:
//! - [`Pattern::Any`] - wildcard
//! - [`Pattern::Value`] - equality with a literal (`From<T>` builds it)
//! - [`Pattern::When`] - arbitrary predicate
//! - [`Pattern::Not`] / [`Pattern::Union`] - combinators
//!
//! # Evaluator
//!
//! ```ignore
//! let label = Evaluator::new(&3)
//!     .with(&[1.into(), 2.into()], None, || "small")
//!     .when(&[Rc::new(|n: &i32| *n > 2)], || "big")
//!     .otherwise(|| "other");
//! assert_eq!(label, "big");
//! ```
//!
//! Thunks are invoked once, for the selected arm only. Later arms are neither
//! tested nor invoked.

use std::fmt;
use std::rc::Rc;

use crate::error::MatchError;

/// Boolean test over a borrowed value.
pub type Predicate<T> = Rc<dyn Fn(&T) -> bool>;

// =============================================================================
// Pattern
// =============================================================================

/// A structural test against a value.
pub enum Pattern<T> {
    /// Matches anything.
    Any,
    /// Matches values equal to the literal.
    Value(T),
    /// Matches when the predicate returns true.
    When(Predicate<T>),
    /// Matches when the inner pattern does not.
    Not(Box<Pattern<T>>),
    /// Matches when any inner pattern does. An empty union never matches.
    Union(Vec<Pattern<T>>),
}

impl<T: PartialEq> Pattern<T> {
    /// Predicate pattern from a closure.
    pub fn when(predicate: impl Fn(&T) -> bool + 'static) -> Self {
        Pattern::When(Rc::new(predicate))
    }

    /// Negate a pattern.
    pub fn not(pattern: impl Into<Pattern<T>>) -> Self {
        Pattern::Not(Box::new(pattern.into()))
    }

    /// Union of patterns.
    pub fn union<P: Into<Pattern<T>>>(patterns: impl IntoIterator<Item = P>) -> Self {
        Pattern::Union(patterns.into_iter().map(Into::into).collect())
    }

    /// Test the value against this pattern.
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Value(expected) => expected == value,
            Pattern::When(predicate) => predicate(value),
            Pattern::Not(inner) => !inner.matches(value),
            Pattern::Union(patterns) => patterns.iter().any(|p| p.matches(value)),
        }
    }
}

impl<T> From<T> for Pattern<T> {
    fn from(value: T) -> Self {
        Pattern::Value(value)
    }
}

impl<T: Clone> Clone for Pattern<T> {
    fn clone(&self) -> Self {
        match self {
            Pattern::Any => Pattern::Any,
            Pattern::Value(v) => Pattern::Value(v.clone()),
            Pattern::When(p) => Pattern::When(p.clone()),
            Pattern::Not(inner) => Pattern::Not(inner.clone()),
            Pattern::Union(ps) => Pattern::Union(ps.clone()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Pattern<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Any => f.write_str("Any"),
            Pattern::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Pattern::When(_) => f.write_str("When(..)"),
            Pattern::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
            Pattern::Union(ps) => f.debug_tuple("Union").field(ps).finish(),
        }
    }
}

// =============================================================================
// Terminal
// =============================================================================

/// How a match expression ends when no arm matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terminal {
    /// Fall back to a default arm.
    Otherwise,
    /// Every value must be covered by some arm.
    Exhaustive,
    /// Single-shot evaluation of the first match.
    Run,
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Terminal::Otherwise => "otherwise",
            Terminal::Exhaustive => "exhaustive",
            Terminal::Run => "run",
        })
    }
}

// =============================================================================
// Evaluator
// =============================================================================

/// Chained first-match evaluator over a borrowed value.
pub struct Evaluator<'v, T, R> {
    value: &'v T,
    selected: Option<R>,
}

impl<'v, T: PartialEq, R> Evaluator<'v, T, R> {
    /// Start matching `value`.
    pub fn new(value: &'v T) -> Self {
        Self {
            value,
            selected: None,
        }
    }

    /// Arm that matches when any pattern matches and the optional guard holds.
    pub fn with(
        self,
        patterns: &[Pattern<T>],
        guard: Option<&Predicate<T>>,
        thunk: impl FnOnce() -> R,
    ) -> Self {
        self.arm(
            |value| {
                patterns.iter().any(|p| p.matches(value)) && guard.is_none_or(|g| g(value))
            },
            thunk,
        )
    }

    /// Arm that matches when every condition holds.
    pub fn when(self, conditions: &[Predicate<T>], thunk: impl FnOnce() -> R) -> Self {
        self.arm(|value| conditions.iter().all(|c| c(value)), thunk)
    }

    fn arm(mut self, test: impl FnOnce(&T) -> bool, thunk: impl FnOnce() -> R) -> Self {
        if self.selected.is_none() && test(self.value) {
            self.selected = Some(thunk());
        }
        self
    }

    /// Whether an arm has already been selected.
    pub fn is_matched(&self) -> bool {
        self.selected.is_some()
    }

    /// Selected result, or the fallback thunk's result.
    pub fn otherwise(self, fallback: impl FnOnce() -> R) -> R {
        self.selected.unwrap_or_else(fallback)
    }

    /// Selected result, or [`MatchError::NoMatch`].
    pub fn exhaustive(self) -> Result<R, MatchError> {
        self.finish(Terminal::Exhaustive)
    }

    /// Selected result, or [`MatchError::NoMatch`].
    pub fn run(self) -> Result<R, MatchError> {
        self.finish(Terminal::Run)
    }

    fn finish(self, terminal: Terminal) -> Result<R, MatchError> {
        self.selected.ok_or(MatchError::NoMatch { terminal })
    }
}

// =============================================================================
// Tests
// =============================================================================
