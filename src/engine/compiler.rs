//! Match Compiler - Resolves one handler for a value.
//!
//! Handlers are handed to the [`Evaluator`] wrapped in thunks that *return*
//! the handler instead of calling it. The evaluator still performs its
//! ordinary first-match selection, but its result is the handler reference
//! itself, which keeps the identity the render cache is keyed by.

use std::fmt;

use super::guard::{ClauseKind, CompiledMatch, Terminator};
use super::handler::Handler;
use crate::error::MatchError;
use crate::pattern::Evaluator;

/// Structural position a handler was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    /// Guard at this index in declaration order.
    Guard(usize),
    /// The `otherwise` fallback.
    Otherwise,
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Branch::Guard(index) => write!(f, "guard #{index}"),
            Branch::Otherwise => f.write_str("otherwise"),
        }
    }
}

/// Outcome of resolution: the handler reference and where it came from.
pub struct Resolved<T, N> {
    pub handler: Handler<T, N>,
    pub branch: Branch,
}

/// Resolve the handler `value` selects in `compiled`.
///
/// Evaluator failures (`NoMatch`) are returned unchanged.
pub fn resolve<T, N>(compiled: &CompiledMatch<T, N>, value: &T) -> Result<Resolved<T, N>, MatchError>
where
    T: Clone + PartialEq + 'static,
{
    let mut evaluator = Evaluator::new(value);

    for (index, guard) in compiled.guards().iter().enumerate() {
        let thunk = || Resolved {
            handler: guard.handler.clone(),
            branch: Branch::Guard(index),
        };
        evaluator = match &guard.kind {
            ClauseKind::With {
                patterns,
                guard: predicate,
            } => evaluator.with(patterns, predicate.as_ref(), thunk),
            ClauseKind::When { conditions } => evaluator.when(conditions, thunk),
        };
    }

    match compiled.terminator() {
        Terminator::Otherwise(fallback) => Ok(evaluator.otherwise(|| Resolved {
            handler: fallback.clone(),
            branch: Branch::Otherwise,
        })),
        Terminator::Exhaustive => evaluator.exhaustive(),
        Terminator::Run => evaluator.run(),
    }
}

// =============================================================================
// Tests
// =============================================================================
