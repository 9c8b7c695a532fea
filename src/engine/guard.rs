//! Guard Builder - Accumulates guard clauses until a terminal freezes them.
//!
//! The builder is the accumulating state; [`CompiledMatch`] is the frozen
//! state. Terminal calls consume the builder, so a frozen guard list can
//! never grow again.
//!
//! ```ignore
//! let compiled = GuardBuilder::new()
//!     .with(1, |get| render_one(get))
//!     .when(|n: &i32| *n > 10, |get| render_big(get))
//!     .otherwise(|get| render_other(get));
//! ```
//!
//! # Owning Scope
//!
//! Freezing creates the effect scope every later render of this structure
//! runs in. Stopping that scope disposes the renders and clears the cache.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use spark_signals::{effect_scope, on_scope_dispose, with_context, AnyReaction, EffectScope};

use super::cache::RenderCache;
use super::handler::{Handler, Reader};
use crate::pattern::{Pattern, Predicate, Terminal};

// =============================================================================
// Clauses
// =============================================================================

/// What a guard tests.
pub enum ClauseKind<T> {
    /// Any pattern matches, and the guard (if any) holds.
    With {
        patterns: Vec<Pattern<T>>,
        guard: Option<Predicate<T>>,
    },
    /// Every condition holds.
    When { conditions: Vec<Predicate<T>> },
}

/// One guard: a test plus the handler it resolves to.
pub struct GuardClause<T, N> {
    pub kind: ClauseKind<T>,
    pub handler: Handler<T, N>,
}

/// Closing clause of a match.
pub enum Terminator<T, N> {
    /// Resolve the fallback handler when no guard matched.
    Otherwise(Handler<T, N>),
    /// Fail with `NoMatch` when no guard matched.
    Exhaustive,
    /// Evaluate the first match once; fail with `NoMatch` when none matched.
    Run,
}

impl<T, N> Terminator<T, N> {
    pub fn terminal(&self) -> Terminal {
        match self {
            Terminator::Otherwise(_) => Terminal::Otherwise,
            Terminator::Exhaustive => Terminal::Exhaustive,
            Terminator::Run => Terminal::Run,
        }
    }
}

// =============================================================================
// GuardBuilder
// =============================================================================

/// Ordered, append-only list of guard clauses.
pub struct GuardBuilder<T, N> {
    guards: Vec<GuardClause<T, N>>,
}

impl<T, N> Default for GuardBuilder<T, N> {
    fn default() -> Self {
        Self { guards: Vec::new() }
    }
}

impl<T, N> GuardBuilder<T, N>
where
    T: Clone + PartialEq + 'static,
    N: Clone + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of clauses accumulated so far.
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Branch taken when the value matches `pattern`.
    pub fn with(
        self,
        pattern: impl Into<Pattern<T>>,
        render: impl Fn(Reader<T>) -> N + 'static,
    ) -> Self {
        self.with_handler(pattern, Handler::new(render))
    }

    /// Like [`with`](Self::with) with an existing handler.
    pub fn with_handler(self, pattern: impl Into<Pattern<T>>, handler: Handler<T, N>) -> Self {
        self.push(
            ClauseKind::With {
                patterns: vec![pattern.into()],
                guard: None,
            },
            handler,
        )
    }

    /// Branch taken when the value matches any of `patterns`.
    pub fn with_any<P: Into<Pattern<T>>>(
        self,
        patterns: impl IntoIterator<Item = P>,
        render: impl Fn(Reader<T>) -> N + 'static,
    ) -> Self {
        self.push(
            ClauseKind::With {
                patterns: patterns.into_iter().map(Into::into).collect(),
                guard: None,
            },
            Handler::new(render),
        )
    }

    /// Branch taken when the value matches `pattern` and `guard` holds.
    pub fn with_guard(
        self,
        pattern: impl Into<Pattern<T>>,
        guard: impl Fn(&T) -> bool + 'static,
        render: impl Fn(Reader<T>) -> N + 'static,
    ) -> Self {
        self.push(
            ClauseKind::With {
                patterns: vec![pattern.into()],
                guard: Some(Rc::new(guard)),
            },
            Handler::new(render),
        )
    }

    /// Branch taken when `condition` holds.
    pub fn when(
        self,
        condition: impl Fn(&T) -> bool + 'static,
        render: impl Fn(Reader<T>) -> N + 'static,
    ) -> Self {
        self.when_handler(condition, Handler::new(render))
    }

    /// Like [`when`](Self::when) with an existing handler.
    pub fn when_handler(
        self,
        condition: impl Fn(&T) -> bool + 'static,
        handler: Handler<T, N>,
    ) -> Self {
        self.push(
            ClauseKind::When {
                conditions: vec![Rc::new(condition)],
            },
            handler,
        )
    }

    /// Branch taken when every condition holds.
    pub fn when_all(
        self,
        conditions: impl IntoIterator<Item = Predicate<T>>,
        render: impl Fn(Reader<T>) -> N + 'static,
    ) -> Self {
        self.push(
            ClauseKind::When {
                conditions: conditions.into_iter().collect(),
            },
            Handler::new(render),
        )
    }

    fn push(mut self, kind: ClauseKind<T>, handler: Handler<T, N>) -> Self {
        self.guards.push(GuardClause { kind, handler });
        self
    }

    /// Freeze with a fallback branch.
    pub fn otherwise(self, render: impl Fn(Reader<T>) -> N + 'static) -> CompiledMatch<T, N> {
        self.otherwise_handler(Handler::new(render))
    }

    /// Like [`otherwise`](Self::otherwise) with an existing handler.
    pub fn otherwise_handler(self, handler: Handler<T, N>) -> CompiledMatch<T, N> {
        self.freeze(Terminator::Otherwise(handler))
    }

    /// Freeze; values no guard covers fail with `NoMatch`.
    pub fn exhaustive(self) -> CompiledMatch<T, N> {
        self.freeze(Terminator::Exhaustive)
    }

    /// Freeze for single-shot first-match evaluation.
    pub fn run(self) -> CompiledMatch<T, N> {
        self.freeze(Terminator::Run)
    }

    fn freeze(self, terminator: Terminator<T, N>) -> CompiledMatch<T, N> {
        let cache = Rc::new(RefCell::new(RenderCache::new()));
        let scope = effect_scope(false);

        let cache_for_dispose = cache.clone();
        scope.run(move || {
            // Cache lives exactly as long as the owning scope
            on_scope_dispose(move || {
                cache_for_dispose.borrow_mut().clear();
            });
        });

        tracing::debug!(
            guards = self.guards.len(),
            terminal = %terminator.terminal(),
            "froze guard list"
        );

        CompiledMatch {
            guards: self.guards,
            terminator,
            scope: RefCell::new(Some(scope)),
            cache,
        }
    }
}

// =============================================================================
// CompiledMatch
// =============================================================================

/// A frozen guard list with its owning scope and render cache.
pub struct CompiledMatch<T: Clone + PartialEq + 'static, N> {
    guards: Vec<GuardClause<T, N>>,
    terminator: Terminator<T, N>,
    scope: RefCell<Option<EffectScope>>,
    cache: Rc<RefCell<RenderCache<T, N>>>,
}

impl<T: Clone + PartialEq + 'static, N> CompiledMatch<T, N> {
    pub fn guards(&self) -> &[GuardClause<T, N>] {
        &self.guards
    }

    pub fn terminator(&self) -> &Terminator<T, N> {
        &self.terminator
    }

    pub(crate) fn cache(&self) -> &RefCell<RenderCache<T, N>> {
        &self.cache
    }

    /// Number of branches rendered and still cached.
    pub fn cached_branches(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Run `f` inside the owning scope, detached from the caller.
    ///
    /// Effects `f` creates are owned by the scope alone, so a re-run of
    /// whatever effect called us cannot destroy them. Signals `f` reads are
    /// not recorded against the caller either.
    ///
    /// Returns `None` once the scope has been stopped.
    pub(crate) fn run_in_scope<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let scope = self.scope.borrow().clone()?;
        scope.run(|| without_owner(f))
    }

    pub fn is_disposed(&self) -> bool {
        self.scope.borrow().is_none()
    }

    /// Stop the owning scope. Idempotent.
    pub fn dispose(&self) {
        let scope = self.scope.borrow_mut().take();
        if let Some(scope) = scope {
            scope.stop();
        }
    }
}

/// Run `f` with no active reaction and no parent effect.
fn without_owner<R>(f: impl FnOnce() -> R) -> R {
    struct Restore {
        reaction: Option<Weak<dyn AnyReaction>>,
        effect: Option<Weak<dyn AnyReaction>>,
    }

    impl Drop for Restore {
        fn drop(&mut self) {
            with_context(|ctx| {
                ctx.set_active_reaction(self.reaction.take());
                ctx.set_active_effect(self.effect.take());
            });
        }
    }

    let _restore = with_context(|ctx| Restore {
        reaction: ctx.set_active_reaction(None),
        effect: ctx.set_active_effect(None),
    });
    f()
}

// =============================================================================
// Tests
// =============================================================================
