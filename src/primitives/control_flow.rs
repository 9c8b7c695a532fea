//! Control Flow Primitives - Pattern-matched rendering.
//!
//! [`match_value`] renders one branch per distinct resolved handler and keeps
//! that branch alive while the value keeps resolving to it:
//! - Same branch, new value: the branch channel is updated (NO re-render!)
//! - New branch: the handler renders once; previous branches stay cached
//! - Revisited branch: the cached node comes back, its channel gets the value
//!
//! # Two Stages
//!
//! ```text
//! children(builder) ──derived──► CompiledMatch ─┐
//!                                               ├─effect─► bind() ─► MatchView
//! value (PropValue) ────────────────────────────┘
//! ```
//!
//! Stage 1 is a lazy `derived` over the children closure, so it only reruns
//! when a signal read while building guards changes. Stage 2 is an effect that
//! pulls the settled stage 1 on every run. A new stage 1 result stops the old
//! structure's scope, dropping its whole cache.
//!
//! # Pattern: EffectScope-based Cleanup
//!
//! 1. An outer EffectScope owns the stage-2 effect
//! 2. Each CompiledMatch owns its own scope; branch renders run inside it,
//!    detached from the stage-2 effect so its re-runs leave them alive
//! 3. `on_scope_dispose()` on the outer scope stops the live structure
//! 4. [`MatchView::dispose`] (or dropping the view) stops the outer scope

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use spark_signals::{derived, effect, effect_scope, on_scope_dispose, signal, EffectScope, Signal};

use super::types::{Cleanup, MatchProps};
use crate::engine::{bind, CompiledMatch, GuardBuilder, HandlerKey};
use crate::error::MatchError;

// =============================================================================
// Structure - stage-1 result
// =============================================================================

/// Frozen guard structure as seen by the derived.
///
/// Equality is identity: every rebuild is a new structure.
struct Structure<T: Clone + PartialEq + 'static, N>(Rc<CompiledMatch<T, N>>);

impl<T: Clone + PartialEq + 'static, N> Clone for Structure<T, N> {
    fn clone(&self) -> Self {
        Structure(self.0.clone())
    }
}

impl<T: Clone + PartialEq + 'static, N> PartialEq for Structure<T, N> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Clone + PartialEq + 'static, N> fmt::Debug for Structure<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Structure")
            .field("guards", &self.0.guards().len())
            .field("terminal", &self.0.terminator().terminal())
            .finish()
    }
}

// =============================================================================
// MatchView
// =============================================================================

/// Output of the most recent evaluation.
struct Current<T: Clone + PartialEq + 'static, N> {
    structure: Option<Structure<T, N>>,
    key: Option<HandlerKey>,
    output: Result<N, MatchError>,
}

/// Self-updating handle on the rendered output of [`match_value`].
///
/// [`get`](Self::get) is tracked: effects reading it rerun when the view
/// switches to another node. Value changes within a branch do not rerun them.
pub struct MatchView<T: Clone + PartialEq + 'static, N> {
    current: Rc<RefCell<Current<T, N>>>,
    revision: Signal<u64>,
    scope: Option<EffectScope>,
}

impl<T: Clone + PartialEq + 'static, N: Clone + 'static> MatchView<T, N> {
    /// Current output node, or the error the last evaluation produced.
    pub fn get(&self) -> Result<N, MatchError> {
        // Read revision (creates dependency)
        let _ = self.revision.get();
        self.current.borrow().output.clone()
    }

    /// Branches rendered by the live guard structure.
    pub fn branch_count(&self) -> usize {
        self.current
            .borrow()
            .structure
            .as_ref()
            .map_or(0, |s| s.0.cached_branches())
    }

    /// Tear down every branch and stop tracking.
    pub fn dispose(mut self) {
        self.stop();
    }
}

impl<T: Clone + PartialEq + 'static, N> MatchView<T, N> {
    fn stop(&mut self) {
        if let Some(scope) = self.scope.take() {
            scope.stop();
        }
    }
}

impl<T: Clone + PartialEq + 'static, N> Drop for MatchView<T, N> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<T: Clone + PartialEq + 'static, N: Clone + 'static> From<MatchView<T, N>> for Cleanup {
    fn from(view: MatchView<T, N>) -> Self {
        Box::new(move || view.dispose())
    }
}

// =============================================================================
// match_value()
// =============================================================================

/// Render the branch a value resolves to, once per branch.
///
/// # Example
///
/// ```ignore
/// use spark_match::{match_value, MatchProps};
/// use spark_signals::signal;
///
/// let count = signal(0);
///
/// let view = match_value(MatchProps::new(count.clone(), |m| {
///     m.with(0, |_| text("empty"))
///         .when(|n: &i32| *n < 10, |get| text(move || format!("{} items", get())))
///         .otherwise(|_| text("lots"))
/// }));
///
/// count.set(3); // "N items" branch rendered
/// count.set(4); // same node, its reader now yields 4
/// count.set(0); // back to the cached "empty" node
/// ```
///
/// # Errors
///
/// Failures are reported through [`MatchView::get`]: `NoMatch` when an
/// `exhaustive()`/`run()` structure covers no guard for the value, and
/// `CacheIdentityCollision` when two guards share one handler.
pub fn match_value<T, N>(props: MatchProps<T, N>) -> MatchView<T, N>
where
    T: Clone + PartialEq + 'static,
    N: Clone + 'static,
{
    let MatchProps {
        value,
        children,
        label,
    } = props;
    let label = Rc::<str>::from(label.unwrap_or_default());

    let current = Rc::new(RefCell::new(Current {
        structure: None,
        key: None,
        output: Err(MatchError::Disposed),
    }));
    let revision = signal(0u64);
    let mut revision_count = 0u64;

    // Stage 1: guard structure
    let structure = derived(move || Structure(Rc::new(children(GuardBuilder::new()))));

    let scope = effect_scope(false);

    let current_for_effect = current.clone();
    let current_for_dispose = current.clone();
    let revision_for_effect = revision.clone();
    let label_for_effect = label.clone();

    scope.run(move || {
        // Stage 2: resolution + cache touch, on every value change
        let _effect_cleanup = effect(move || {
            let structure = structure.get();
            let value = value.get();
            let label = &*label_for_effect;

            let previous = current_for_effect.borrow_mut().structure.take();
            let rebuilt = previous.as_ref() != Some(&structure);
            if rebuilt {
                if let Some(old) = previous {
                    tracing::debug!(label, "guard structure rebuilt; dropping cache");
                    old.0.dispose();
                }
            }

            let result = bind(&structure.0, value);
            if let Err(error) = &result {
                tracing::warn!(label, %error, "match evaluation failed");
            }

            let mut current = current_for_effect.borrow_mut();
            let key = result.as_ref().ok().map(|bound| bound.key);
            let changed = rebuilt || key.is_none() || current.key != key;

            current.structure = Some(structure);
            current.key = key;
            current.output = result.map(|bound| bound.node);
            drop(current);

            if changed {
                revision_count += 1;
                revision_for_effect.set(revision_count);
            }
        });

        // Tear down the live structure with the view
        on_scope_dispose(move || {
            let live = {
                let mut current = current_for_dispose.borrow_mut();
                current.key = None;
                current.output = Err(MatchError::Disposed);
                current.structure.take()
            };
            if let Some(structure) = live {
                structure.0.dispose();
            }
        });
    });

    MatchView {
        current,
        revision,
        scope: Some(scope),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Reader;
    use crate::primitives::PropValue;
    use std::cell::Cell;

    type Node = Rc<String>;

    fn node(label: &str) -> Node {
        Rc::new(label.to_string())
    }

    #[test]
    fn test_match_value_renders_initial_branch() {
        let view = match_value(MatchProps::new(2, |m: GuardBuilder<i32, Node>| {
            m.with(1, |_| node("one"))
                .with(2, |_| node("two"))
                .otherwise(|_| node("other"))
        }));

        assert_eq!(*view.get().unwrap(), "two");
        assert_eq!(view.branch_count(), 1);
    }

    #[test]
    fn test_match_value_follows_signal() {
        let value = signal(1);
        let renders = Rc::new(Cell::new(0));
        let renders_clone = renders.clone();

        let view = match_value(MatchProps::new(
            PropValue::Signal(value.clone()),
            move |m: GuardBuilder<i32, Node>| {
                let r1 = renders_clone.clone();
                let r2 = renders_clone.clone();
                m.when(|n: &i32| *n > 0, move |_| {
                    r1.set(r1.get() + 1);
                    node("positive")
                })
                .otherwise(move |_| {
                    r2.set(r2.get() + 1);
                    node("non-positive")
                })
            },
        ));

        let first = view.get().unwrap();
        value.set(5);
        assert!(Rc::ptr_eq(&first, &view.get().unwrap()), "same branch, same node");

        value.set(-1);
        assert_eq!(*view.get().unwrap(), "non-positive");

        value.set(7);
        assert!(Rc::ptr_eq(&first, &view.get().unwrap()), "revisit returns cached node");
        assert_eq!(renders.get(), 2);
    }

    #[test]
    fn test_view_readers_only_rerun_on_node_change() {
        let value = signal(1);
        let view = Rc::new(match_value(MatchProps::new(
            PropValue::Signal(value.clone()),
            |m: GuardBuilder<i32, Node>| {
                m.when(|n: &i32| *n < 10, |_| node("small"))
                    .otherwise(|_| node("large"))
            },
        )));

        let runs = Rc::new(Cell::new(0));
        let runs_clone = runs.clone();
        let view_clone = view.clone();
        let _stop = effect(move || {
            let _ = view_clone.get();
            runs_clone.set(runs_clone.get() + 1);
        });
        assert_eq!(runs.get(), 1);

        value.set(2);
        value.set(3);
        assert_eq!(runs.get(), 1, "value churn within a branch is not a node change");

        value.set(20);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_rebuilding_structure_drops_cache() {
        let threshold = signal(10);
        let threshold_for_children = threshold.clone();
        let renders = Rc::new(Cell::new(0));
        let renders_clone = renders.clone();

        let view = match_value(MatchProps::new(5, move |m: GuardBuilder<i32, Node>| {
            let limit = threshold_for_children.get();
            let renders = renders_clone.clone();
            m.when(move |n: &i32| *n < limit, move |_| {
                renders.set(renders.get() + 1);
                node("below")
            })
            .otherwise(|_| node("above"))
        }));

        let before = view.get().unwrap();
        assert_eq!(renders.get(), 1);

        threshold.set(20);
        let after = view.get().unwrap();
        assert_eq!(*after, "below");
        assert!(!Rc::ptr_eq(&before, &after), "new structure renders fresh nodes");
        assert_eq!(renders.get(), 2);
        assert_eq!(view.branch_count(), 1, "old cache is gone");
    }

    #[test]
    fn test_exhaustive_no_match_is_error() {
        let value = signal(1);
        let view = match_value(MatchProps::new(
            PropValue::Signal(value.clone()),
            |m: GuardBuilder<i32, Node>| m.with(1, |_| node("one")).exhaustive(),
        ));
        assert!(view.get().is_ok());

        value.set(2);
        assert!(matches!(view.get(), Err(MatchError::NoMatch { .. })));

        value.set(1);
        assert_eq!(*view.get().unwrap(), "one");
    }

    #[test]
    fn test_dispose_tears_down_branches() {
        let alive = Rc::new(Cell::new(0));
        let alive_clone = alive.clone();

        let view = match_value(MatchProps::new(1, move |m: GuardBuilder<i32, Node>| {
            let alive = alive_clone.clone();
            m.otherwise(move |_: Reader<i32>| {
                alive.set(alive.get() + 1);
                let alive = alive.clone();
                on_scope_dispose(move || alive.set(alive.get() - 1));
                node("branch")
            })
        }));

        assert_eq!(alive.get(), 1);
        let cleanup: Cleanup = view.into();
        cleanup();
        assert_eq!(alive.get(), 0, "branch scope stopped with the view");
    }

    #[test]
    fn test_drop_stops_view() {
        let alive = Rc::new(Cell::new(0));
        let alive_clone = alive.clone();

        let view = match_value(MatchProps::new(1, move |m: GuardBuilder<i32, Node>| {
            let alive = alive_clone.clone();
            m.otherwise(move |_: Reader<i32>| {
                alive.set(alive.get() + 1);
                let alive = alive.clone();
                on_scope_dispose(move || alive.set(alive.get() - 1));
                node("branch")
            })
        }));

        assert_eq!(alive.get(), 1);
        drop(view);
        assert_eq!(alive.get(), 0, "dropping behaves like dispose");
    }
}
