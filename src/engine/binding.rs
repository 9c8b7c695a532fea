//! Reactive Binding - Cache hit/miss protocol for one evaluation.
//!
//! - **Hit**: the resolved handler already rendered. Push the value into its
//!   channel (only if it changed) and hand back the cached node untouched.
//! - **Miss**: create a channel seeded with the value and render the handler
//!   once, inside the owning scope captured when the guards were frozen. The
//!   render has no parent effect and its signal reads are not tracked by the
//!   caller.
//!
//! A branch's render function therefore runs at most once per compiled
//! match. Value churn within a branch reaches the node through the channel.
//! A render that never reads its channel reactively will not see later
//! values; that is the contract, not a bug.

use super::cache::{CacheEntry, Channel};
use super::compiler::{resolve, Branch};
use super::guard::CompiledMatch;
use super::handler::HandlerKey;
use crate::error::MatchError;

/// What [`bind`] did to produce the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Cached node reused; `delivered` is whether the channel was written.
    Hit { delivered: bool },
    /// Handler rendered for the first time.
    Miss,
}

/// Result of binding a value: the node and the branch it belongs to.
pub struct Bound<N> {
    pub node: N,
    pub key: HandlerKey,
    pub branch: Branch,
    pub outcome: Outcome,
}

/// Resolve `value` against `compiled` and return its output node.
pub fn bind<T, N>(compiled: &CompiledMatch<T, N>, value: T) -> Result<Bound<N>, MatchError>
where
    T: Clone + PartialEq + 'static,
    N: Clone + 'static,
{
    let resolved = resolve(compiled, &value)?;
    let key = resolved.handler.key();
    let branch = resolved.branch;

    // Copy out of the cache before delivering: the write runs branch effects
    let cached = compiled
        .cache()
        .borrow()
        .get(key)
        .map(|entry| (entry.channel().clone(), entry.node().clone(), entry.branch()));

    if let Some((channel, node, cached_branch)) = cached {
        if cached_branch != branch {
            tracing::warn!(?key, %cached_branch, %branch, "handler shared between branches");
            return Err(MatchError::CacheIdentityCollision {
                handler: key,
                cached: cached_branch,
                resolved: branch,
            });
        }

        let delivered = channel.deliver(value);
        tracing::trace!(%branch, delivered, "cache hit");
        return Ok(Bound {
            node,
            key,
            branch,
            outcome: Outcome::Hit { delivered },
        });
    }

    tracing::debug!(%branch, "cache miss; rendering branch");

    let handler = resolved.handler;
    let channel = Channel::new(value);
    let reader = channel.reader();
    let node = compiled
        .run_in_scope(move || handler.render(reader))
        .ok_or(MatchError::Disposed)?;

    compiled
        .cache()
        .borrow_mut()
        .put(key, CacheEntry::new(channel, node.clone(), branch));

    Ok(Bound {
        node,
        key,
        branch,
        outcome: Outcome::Miss,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::guard::GuardBuilder;
    use crate::engine::handler::{Handler, Reader};
    use spark_signals::{effect, signal};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Output node stand-in: identity is the `Rc` allocation.
    type Node = Rc<String>;

    fn counted(label: &'static str, calls: &Rc<Cell<usize>>) -> impl Fn(Reader<i32>) -> Node + use<> {
        let calls = calls.clone();
        move |_get| {
            calls.set(calls.get() + 1);
            Rc::new(label.to_string())
        }
    }

    #[test]
    fn test_same_branch_returns_same_node() {
        let calls = Rc::new(Cell::new(0));
        let compiled = GuardBuilder::new()
            .when(|n: &i32| *n > 0, counted("positive", &calls))
            .otherwise(counted("other", &calls));

        let a = bind(&compiled, 1).unwrap();
        let b = bind(&compiled, 2).unwrap();
        let c = bind(&compiled, 3).unwrap();

        assert!(Rc::ptr_eq(&a.node, &b.node));
        assert!(Rc::ptr_eq(&b.node, &c.node));
        assert_eq!(a.outcome, Outcome::Miss);
        assert_eq!(b.outcome, Outcome::Hit { delivered: true });
        assert_eq!(calls.get(), 1, "branch renders once");
    }

    #[test]
    fn test_switching_branches_keeps_cache() {
        let calls = Rc::new(Cell::new(0));
        let compiled = GuardBuilder::new()
            .with(1, counted("one", &calls))
            .with(2, counted("two", &calls))
            .otherwise(counted("other", &calls));

        let a = bind(&compiled, 1).unwrap();
        let b = bind(&compiled, 2).unwrap();
        assert!(!Rc::ptr_eq(&a.node, &b.node));
        assert_eq!(compiled.cached_branches(), 2);

        let again = bind(&compiled, 1).unwrap();
        assert!(Rc::ptr_eq(&a.node, &again.node), "revisit returns original node");
        assert_eq!(again.outcome, Outcome::Hit { delivered: false });
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_hit_pushes_value_through_channel() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_render = seen.clone();

        let compiled: CompiledMatch<i32, ()> = GuardBuilder::new()
            .when(|n: &i32| *n % 2 == 0, move |get| {
                let seen = seen_render.clone();
                let _stop = effect(move || {
                    seen.borrow_mut().push(get());
                });
            })
            .otherwise(|_| ());

        bind(&compiled, 2).unwrap();
        bind(&compiled, 4).unwrap();
        bind(&compiled, 3).unwrap();
        bind(&compiled, 6).unwrap();

        assert_eq!(*seen.borrow(), vec![2, 4, 6]);
    }

    #[test]
    fn test_readers_survive_binding_effect_rerun() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_render = seen.clone();
        let compiled: Rc<CompiledMatch<i32, ()>> = Rc::new(
            GuardBuilder::new()
                .when(|n: &i32| *n >= 10, move |get| {
                    let seen = seen_render.clone();
                    let _stop = effect(move || {
                        seen.borrow_mut().push(get());
                    });
                })
                .otherwise(|_| ()),
        );

        let value = signal(10);
        let value_clone = value.clone();
        let compiled_clone = compiled.clone();
        let _stop = effect(move || {
            let _ = bind(&compiled_clone, value_clone.get());
        });

        value.set(11);
        value.set(12);
        assert_eq!(*seen.borrow(), vec![10, 11, 12]);
    }

    #[test]
    fn test_collision_detected() {
        let shared: Handler<i32, Node> = Handler::new(|_| Rc::new("shared".to_string()));
        let compiled = GuardBuilder::new()
            .with_handler(1, shared.clone())
            .with_handler(2, shared.clone())
            .exhaustive();

        bind(&compiled, 1).unwrap();
        let err = bind(&compiled, 2).err();
        assert_eq!(
            err,
            Some(MatchError::CacheIdentityCollision {
                handler: shared.key(),
                cached: Branch::Guard(0),
                resolved: Branch::Guard(1),
            })
        );
    }

    #[test]
    fn test_no_match_propagates() {
        let compiled: CompiledMatch<i32, Node> = GuardBuilder::new()
            .with(1, |_| Rc::new("one".to_string()))
            .exhaustive();

        assert!(matches!(bind(&compiled, 5), Err(MatchError::NoMatch { .. })));
        assert_eq!(compiled.cached_branches(), 0, "failures render nothing");
    }

    #[test]
    fn test_disposed_match_refuses_render() {
        let compiled: CompiledMatch<i32, Node> = GuardBuilder::new()
            .otherwise(|_| Rc::new("x".to_string()));
        compiled.dispose();

        assert!(matches!(bind(&compiled, 1), Err(MatchError::Disposed)));
    }
}
