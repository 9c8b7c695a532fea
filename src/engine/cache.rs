//! Render Cache - Handler identity to previously rendered branch.
//!
//! Each entry keeps the output node and the channel feeding that node. The
//! channel is a spark-signals `Signal`; the "did the value change?" check
//! reads it through `untrack`, so delivering never subscribes the caller.

use std::collections::HashMap;
use std::rc::Rc;

use spark_signals::{signal, untrack, Signal};

use super::compiler::Branch;
use super::handler::{HandlerKey, Reader};

// =============================================================================
// Channel
// =============================================================================

/// Private input channel of one rendered branch.
pub struct Channel<T: Clone + PartialEq + 'static> {
    signal: Signal<T>,
}

impl<T: Clone + PartialEq + 'static> Channel<T> {
    /// New channel seeded with `value`.
    pub fn new(value: T) -> Rc<Self> {
        Rc::new(Self {
            signal: signal(value),
        })
    }

    /// Tracked reader handed to the branch render function.
    pub fn reader(&self) -> Reader<T> {
        let signal = self.signal.clone();
        Rc::new(move || signal.get())
    }

    /// Last value written, read without tracking.
    pub fn last_delivered(&self) -> T {
        untrack(|| self.signal.get())
    }

    /// Push `value` if it differs from the last delivered one.
    ///
    /// Returns whether a write happened.
    pub fn deliver(&self, value: T) -> bool {
        if self.last_delivered() == value {
            return false;
        }
        self.signal.set(value);
        true
    }
}

// =============================================================================
// CacheEntry
// =============================================================================

/// One rendered branch.
pub struct CacheEntry<T: Clone + PartialEq + 'static, N> {
    channel: Rc<Channel<T>>,
    node: N,
    branch: Branch,
}

impl<T: Clone + PartialEq + 'static, N: Clone> CacheEntry<T, N> {
    pub fn new(channel: Rc<Channel<T>>, node: N, branch: Branch) -> Self {
        Self {
            channel,
            node,
            branch,
        }
    }

    pub fn channel(&self) -> &Rc<Channel<T>> {
        &self.channel
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    /// Guard position that produced this render.
    pub fn branch(&self) -> Branch {
        self.branch
    }
}

// =============================================================================
// RenderCache
// =============================================================================

/// Renders of one compiled match, keyed by handler identity.
pub struct RenderCache<T: Clone + PartialEq + 'static, N> {
    entries: HashMap<HandlerKey, CacheEntry<T, N>>,
}

impl<T: Clone + PartialEq + 'static, N> Default for RenderCache<T, N> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T: Clone + PartialEq + 'static, N> RenderCache<T, N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: HandlerKey) -> Option<&CacheEntry<T, N>> {
        self.entries.get(&key)
    }

    pub fn put(&mut self, key: HandlerKey, entry: CacheEntry<T, N>) {
        self.entries.insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry, releasing nodes and channels.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::handler::Handler;
    use spark_signals::effect;
    use std::cell::{Cell, RefCell};

    #[test]
    fn test_channel_deliver_skips_equal_values() {
        let channel = Channel::new(1);

        assert!(!channel.deliver(1), "same value must not write");
        assert!(channel.deliver(2));
        assert_eq!(channel.last_delivered(), 2);
        assert_eq!((channel.reader())(), 2);
    }

    #[test]
    fn test_channel_reader_is_tracked() {
        let channel = Channel::new("a".to_string());
        let reader = channel.reader();

        let runs = Rc::new(Cell::new(0));
        let runs_clone = runs.clone();
        let seen = Rc::new(RefCell::new(String::new()));
        let seen_clone = seen.clone();

        let _stop = effect(move || {
            runs_clone.set(runs_clone.get() + 1);
            *seen_clone.borrow_mut() = reader();
        });
        assert_eq!(runs.get(), 1);

        channel.deliver("b".to_string());
        assert_eq!(*seen.borrow(), "b", "reader effect should see pushed value");
        assert_eq!(runs.get(), 2);

        channel.deliver("b".to_string());
        assert_eq!(runs.get(), 2, "unchanged value must not re-run readers");
    }

    #[test]
    fn test_deliver_does_not_subscribe_caller() {
        let channel = Channel::new(0);
        let channel_clone = channel.clone();
        let runs = Rc::new(Cell::new(0));
        let runs_clone = runs.clone();

        let _stop = effect(move || {
            runs_clone.set(runs_clone.get() + 1);
            channel_clone.deliver(1);
        });
        assert_eq!(runs.get(), 1);

        channel.deliver(2);
        assert_eq!(runs.get(), 1, "comparison inside deliver must be untracked");
        assert_eq!(channel.last_delivered(), 2);
    }

    #[test]
    fn test_cache_keyed_by_identity() {
        let h1: Handler<i32, &str> = Handler::new(|_| "x");
        let h2: Handler<i32, &str> = Handler::new(|_| "x");

        let mut cache = RenderCache::new();
        cache.put(h1.key(), CacheEntry::new(Channel::new(1), "A", Branch::Guard(0)));

        assert!(cache.get(h1.key()).is_some());
        assert!(cache.get(h1.clone().key()).is_some(), "clones share the entry");
        assert!(
            cache.get(h2.key()).is_none(),
            "structurally equal handler is a different branch"
        );

        let entry = cache.get(h1.key()).unwrap();
        assert_eq!(*entry.node(), "A");
        assert_eq!(entry.branch(), Branch::Guard(0));
        assert_eq!(entry.channel().last_delivered(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
