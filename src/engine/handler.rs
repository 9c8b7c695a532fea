//! Handler - Render functions with a stable identity.
//!
//! A [`Handler`] wraps the render function of one branch in an `Rc`. Cloning
//! a handler shares the allocation, so the pointer doubles as the branch
//! identity ([`HandlerKey`]) used by the render cache.

use std::fmt;
use std::rc::Rc;

/// Tracked accessor for the value delivered to a branch.
///
/// Calling it inside an effect subscribes that effect to the branch channel.
pub type Reader<T> = Rc<dyn Fn() -> T>;

/// Identity of a handler allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerKey(usize);

/// Render function of one branch: receives the branch reader, returns a node.
pub struct Handler<T, N> {
    render: Rc<dyn Fn(Reader<T>) -> N>,
}

impl<T, N> Handler<T, N> {
    /// Wrap a render function into a new handler with a fresh identity.
    pub fn new(render: impl Fn(Reader<T>) -> N + 'static) -> Self {
        Self {
            render: Rc::new(render),
        }
    }

    /// Identity of this handler. Clones share it.
    pub fn key(&self) -> HandlerKey {
        HandlerKey(Rc::as_ptr(&self.render).cast::<()>() as usize)
    }

    /// Whether both handlers point at the same render function.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }

    pub(crate) fn render(&self, reader: Reader<T>) -> N {
        (self.render)(reader)
    }
}

impl<T, N> Clone for Handler<T, N> {
    fn clone(&self) -> Self {
        Self {
            render: self.render.clone(),
        }
    }
}

impl<T, N> fmt::Debug for Handler<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.key()).finish()
    }
}

impl<T, N, F> From<F> for Handler<T, N>
where
    F: Fn(Reader<T>) -> N + 'static,
{
    fn from(render: F) -> Self {
        Handler::new(render)
    }
}
