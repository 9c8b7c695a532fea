//! Match Engine - Guards, resolution, and the render cache.
//!
//! Two stages, leaves first:
//! 1. [`GuardBuilder`] accumulates clauses and freezes into a [`CompiledMatch`]
//!    (rarely recomputed).
//! 2. [`bind`] resolves a value to one handler via [`resolve`] and touches the
//!    [`RenderCache`] (recomputed on every value change).
//!
//! Nothing here is reactive on its own. [`crate::primitives::match_value`]
//! wires the two stages into spark-signals.

mod binding;
mod cache;
mod compiler;
mod guard;
mod handler;

pub use binding::{bind, Bound, Outcome};
pub use cache::{CacheEntry, Channel, RenderCache};
pub use compiler::{resolve, Branch, Resolved};
pub use guard::{ClauseKind, CompiledMatch, GuardBuilder, GuardClause, Terminator};
pub use handler::{Handler, HandlerKey, Reader};
