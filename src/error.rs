//! Error types for match resolution and rendering.

use thiserror::Error;

use crate::engine::{Branch, HandlerKey};
use crate::pattern::Terminal;

/// Errors produced while resolving or rendering a match.
///
/// Stored inside [`MatchView`](crate::MatchView) so it is `Clone + PartialEq`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// No guard matched and the terminal has no fallback.
    #[error("no guard matched the value (terminal: {terminal})")]
    NoMatch {
        /// The terminal that gave up.
        terminal: Terminal,
    },

    /// Two structurally distinct guards resolved to the same handler reference.
    #[error("handler {handler:?} is shared by {cached:?} and {resolved:?}; branches would merge")]
    CacheIdentityCollision {
        /// Identity of the shared handler.
        handler: HandlerKey,
        /// Branch that produced the cached render.
        cached: Branch,
        /// Branch that resolved to the same handler now.
        resolved: Branch,
    },

    /// The view was read after it was disposed.
    #[error("match view has been disposed")]
    Disposed,
}
