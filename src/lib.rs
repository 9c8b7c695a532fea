//! # spark-match
//!
//! Pattern-matched, identity-stable rendering on top of
//! [spark-signals](https://github.com/RLabs-Inc/spark-signals).
//!
//! A value is matched against an ordered list of guards. The first matching
//! guard's handler renders **once**; as long as later values resolve to the
//! same handler, they are pushed into that branch's private signal instead of
//! rendering again. Switching branches keeps earlier renders cached, so
//! revisiting a branch returns the very same node.
//!
//! ## Architecture
//!
//! ```text
//! GuardBuilder ─freeze─► CompiledMatch ─resolve─► Handler ─bind─► RenderCache
//!                                                                 hit: push value
//!                                                                 miss: render once
//! ```
//!
//! ## Modules
//!
//! - [`pattern`] - Patterns and the first-match evaluator
//! - [`engine`] - Guards, handler resolution, render cache, hit/miss binding
//! - [`primitives`] - `match_value` and its props
//! - [`error`] - `MatchError`

pub mod engine;
pub mod error;
pub mod pattern;
pub mod primitives;

pub use engine::{
    bind, resolve, Branch, CompiledMatch, GuardBuilder, Handler, HandlerKey, Outcome, Reader,
    RenderCache, Terminator,
};

pub use error::MatchError;

pub use pattern::{Evaluator, Pattern, Predicate, Terminal};

pub use primitives::{match_value, Cleanup, MatchProps, MatchView, PropValue};
