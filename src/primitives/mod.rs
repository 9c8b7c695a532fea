//! Match Primitives - The public rendering surface.
//!
//! - [`match_value`] - Render one branch per resolved handler, update it in place
//!
//! # Reactivity
//!
//! The matched value is a [`PropValue`]:
//! - Static values: `MatchProps::new(3, ..)`
//! - Signals: `MatchProps::new(my_signal, ..)` (stays connected!)
//! - Getters: `MatchProps::new(PropValue::getter(|| compute()), ..)`
//!
//! Branch renders receive a [`Reader`](crate::Reader). Read it inside an
//! effect (or a getter prop of whatever the branch builds) to follow value
//! changes without re-rendering:
//!
//! ```ignore
//! // CORRECT - reader stays connected
//! m.when(|n: &i32| *n > 0, |get| label(move || format!("{}", get())))
//!
//! // WRONG - value captured once, later pushes are never seen
//! m.when(|n: &i32| *n > 0, |get| { let n = get(); label(move || format!("{}", n)) })
//! ```

mod control_flow;
mod types;

pub use control_flow::{match_value, MatchView};
pub use types::*;
