//! Primitive types - Props and cleanup.
//!
//! These types define the interface of the match primitive.
//! Props support static values, signals, and getters for reactivity.

use std::rc::Rc;

use spark_signals::Signal;

use crate::engine::{CompiledMatch, GuardBuilder};

// =============================================================================
// Cleanup Function
// =============================================================================

/// Cleanup function returned by primitives.
///
/// Call this to unmount and release resources.
pub type Cleanup = Box<dyn FnOnce()>;

// =============================================================================
// Prop Value - Reactive property wrapper
// =============================================================================

/// A property value that can be static, a signal, or a getter.
///
/// Reading a `Signal` or `Getter` inside an effect creates a dependency.
#[derive(Clone)]
pub enum PropValue<T: Clone + PartialEq + 'static> {
    /// Static value (not reactive).
    Static(T),
    /// Reactive signal (changes propagate automatically).
    Signal(Signal<T>),
    /// Getter function (called each time value is needed).
    Getter(Rc<dyn Fn() -> T>),
}

impl<T: Clone + PartialEq + 'static> PropValue<T> {
    /// Get the current value (tracked when reactive).
    pub fn get(&self) -> T {
        match self {
            PropValue::Static(v) => v.clone(),
            PropValue::Signal(s) => s.get(),
            PropValue::Getter(f) => f(),
        }
    }

    /// Getter from a closure.
    pub fn getter(f: impl Fn() -> T + 'static) -> Self {
        PropValue::Getter(Rc::new(f))
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for PropValue<T> {
    fn default() -> Self {
        PropValue::Static(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> From<T> for PropValue<T> {
    fn from(value: T) -> Self {
        PropValue::Static(value)
    }
}

impl<T: Clone + PartialEq + 'static> From<Signal<T>> for PropValue<T> {
    fn from(signal: Signal<T>) -> Self {
        PropValue::Signal(signal)
    }
}

// =============================================================================
// Match Props
// =============================================================================

/// Builds the guard structure from a fresh builder.
pub type Children<T, N> = Box<dyn Fn(GuardBuilder<T, N>) -> CompiledMatch<T, N>>;

/// Properties for [`match_value`](super::match_value).
///
/// # Example
///
/// ```ignore
/// use spark_match::{match_value, MatchProps};
/// use spark_signals::signal;
///
/// let status = signal(Status::Loading);
///
/// let view = match_value(
///     MatchProps::new(status.clone(), |m| {
///         m.with(Status::Loading, |_| spinner())
///             .when(|s: &Status| s.is_error(), |get| error_banner(get))
///             .otherwise(|get| content(get))
///     })
///     .label("status"),
/// );
/// ```
pub struct MatchProps<T: Clone + PartialEq + 'static, N> {
    /// Value being matched.
    pub value: PropValue<T>,

    /// Guard structure. Re-run only when signals it reads change.
    pub children: Children<T, N>,

    /// Name attached to log events.
    pub label: Option<String>,
}

impl<T: Clone + PartialEq + 'static, N> MatchProps<T, N> {
    pub fn new(
        value: impl Into<PropValue<T>>,
        children: impl Fn(GuardBuilder<T, N>) -> CompiledMatch<T, N> + 'static,
    ) -> Self {
        Self {
            value: value.into(),
            children: Box::new(children),
            label: None,
        }
    }

    /// Set the diagnostic label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}
