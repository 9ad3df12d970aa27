//! Reducer composition utilities
//!
//! This module provides utilities for composing reducers in various ways:
//! - **`combine_reducers`**: Run multiple reducers on the same state/action
//! - **`scope_reducer`**: Focus a reducer on a subset of state
//!
//! # Examples
//!
//! ## Scoping a Reducer
//!
//! ```
//! use std::convert::Infallible;
//! use tally_core::action::Action;
//! use tally_core::composition::scope_reducer;
//! use tally_core::reducer::{Reducer, initialize, reducer_fn};
//!
//! #[derive(Clone, Default)]
//! struct AppState {
//!     clicks: u32,
//!     title: String,
//! }
//!
//! enum AppAction {
//!     Click,
//!     Rename(String),
//! }
//!
//! let clicks = reducer_fn(|state: Option<&u32>, action: Action<'_, ()>| {
//!     let state = state.copied().unwrap_or_default();
//!     Ok::<_, Infallible>(if action.is_init() { state } else { state + 1 })
//! });
//!
//! let app = scope_reducer(
//!     clicks,
//!     |app: &AppState| &app.clicks,
//!     |app: &mut AppState, clicks| app.clicks = clicks,
//!     |action: &AppAction| match action {
//!         AppAction::Click => Some(&()),
//!         AppAction::Rename(_) => None,
//!     },
//! );
//!
//! let state = initialize(&app, None)?;
//! let state = app.reduce(Some(&state), Action::from(&AppAction::Click))?;
//! assert_eq!(state.clicks, 1);
//! # Ok::<(), Infallible>(())
//! ```

use crate::action::Action;
use crate::reducer::Reducer;

/// Boxed reducer over a shared state, action and error type.
pub type BoxedReducer<S, A, E> = Box<dyn Reducer<State = S, Action = A, Error = E>>;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer runs in sequence and sees the state produced by the one
/// before it. The first error stops the chain and is returned as-is.
///
/// With no reducers, the combined reducer returns the input state, or
/// `S::default()` when there is none.
///
/// # Examples
///
/// ```
/// use tally_core::action::Action;
/// use tally_core::composition::combine_reducers;
/// use tally_core::reducer::{Reducer, reducer_fn};
///
/// #[derive(Clone, Debug, Default, PartialEq)]
/// struct Stats {
///     hits: u32,
///     last: Option<char>,
/// }
///
/// let hits = reducer_fn(|state: Option<&Stats>, action: Action<'_, char>| {
///     let mut next = state.cloned().unwrap_or_default();
///     if !action.is_init() {
///         next.hits += 1;
///     }
///     Ok::<_, String>(next)
/// });
/// let last = reducer_fn(|state: Option<&Stats>, action: Action<'_, char>| {
///     let mut next = state.cloned().unwrap_or_default();
///     if let Some(c) = action.dispatched() {
///         next.last = Some(*c);
///     }
///     Ok::<_, String>(next)
/// });
///
/// let combined = combine_reducers(vec![Box::new(hits), Box::new(last)]);
/// let state = combined.reduce(None, Action::from(&'x'))?;
/// assert_eq!(state, Stats { hits: 1, last: Some('x') });
/// # Ok::<(), String>(())
/// ```
#[must_use]
pub fn combine_reducers<S, A, E>(reducers: Vec<BoxedReducer<S, A, E>>) -> CombinedReducer<S, A, E>
where
    S: Clone + Default,
{
    CombinedReducer { reducers }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A, E> {
    reducers: Vec<BoxedReducer<S, A, E>>,
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    S: Clone + Default,
{
    type State = S;
    type Action = A;
    type Error = E;

    fn reduce(&self, state: Option<&S>, action: Action<'_, A>) -> Result<S, E> {
        let mut current: Option<S> = None;

        for reducer in &self.reducers {
            let next = reducer.reduce(current.as_ref().or(state), action)?;
            current = Some(next);
        }

        Ok(current.unwrap_or_else(|| state.cloned().unwrap_or_default()))
    }
}

/// Scopes a reducer to operate on a subset of a larger state.
///
/// This allows you to reuse reducers designed for smaller state types
/// within a larger application state.
///
/// - `get_state` / `set_state` focus on the child's field of the parent.
/// - `to_child_action` picks out the parent actions the child understands.
///   Any other action leaves the parent state unchanged.
///
/// The init action always reaches the child, so it can supply its default.
/// When the parent has no state yet, the child's result is written into
/// `P::default()`.
pub fn scope_reducer<P, PA, R>(
    reducer: R,
    get_state: fn(&P) -> &R::State,
    set_state: fn(&mut P, R::State),
    to_child_action: fn(&PA) -> Option<&R::Action>,
) -> ScopedReducer<P, PA, R>
where
    P: Clone + Default,
    R: Reducer,
{
    ScopedReducer {
        reducer,
        get_state,
        set_state,
        to_child_action,
    }
}

/// A scoped reducer that operates on a subset of state.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<P, PA, R>
where
    R: Reducer,
{
    reducer: R,
    get_state: fn(&P) -> &R::State,
    set_state: fn(&mut P, R::State),
    to_child_action: fn(&PA) -> Option<&R::Action>,
}

impl<P, PA, R> Reducer for ScopedReducer<P, PA, R>
where
    P: Clone + Default,
    R: Reducer,
{
    type State = P;
    type Action = PA;
    type Error = R::Error;

    fn reduce(&self, state: Option<&P>, action: Action<'_, PA>) -> Result<P, R::Error> {
        let Some(child_action) = action.filter_map(self.to_child_action) else {
            return Ok(state.cloned().unwrap_or_default());
        };

        let child = self
            .reducer
            .reduce(state.map(self.get_state), child_action)?;

        let mut parent = state.cloned().unwrap_or_default();
        (self.set_state)(&mut parent, child);
        Ok(parent)
    }
}
