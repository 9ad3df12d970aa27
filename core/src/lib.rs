//! # Tally Core
//!
//! Core traits and types for the Tally unidirectional store.
//!
//! This crate provides the pure half of the architecture: the action envelope
//! a reducer receives and the [`Reducer`](reducer::Reducer) trait itself. The
//! stateful half (the `Store`) lives in `tally-runtime`.
//!
//! ## Core Concepts
//!
//! - **State**: An application-defined value, replaced as a whole on every dispatch
//! - **Action**: A tagged value describing an intended state transition
//! - **Reducer**: Pure function `(Option<State>, Action) → State`
//!
//! ## Example
//!
//! ```
//! use std::convert::Infallible;
//! use tally_core::action::Action;
//! use tally_core::reducer::{Reducer, initialize};
//!
//! #[derive(Clone, Debug, Default, PartialEq)]
//! struct Toggle {
//!     on: bool,
//! }
//!
//! enum ToggleAction {
//!     Flip,
//! }
//!
//! struct ToggleReducer;
//!
//! impl Reducer for ToggleReducer {
//!     type State = Toggle;
//!     type Action = ToggleAction;
//!     type Error = Infallible;
//!
//!     fn reduce(
//!         &self,
//!         state: Option<&Toggle>,
//!         action: Action<'_, ToggleAction>,
//!     ) -> Result<Toggle, Infallible> {
//!         let state = state.cloned().unwrap_or_default();
//!         match action {
//!             Action::Dispatched(ToggleAction::Flip) => Ok(Toggle { on: !state.on }),
//!             Action::Init(_) => Ok(state),
//!         }
//!     }
//! }
//!
//! let state = initialize(&ToggleReducer, None)?;
//! assert_eq!(state, Toggle { on: false });
//!
//! let state = ToggleReducer.reduce(Some(&state), Action::from(&ToggleAction::Flip))?;
//! assert!(state.on);
//! # Ok::<(), Infallible>(())
//! ```

// Re-export commonly used types
pub use serde::{Deserialize, Serialize};

/// Action envelope and the reserved initialization action
pub mod action;

/// Reducer composition utilities
pub mod composition;

/// Reducer module - The core trait for state transitions
///
/// Reducers are pure functions: `(Option<State>, Action) → Result<State, Error>`.
///
/// A `None` state means the store has no state yet. This only happens for the
/// initialization action dispatched at store construction, and is the branch
/// where a reducer supplies its default state.
pub mod reducer {
    use crate::action::{Action, Init};
    use std::marker::PhantomData;

    /// The Reducer trait - core abstraction for state transitions
    ///
    /// # Contract
    ///
    /// - No side effects. The same input always yields the same output.
    /// - Unrecognized actions (including [`Action::Init`]) must yield the input
    ///   state unchanged, or the reducer's default when there is no state.
    /// - An `Err` is surfaced to the caller of `dispatch`; the store keeps its
    ///   previous state and notifies no one.
    ///
    /// Infallible reducers use [`std::convert::Infallible`] as their error type.
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The application action type this reducer processes
        type Action;

        /// The error a failed transition reports
        type Error;

        /// Compute the next state from the current state and an action
        ///
        /// # Errors
        ///
        /// Returns the reducer's own error when the transition cannot be
        /// computed.
        fn reduce(
            &self,
            state: Option<&Self::State>,
            action: Action<'_, Self::Action>,
        ) -> Result<Self::State, Self::Error>;
    }

    /// Run a reducer against the reserved initialization action
    ///
    /// This is what a store does once at construction so the reducer can
    /// populate a missing state with its default. Exposed so tests and
    /// composite reducers can do the same without being able to forge the
    /// init action themselves.
    ///
    /// # Errors
    ///
    /// Returns the reducer's error if it rejects initialization.
    pub fn initialize<R>(reducer: &R, state: Option<&R::State>) -> Result<R::State, R::Error>
    where
        R: Reducer + ?Sized,
    {
        reducer.reduce(state, Action::Init(Init::reserved()))
    }

    /// Wrap a plain function or closure as a [`Reducer`]
    ///
    /// # Example
    ///
    /// ```
    /// use std::convert::Infallible;
    /// use tally_core::action::Action;
    /// use tally_core::reducer::{Reducer, initialize, reducer_fn};
    ///
    /// let doubler = reducer_fn(|state: Option<&u32>, action: Action<'_, ()>| {
    ///     let state = state.copied().unwrap_or(1);
    ///     Ok::<_, Infallible>(if action.is_init() { state } else { state * 2 })
    /// });
    ///
    /// let state = initialize(&doubler, None)?;
    /// assert_eq!(doubler.reduce(Some(&state), Action::from(&()))?, 2);
    /// # Ok::<(), Infallible>(())
    /// ```
    pub const fn reducer_fn<F, S, A, E>(f: F) -> FnReducer<F, S, A, E>
    where
        F: Fn(Option<&S>, Action<'_, A>) -> Result<S, E>,
    {
        FnReducer {
            f,
            _phantom: PhantomData,
        }
    }

    /// A reducer backed by a function.
    ///
    /// Created by [`reducer_fn`].
    pub struct FnReducer<F, S, A, E> {
        f: F,
        _phantom: PhantomData<fn(Option<&S>, &A) -> Result<S, E>>,
    }

    impl<F: Clone, S, A, E> Clone for FnReducer<F, S, A, E> {
        fn clone(&self) -> Self {
            Self {
                f: self.f.clone(),
                _phantom: PhantomData,
            }
        }
    }

    impl<F, S, A, E> std::fmt::Debug for FnReducer<F, S, A, E> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("FnReducer").finish_non_exhaustive()
        }
    }

    impl<F, S, A, E> Reducer for FnReducer<F, S, A, E>
    where
        F: Fn(Option<&S>, Action<'_, A>) -> Result<S, E>,
    {
        type State = S;
        type Action = A;
        type Error = E;

        fn reduce(&self, state: Option<&S>, action: Action<'_, A>) -> Result<S, E> {
            (self.f)(state, action)
        }
    }
}
