//! # Tally Runtime
//!
//! Runtime implementation for Tally: the [`Store`].
//!
//! The Store holds a single state value, runs every dispatched action through
//! its reducer, and synchronously notifies subscribed listeners with the new
//! state.
//!
//! ## Example
//!
//! ```
//! use std::convert::Infallible;
//! use tally_core::action::{Action, ActionType};
//! use tally_core::reducer::Reducer;
//! use tally_runtime::Store;
//!
//! #[derive(Clone, Debug, Default)]
//! struct Votes {
//!     yes: u32,
//! }
//!
//! struct Vote;
//!
//! impl ActionType for Vote {
//!     fn action_type(&self) -> &str {
//!         "VOTE"
//!     }
//! }
//!
//! struct VotesReducer;
//!
//! impl Reducer for VotesReducer {
//!     type State = Votes;
//!     type Action = Vote;
//!     type Error = Infallible;
//!
//!     fn reduce(
//!         &self,
//!         state: Option<&Votes>,
//!         action: Action<'_, Vote>,
//!     ) -> Result<Votes, Infallible> {
//!         let state = state.cloned().unwrap_or_default();
//!         Ok(match action {
//!             Action::Dispatched(Vote) => Votes { yes: state.yes + 1 },
//!             Action::Init(_) => state,
//!         })
//!     }
//! }
//!
//! let store = Store::new(VotesReducer, None)?;
//! let unsubscribe = store.subscribe(|votes: &Votes| println!("yes: {}", votes.yes));
//!
//! store.dispatch(Vote)?;
//! assert_eq!(store.get_state().yes, 1);
//!
//! assert!(unsubscribe.unsubscribe());
//! # Ok::<(), tally_runtime::StoreError<Infallible>>(())
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Instant;
use tally_core::action::{Action, ActionType, INIT_ACTION_TYPE};
use tally_core::reducer::{Reducer, initialize};

/// Store metrics via the `metrics` facade
pub mod metrics;

mod listeners;

pub use listeners::{ListenerId, Unsubscribe};

use crate::listeners::ListenerRegistry;
use crate::metrics::StoreMetrics;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    ///
    /// `E` is the reducer's own error type.
    #[derive(Error, Debug)]
    pub enum StoreError<E> {
        /// The reducer returned an error
        ///
        /// The store kept its previous state and notified no listeners.
        #[error("Reducer failed on `{action_type}`: {source}")]
        Reducer {
            /// Type tag of the action being reduced
            action_type: String,
            /// The reducer's error
            #[source]
            source: E,
        },

        /// `dispatch` was called while the reducer was running
        ///
        /// Reducers must be pure; the nested action was dropped.
        #[error("Reducers may not dispatch actions (rejected `{action_type}`)")]
        DispatchInReducer {
            /// Type tag of the rejected action
            action_type: String,
        },
    }
}

pub use error::StoreError;

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use tally_runtime::StoreConfig;
///
/// let config = StoreConfig::new("session").with_listener_warning_threshold(Some(8));
/// assert_eq!(config.name, "session");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Store label used in tracing spans and metric labels
    pub name: String,
    /// Log a warning once the listener count exceeds this value
    pub listener_warning_threshold: Option<usize>,
}

impl StoreConfig {
    /// Create a configuration with the given store name and default settings
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the store name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the listener warning threshold (`None` disables the warning)
    #[must_use]
    pub const fn with_listener_warning_threshold(mut self, threshold: Option<usize>) -> Self {
        self.listener_warning_threshold = threshold;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "store".to_string(),
            listener_warning_threshold: Some(64),
        }
    }
}

/// Marks the reducer as running for the lifetime of the guard.
///
/// Clears the flag on drop, so a panicking reducer does not wedge the store.
struct ReducerGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> ReducerGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self { flag }
    }
}

impl Drop for ReducerGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// Run one reducer call with timing, metrics, and failure logging.
fn observe<S, E>(
    store: &str,
    action_type: &str,
    reduce: impl FnOnce() -> Result<S, E>,
) -> Result<S, StoreError<E>>
where
    E: fmt::Display,
{
    let start = Instant::now();
    let result = {
        let span = tracing::debug_span!("reducer_execution");
        let _enter = span.enter();
        reduce()
    };
    StoreMetrics::record_dispatch(store, start.elapsed(), result.is_err());

    result.map_err(|source| {
        tracing::warn!(error = %source, "Reducer failed, state unchanged");
        StoreError::Reducer {
            action_type: action_type.to_owned(),
            source,
        }
    })
}

/// Store module - the stateful container
pub mod store {
    use super::{
        Action, ActionType, Cell, INIT_ACTION_TYPE, ListenerRegistry, Rc, Reducer, ReducerGuard,
        RefCell, StoreConfig, StoreError, Unsubscribe, fmt, initialize, observe,
    };
    use std::rc::Weak;

    /// The Store - holds the state and coordinates dispatch
    ///
    /// The Store manages:
    /// 1. State (an `Rc<State>`, replaced as a whole on each dispatch)
    /// 2. Reducer (the transition function)
    /// 3. Listeners (notified in subscription order after each dispatch)
    ///
    /// `Store` is a cheap handle: clones share the same state and listeners.
    /// It is single-threaded (`!Send`, `!Sync`).
    ///
    /// Listeners may dispatch or subscribe re-entrantly. A listener that needs
    /// the store should capture a [`WeakStore`] from [`Store::downgrade`]: a
    /// strong clone stored inside the store's own listener list keeps the
    /// store alive forever.
    ///
    /// ```
    /// # use std::convert::Infallible;
    /// # use tally_core::action::{Action, ActionType};
    /// # use tally_core::reducer::reducer_fn;
    /// # use tally_runtime::Store;
    /// # struct Step;
    /// # impl ActionType for Step {
    /// #     fn action_type(&self) -> &str {
    /// #         "STEP"
    /// #     }
    /// # }
    /// let reducer = reducer_fn(|state: Option<&u32>, action: Action<'_, Step>| {
    ///     let state = state.copied().unwrap_or(0);
    ///     Ok::<_, Infallible>(if action.is_init() { state } else { state + 1 })
    /// });
    /// let store = Store::new(reducer, None)?;
    ///
    /// let weak = store.downgrade();
    /// store.subscribe(move |count: &u32| {
    ///     if *count == 1 {
    ///         if let Some(store) = weak.upgrade() {
    ///             let _ = store.dispatch(Step);
    ///         }
    ///     }
    /// });
    ///
    /// store.dispatch(Step)?;
    /// assert_eq!(*store.get_state(), 2);
    /// # Ok::<(), tally_runtime::StoreError<Infallible>>(())
    /// ```
    ///
    /// # Type Parameters
    ///
    /// - `R`: Reducer implementation. Its action type must implement
    ///   [`ActionType`] for logging, and its error type must implement
    ///   [`Display`](std::fmt::Display).
    pub struct Store<R>
    where
        R: Reducer,
    {
        shared: Rc<Shared<R>>,
    }

    /// A non-owning handle to a [`Store`]
    ///
    /// Created by [`Store::downgrade`]. Holding one does not keep the store's
    /// state, reducer or listeners alive.
    pub struct WeakStore<R>
    where
        R: Reducer,
    {
        shared: Weak<Shared<R>>,
    }

    impl<R> WeakStore<R>
    where
        R: Reducer,
    {
        /// The store, if any strong handle to it still exists
        #[must_use]
        pub fn upgrade(&self) -> Option<Store<R>> {
            self.shared.upgrade().map(|shared| Store { shared })
        }
    }

    impl<R> Clone for WeakStore<R>
    where
        R: Reducer,
    {
        fn clone(&self) -> Self {
            Self {
                shared: Weak::clone(&self.shared),
            }
        }
    }

    impl<R> fmt::Debug for WeakStore<R>
    where
        R: Reducer,
    {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("WeakStore")
                .field("alive", &(self.shared.strong_count() > 0))
                .finish()
        }
    }

    struct Shared<R>
    where
        R: Reducer,
    {
        reducer: R,
        state: RefCell<Rc<R::State>>,
        listeners: Rc<RefCell<ListenerRegistry<R::State>>>,
        reducing: Cell<bool>,
        config: StoreConfig,
    }

    impl<R> Store<R>
    where
        R: Reducer,
        R::Action: ActionType,
        R::Error: fmt::Display,
    {
        /// Create a new store with a reducer and an optional initial state
        ///
        /// Dispatches the reserved init action once, so a reducer can supply
        /// its default when `initial_state` is `None`. Uses the default
        /// [`StoreConfig`].
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::Reducer`] if the reducer rejects the init action.
        pub fn new(
            reducer: R,
            initial_state: Option<R::State>,
        ) -> Result<Self, StoreError<R::Error>> {
            Self::with_config(reducer, initial_state, StoreConfig::default())
        }

        /// Create a new store with custom configuration
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::Reducer`] if the reducer rejects the init action.
        pub fn with_config(
            reducer: R,
            initial_state: Option<R::State>,
            config: StoreConfig,
        ) -> Result<Self, StoreError<R::Error>> {
            let span = tracing::debug_span!("store_init", store = %config.name);
            let _enter = span.enter();

            let state = observe(&config.name, INIT_ACTION_TYPE, || {
                initialize(&reducer, initial_state.as_ref())
            })?;

            tracing::debug!(
                had_initial_state = initial_state.is_some(),
                "Store initialized"
            );

            let listeners = Rc::new(RefCell::new(ListenerRegistry::new(config.name.clone())));
            Ok(Self {
                shared: Rc::new(Shared {
                    reducer,
                    state: RefCell::new(Rc::new(state)),
                    listeners,
                    reducing: Cell::new(false),
                    config,
                }),
            })
        }

        /// The current state
        ///
        /// Returns a shared reference; the store replaces rather than mutates
        /// its state, so the returned value never changes underneath the caller.
        #[must_use]
        pub fn get_state(&self) -> Rc<R::State> {
            Rc::clone(&self.shared.state.borrow())
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let count = store.state(|s| s.count);
        /// ```
        pub fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&R::State) -> T,
        {
            let state = self.get_state();
            f(&state)
        }

        /// Dispatch an action
        ///
        /// 1. Runs the reducer on the current state
        /// 2. Replaces the state with the result
        /// 3. Calls every listener subscribed when notification starts, in
        ///    subscription order, with the new state
        ///
        /// Everything completes before `dispatch` returns. The action is handed
        /// back on success whether or not the state changed.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Reducer`]: the reducer failed; state is unchanged and
        ///   no listener runs
        /// - [`StoreError::DispatchInReducer`]: called from inside the reducer
        #[tracing::instrument(
            skip_all,
            name = "store_dispatch",
            fields(store = %self.shared.config.name, action_type = action.action_type())
        )]
        pub fn dispatch(&self, action: R::Action) -> Result<R::Action, StoreError<R::Error>> {
            let shared = &*self.shared;

            if shared.reducing.get() {
                tracing::warn!("Rejected action: dispatched from inside the reducer");
                return Err(StoreError::DispatchInReducer {
                    action_type: action.action_type().to_owned(),
                });
            }

            tracing::debug!("Processing action");

            let current = self.get_state();
            let next = observe(&shared.config.name, action.action_type(), || {
                let _guard = ReducerGuard::enter(&shared.reducing);
                shared
                    .reducer
                    .reduce(Some(&*current), Action::Dispatched(&action))
            })?;

            let next = Rc::new(next);
            *shared.state.borrow_mut() = Rc::clone(&next);
            tracing::trace!("State replaced");

            self.notify(&next);

            Ok(action)
        }

        /// Subscribe a listener to state changes
        ///
        /// The listener is appended to the end of the list and called with the
        /// new state after every subsequent dispatch. Subscribing the same
        /// closure twice registers it twice.
        ///
        /// Use the returned [`Unsubscribe`] handle to remove it; dropping the
        /// handle leaves the listener registered.
        pub fn subscribe<F>(&self, listener: F) -> Unsubscribe<R::State>
        where
            F: Fn(&R::State) + 'static,
        {
            let shared = &*self.shared;
            let (id, count) = {
                let mut registry = shared.listeners.borrow_mut();
                let id = registry.insert(Rc::new(listener));
                (id, registry.len())
            };

            tracing::debug!(
                store = %shared.config.name,
                listener_id = id.get(),
                listeners = count,
                "Listener subscribed"
            );

            if shared
                .config
                .listener_warning_threshold
                .is_some_and(|threshold| count > threshold)
            {
                tracing::warn!(
                    store = %shared.config.name,
                    listeners = count,
                    "Listener count above threshold, possible subscription leak"
                );
            }

            Unsubscribe::new(id, Rc::downgrade(&shared.listeners))
        }

        /// A handle that does not keep the store alive
        ///
        /// Listeners that dispatch into their own store capture this instead
        /// of a clone.
        #[must_use]
        pub fn downgrade(&self) -> WeakStore<R> {
            WeakStore {
                shared: Rc::downgrade(&self.shared),
            }
        }

        /// Number of registered listeners
        #[must_use]
        pub fn listener_count(&self) -> usize {
            self.shared.listeners.borrow().len()
        }

        /// The store's configuration
        #[must_use]
        pub fn config(&self) -> &StoreConfig {
            &self.shared.config
        }

        fn notify(&self, state: &R::State) {
            // No borrow is held while listeners run.
            let snapshot = self.shared.listeners.borrow().snapshot();
            tracing::trace!(listeners = snapshot.len(), "Notifying listeners");

            for (_, listener) in snapshot.iter() {
                listener(state);
            }
        }
    }

    impl<R> Clone for Store<R>
    where
        R: Reducer,
    {
        fn clone(&self) -> Self {
            Self {
                shared: Rc::clone(&self.shared),
            }
        }
    }

    impl<R> fmt::Debug for Store<R>
    where
        R: Reducer,
        R::State: fmt::Debug,
    {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("Store")
                .field("name", &self.shared.config.name)
                .field("state", &self.shared.state.borrow())
                .field("listeners", &self.shared.listeners.borrow().len())
                .finish_non_exhaustive()
        }
    }
}

pub use store::{Store, WeakStore};

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can unwrap
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Tally {
        total: i64,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Op {
        Add(i64),
        Fail,
    }

    impl ActionType for Op {
        fn action_type(&self) -> &str {
            match self {
                Op::Add(_) => "ADD",
                Op::Fail => "FAIL",
            }
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("refused")]
    struct Refused;

    struct TallyReducer;

    impl Reducer for TallyReducer {
        type State = Tally;
        type Action = Op;
        type Error = Refused;

        fn reduce(&self, state: Option<&Tally>, action: Action<'_, Op>) -> Result<Tally, Refused> {
            let state = state.cloned().unwrap_or(Tally { total: 100 });
            match action {
                Action::Dispatched(Op::Add(n)) => Ok(Tally {
                    total: state.total + n,
                }),
                Action::Dispatched(Op::Fail) => Err(Refused),
                Action::Init(_) => Ok(state),
            }
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.name, "store");
        assert_eq!(config.listener_warning_threshold, Some(64));
    }

    #[test]
    fn test_config_builder() {
        let config = StoreConfig::new("a")
            .with_name("b")
            .with_listener_warning_threshold(None);
        assert_eq!(config.name, "b");
        assert_eq!(config.listener_warning_threshold, None);
    }

    #[test]
    fn test_new_without_state_uses_reducer_default() {
        let store = Store::new(TallyReducer, None).unwrap();
        assert_eq!(store.get_state().total, 100);
    }

    #[test]
    fn test_new_with_state_keeps_it() {
        let store = Store::new(TallyReducer, Some(Tally { total: 3 })).unwrap();
        assert_eq!(store.state(|s| s.total), 3);
    }

    #[test]
    fn test_dispatch_returns_action() {
        let store = Store::new(TallyReducer, None).unwrap();
        let action = store.dispatch(Op::Add(5)).unwrap();
        assert_eq!(action, Op::Add(5));
        assert_eq!(store.get_state().total, 105);
    }

    #[test]
    fn test_failed_dispatch_keeps_state() {
        let store = Store::new(TallyReducer, None).unwrap();
        let before = store.get_state();

        let err = store.dispatch(Op::Fail).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Reducer { ref action_type, .. } if action_type == "FAIL"
        ));
        assert_eq!(err.to_string(), "Reducer failed on `FAIL`: refused");
        assert!(Rc::ptr_eq(&before, &store.get_state()));
    }

    #[test]
    fn test_failed_init_is_reported() {
        let reducer = tally_core::reducer::reducer_fn(
            |_state: Option<&Tally>, _action: Action<'_, Op>| Err::<Tally, _>(Refused),
        );
        let err = Store::new(reducer, None).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Reducer { ref action_type, .. } if action_type == INIT_ACTION_TYPE
        ));
    }

    #[test]
    fn test_clones_share_state() {
        let store = Store::new(TallyReducer, None).unwrap();
        let other = store.clone();
        other.dispatch(Op::Add(1)).unwrap();
        assert_eq!(store.get_state().total, 101);
    }

    #[test]
    fn test_debug_output() {
        let store = Store::with_config(TallyReducer, None, StoreConfig::new("debugged")).unwrap();
        let rendered = format!("{store:?}");
        assert!(rendered.contains("debugged"));
        assert!(rendered.contains("total: 100"));
    }

    #[test]
    fn test_infallible_reducer() {
        let reducer = tally_core::reducer::reducer_fn(
            |state: Option<&Tally>, _action: Action<'_, Op>| {
                Ok::<_, Infallible>(state.cloned().unwrap_or(Tally { total: 0 }))
            },
        );
        let store = Store::new(reducer, None).unwrap();
        store.dispatch(Op::Add(1)).unwrap();
        assert_eq!(store.get_state().total, 0);
    }
}
