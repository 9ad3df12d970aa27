//! # Tally Testing
//!
//! Testing utilities and helpers for Tally reducers and stores.
//!
//! This crate provides:
//! - [`ReducerTest`]: Given-When-Then harness for a single reducer call
//! - [`RecordingListener`]: a listener that keeps every state it is handed
//! - [`replay`]: run a reducer over a sequence of actions, as a store would
//! - proptest strategies for action sequences
//!
//! ## Example
//!
//! ```ignore
//! use tally_testing::RecordingListener;
//!
//! let store = Store::new(CounterReducer, None)?;
//! let recorder = RecordingListener::new();
//! recorder.attach(&store);
//!
//! store.dispatch(CounterAction::Add)?;
//! assert_eq!(recorder.calls(), 1);
//! ```


pub use reducer_test::ReducerTest;

/// Mock listeners
pub mod mocks {
    use std::cell::RefCell;
    use std::fmt;
    use std::rc::Rc;
    use tally_core::action::ActionType;
    use tally_core::reducer::Reducer;
    use tally_runtime::{Store, Unsubscribe};

    /// A listener that records every state it is called with
    ///
    /// Clones share the same log, so one clone can be subscribed while the
    /// test keeps another to inspect.
    ///
    /// # Example
    ///
    /// ```
    /// use tally_testing::mocks::RecordingListener;
    ///
    /// let recorder = RecordingListener::new();
    /// let listener = recorder.listener();
    /// listener(&1);
    /// listener(&2);
    /// assert_eq!(recorder.states(), vec![1, 2]);
    /// ```
    pub struct RecordingListener<S> {
        states: Rc<RefCell<Vec<S>>>,
    }

    impl<S: Clone + 'static> RecordingListener<S> {
        /// Create an empty recorder
        #[must_use]
        pub fn new() -> Self {
            Self {
                states: Rc::new(RefCell::new(Vec::new())),
            }
        }

        /// A closure to pass to `Store::subscribe`
        #[must_use]
        pub fn listener(&self) -> impl Fn(&S) + 'static {
            let states = Rc::clone(&self.states);
            move |state: &S| states.borrow_mut().push(state.clone())
        }

        /// Subscribe this recorder to a store
        pub fn attach<R>(&self, store: &Store<R>) -> Unsubscribe<S>
        where
            R: Reducer<State = S>,
            R::Action: ActionType,
            R::Error: fmt::Display,
        {
            store.subscribe(self.listener())
        }

        /// Every recorded state, in call order
        #[must_use]
        pub fn states(&self) -> Vec<S> {
            self.states.borrow().clone()
        }

        /// The most recently recorded state
        #[must_use]
        pub fn last(&self) -> Option<S> {
            self.states.borrow().last().cloned()
        }

        /// How many times the listener was called
        #[must_use]
        pub fn calls(&self) -> usize {
            self.states.borrow().len()
        }
    }

    impl<S: Clone + 'static> Default for RecordingListener<S> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<S> Clone for RecordingListener<S> {
        fn clone(&self) -> Self {
            Self {
                states: Rc::clone(&self.states),
            }
        }
    }

    impl<S: fmt::Debug> fmt::Debug for RecordingListener<S> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("RecordingListener")
                .field("states", &self.states.borrow())
                .finish()
        }
    }
}

/// Test helpers and utilities
pub mod helpers {
    use tally_core::action::Action;
    use tally_core::reducer::{Reducer, initialize};

    /// Run a reducer the way a store would, without a store
    ///
    /// Applies the init action to `initial`, then every action in order.
    ///
    /// # Errors
    ///
    /// Returns the first reducer error.
    ///
    /// # Example
    ///
    /// ```
    /// use std::convert::Infallible;
    /// use tally_core::action::Action;
    /// use tally_core::reducer::reducer_fn;
    /// use tally_testing::replay;
    ///
    /// let sum = reducer_fn(|state: Option<&i32>, action: Action<'_, i32>| {
    ///     let step = action.dispatched().copied().unwrap_or(0);
    ///     Ok::<_, Infallible>(state.copied().unwrap_or(0) + step)
    /// });
    /// assert_eq!(replay(&sum, None, [1, 2, 3]), Ok(6));
    /// ```
    pub fn replay<R, I>(
        reducer: &R,
        initial: Option<R::State>,
        actions: I,
    ) -> Result<R::State, R::Error>
    where
        R: Reducer,
        I: IntoIterator<Item = R::Action>,
    {
        let mut state = initialize(reducer, initial.as_ref())?;
        for action in actions {
            state = reducer.reduce(Some(&state), Action::Dispatched(&action))?;
        }
        Ok(state)
    }
}

/// Property-based testing utilities
///
/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::collection::vec;
    use proptest::strategy::Strategy;

    /// Sequences of up to `max_len` actions drawn from `action`
    pub fn action_sequence<S>(action: S, max_len: usize) -> impl Strategy<Value = Vec<S::Value>>
    where
        S: Strategy,
    {
        vec(action, 0..=max_len)
    }
}

// Re-export commonly used items
pub use helpers::replay;
pub use mocks::RecordingListener;
pub use properties::action_sequence;
