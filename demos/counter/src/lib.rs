//! # Counter
//!
//! A tally counter built on the Tally store.
//!
//! This crate showcases:
//! - A pure reducer with a default state for the "no state yet" branch
//! - Closed action enum with a JSON wire form (`{"type": "ADD"}`)
//! - Reducer failure (`i64` overflow) surfacing through `dispatch`
//!
//! ## Example
//!
//! ```
//! use counter::{CounterAction, CounterReducer};
//! use tally_runtime::Store;
//!
//! let store = Store::new(CounterReducer, None)?;
//! assert_eq!(store.get_state().count, 0);
//!
//! store.dispatch(CounterAction::Add)?;
//! store.dispatch(CounterAction::Add)?;
//! store.dispatch(CounterAction::Subtract)?;
//! assert_eq!(store.get_state().count, 1);
//!
//! store.dispatch(CounterAction::Reset)?;
//! assert_eq!(store.get_state().count, 0);
//! # Ok::<(), tally_runtime::StoreError<counter::CounterError>>(())
//! ```

use serde::{Deserialize, Serialize};
use tally_core::action::{Action, ActionType};
use tally_core::reducer::Reducer;
use thiserror::Error;

/// Counter state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterState {
    /// Current count value; may go negative
    pub count: i64,
}

/// Counter actions
///
/// Serialized as `{"type": "ADD"}`. Any other `type` decodes to
/// [`CounterAction::Unrecognized`], which the reducer ignores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CounterAction {
    /// Increment the counter by 1
    Add,
    /// Decrement the counter by 1
    Subtract,
    /// Reset the counter to 0
    Reset,
    /// An action type this reducer does not handle
    #[serde(other)]
    Unrecognized,
}

impl ActionType for CounterAction {
    fn action_type(&self) -> &str {
        match self {
            CounterAction::Add => "ADD",
            CounterAction::Subtract => "SUBTRACT",
            CounterAction::Reset => "RESET",
            CounterAction::Unrecognized => "UNRECOGNIZED",
        }
    }
}

/// Parse one action from its JSON wire form, e.g. `{"type":"ADD"}`
///
/// A well-formed object with an unknown `type` parses to
/// [`CounterAction::Unrecognized`].
///
/// # Errors
///
/// Returns the `serde_json` error for malformed JSON or a missing `type`.
pub fn parse_action(raw: &str) -> Result<CounterAction, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Counter errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CounterError {
    /// The count would leave the `i64` range
    #[error("Count {count} cannot be {action_type}ed without overflowing")]
    Overflow {
        /// Count before the action
        count: i64,
        /// The action that would overflow, in lowercase
        action_type: &'static str,
    },
}

/// Counter reducer function
///
/// With no state, starts from `CounterState { count: 0 }`.
///
/// | action | result |
/// |---|---|
/// | `Add` | `count + 1` |
/// | `Subtract` | `count - 1` |
/// | `Reset` | `count = 0` |
/// | anything else | unchanged |
///
/// # Errors
///
/// Returns [`CounterError::Overflow`] instead of wrapping at the `i64` bounds.
pub fn counter_reducer(
    state: Option<&CounterState>,
    action: Action<'_, CounterAction>,
) -> Result<CounterState, CounterError> {
    let state = state.cloned().unwrap_or_default();

    match action.dispatched() {
        Some(CounterAction::Add) => {
            let count = state.count.checked_add(1).ok_or(CounterError::Overflow {
                count: state.count,
                action_type: "add",
            })?;
            Ok(CounterState { count, ..state })
        },
        Some(CounterAction::Subtract) => {
            let count = state.count.checked_sub(1).ok_or(CounterError::Overflow {
                count: state.count,
                action_type: "subtract",
            })?;
            Ok(CounterState { count, ..state })
        },
        Some(CounterAction::Reset) => Ok(CounterState { count: 0, ..state }),
        Some(CounterAction::Unrecognized) | None => Ok(state),
    }
}

/// Counter reducer
///
/// Implements [`Reducer`] by delegating to [`counter_reducer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterReducer;

impl Reducer for CounterReducer {
    type State = CounterState;
    type Action = CounterAction;
    type Error = CounterError;

    fn reduce(
        &self,
        state: Option<&Self::State>,
        action: Action<'_, Self::Action>,
    ) -> Result<Self::State, Self::Error> {
        counter_reducer(state, action)
    }
}
