//! The action envelope a reducer receives.
//!
//! Application code defines its own closed action enum (for example
//! `CounterAction`). The store wraps every dispatched value in
//! [`Action::Dispatched`], and dispatches [`Action::Init`] exactly once at
//! construction. `Init` has no public constructor, so application code can
//! match on it but never forge it.

use std::fmt;

/// Type tag reported for the reserved initialization action.
pub const INIT_ACTION_TYPE: &str = "@@INIT";

/// Exposes an action's `type` discriminator.
///
/// Used for logging and error context; reducers match on the enum itself.
pub trait ActionType {
    /// The action's type tag, e.g. `"ADD"`
    fn action_type(&self) -> &str;
}

/// Marker carried by the reserved initialization action.
///
/// Only this crate can build one; see [`crate::reducer::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Init {
    _reserved: (),
}

impl Init {
    pub(crate) const fn reserved() -> Self {
        Self { _reserved: () }
    }
}

/// An action as seen by a reducer.
///
/// A closed sum of the reserved initialization action and a borrowed
/// application action.
pub enum Action<'a, A> {
    /// Dispatched once by the store at construction
    Init(Init),
    /// An application action passed to `dispatch`
    Dispatched(&'a A),
}

impl<'a, A> Action<'a, A> {
    /// The application action, or `None` for the init action
    #[must_use]
    pub fn dispatched(self) -> Option<&'a A> {
        match self {
            Action::Dispatched(action) => Some(action),
            Action::Init(_) => None,
        }
    }

    /// Whether this is the reserved initialization action
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self, Action::Init(_))
    }

    /// Translate the application action into another action type.
    ///
    /// The init action translates to itself. Returns `None` when `f` does not
    /// recognize the application action.
    pub fn filter_map<B, F>(self, f: F) -> Option<Action<'a, B>>
    where
        F: FnOnce(&'a A) -> Option<&'a B>,
    {
        match self {
            Action::Init(init) => Some(Action::Init(init)),
            Action::Dispatched(action) => f(action).map(Action::Dispatched),
        }
    }
}

impl<A: ActionType> Action<'_, A> {
    /// The type tag of the wrapped action, or [`INIT_ACTION_TYPE`]
    #[must_use]
    pub fn action_type(&self) -> &str {
        match self {
            Action::Init(_) => INIT_ACTION_TYPE,
            Action::Dispatched(action) => action.action_type(),
        }
    }
}

impl<'a, A> From<&'a A> for Action<'a, A> {
    fn from(action: &'a A) -> Self {
        Action::Dispatched(action)
    }
}

// Manual impls: the envelope only borrows `A`, so it is `Copy` for any `A`.
impl<A> Clone for Action<'_, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for Action<'_, A> {}

impl<A: fmt::Debug> fmt::Debug for Action<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Init(_) => write!(f, "Action::Init"),
            Action::Dispatched(action) => {
                f.debug_tuple("Action::Dispatched").field(action).finish()
            },
        }
    }
}

impl<A: PartialEq> PartialEq for Action<'_, A> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Action::Init(_), Action::Init(_)) => true,
            (Action::Dispatched(a), Action::Dispatched(b)) => a == b,
            _ => false,
        }
    }
}
