//! Reducer trait for MVI architecture.

use super::intent::Intent;
use super::state::ViewState;

/// Reducer transforms state based on intents.
///
/// It must be a pure function: (State, Intent) -> State. A reducer can back
/// a route directly (see `RouterBuilder::reducer`), in which case it runs
/// inside a single atomic state update.
pub trait Reducer {
    /// The state type this reducer operates on.
    type State: ViewState;

    /// The intent type this reducer handles.
    type Intent: Intent;

    /// Process an intent and return the new state.
    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State;
}
