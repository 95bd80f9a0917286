use std::sync::Arc;

use super::events::EventBus;
use super::state::StateContainer;
use crate::mvi::{SideEffect, ViewState};

/// What a handler sees while it runs.
///
/// A fresh scope is built for every handler invocation. Each call goes
/// straight to the container: `reduce` and `post_event` are not batched, and
/// [`state`](Self::state) always reads the latest value, including updates
/// made by other jobs.
pub struct IntentScope<S: ViewState, E: SideEffect> {
    state: Arc<StateContainer<S>>,
    events: Arc<EventBus<E>>,
}

impl<S: ViewState, E: SideEffect> IntentScope<S, E> {
    pub(crate) fn new(state: Arc<StateContainer<S>>, events: Arc<EventBus<E>>) -> Self {
        Self { state, events }
    }

    pub fn state(&self) -> S {
        self.state.current()
    }

    /// Atomically replace the state with `reducer(current)`.
    ///
    /// A panicking reducer leaves the state unchanged and unwinds into the
    /// running job.
    pub fn reduce<F>(&self, reducer: F)
    where
        F: FnOnce(S) -> S,
    {
        self.state.update(reducer);
    }

    /// Fallible variant of [`reduce`](Self::reduce). On `Err` nothing is
    /// applied and the error is handed back.
    pub fn try_reduce<F, Err>(&self, reducer: F) -> Result<(), Err>
    where
        F: FnOnce(S) -> Result<S, Err>,
    {
        self.state.try_update(reducer)?;
        Ok(())
    }

    pub fn post_event(&self, event: E) {
        self.events.emit(event);
    }
}

impl<S: ViewState, E: SideEffect> Clone for IntentScope<S, E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            events: Arc::clone(&self.events),
        }
    }
}
