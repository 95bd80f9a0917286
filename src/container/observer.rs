//! Diagnostic side channel for state transitions.

use crate::mvi::ViewState;

/// Receives every transition applied through an [`IntentScope`](super::IntentScope)
/// of a container built with debug enabled.
///
/// Closures `Fn(&S, &S)` are observers.
pub trait StateObserver<S>: Send + Sync {
    fn on_transition(&self, old: &S, new: &S);
}

impl<S, F> StateObserver<S> for F
where
    F: Fn(&S, &S) + Send + Sync,
{
    fn on_transition(&self, old: &S, new: &S) {
        self(old, new)
    }
}

/// Default observer: one `info` record per transition.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl<S: ViewState> StateObserver<S> for TracingObserver {
    fn on_transition(&self, old: &S, new: &S) {
        tracing::info!("[{}] State changed: {:?} -> {:?}", short_type_name::<S>(), old, new);
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
