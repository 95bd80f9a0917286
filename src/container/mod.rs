//! The state container: current state, one-off events and the scopes that
//! mutate them.
//!
//! Outside code only gets the narrow [`Container`] facade. The underlying
//! state holder and event bus are crate-private; the only way to change state
//! or emit an event is through an [`IntentScope`] handed to a scheduled job.

mod events;
mod observer;
mod scope;
mod state;

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::FutureExt;

use crate::config::RuntimeConfig;
use crate::context::ExecutionContext;
use crate::error::ContainerError;
use crate::mvi::{SideEffect, ViewState};
use crate::persist::{PersistError, StateStore};
use crate::strategy::{ExecutionMode, Scheduled, StrategySet};

use events::EventBus;
use state::StateContainer;

pub use events::{EventStream, DEFAULT_EVENT_CAPACITY};
pub use observer::{StateObserver, TracingObserver};
pub use scope::IntentScope;
pub use state::StateStream;

/// Key used by [`Container::intent`].
const DEFAULT_INTENT_KEY: &str = "intent";

/// Observable state plus event broadcast, bound to one execution context.
///
/// Cheap to clone; clones share everything.
pub struct Container<S: ViewState, E: SideEffect> {
    state: Arc<StateContainer<S>>,
    events: Arc<EventBus<E>>,
    strategies: Arc<StrategySet>,
    context: ExecutionContext,
}

impl<S: ViewState, E: SideEffect> Clone for Container<S, E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            events: Arc::clone(&self.events),
            strategies: Arc::clone(&self.strategies),
            context: self.context.clone(),
        }
    }
}

/// Build a container without persistence.
pub fn create_container<S, E>(initial: S, context: ExecutionContext, debug: bool) -> Container<S, E>
where
    S: ViewState,
    E: SideEffect,
{
    let observer = debug.then(|| Arc::new(TracingObserver) as Arc<dyn StateObserver<S>>);
    Container::assemble(initial, context, DEFAULT_EVENT_CAPACITY, observer)
}

impl<S: ViewState, E: SideEffect> Container<S, E> {
    pub fn builder(initial: S, context: ExecutionContext) -> ContainerBuilder<S, E> {
        ContainerBuilder::new(initial, context)
    }

    fn assemble(
        initial: S,
        context: ExecutionContext,
        event_capacity: usize,
        observer: Option<Arc<dyn StateObserver<S>>>,
    ) -> Self {
        Self {
            state: Arc::new(StateContainer::new(initial, observer)),
            events: Arc::new(EventBus::new(event_capacity)),
            strategies: Arc::new(StrategySet::new()),
            context,
        }
    }

    pub fn current_state(&self) -> S {
        self.state.current()
    }

    /// Current value first, then every distinct change.
    pub fn observe_state(&self) -> StateStream<S> {
        self.state.observe()
    }

    /// Events emitted from now on. Nothing emitted earlier is replayed.
    pub fn observe_events(&self) -> EventStream<E> {
        self.events.subscribe()
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// The strategy instances owned by this container.
    pub fn strategies(&self) -> &StrategySet {
        &self.strategies
    }

    /// A fresh scope bound to this container.
    pub(crate) fn scope(&self) -> IntentScope<S, E> {
        IntentScope::new(Arc::clone(&self.state), Arc::clone(&self.events))
    }

    /// Fire-and-forget dispatch with parallel scheduling.
    pub fn intent<F, Fut>(&self, block: F) -> Scheduled
    where
        F: FnOnce(IntentScope<S, E>) -> Fut,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.intent_with(ExecutionMode::Parallel, DEFAULT_INTENT_KEY, block)
    }

    /// Dispatch under `key` with the given strategy.
    pub fn intent_with<F, Fut>(&self, mode: ExecutionMode, key: &str, block: F) -> Scheduled
    where
        F: FnOnce(IntentScope<S, E>) -> Fut,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let job = block(self.scope()).boxed();
        self.strategies.execute(mode, &self.context, key, job)
    }
}

/// Step-by-step container construction.
///
/// ```no_run
/// # use mvikit::container::ContainerBuilder;
/// # use mvikit::context::ExecutionContext;
/// # use mvikit::mvi::{SideEffect, ViewState};
/// # use mvikit::persist::MemoryStore;
/// # #[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
/// # struct Counter { count: u32 }
/// # impl ViewState for Counter {}
/// # #[derive(Debug, Clone)]
/// # struct Tick;
/// # impl SideEffect for Tick {}
/// # fn demo() -> Result<(), mvikit::error::ContainerError> {
/// let context = ExecutionContext::current();
/// let container = ContainerBuilder::<Counter, Tick>::new(Counter::default(), context)
///     .debug(true)
///     .persist_with(MemoryStore::new())
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ContainerBuilder<S: ViewState, E: SideEffect> {
    initial: S,
    context: ExecutionContext,
    debug: bool,
    event_capacity: usize,
    observer: Option<Arc<dyn StateObserver<S>>>,
    store: Option<Arc<dyn StateStore<S>>>,
    _events: PhantomData<fn() -> E>,
}

impl<S: ViewState, E: SideEffect> ContainerBuilder<S, E> {
    pub fn new(initial: S, context: ExecutionContext) -> Self {
        Self {
            initial,
            context,
            debug: false,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            observer: None,
            store: None,
            _events: PhantomData,
        }
    }

    /// Report every reduce to the observer ([`TracingObserver`] unless
    /// another one is set).
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Use a custom observer. Turns debug on.
    pub fn observer(mut self, observer: impl StateObserver<S> + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self.debug = true;
        self
    }

    /// Take capacity and debug from the runtime config.
    pub fn with_config(self, config: &RuntimeConfig) -> Self {
        self.event_capacity(config.event_capacity).debug(config.debug)
    }

    /// Restore the initial state from `store` and save every distinct state
    /// back to it.
    pub fn persist_with(mut self, store: impl StateStore<S> + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Fails when the configuration is unusable or the stored snapshot
    /// cannot be restored. Nothing is launched in that case.
    pub fn build(self) -> Result<Container<S, E>, ContainerError> {
        if self.event_capacity == 0 {
            return Err(ContainerError::Configuration {
                message: "event capacity must be at least 1".to_string(),
            });
        }

        let initial = match &self.store {
            Some(store) => restore(store.as_ref(), self.initial)?,
            None => self.initial,
        };

        let observer = if self.debug {
            Some(
                self.observer
                    .unwrap_or_else(|| Arc::new(TracingObserver) as Arc<dyn StateObserver<S>>),
            )
        } else {
            None
        };

        let container = Container::assemble(initial, self.context, self.event_capacity, observer);
        if let Some(store) = self.store {
            spawn_writer(&container, store);
        }
        Ok(container)
    }
}

fn restore<S: ViewState>(store: &dyn StateStore<S>, fallback: S) -> Result<S, ContainerError> {
    match store.load() {
        Ok(Some(restored)) => {
            tracing::debug!("Restored state from store");
            Ok(restored)
        }
        Ok(None) => Ok(fallback),
        Err(PersistError::Decode(source)) => Err(ContainerError::Configuration {
            message: format!("stored state cannot be restored: {}", source),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Save every distinct state until the context shuts down.
fn spawn_writer<S, E>(container: &Container<S, E>, store: Arc<dyn StateStore<S>>)
where
    S: ViewState,
    E: SideEffect,
{
    let mut states = container.observe_state();
    container.context.launch_daemon("persist", async move {
        while let Some(state) = states.next().await {
            if let Err(e) = store.save(&state) {
                tracing::warn!(error = %e, "Failed to persist state");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;
    use parking_lot::Mutex;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    struct Counter {
        count: u32,
    }

    impl ViewState for Counter {}

    #[derive(Debug, Clone, PartialEq)]
    enum Note {
        Bumped(u32),
    }

    impl SideEffect for Note {}

    #[tokio::test]
    async fn test_intent_updates_state_and_emits() {
        let container: Container<Counter, Note> =
            create_container(Counter::default(), ExecutionContext::current(), false);
        let mut events = container.observe_events();

        container.intent(|scope| async move {
            scope.reduce(|s| Counter { count: s.count + 1 });
            scope.post_event(Note::Bumped(scope.state().count));
            Ok(())
        });

        container.context().wait_idle().await;
        assert_eq!(container.current_state().count, 1);
        assert_eq!(events.next().await, Some(Note::Bumped(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_intent_with_uses_container_strategies() {
        let container: Container<Counter, Note> =
            create_container(Counter::default(), ExecutionContext::current(), false);

        for _ in 0..2 {
            container.intent_with(ExecutionMode::Drop, "bump", |scope| async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                scope.reduce(|s| Counter { count: s.count + 1 });
                Ok(())
            });
        }

        container.context().wait_idle().await;
        assert_eq!(container.current_state().count, 1);
        assert!(!container.strategies().drop_strategy().is_active("bump"));
    }

    #[tokio::test]
    async fn test_observer_enables_debug() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let context = ExecutionContext::current();
        let container = ContainerBuilder::<Counter, Note>::new(Counter::default(), context)
            .observer(move |old: &Counter, new: &Counter| sink.lock().push((old.count, new.count)))
            .build()
            .unwrap();

        container.intent(|scope| async move {
            scope.reduce(|_| Counter { count: 5 });
            Ok(())
        });
        container.context().wait_idle().await;

        assert_eq!(*seen.lock(), vec![(0, 5)]);
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let context = ExecutionContext::new(runtime.handle().clone());
        let result = ContainerBuilder::<Counter, Note>::new(Counter::default(), context)
            .event_capacity(0)
            .build();
        assert!(matches!(result, Err(ContainerError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_undecodable_snapshot_is_configuration_error() {
        let store = MemoryStore::new();
        store.put_raw(serde_json::json!("not a counter"));

        let context = ExecutionContext::current();
        let result = ContainerBuilder::<Counter, Note>::new(Counter::default(), context)
            .persist_with(store)
            .build();
        assert!(matches!(result, Err(ContainerError::Configuration { .. })));
    }
}
