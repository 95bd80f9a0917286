use std::ops::Deref;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use thiserror::Error;

use super::router::Router;
use crate::container::{Container, EventStream, IntentScope, StateStream};
use crate::context::{ExecutionContext, JobFuture};
use crate::mvi::{Intent, IntentOrigin, SideEffect, ViewState};
use crate::strategy::Scheduled;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Intent '{name}' is internal and cannot be dispatched from the view layer")]
    InternalIntent { name: &'static str },

    #[error("No handler registered for intent '{name}'")]
    Unrouted { name: &'static str },
}

/// A container together with its routing table: the component the view
/// layer talks to.
pub struct Host<S: ViewState, I: Intent, E: SideEffect> {
    inner: Arc<HostInner<S, I, E>>,
}

struct HostInner<S: ViewState, I: Intent, E: SideEffect> {
    container: Container<S, E>,
    router: Router<S, I, E>,
}

impl<S: ViewState, I: Intent, E: SideEffect> Clone for Host<S, I, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: ViewState, I: Intent, E: SideEffect> Host<S, I, E> {
    pub fn new(container: Container<S, E>, router: Router<S, I, E>) -> Self {
        Self {
            inner: Arc::new(HostInner { container, router }),
        }
    }

    /// Entry point for view actions. Internal intents are refused.
    pub fn dispatch(&self, intent: I) -> Result<Scheduled, DispatchError> {
        if intent.origin() == IntentOrigin::Internal {
            return Err(DispatchError::InternalIntent {
                name: intent.name(),
            });
        }
        self.schedule(intent)
    }

    fn schedule(&self, intent: I) -> Result<Scheduled, DispatchError> {
        let name = intent.name();
        let route = self
            .inner
            .router
            .route(name)
            .ok_or(DispatchError::Unrouted { name })?;

        let scope = HandlerScope {
            scope: self.inner.container.scope(),
            host: self.clone(),
        };
        let mut job = (route.handler)(intent, scope);
        if route.debug {
            tracing::debug!(intent = name, key = %route.key, mode = %route.mode, "Intent received");
            job = timed(name, job).boxed();
        }

        let container = &self.inner.container;
        Ok(container
            .strategies()
            .execute(route.mode, container.context(), &route.key, job))
    }

    pub fn state(&self) -> S {
        self.inner.container.current_state()
    }

    pub fn observe_state(&self) -> StateStream<S> {
        self.inner.container.observe_state()
    }

    pub fn observe_events(&self) -> EventStream<E> {
        self.inner.container.observe_events()
    }

    pub fn router(&self) -> &Router<S, I, E> {
        &self.inner.router
    }

    pub fn context(&self) -> &ExecutionContext {
        self.inner.container.context()
    }

    /// End of the host lifecycle: cancels every pending job.
    pub fn shutdown(&self) {
        self.context().shutdown();
    }
}

async fn timed(name: &'static str, job: JobFuture) -> anyhow::Result<()> {
    let started = Instant::now();
    let result = job.await;
    tracing::debug!(
        intent = name,
        elapsed_ms = started.elapsed().as_millis() as u64,
        ok = result.is_ok(),
        "Intent completed"
    );
    result
}

/// The scope handed to a routed handler.
///
/// Derefs to [`IntentScope`] for `state`/`reduce`/`post_event` and can chain
/// into follow-up intents, internal ones included.
pub struct HandlerScope<S: ViewState, I: Intent, E: SideEffect> {
    scope: IntentScope<S, E>,
    host: Host<S, I, E>,
}

impl<S: ViewState, I: Intent, E: SideEffect> HandlerScope<S, I, E> {
    pub fn dispatch(&self, intent: I) -> Result<Scheduled, DispatchError> {
        self.host.schedule(intent)
    }
}

impl<S: ViewState, I: Intent, E: SideEffect> Deref for HandlerScope<S, I, E> {
    type Target = IntentScope<S, E>;

    fn deref(&self) -> &Self::Target {
        &self.scope
    }
}
