use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use thiserror::Error;

use super::host::HandlerScope;
use crate::context::JobFuture;
use crate::mvi::{Intent, Reducer, SideEffect, ViewState};
use crate::strategy::ExecutionMode;

type HandlerFn<S, I, E> = Arc<dyn Fn(I, HandlerScope<S, I, E>) -> JobFuture + Send + Sync>;

/// Errors detected while validating a routing table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouterError {
    #[error("No handler registered for intent '{name}'")]
    MissingHandler { name: String },

    #[error("Intent '{name}' has more than one handler")]
    DuplicateHandler { name: String },

    #[error("Handler registered for unknown intent '{name}'")]
    UnknownIntent { name: String },
}

/// How a route is scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerOptions {
    /// Strategy for same-key submissions (default: parallel).
    pub mode: ExecutionMode,
    /// Scheduling key (default: the intent variant name).
    pub key: Option<String>,
    /// Log receipt and completion of every dispatch (default: true).
    pub debug: bool,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Parallel,
            key: None,
            debug: true,
        }
    }
}

impl HandlerOptions {
    pub fn new(mode: ExecutionMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

pub(crate) struct Route<S: ViewState, I: Intent, E: SideEffect> {
    pub mode: ExecutionMode,
    pub key: String,
    pub debug: bool,
    pub handler: HandlerFn<S, I, E>,
}

/// Validated table from intent variant name to route.
pub struct Router<S: ViewState, I: Intent, E: SideEffect> {
    routes: HashMap<&'static str, Route<S, I, E>>,
}

impl<S: ViewState, I: Intent, E: SideEffect> Router<S, I, E> {
    pub fn builder() -> RouterBuilder<S, I, E> {
        RouterBuilder::new()
    }

    pub(crate) fn route(&self, name: &str) -> Option<&Route<S, I, E>> {
        self.routes.get(name)
    }

    pub fn mode_of(&self, name: &str) -> Option<ExecutionMode> {
        self.route(name).map(|route| route.mode)
    }

    pub fn key_of(&self, name: &str) -> Option<&str> {
        self.route(name).map(|route| route.key.as_str())
    }

    /// Registered variant names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.routes.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

struct Registration<S: ViewState, I: Intent, E: SideEffect> {
    name: String,
    options: HandlerOptions,
    handler: HandlerFn<S, I, E>,
}

/// Collects handler registrations; [`build`](Self::build) checks them against
/// `I::VARIANTS`.
pub struct RouterBuilder<S: ViewState, I: Intent, E: SideEffect> {
    registrations: Vec<Registration<S, I, E>>,
}

impl<S: ViewState, I: Intent, E: SideEffect> Default for RouterBuilder<S, I, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ViewState, I: Intent, E: SideEffect> RouterBuilder<S, I, E> {
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
        }
    }

    /// Route `name` to an async handler.
    pub fn on<F, Fut>(mut self, name: &str, options: HandlerOptions, handler: F) -> Self
    where
        F: Fn(I, HandlerScope<S, I, E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.registrations.push(Registration {
            name: name.to_string(),
            options,
            handler: Arc::new(move |intent: I, scope: HandlerScope<S, I, E>| {
                handler(intent, scope).boxed()
            }),
        });
        self
    }

    /// Route `name` to a pure reducer, applied as one atomic update.
    pub fn reducer<R>(self, name: &str, options: HandlerOptions) -> Self
    where
        R: Reducer<State = S, Intent = I> + 'static,
    {
        self.on(name, options, |intent: I, scope: HandlerScope<S, I, E>| async move {
            scope.reduce(move |state| R::reduce(state, intent));
            Ok(())
        })
    }

    pub fn build(self) -> Result<Router<S, I, E>, RouterError> {
        let mut routes = HashMap::new();

        for Registration {
            name,
            options,
            handler,
        } in self.registrations
        {
            let Some(kind) = I::VARIANTS.iter().find(|kind| kind.name == name) else {
                return Err(RouterError::UnknownIntent { name });
            };
            if routes.contains_key(kind.name) {
                return Err(RouterError::DuplicateHandler { name });
            }
            routes.insert(
                kind.name,
                Route {
                    mode: options.mode,
                    key: options.key.unwrap_or(name),
                    debug: options.debug,
                    handler,
                },
            );
        }

        if let Some(missing) = I::VARIANTS.iter().find(|kind| !routes.contains_key(kind.name)) {
            return Err(RouterError::MissingHandler {
                name: missing.name.to_string(),
            });
        }

        Ok(Router { routes })
    }
}
