//! Hand-written routing from intents to handlers.
//!
//! A [`Router`] maps every intent variant to a handler plus its scheduling
//! options. [`RouterBuilder::build`] refuses incomplete or ambiguous tables, so
//! a missing handler is caught when the host is created rather than when the
//! intent is first dispatched.

mod host;
mod router;

pub use host::{DispatchError, HandlerScope, Host};
pub use router::{HandlerOptions, Router, RouterBuilder, RouterError};
