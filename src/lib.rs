//! Model-View-Intent state containers with keyed execution strategies.
//!
//! A [`Container`](container::Container) holds one immutable state value and
//! a broadcast of one-off events. Work reaches it as intent handlers scheduled
//! by an [`ExecutionStrategy`](strategy::ExecutionStrategy) onto a
//! caller-supplied [`ExecutionContext`](context::ExecutionContext).

pub mod config;
pub mod container;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod login;
pub mod mvi;
pub mod persist;
pub mod strategy;
