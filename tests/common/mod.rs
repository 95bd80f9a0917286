//! Shared test utilities.

#![allow(dead_code, unused_imports)]

use mvikit::container::{create_container, Container};
use mvikit::context::{ExecutionContext, JobFailure};
use mvikit::mvi::{SideEffect, ViewState};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Counter {
    pub count: u32,
}

impl ViewState for Counter {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterEvent {
    Reached(u32),
    Note(&'static str),
}

impl SideEffect for CounterEvent {}

pub type SharedLog<T> = Arc<Mutex<Vec<T>>>;

pub fn shared_log<T>() -> SharedLog<T> {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn counter_container() -> Container<Counter, CounterEvent> {
    create_container(Counter::default(), ExecutionContext::current(), false)
}

/// Context whose failures are collected as "key: message" lines.
pub fn recording_context() -> (ExecutionContext, SharedLog<String>) {
    let failures = shared_log();
    let sink = Arc::clone(&failures);
    let context = ExecutionContext::current().with_failure_handler(
        move |key: &str, failure: &JobFailure| {
            sink.lock().push(format!("{key}: {failure}"));
        },
    );
    (context, failures)
}

pub fn increment(state: Counter) -> Counter {
    Counter {
        count: state.count + 1,
    }
}

pub fn panicking_reducer(_: Counter) -> Counter {
    panic!("reducer exploded")
}

/// Yield to the runtime until `condition` holds, advancing paused time by
/// 1 ms per round. Panics after `rounds` attempts.
pub async fn eventually(rounds: usize, mut condition: impl FnMut() -> bool) {
    for _ in 0..rounds {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert!(condition(), "condition not reached after {rounds} rounds");
}
