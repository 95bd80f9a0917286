use std::sync::Arc;

use futures::FutureExt;

use super::registry::JobRegistry;
use super::{ExecutionMode, ExecutionStrategy, Scheduled};
use crate::context::{ExecutionContext, JobFuture};

/// Silently discards new jobs for a key while one is still in flight.
///
/// Use for duplicate-submission guards (double clicks on a submit button).
pub struct DropStrategy {
    registry: Arc<JobRegistry>,
}

impl Default for DropStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl DropStrategy {
    pub fn new() -> Self {
        Self {
            registry: JobRegistry::new(),
        }
    }

    /// Whether a job currently holds `key`.
    pub fn is_active(&self, key: &str) -> bool {
        self.registry.get(key).is_some_and(|job| job.is_active())
    }

    pub fn active_keys(&self) -> Vec<String> {
        self.registry.keys()
    }
}

impl ExecutionStrategy for DropStrategy {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Drop
    }

    fn execute(&self, context: &ExecutionContext, key: &str, block: JobFuture) -> Scheduled {
        let ticket = context.ticket();
        let handle = ticket.handle().clone();

        if !self.registry.insert_if_idle(key, handle.clone()) {
            tracing::debug!(key = %key, "Job in flight, dropping submission");
            return Scheduled::Dropped;
        }

        let release = self.registry.release_on_drop(key, handle.id());
        let job = async move {
            let _release = release;
            block.await
        };
        Scheduled::Launched(context.launch_ticket(ticket, key, job.boxed()))
    }
}
