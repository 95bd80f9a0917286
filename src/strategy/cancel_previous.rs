use std::sync::Arc;

use futures::FutureExt;

use super::registry::JobRegistry;
use super::{ExecutionMode, ExecutionStrategy, Scheduled};
use crate::context::{ExecutionContext, JobFuture, JobHandle};

/// Cancels the in-flight job for a key when a new one arrives.
///
/// Use for superseding work: search-as-you-type, incremental validation,
/// filter changes. Effects the cancelled job already applied stay applied.
pub struct CancelPreviousStrategy {
    registry: Arc<JobRegistry>,
}

impl Default for CancelPreviousStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelPreviousStrategy {
    pub fn new() -> Self {
        Self {
            registry: JobRegistry::new(),
        }
    }

    /// The job currently registered under `key`, if any.
    pub fn job(&self, key: &str) -> Option<JobHandle> {
        self.registry.get(key)
    }

    pub fn active_keys(&self) -> Vec<String> {
        self.registry.keys()
    }
}

impl ExecutionStrategy for CancelPreviousStrategy {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::CancelPrevious
    }

    fn execute(&self, context: &ExecutionContext, key: &str, block: JobFuture) -> Scheduled {
        let ticket = context.ticket();
        let handle = ticket.handle().clone();

        if let Some(previous) = self.registry.replace(key, handle.clone()) {
            if previous.is_active() {
                tracing::debug!(key = %key, job = previous.id(), "Cancelling previous job");
            }
            previous.cancel();
        }

        let release = self.registry.release_on_drop(key, handle.id());
        let job = async move {
            let _release = release;
            block.await
        };
        Scheduled::Launched(context.launch_ticket(ticket, key, job.boxed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Duration;

    fn record(results: &Arc<Mutex<Vec<i32>>>, value: i32, delay_ms: u64) -> JobFuture {
        let results = Arc::clone(results);
        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            results.lock().push(value);
            Ok(())
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_job_cancels_previous() {
        let context = ExecutionContext::current();
        let strategy = CancelPreviousStrategy::new();
        let results = Arc::new(Mutex::new(Vec::new()));

        strategy.execute(&context, "test", record(&results, 1, 100));
        tokio::time::sleep(Duration::from_millis(50)).await;
        strategy.execute(&context, "test", record(&results, 2, 100));

        context.wait_idle().await;
        assert_eq!(*results.lock(), vec![2]);
        assert!(strategy.active_keys().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_keys_do_not_cancel() {
        let context = ExecutionContext::current();
        let strategy = CancelPreviousStrategy::new();
        let results = Arc::new(Mutex::new(Vec::new()));

        strategy.execute(&context, "key1", record(&results, 1, 100));
        strategy.execute(&context, "key2", record(&results, 2, 100));

        context.wait_idle().await;
        let mut results = results.lock().clone();
        results.sort();
        assert_eq!(results, vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_job_releases_key() {
        let context = ExecutionContext::current().with_failure_handler(|_, _| {});
        let strategy = CancelPreviousStrategy::new();

        let failing: JobFuture = Box::pin(async { Err(anyhow::anyhow!("broken")) });
        strategy.execute(&context, "k", failing);
        context.wait_idle().await;
        assert!(strategy.job("k").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_tracks_running_job() {
        let context = ExecutionContext::current();
        let strategy = CancelPreviousStrategy::new();
        let results = Arc::new(Mutex::new(Vec::new()));

        let scheduled = strategy.execute(&context, "k", record(&results, 1, 100));
        let job = scheduled.job().cloned().unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(strategy.job("k").map(|j| j.id()), Some(job.id()));
        assert!(job.is_active());

        context.wait_idle().await;
        assert!(strategy.job("k").is_none());
        assert!(job.is_finished());
    }
}
