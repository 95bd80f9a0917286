use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::FutureExt;

use super::{ExecutionMode, ExecutionStrategy, Scheduled};
use crate::context::{ExecutionContext, JobFuture};

/// Launches every job immediately, independent of any other job.
///
/// The default when no policy is requested. Only a running count is kept.
#[derive(Default)]
pub struct ParallelStrategy {
    running: Arc<AtomicUsize>,
}

impl ParallelStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }
}

impl ExecutionStrategy for ParallelStrategy {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Parallel
    }

    fn execute(&self, context: &ExecutionContext, key: &str, block: JobFuture) -> Scheduled {
        self.running.fetch_add(1, Ordering::SeqCst);
        let running = scopeguard::guard(Arc::clone(&self.running), |running| {
            running.fetch_sub(1, Ordering::SeqCst);
        });
        let job = async move {
            let _running = running;
            block.await
        };
        Scheduled::Launched(context.launch(key, job.boxed()))
    }
}
