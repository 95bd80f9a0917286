use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{ExecutionMode, ExecutionStrategy, Scheduled};
use crate::context::{run_guarded, ExecutionContext, JobFuture, WorkGuard};

/// Runs jobs for a key strictly one after another, in submission order.
///
/// Use for non-interruptible sequences (payment steps, ordered writes).
/// Each key gets an unbounded FIFO lane and a single consumer per execution
/// context, created on the first submission and kept until that context shuts
/// down. The consumer runs on the context that created it, so shutting one
/// context down never drops items submitted through another.
#[derive(Default)]
pub struct QueueStrategy {
    lanes: Mutex<HashMap<LaneKey, Lane>>,
}

type LaneKey = (u64, String);

struct Lane {
    sender: mpsc::UnboundedSender<QueuedJob>,
    depth: Arc<AtomicUsize>,
}

struct QueuedJob {
    block: JobFuture,
    work: WorkGuard,
}

impl Lane {
    fn start(context: &ExecutionContext, key: &str) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let depth = Arc::new(AtomicUsize::new(0));
        tracing::debug!(key = %key, "Starting queue consumer");
        context.launch_daemon(
            key,
            drain(context.clone(), key.to_string(), receiver, Arc::clone(&depth)),
        );
        Self { sender, depth }
    }
}

/// Consumer loop: a failing item aborts only itself.
async fn drain(
    context: ExecutionContext,
    key: String,
    mut receiver: mpsc::UnboundedReceiver<QueuedJob>,
    depth: Arc<AtomicUsize>,
) {
    while let Some(QueuedJob { block, work }) = receiver.recv().await {
        if let Err(failure) = run_guarded(block).await {
            context.report_failure(&key, &failure);
        }
        depth.fetch_sub(1, Ordering::SeqCst);
        drop(work);
    }
}

impl QueueStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items submitted under `key` that have not finished yet, across contexts.
    pub fn depth(&self, key: &str) -> usize {
        self.lanes
            .lock()
            .iter()
            .filter(|((_, lane_key), _)| lane_key == key)
            .map(|(_, lane)| lane.depth.load(Ordering::SeqCst))
            .sum()
    }

    /// Keys with a live consumer.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .lanes
            .lock()
            .iter()
            .filter(|(_, lane)| !lane.sender.is_closed())
            .map(|((_, key), _)| key.clone())
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

impl ExecutionStrategy for QueueStrategy {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Queue
    }

    fn execute(&self, context: &ExecutionContext, key: &str, block: JobFuture) -> Scheduled {
        let mut job = QueuedJob {
            block,
            work: context.track_work(),
        };
        let lane_key: LaneKey = (context.id(), key.to_string());
        let mut lanes = self.lanes.lock();
        lanes.retain(|_, lane| !lane.sender.is_closed());

        // A lane whose consumer is gone (context shut down) is replaced once.
        for _ in 0..2 {
            let lane = lanes
                .entry(lane_key.clone())
                .or_insert_with(|| Lane::start(context, key));
            lane.depth.fetch_add(1, Ordering::SeqCst);
            match lane.sender.send(job) {
                Ok(()) => return Scheduled::Queued,
                Err(mpsc::error::SendError(returned)) => {
                    lane.depth.fetch_sub(1, Ordering::SeqCst);
                    lanes.remove(&lane_key);
                    job = returned;
                }
            }
        }

        tracing::warn!(key = %key, "Queue consumer unavailable, dropping submission");
        Scheduled::Dropped
    }
}
