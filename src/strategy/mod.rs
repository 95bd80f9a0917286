//! Keyed execution strategies.
//!
//! A strategy decides whether and when a submitted job runs relative to other
//! jobs sharing its key:
//!
//! - [`CancelPreviousStrategy`]: the newest submission wins, older ones are cancelled
//! - [`DropStrategy`]: submissions are discarded while one is in flight
//! - [`QueueStrategy`]: submissions run one at a time, in order
//! - [`ParallelStrategy`]: submissions run independently (the default)

mod cancel_previous;
mod drop;
mod parallel;
mod queue;
mod registry;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::{ExecutionContext, JobFuture, JobHandle};

pub use cancel_previous::CancelPreviousStrategy;
pub use drop::DropStrategy;
pub use parallel::ParallelStrategy;
pub use queue::QueueStrategy;

/// Policy selector for same-key scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    CancelPrevious,
    Drop,
    Queue,
    #[default]
    Parallel,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionMode::CancelPrevious => "cancel_previous",
            ExecutionMode::Drop => "drop",
            ExecutionMode::Queue => "queue",
            ExecutionMode::Parallel => "parallel",
        };
        f.write_str(name)
    }
}

/// What a strategy did with a submission.
#[derive(Debug, Clone)]
pub enum Scheduled {
    /// The job was launched immediately.
    Launched(JobHandle),
    /// The job was appended to its key's queue.
    Queued,
    /// The job was discarded without running.
    Dropped,
}

impl Scheduled {
    pub fn job(&self) -> Option<&JobHandle> {
        match self {
            Scheduled::Launched(job) => Some(job),
            Scheduled::Queued | Scheduled::Dropped => None,
        }
    }

    pub fn is_dropped(&self) -> bool {
        matches!(self, Scheduled::Dropped)
    }
}

/// Common contract of all strategies.
///
/// Failures inside a job terminate that job only; strategies never retry.
pub trait ExecutionStrategy: Send + Sync {
    fn mode(&self) -> ExecutionMode;

    fn execute(&self, context: &ExecutionContext, key: &str, block: JobFuture) -> Scheduled;
}

/// One instance of every strategy, as owned by a container.
#[derive(Default)]
pub struct StrategySet {
    cancel_previous: CancelPreviousStrategy,
    drop: DropStrategy,
    queue: QueueStrategy,
    parallel: ParallelStrategy,
}

impl StrategySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, mode: ExecutionMode) -> &dyn ExecutionStrategy {
        match mode {
            ExecutionMode::CancelPrevious => &self.cancel_previous,
            ExecutionMode::Drop => &self.drop,
            ExecutionMode::Queue => &self.queue,
            ExecutionMode::Parallel => &self.parallel,
        }
    }

    pub fn execute(
        &self,
        mode: ExecutionMode,
        context: &ExecutionContext,
        key: &str,
        block: JobFuture,
    ) -> Scheduled {
        self.get(mode).execute(context, key, block)
    }

    pub fn cancel_previous(&self) -> &CancelPreviousStrategy {
        &self.cancel_previous
    }

    pub fn drop_strategy(&self) -> &DropStrategy {
        &self.drop
    }

    pub fn queue(&self) -> &QueueStrategy {
        &self.queue
    }

    pub fn parallel(&self) -> &ParallelStrategy {
        &self.parallel
    }
}
