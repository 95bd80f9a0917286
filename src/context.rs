//! Caller-supplied execution surface for intent jobs.
//!
//! The core never creates its own runtime. An [`ExecutionContext`] wraps a
//! tokio runtime handle supplied by the host, tracks every task launched
//! through it, and cancels them all when the host's lifecycle ends.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::{AbortHandle, AbortRegistration, Abortable, BoxFuture};
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::Notify;

/// A unit of work scheduled by a strategy: one handler invocation.
pub type JobFuture = BoxFuture<'static, anyhow::Result<()>>;

/// Callback invoked for every job that ends with an error or a panic.
pub type FailureHandler = Arc<dyn Fn(&str, &JobFailure) + Send + Sync>;

/// Why a job terminated abnormally.
#[derive(Debug)]
pub enum JobFailure {
    /// The handler returned an error.
    Failed(anyhow::Error),
    /// The handler (or a reducer it called) panicked.
    Panicked(String),
}

impl std::fmt::Display for JobFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobFailure::Failed(error) => write!(f, "{:#}", error),
            JobFailure::Panicked(message) => write!(f, "panicked: {}", message),
        }
    }
}

/// Handle to one launched job.
///
/// Cancellation is cooperative: the job stops at its next suspension point.
/// Work already performed by the job is not rolled back.
#[derive(Debug, Clone)]
pub struct JobHandle {
    id: u64,
    abort: AbortHandle,
    finished: Arc<AtomicBool>,
}

impl JobHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.abort.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.abort.is_aborted()
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Launched, not yet finished and not cancelled.
    pub fn is_active(&self) -> bool {
        !self.is_cancelled() && !self.is_finished()
    }
}

/// A job identity reserved before the job is launched.
///
/// Strategies register the handle in their registry first and launch second,
/// so a concurrent submission under the same key always sees the entry.
pub struct JobTicket {
    handle: JobHandle,
    registration: AbortRegistration,
}

impl JobTicket {
    pub fn handle(&self) -> &JobHandle {
        &self.handle
    }
}

/// Counts queued work toward [`ExecutionContext::wait_idle`] until dropped.
pub struct WorkGuard {
    inner: Arc<ContextInner>,
}

impl Drop for WorkGuard {
    fn drop(&mut self) {
        self.inner.work_done();
    }
}

/// Execution surface supporting task launch and cooperative cancellation.
#[derive(Clone)]
pub struct ExecutionContext {
    inner: Arc<ContextInner>,
}

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

struct ContextInner {
    id: u64,
    handle: Handle,
    tasks: Mutex<HashMap<u64, AbortHandle>>,
    next_id: AtomicU64,
    pending: AtomicUsize,
    idle: Notify,
    closed: AtomicBool,
    on_failure: FailureHandler,
}

impl ContextInner {
    fn work_done(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    fn release(&self, id: u64) {
        self.tasks.lock().remove(&id);
    }

    fn report(&self, key: &str, failure: &JobFailure) {
        (self.on_failure)(key, failure);
    }
}

impl ExecutionContext {
    /// Create a context launching onto the given runtime.
    pub fn new(handle: Handle) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
                handle,
                tasks: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                pending: AtomicUsize::new(0),
                idle: Notify::new(),
                closed: AtomicBool::new(false),
                on_failure: Arc::new(log_failure),
            }),
        }
    }

    /// Create a context on the runtime the caller is running in.
    ///
    /// Panics when called outside a tokio runtime, like `Handle::current`.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Replace the failure policy. Must be called before the context is cloned.
    pub fn with_failure_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str, &JobFailure) + Send + Sync + 'static,
    {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.on_failure = Arc::new(handler);
        } else {
            tracing::warn!("Failure handler ignored: execution context already shared");
        }
        self
    }

    /// Reserve a job identity without launching anything yet.
    pub fn ticket(&self) -> JobTicket {
        let (abort, registration) = AbortHandle::new_pair();
        JobTicket {
            handle: JobHandle {
                id: self.inner.next_id.fetch_add(1, Ordering::SeqCst),
                abort,
                finished: Arc::new(AtomicBool::new(false)),
            },
            registration,
        }
    }

    /// Launch a job under `key`.
    pub fn launch(&self, key: &str, job: JobFuture) -> JobHandle {
        let ticket = self.ticket();
        self.launch_ticket(ticket, key, job)
    }

    /// Launch a job with a previously reserved identity.
    ///
    /// Errors and panics are reported to the failure handler; nothing is retried.
    /// After [`shutdown`](Self::shutdown) the job is dropped without running.
    pub fn launch_ticket(&self, ticket: JobTicket, key: &str, job: JobFuture) -> JobHandle {
        let JobTicket {
            handle,
            registration,
        } = ticket;

        // The closed check and the registration share the tasks lock, so a
        // concurrent shutdown either sees this job in the map or rejects it.
        {
            let mut tasks = self.inner.tasks.lock();
            if self.is_shut_down() {
                drop(tasks);
                tracing::warn!(
                    key = %key,
                    job = handle.id,
                    "Execution context shut down, job rejected"
                );
                handle.abort.abort();
                handle.finished.store(true, Ordering::SeqCst);
                return handle;
            }
            self.inner.pending.fetch_add(1, Ordering::SeqCst);
            tasks.insert(handle.id, handle.abort.clone());
        }

        let id = handle.id;
        let key = key.to_string();
        let inner = Arc::clone(&self.inner);
        let finished = Arc::clone(&handle.finished);
        let cleanup = scopeguard::guard(Arc::clone(&self.inner), move |inner| {
            finished.store(true, Ordering::SeqCst);
            inner.release(id);
            inner.work_done();
        });
        let task = Abortable::new(run_guarded(job), registration);

        self.inner.handle.spawn(async move {
            let _cleanup = cleanup;
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(failure)) => inner.report(&key, &failure),
                Err(_aborted) => tracing::debug!(key = %key, job = id, "Job cancelled"),
            }
        });

        handle
    }

    /// Launch a long-lived task that is cancelled on shutdown but does not
    /// count as pending work.
    pub fn launch_daemon<F>(&self, name: &str, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let JobTicket {
            handle,
            registration,
        } = self.ticket();
        {
            let mut tasks = self.inner.tasks.lock();
            if self.is_shut_down() {
                drop(tasks);
                tracing::warn!(daemon = %name, "Execution context shut down, daemon rejected");
                return;
            }
            tasks.insert(handle.id, handle.abort.clone());
        }

        let id = handle.id;
        let cleanup = scopeguard::guard(Arc::clone(&self.inner), move |inner| inner.release(id));
        let task = Abortable::new(future, registration);
        self.inner.handle.spawn(async move {
            let _cleanup = cleanup;
            let _ = task.await;
        });
    }

    /// Count work that is queued but not launched as its own job.
    pub fn track_work(&self) -> WorkGuard {
        self.inner.pending.fetch_add(1, Ordering::SeqCst);
        WorkGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Report a failure through this context's policy.
    pub(crate) fn report_failure(&self, key: &str, failure: &JobFailure) {
        self.inner.report(key, failure);
    }

    /// Process-unique identity, shared by clones.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Jobs and queued items not yet finished.
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::SeqCst)
    }

    /// Wait until no job or queued item is pending.
    pub async fn wait_idle(&self) {
        loop {
            // Register before checking the counter so a concurrent
            // notify_waiters() between the check and the await is not lost.
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// End of the host lifecycle: cancel every tracked task and reject new ones.
    pub fn shutdown(&self) {
        let tasks: Vec<AbortHandle> = {
            let mut tasks = self.inner.tasks.lock();
            if self.inner.closed.swap(true, Ordering::SeqCst) {
                return;
            }
            tasks.drain().map(|(_, abort)| abort).collect()
        };
        tracing::debug!(cancelled = tasks.len(), "Execution context shutting down");
        for abort in tasks {
            abort.abort();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

/// Run a job, converting errors and panics into [`JobFailure`].
pub(crate) async fn run_guarded(job: JobFuture) -> Result<(), JobFailure> {
    match AssertUnwindSafe(job).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(JobFailure::Failed(error)),
        Err(panic) => Err(JobFailure::Panicked(panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn log_failure(key: &str, failure: &JobFailure) {
    tracing::error!(key = %key, error = %failure, "Intent job failed");
}
