//! Keyed job registry shared by the cancel-previous and drop strategies.
//!
//! Each strategy instance owns one registry; keys never leak between
//! instances. Entries are released by a guard that travels with the job, so
//! completion, failure, panic and cancellation all clean up the same way.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::context::JobHandle;

#[derive(Default)]
pub(crate) struct JobRegistry {
    jobs: Mutex<HashMap<String, JobHandle>>,
}

/// Removes a registry entry when dropped, but only if it still belongs to
/// the job that created the guard.
pub(crate) struct Release {
    registry: Arc<JobRegistry>,
    key: String,
    id: u64,
}

impl Drop for Release {
    fn drop(&mut self) {
        self.registry.release(&self.key, self.id);
    }
}

impl JobRegistry {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `handle` under `key`, returning whatever it replaced.
    pub(crate) fn replace(&self, key: &str, handle: JobHandle) -> Option<JobHandle> {
        self.jobs.lock().insert(key.to_string(), handle)
    }

    /// Register `handle` unless an active job already holds `key`.
    pub(crate) fn insert_if_idle(&self, key: &str, handle: JobHandle) -> bool {
        let mut jobs = self.jobs.lock();
        if jobs.get(key).is_some_and(JobHandle::is_active) {
            return false;
        }
        jobs.insert(key.to_string(), handle);
        true
    }

    pub(crate) fn release(&self, key: &str, id: u64) {
        let mut jobs = self.jobs.lock();
        if jobs.get(key).is_some_and(|job| job.id() == id) {
            jobs.remove(key);
        }
    }

    pub(crate) fn release_on_drop(self: &Arc<Self>, key: &str, id: u64) -> Release {
        Release {
            registry: Arc::clone(self),
            key: key.to_string(),
            id,
        }
    }

    pub(crate) fn get(&self, key: &str) -> Option<JobHandle> {
        self.jobs.lock().get(key).cloned()
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.jobs.lock().keys().cloned().collect();
        keys.sort();
        keys
    }
}
