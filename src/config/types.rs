use serde::{Deserialize, Serialize};

use crate::container::DEFAULT_EVENT_CAPACITY;
use crate::persist::DEFAULT_STATE_KEY;
use crate::strategy::ExecutionMode;

/// Runtime settings shared by every container of the process.
///
/// Every field is optional in the file; missing fields take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Per-subscriber event buffer (default: 64).
    pub event_capacity: usize,
    /// Record every reduce through the state observer (default: false).
    pub debug: bool,
    /// Snapshot key used by `MemoryStore` (default: "mvi_state").
    pub state_key: String,
    /// Strategy for routes that do not choose one (default: parallel).
    pub default_mode: ExecutionMode,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_capacity: DEFAULT_EVENT_CAPACITY,
            debug: false,
            state_key: DEFAULT_STATE_KEY.to_string(),
            default_mode: ExecutionMode::default(),
        }
    }
}
