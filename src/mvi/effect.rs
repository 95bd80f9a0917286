//! Base trait for one-off events (side effects).

use std::fmt::Debug;

/// Marker trait for events posted from intent handlers.
///
/// Events are not part of state: they are never de-duplicated and are only
/// delivered to subscribers that are observing at the time of emission.
pub trait SideEffect: Clone + Debug + Send + Sync + 'static {}
