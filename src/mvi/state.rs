//! Base trait for view state in MVI architecture.

use std::fmt::Debug;

/// Marker trait for state objects held by a container.
///
/// States should be:
/// - Immutable (Clone to create new states)
/// - Self-contained (all data needed to render the view)
/// - Comparable (PartialEq drives de-duplication of observed values)
/// - Printable (Debug feeds the reduce diagnostics)
pub trait ViewState: Clone + PartialEq + Debug + Send + Sync + 'static {}
