//! Model-View-Intent (MVI) architecture primitives.
//!
//! This module provides the base traits shared by every container, router
//! and strategy in the crate.
//!
//! # Architecture
//!
//! ```text
//! Intent ──→ Handler ──→ reduce ──→ State ──→ View
//!    ↑          │                              │
//!    │          └──→ postEvent ──→ Event ──────┤
//!    └─────────────────────────────────────────┘
//! ```
//!
//! - **State**: Immutable representation of screen state
//! - **Intent**: User actions or internal follow-ups
//! - **SideEffect**: One-off events delivered to live observers only
//! - **Reducer**: Pure function that transforms state based on intents

mod effect;
mod intent;
mod reducer;
mod state;

pub use effect::SideEffect;
pub use intent::{Intent, IntentKind, IntentOrigin};
pub use reducer::Reducer;
pub use state::ViewState;
