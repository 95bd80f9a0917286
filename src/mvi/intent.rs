//! Base trait for intents (user/system actions) in MVI architecture.

/// Where an intent is allowed to come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentOrigin {
    /// Dispatched by the view layer (button clicks, text input).
    ViewAction,
    /// Dispatched only from inside another handler.
    Internal,
}

/// Static description of one intent variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentKind {
    pub name: &'static str,
    pub origin: IntentOrigin,
}

impl IntentKind {
    pub const fn view_action(name: &'static str) -> Self {
        Self {
            name,
            origin: IntentOrigin::ViewAction,
        }
    }

    pub const fn internal(name: &'static str) -> Self {
        Self {
            name,
            origin: IntentOrigin::Internal,
        }
    }
}

/// Trait for intent objects.
///
/// Intents are closed sets (usually an enum). `VARIANTS` lists every variant
/// so that a routing table can be checked for completeness, and `name`
/// returns the variant a value belongs to.
pub trait Intent: Send + 'static {
    /// Every variant of this intent type.
    const VARIANTS: &'static [IntentKind];

    /// Variant name of this value. Must appear in `VARIANTS`.
    fn name(&self) -> &'static str;

    /// Origin of this value, looked up from `VARIANTS`.
    ///
    /// Unknown names are treated as view actions.
    fn origin(&self) -> IntentOrigin {
        let name = self.name();
        Self::VARIANTS
            .iter()
            .find(|kind| kind.name == name)
            .map(|kind| kind.origin)
            .unwrap_or(IntentOrigin::ViewAction)
    }
}
