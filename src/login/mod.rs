//! Sample login screen built on the container, router and strategies.
//!
//! - e-mail validation is debounced with cancel-previous scheduling
//! - the login button ignores taps while a login is in flight (drop)
//! - success and failure are internal follow-up intents

mod effect;
mod handlers;
mod intent;
mod state;

pub use effect::LoginEffect;
pub use handlers::{login_host, login_router, LoginHost, LOGIN_DELAY, VALIDATION_DELAY};
pub use intent::LoginIntent;
pub use state::LoginState;
