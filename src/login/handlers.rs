use std::time::Duration;

use crate::config::RuntimeConfig;
use crate::container::Container;
use crate::dispatch::{HandlerOptions, HandlerScope, Host, Router, RouterError};
use crate::mvi::Intent;
use crate::strategy::ExecutionMode;

use super::{LoginEffect, LoginIntent, LoginState};

/// Simulated round trip of the e-mail availability check.
pub const VALIDATION_DELAY: Duration = Duration::from_millis(300);
/// Simulated round trip of the login call.
pub const LOGIN_DELAY: Duration = Duration::from_millis(2000);

const DEMO_EMAIL: &str = "test@example.com";
const DEMO_PASSWORD: &str = "password";

pub type LoginHost = Host<LoginState, LoginIntent, LoginEffect>;
type LoginScope = HandlerScope<LoginState, LoginIntent, LoginEffect>;

/// Routing table of the login screen.
///
/// Validation and login pin their strategies; every other route uses
/// `config.default_mode`.
pub fn login_router(
    config: &RuntimeConfig,
) -> Result<Router<LoginState, LoginIntent, LoginEffect>, RouterError> {
    let fallback = HandlerOptions::new(config.default_mode);

    Router::builder()
        .on("EmailChanged", fallback.clone(), email_changed)
        .on("PasswordChanged", fallback.clone(), password_changed)
        .on(
            "ValidateEmail",
            HandlerOptions::new(ExecutionMode::CancelPrevious),
            validate_email,
        )
        .on(
            "LoginClicked",
            HandlerOptions::new(ExecutionMode::Drop),
            login_clicked,
        )
        .on("OnLoginSuccess", fallback.clone(), login_succeeded)
        .on("OnLoginFailure", fallback, login_failed)
        .build()
}

/// Wire a container to the login routes.
pub fn login_host(
    container: Container<LoginState, LoginEffect>,
    config: &RuntimeConfig,
) -> Result<LoginHost, RouterError> {
    Ok(Host::new(container, login_router(config)?))
}

fn unexpected(intent: &LoginIntent) -> anyhow::Error {
    anyhow::anyhow!("Intent '{}' routed to the wrong handler", intent.name())
}

async fn email_changed(intent: LoginIntent, scope: LoginScope) -> anyhow::Result<()> {
    let email = match intent {
        LoginIntent::EmailChanged(email) => email,
        other => return Err(unexpected(&other)),
    };

    scope.reduce(|s| LoginState {
        email: email.clone(),
        email_valid: None,
        email_validating: false,
        error_message: None,
        ..s
    });
    if !email.trim().is_empty() {
        scope.dispatch(LoginIntent::ValidateEmail(email))?;
    }
    Ok(())
}

async fn password_changed(intent: LoginIntent, scope: LoginScope) -> anyhow::Result<()> {
    let password = match intent {
        LoginIntent::PasswordChanged(password) => password,
        other => return Err(unexpected(&other)),
    };

    scope.reduce(|s| LoginState {
        password,
        error_message: None,
        ..s
    });
    Ok(())
}

async fn validate_email(intent: LoginIntent, scope: LoginScope) -> anyhow::Result<()> {
    let email = match intent {
        LoginIntent::ValidateEmail(email) => email,
        other => return Err(unexpected(&other)),
    };

    scope.reduce(|s| LoginState {
        email_validating: true,
        ..s
    });
    tokio::time::sleep(VALIDATION_DELAY).await;

    // Addresses containing "test" count as already registered.
    let valid = !email.contains("test");
    scope.reduce(|s| LoginState {
        email_validating: false,
        email_valid: Some(valid),
        ..s
    });
    Ok(())
}

async fn login_clicked(_: LoginIntent, scope: LoginScope) -> anyhow::Result<()> {
    let LoginState {
        email, password, ..
    } = scope.state();

    if email.trim().is_empty() || password.trim().is_empty() {
        scope.reduce(|s| LoginState {
            error_message: Some("Email and password cannot be empty".to_string()),
            ..s
        });
        return Ok(());
    }

    scope.reduce(|s| LoginState {
        is_loading: true,
        error_message: None,
        ..s
    });
    tokio::time::sleep(LOGIN_DELAY).await;

    let outcome = if email == DEMO_EMAIL && password == DEMO_PASSWORD {
        LoginIntent::OnLoginSuccess
    } else {
        LoginIntent::OnLoginFailure("Invalid credentials".to_string())
    };
    scope.dispatch(outcome)?;
    Ok(())
}

async fn login_succeeded(_: LoginIntent, scope: LoginScope) -> anyhow::Result<()> {
    scope.reduce(|s| LoginState {
        is_loading: false,
        ..s
    });
    scope.post_event(LoginEffect::NavigateToHome);
    scope.post_event(LoginEffect::ShowToast("Login successful!".to_string()));
    Ok(())
}

async fn login_failed(intent: LoginIntent, scope: LoginScope) -> anyhow::Result<()> {
    let error = match intent {
        LoginIntent::OnLoginFailure(error) => error,
        other => return Err(unexpected(&other)),
    };

    scope.reduce(|s| LoginState {
        is_loading: false,
        error_message: Some(error.clone()),
        ..s
    });
    scope.post_event(LoginEffect::ShowToast(error));
    Ok(())
}
