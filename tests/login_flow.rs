mod common;

use common::shared_log;
use mvikit::config::RuntimeConfig;
use mvikit::container::{create_container, ContainerBuilder};
use mvikit::context::ExecutionContext;
use mvikit::dispatch::DispatchError;
use mvikit::login::{
    login_host, LoginEffect, LoginHost, LoginIntent, LoginState, LOGIN_DELAY, VALIDATION_DELAY,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

fn host() -> LoginHost {
    let container = create_container(LoginState::default(), ExecutionContext::current(), false);
    login_host(container, &RuntimeConfig::default()).unwrap()
}

async fn fill_form(host: &LoginHost, email: &str, password: &str) {
    host.dispatch(LoginIntent::EmailChanged(email.to_string())).unwrap();
    host.dispatch(LoginIntent::PasswordChanged(password.to_string())).unwrap();
    host.context().wait_idle().await;
}

#[tokio::test(start_paused = true)]
async fn test_successful_login_navigates_home() {
    let host = host();
    let mut events = host.observe_events();
    fill_form(&host, "test@example.com", "password").await;

    host.dispatch(LoginIntent::LoginClicked).unwrap();
    sleep(Duration::from_millis(10)).await;
    assert!(host.state().is_loading);

    host.context().wait_idle().await;
    let state = host.state();
    assert!(!state.is_loading);
    assert_eq!(state.error_message, None);
    assert_eq!(events.next().await, Some(LoginEffect::NavigateToHome));
    assert_eq!(
        events.next().await,
        Some(LoginEffect::ShowToast("Login successful!".to_string()))
    );
}

#[tokio::test(start_paused = true)]
async fn test_wrong_credentials_show_error() {
    let host = host();
    let mut events = host.observe_events();
    fill_form(&host, "user@example.com", "hunter2").await;

    host.dispatch(LoginIntent::LoginClicked).unwrap();
    host.context().wait_idle().await;

    let state = host.state();
    assert!(!state.is_loading);
    assert_eq!(state.error_message.as_deref(), Some("Invalid credentials"));
    assert_eq!(
        events.next().await,
        Some(LoginEffect::ShowToast("Invalid credentials".to_string()))
    );
}

#[tokio::test(start_paused = true)]
async fn test_empty_form_is_rejected_without_loading() {
    let host = host();

    host.dispatch(LoginIntent::LoginClicked).unwrap();
    host.context().wait_idle().await;

    let state = host.state();
    assert!(!state.is_loading);
    assert_eq!(
        state.error_message.as_deref(),
        Some("Email and password cannot be empty")
    );
}

#[tokio::test(start_paused = true)]
async fn test_repeated_login_taps_are_dropped() {
    let host = host();
    let mut events = host.observe_events();
    fill_form(&host, "test@example.com", "password").await;

    assert!(!host.dispatch(LoginIntent::LoginClicked).unwrap().is_dropped());
    sleep(LOGIN_DELAY / 2).await;
    assert!(host.dispatch(LoginIntent::LoginClicked).unwrap().is_dropped());

    host.context().wait_idle().await;
    assert_eq!(events.next().await, Some(LoginEffect::NavigateToHome));
    assert_eq!(
        events.next().await,
        Some(LoginEffect::ShowToast("Login successful!".to_string()))
    );

    // The second tap never ran, so nothing else was emitted.
    host.dispatch(LoginIntent::EmailChanged("x@y.z".to_string())).unwrap();
    host.context().wait_idle().await;
    assert!(tokio::time::timeout(Duration::from_millis(1), events.next()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_email_validation_marks_taken_addresses() {
    let host = host();

    host.dispatch(LoginIntent::EmailChanged("someone@example.com".to_string())).unwrap();
    sleep(Duration::from_millis(10)).await;
    assert!(host.state().email_validating);

    host.context().wait_idle().await;
    assert_eq!(host.state().email_valid, Some(true));
    assert!(!host.state().email_validating);

    host.dispatch(LoginIntent::EmailChanged("test@example.com".to_string())).unwrap();
    host.context().wait_idle().await;
    assert_eq!(host.state().email_valid, Some(false));
}

#[tokio::test(start_paused = true)]
async fn test_email_validation_is_debounced() {
    let transitions = shared_log();
    let sink = Arc::clone(&transitions);
    let container = ContainerBuilder::new(LoginState::default(), ExecutionContext::current())
        .observer(move |_: &LoginState, new: &LoginState| sink.lock().push(new.clone()))
        .build()
        .unwrap();
    let host = login_host(container, &RuntimeConfig::default()).unwrap();

    host.dispatch(LoginIntent::EmailChanged("first@example.com".to_string())).unwrap();
    sleep(VALIDATION_DELAY / 3).await;
    host.dispatch(LoginIntent::EmailChanged("test@example.com".to_string())).unwrap();
    host.context().wait_idle().await;

    let state = host.state();
    assert_eq!(state.email, "test@example.com");
    assert_eq!(state.email_valid, Some(false));

    // The superseded validation never reported a result.
    let results: Vec<Option<bool>> = transitions
        .lock()
        .iter()
        .map(|state| state.email_valid)
        .filter(Option::is_some)
        .collect();
    assert_eq!(results, vec![Some(false)]);
}

#[tokio::test(start_paused = true)]
async fn test_blank_email_skips_validation() {
    let host = host();
    host.dispatch(LoginIntent::EmailChanged("   ".to_string())).unwrap();
    host.context().wait_idle().await;

    let state = host.state();
    assert_eq!(state.email_valid, None);
    assert!(!state.email_validating);
}

#[tokio::test]
async fn test_internal_intents_are_rejected_from_view() {
    let host = host();

    for intent in [
        LoginIntent::ValidateEmail("a@b.c".to_string()),
        LoginIntent::OnLoginSuccess,
        LoginIntent::OnLoginFailure("nope".to_string()),
    ] {
        let name = match &intent {
            LoginIntent::ValidateEmail(_) => "ValidateEmail",
            LoginIntent::OnLoginSuccess => "OnLoginSuccess",
            _ => "OnLoginFailure",
        };
        assert_eq!(
            host.dispatch(intent).err(),
            Some(DispatchError::InternalIntent { name })
        );
    }
    assert_eq!(host.state(), LoginState::default());
}
