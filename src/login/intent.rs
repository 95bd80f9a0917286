use crate::mvi::{Intent, IntentKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginIntent {
    EmailChanged(String),
    PasswordChanged(String),
    LoginClicked,
    /// Check that the e-mail is not taken. Internal.
    ValidateEmail(String),
    /// Internal.
    OnLoginSuccess,
    /// Internal.
    OnLoginFailure(String),
}

impl Intent for LoginIntent {
    const VARIANTS: &'static [IntentKind] = &[
        IntentKind::view_action("EmailChanged"),
        IntentKind::view_action("PasswordChanged"),
        IntentKind::view_action("LoginClicked"),
        IntentKind::internal("ValidateEmail"),
        IntentKind::internal("OnLoginSuccess"),
        IntentKind::internal("OnLoginFailure"),
    ];

    fn name(&self) -> &'static str {
        match self {
            LoginIntent::EmailChanged(_) => "EmailChanged",
            LoginIntent::PasswordChanged(_) => "PasswordChanged",
            LoginIntent::LoginClicked => "LoginClicked",
            LoginIntent::ValidateEmail(_) => "ValidateEmail",
            LoginIntent::OnLoginSuccess => "OnLoginSuccess",
            LoginIntent::OnLoginFailure(_) => "OnLoginFailure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mvi::IntentOrigin;

    #[test]
    fn test_every_value_is_listed() {
        let values = [
            LoginIntent::EmailChanged(String::new()),
            LoginIntent::PasswordChanged(String::new()),
            LoginIntent::LoginClicked,
            LoginIntent::ValidateEmail(String::new()),
            LoginIntent::OnLoginSuccess,
            LoginIntent::OnLoginFailure(String::new()),
        ];
        let names: Vec<&str> = values.iter().map(|v| v.name()).collect();
        let listed: Vec<&str> = LoginIntent::VARIANTS.iter().map(|k| k.name).collect();
        assert_eq!(names, listed);
    }

    #[test]
    fn test_origins() {
        assert_eq!(LoginIntent::LoginClicked.origin(), IntentOrigin::ViewAction);
        assert_eq!(
            LoginIntent::ValidateEmail("a@b.c".into()).origin(),
            IntentOrigin::Internal
        );
        assert_eq!(LoginIntent::OnLoginSuccess.origin(), IntentOrigin::Internal);
    }
}
