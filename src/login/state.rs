use serde::{Deserialize, Serialize};

use crate::mvi::ViewState;

/// Everything the login screen renders.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoginState {
    pub email: String,
    pub password: String,
    /// `None` until a validation for the current e-mail has finished.
    pub email_valid: Option<bool>,
    pub email_validating: bool,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

impl ViewState for LoginState {}
