use crate::mvi::SideEffect;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginEffect {
    NavigateToHome,
    ShowToast(String),
}

impl SideEffect for LoginEffect {}
