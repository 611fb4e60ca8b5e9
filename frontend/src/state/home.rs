//! # Home State Module
//!
//! State of the signed-out landing screen: which auth form is shown and the
//! status indicator underneath it.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::notification::NotificationState;
use super::reducer::{update_if_changed, Reducible};

/// The auth form currently displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HomeForm {
    #[default]
    Login,
    Registration,
    ForgotPassword,
}

impl HomeForm {
    pub fn index(&self) -> usize {
        match self {
            HomeForm::Login => 0,
            HomeForm::Registration => 1,
            HomeForm::ForgotPassword => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HomeState {
    pub current_form: HomeForm,
    pub indicator: NotificationState,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HomeAction {
    GoToLogin,
    GoToRegistration,
    GoToForgotPassword,
    ToggleMessage(NotificationState),
}

impl From<NotificationState> for HomeAction {
    fn from(notification: NotificationState) -> Self {
        HomeAction::ToggleMessage(notification)
    }
}

impl Reducible for HomeState {
    type Action = HomeAction;

    fn reduce(self: Arc<Self>, action: HomeAction) -> Arc<Self> {
        match action {
            HomeAction::GoToLogin => update_if_changed(self, |s| s.current_form = HomeForm::Login),
            HomeAction::GoToRegistration => {
                update_if_changed(self, |s| s.current_form = HomeForm::Registration)
            }
            HomeAction::GoToForgotPassword => {
                update_if_changed(self, |s| s.current_form = HomeForm::ForgotPassword)
            }
            HomeAction::ToggleMessage(indicator) => update_if_changed(self, |s| s.indicator = indicator),
        }
    }
}
