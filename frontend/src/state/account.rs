//! # Account State Module
//!
//! Editable profile fields on the dashboard account page.

use serde::Deserialize;
use std::sync::Arc;

use super::reducer::{update_if_changed, Reducible};
use shared::AuthSession;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccountState {
    pub email: String,
    pub display_name: String,
    /// Whether the user agreed to receive emailed reports
    pub can_send_report: bool,
}

impl AccountState {
    /// Prefill from the signed-in session. Report emails start switched off.
    pub fn from_session(session: &AuthSession) -> Self {
        Self {
            email: session.email.clone(),
            display_name: session.display_name.clone(),
            can_send_report: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountAction {
    SetEmail(String),
    SetDisplayName(String),
    SetAllowEmailReport(bool),
}

impl Reducible for AccountState {
    type Action = AccountAction;

    fn reduce(self: Arc<Self>, action: AccountAction) -> Arc<Self> {
        match action {
            AccountAction::SetEmail(email) => update_if_changed(self, |s| s.email = email),
            AccountAction::SetDisplayName(name) => update_if_changed(self, |s| s.display_name = name),
            AccountAction::SetAllowEmailReport(allow) => {
                update_if_changed(self, |s| s.can_send_report = allow)
            }
        }
    }
}
