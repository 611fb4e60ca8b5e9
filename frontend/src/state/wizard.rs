//! # Wizard State Module
//!
//! Page cursor for modal multi-page dialogs (list -> edit, form -> picker).
//!
//! ## Responsibilities:
//! - A page index that always addresses one of the dialog's pages
//! - A back stack of visited pages
//! - The entity being edited, if any (create and edit share one page)
//! - The pending delete confirmation
//! - A per-opening session number used to drop stale async results
//!
//! A fresh state is built on every `Open`, so nothing leaks from one opening
//! of a dialog to the next except the explicitly seeded edit target.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::notification::NotificationState;
use super::reducer::{update_if_changed, Reducible};

/// What `GoBack` does on the first page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BackAtRoot {
    #[default]
    Stay,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardState<T> {
    pub page: usize,
    pub page_count: usize,
    pub history: Vec<usize>,
    pub edit_target: Option<T>,
    pub pending_delete: Option<T>,
    pub is_open: bool,
    pub back_at_root: BackAtRoot,
    pub notice: NotificationState,
    /// Incremented on every opening
    pub session: u64,
}

impl<T> WizardState<T> {
    /// A closed dialog with `page_count` pages
    pub fn new(page_count: usize, back_at_root: BackAtRoot) -> Self {
        Self {
            page: 0,
            page_count: page_count.max(1),
            history: Vec::new(),
            edit_target: None,
            pending_delete: None,
            is_open: false,
            back_at_root,
            notice: NotificationState::hidden(),
            session: 0,
        }
    }

    pub fn is_creating(&self) -> bool {
        self.edit_target.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WizardAction<T> {
    GoTo(usize),
    GoBack,
    /// Show the first page and forget the back stack
    ReturnToStart,
    SetEditTarget(Option<T>),
    /// Clear the edit target and show the edit page
    OpenCreate { edit_page: usize },
    /// Seed the edit target and show the edit page
    OpenEdit { target: T, edit_page: usize },
    RequestDelete(T),
    CancelDelete,
    /// Open afresh, optionally seeded with an edit target
    Open { edit_target: Option<T> },
    Close,
    ToggleMessage(NotificationState),
}

impl<T> From<NotificationState> for WizardAction<T> {
    fn from(notification: NotificationState) -> Self {
        WizardAction::ToggleMessage(notification)
    }
}

fn go_to<T>(state: &mut WizardState<T>, page: usize) {
    if page != state.page {
        state.history.push(state.page);
        state.page = page;
    }
}

impl<T: Clone + PartialEq> Reducible for WizardState<T> {
    type Action = WizardAction<T>;

    fn reduce(self: Arc<Self>, action: WizardAction<T>) -> Arc<Self> {
        match action {
            WizardAction::GoTo(page) | WizardAction::OpenCreate { edit_page: page }
                if page >= self.page_count =>
            {
                log::warn!("Ignoring wizard page {} (only {} pages)", page, self.page_count);
                self
            }
            WizardAction::OpenEdit { edit_page, .. } if edit_page >= self.page_count => {
                log::warn!("Ignoring wizard page {} (only {} pages)", edit_page, self.page_count);
                self
            }
            WizardAction::GoTo(page) => update_if_changed(self, |s| go_to(s, page)),
            WizardAction::GoBack => {
                if let Some(previous) = self.history.last().copied() {
                    update_if_changed(self, |s| {
                        s.history.pop();
                        s.page = previous;
                    })
                } else if self.page > 0 {
                    update_if_changed(self, |s| s.page -= 1)
                } else {
                    match self.back_at_root {
                        BackAtRoot::Stay => self,
                        BackAtRoot::Close => update_if_changed(self, |s| s.is_open = false),
                    }
                }
            }
            WizardAction::ReturnToStart => update_if_changed(self, |s| {
                s.page = 0;
                s.history.clear();
            }),
            WizardAction::SetEditTarget(target) => update_if_changed(self, |s| s.edit_target = target),
            WizardAction::OpenCreate { edit_page } => update_if_changed(self, |s| {
                s.edit_target = None;
                go_to(s, edit_page);
            }),
            WizardAction::OpenEdit { target, edit_page } => update_if_changed(self, |s| {
                s.edit_target = Some(target);
                go_to(s, edit_page);
            }),
            WizardAction::RequestDelete(target) => {
                update_if_changed(self, |s| s.pending_delete = Some(target))
            }
            WizardAction::CancelDelete => update_if_changed(self, |s| s.pending_delete = None),
            WizardAction::Open { edit_target } => {
                let mut next = WizardState::new(self.page_count, self.back_at_root);
                next.is_open = true;
                next.edit_target = edit_target;
                next.session = self.session + 1;
                Arc::new(next)
            }
            WizardAction::Close => update_if_changed(self, |s| {
                s.is_open = false;
                s.pending_delete = None;
            }),
            WizardAction::ToggleMessage(notice) => update_if_changed(self, |s| s.notice = notice),
        }
    }
}
