//! # Entry Form Module
//!
//! The add/edit entry dialog: a form page plus two picker pages (category,
//! ledger) that return to the form once something is chosen.
//!
//! ## Responsibilities:
//! - Raw field values as typed, with one inline error per field
//! - Turning the fields into a [`NewEntry`] (date and amount normalized)
//! - Submitting through the data service, one submission at a time
//! - Dropping results that arrive after the dialog was closed or reopened

use chrono::NaiveDate;
use log::{debug, info, warn};
use std::sync::Arc;

use super::entry_list::EntryChange;
use super::notification::{NotificationQueue, Severity};
use super::reducer::{update_if_changed, Reducible};
use super::store::Store;
use super::wizard::{BackAtRoot, WizardAction, WizardState};
use crate::config::NotificationDurations;
use crate::services::data_service::{DataService, ServiceError};
use crate::services::date_utils::{parse_date_string, to_canonical};
use crate::services::error_messages::message_for;
use crate::services::validation::{is_valid_currency_amount, validate_name_field, ValidationError};
use shared::{CategoryId, Entry, LedgerId, MoneyValue, NewEntry};

pub const FORM_PAGE: usize = 0;
pub const CHOOSE_CATEGORY_PAGE: usize = 1;
pub const CHOOSE_LEDGER_PAGE: usize = 2;
const PAGE_COUNT: usize = 3;

/// Inline error per form field
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntryFieldErrors {
    pub date: Option<ValidationError>,
    pub detail: Option<ValidationError>,
    pub amount: Option<ValidationError>,
}

impl EntryFieldErrors {
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.detail.is_none() && self.amount.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFormState {
    /// As typed, `yyyy/mm/dd` or `yyyy-mm-dd`
    pub date: String,
    pub detail: String,
    /// As typed, e.g. `12.5`
    pub amount: String,
    pub is_positive: bool,
    pub note: String,
    pub category_id: Option<CategoryId>,
    pub ledger_id: Option<LedgerId>,
    pub errors: EntryFieldErrors,
    pub is_submitting: bool,
}

impl Default for EntryFormState {
    fn default() -> Self {
        Self {
            date: String::new(),
            detail: String::new(),
            amount: String::new(),
            is_positive: false,
            note: String::new(),
            category_id: None,
            ledger_id: None,
            errors: EntryFieldErrors::default(),
            is_submitting: false,
        }
    }
}

impl EntryFormState {
    /// A blank expense dated `today`
    pub fn new(today: NaiveDate) -> Self {
        Self {
            date: to_canonical(&today),
            ..Self::default()
        }
    }

    /// The form prefilled from an existing entry
    pub fn from_entry(entry: &Entry) -> Self {
        Self {
            date: to_canonical(&entry.date),
            detail: entry.detail.clone(),
            amount: entry.amount.to_padded_string(),
            is_positive: entry.is_positive,
            note: entry.note.clone().unwrap_or_default(),
            category_id: entry.category_id,
            ledger_id: entry.ledger_id,
            errors: EntryFieldErrors::default(),
            is_submitting: false,
        }
    }

    /// Check every field and build the entry to submit
    pub fn validate(&self, currency_code: &str) -> Result<NewEntry, EntryFieldErrors> {
        let mut errors = EntryFieldErrors::default();

        let date = parse_date_string(&self.date)
            .map_err(|e| errors.date = Some(ValidationError::from(e)))
            .ok();

        if let Err(e) = validate_name_field(&self.detail) {
            errors.detail = Some(e);
        }

        let amount = self.amount.trim();
        let amount = if amount.is_empty() {
            errors.amount = Some(ValidationError::Required);
            None
        } else if !is_valid_currency_amount(amount) {
            errors.amount = Some(ValidationError::InvalidAmount);
            None
        } else {
            MoneyValue::parse(amount, currency_code)
                .map_err(|_| errors.amount = Some(ValidationError::InvalidAmount))
                .ok()
        };

        match (date, amount) {
            (Some(date), Some(amount)) if errors.is_empty() => {
                let note = self.note.trim();
                Ok(NewEntry {
                    ledger_id: self.ledger_id,
                    date,
                    detail: self.detail.trim().to_string(),
                    amount,
                    is_positive: self.is_positive,
                    note: (!note.is_empty()).then(|| note.to_string()),
                    category_id: self.category_id,
                })
            }
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryFormAction {
    SetDate(String),
    SetDetail(String),
    SetAmount(String),
    SetPositive(bool),
    SetNote(String),
    SelectCategory(Option<CategoryId>),
    SelectLedger(Option<LedgerId>),
    SetErrors(EntryFieldErrors),
    /// Ignored while a submission is already running
    SubmitStarted,
    SubmitFinished,
    /// Blank the form, keeping the date and ledger
    Reset,
    LoadEntry(Entry),
}

impl Reducible for EntryFormState {
    type Action = EntryFormAction;

    fn reduce(self: Arc<Self>, action: EntryFormAction) -> Arc<Self> {
        match action {
            EntryFormAction::SetDate(date) => update_if_changed(self, |s| {
                s.date = date;
                s.errors.date = None;
            }),
            EntryFormAction::SetDetail(detail) => update_if_changed(self, |s| {
                s.detail = detail;
                s.errors.detail = None;
            }),
            EntryFormAction::SetAmount(amount) => update_if_changed(self, |s| {
                s.amount = amount;
                s.errors.amount = None;
            }),
            EntryFormAction::SetPositive(is_positive) => update_if_changed(self, |s| s.is_positive = is_positive),
            EntryFormAction::SetNote(note) => update_if_changed(self, |s| s.note = note),
            EntryFormAction::SelectCategory(id) => update_if_changed(self, |s| s.category_id = id),
            EntryFormAction::SelectLedger(id) => update_if_changed(self, |s| s.ledger_id = id),
            EntryFormAction::SetErrors(errors) => update_if_changed(self, |s| s.errors = errors),
            EntryFormAction::SubmitStarted => update_if_changed(self, |s| s.is_submitting = true),
            EntryFormAction::SubmitFinished => update_if_changed(self, |s| s.is_submitting = false),
            EntryFormAction::Reset => update_if_changed(self, |s| {
                *s = EntryFormState {
                    date: std::mem::take(&mut s.date),
                    ledger_id: s.ledger_id,
                    ..EntryFormState::default()
                };
            }),
            EntryFormAction::LoadEntry(entry) => Arc::new(EntryFormState::from_entry(&entry)),
        }
    }
}

/// Result of submitting or deleting from the entry dialog
#[derive(Debug, Clone, PartialEq)]
pub enum EntrySubmitOutcome {
    Saved(EntryChange),
    Invalid(EntryFieldErrors),
    Failed(ServiceError),
    Busy,
    Stale,
}

/// The add/edit entry dialog
pub struct EntryDialog {
    service: Arc<dyn DataService>,
    wizard: Store<WizardState<Entry>>,
    form: Store<EntryFormState>,
    notifications: NotificationQueue,
    durations: NotificationDurations,
    currency_code: String,
}

impl EntryDialog {
    pub fn new(
        service: Arc<dyn DataService>,
        durations: NotificationDurations,
        currency_code: impl Into<String>,
    ) -> Self {
        let wizard = Store::new(WizardState::new(PAGE_COUNT, BackAtRoot::Close));
        let notifications = NotificationQueue::new(Arc::new(wizard.clone()));
        Self {
            service,
            wizard,
            form: Store::new(EntryFormState::default()),
            notifications,
            durations,
            currency_code: currency_code.into(),
        }
    }

    pub fn wizard(&self) -> Arc<WizardState<Entry>> {
        self.wizard.state()
    }

    pub fn form(&self) -> Arc<EntryFormState> {
        self.form.state()
    }

    /// Dispatch a field edit
    pub fn edit(&self, action: EntryFormAction) -> bool {
        self.form.dispatch(action)
    }

    /// Open for a new entry dated `today`, or for editing `seed`.
    ///
    /// A new entry goes to the user's current ledger.
    pub async fn open(&self, seed: Option<Entry>, today: NaiveDate) {
        self.wizard.dispatch(WizardAction::Open {
            edit_target: seed.clone(),
        });
        match seed {
            Some(entry) => {
                self.form.dispatch(EntryFormAction::LoadEntry(entry));
            }
            None => {
                self.form.replace(EntryFormState::new(today));
                let session = self.wizard().session;
                match self.service.current_ledger().await {
                    Ok(ledger_id) if self.is_current(session) => {
                        self.form.dispatch(EntryFormAction::SelectLedger(ledger_id));
                    }
                    Ok(_) => debug!("Dropping stale current ledger"),
                    Err(e) => {
                        warn!("Failed to load current ledger: {}", e);
                        self.notifications
                            .show(message_for(&e), Severity::Error, Some(self.durations.error()));
                    }
                }
            }
        }
    }

    pub fn choose_category(&self) {
        self.wizard.dispatch(WizardAction::GoTo(CHOOSE_CATEGORY_PAGE));
    }

    pub fn choose_ledger(&self) {
        self.wizard.dispatch(WizardAction::GoTo(CHOOSE_LEDGER_PAGE));
    }

    /// Pick a category and return to the form
    pub fn pick_category(&self, id: Option<CategoryId>) {
        self.form.dispatch(EntryFormAction::SelectCategory(id));
        self.wizard.dispatch(WizardAction::GoBack);
    }

    /// Pick a ledger and return to the form
    pub fn pick_ledger(&self, id: Option<LedgerId>) {
        self.form.dispatch(EntryFormAction::SelectLedger(id));
        self.wizard.dispatch(WizardAction::GoBack);
    }

    /// Back one page; on the form page this closes the dialog
    pub fn go_back(&self) {
        self.wizard.dispatch(WizardAction::GoBack);
        if !self.wizard().is_open {
            self.notifications.cancel_pending();
        }
    }

    pub async fn submit(&self) -> EntrySubmitOutcome {
        if !self.form.dispatch(EntryFormAction::SubmitStarted) {
            return EntrySubmitOutcome::Busy;
        }

        let wizard = self.wizard();
        if !wizard.is_open {
            self.form.dispatch(EntryFormAction::SubmitFinished);
            return EntrySubmitOutcome::Stale;
        }

        let new_entry = match self.form().validate(&self.currency_code) {
            Ok(new_entry) => new_entry,
            Err(errors) => {
                self.form.dispatch(EntryFormAction::SetErrors(errors.clone()));
                self.form.dispatch(EntryFormAction::SubmitFinished);
                return EntrySubmitOutcome::Invalid(errors);
            }
        };

        let result = match wizard.edit_target.as_ref() {
            Some(existing) => self
                .service
                .update_entry(existing.id, new_entry)
                .await
                .map(EntryChange::Updated),
            None => self.service.add_entry(new_entry).await.map(EntryChange::Inserted),
        };
        self.form.dispatch(EntryFormAction::SubmitFinished);
        if !self.is_current(wizard.session) {
            debug!("Dropping stale entry submission");
            return EntrySubmitOutcome::Stale;
        }

        match result {
            Ok(change) => {
                let message = match &change {
                    EntryChange::Updated(_) => "Entry updated",
                    _ => "New entry created",
                };
                info!("{}", message);
                self.notifications
                    .show(message, Severity::Info, Some(self.durations.short()));
                self.form.dispatch(EntryFormAction::Reset);
                self.wizard.dispatch(WizardAction::SetEditTarget(None));
                self.wizard.dispatch(WizardAction::ReturnToStart);
                EntrySubmitOutcome::Saved(change)
            }
            Err(e) => {
                warn!("Failed to save entry: {}", e);
                self.notifications
                    .show(message_for(&e), Severity::Error, Some(self.durations.error()));
                EntrySubmitOutcome::Failed(e)
            }
        }
    }

    /// Delete the entry being edited
    pub async fn delete(&self) -> EntrySubmitOutcome {
        let wizard = self.wizard();
        let Some(existing) = wizard.edit_target.as_ref() else {
            return EntrySubmitOutcome::Stale;
        };
        if !self.form.dispatch(EntryFormAction::SubmitStarted) {
            return EntrySubmitOutcome::Busy;
        }

        let result = self.service.delete_entry(existing.id).await;
        self.form.dispatch(EntryFormAction::SubmitFinished);
        if !self.is_current(wizard.session) {
            return EntrySubmitOutcome::Stale;
        }

        match result {
            Ok(()) => {
                info!("Deleted entry {}", existing.id);
                self.notifications
                    .show("Entry deleted", Severity::Info, Some(self.durations.short()));
                self.close();
                EntrySubmitOutcome::Saved(EntryChange::Deleted(existing.id))
            }
            Err(e) => {
                warn!("Failed to delete entry {}: {}", existing.id, e);
                self.notifications
                    .show(message_for(&e), Severity::Error, Some(self.durations.error()));
                EntrySubmitOutcome::Failed(e)
            }
        }
    }

    /// Close the dialog and cancel its pending message timer
    pub fn close(&self) {
        self.wizard.dispatch(WizardAction::Close);
        self.notifications.cancel_pending();
    }

    fn is_current(&self, session: u64) -> bool {
        let state = self.wizard();
        state.is_open && state.session == session
    }
}
