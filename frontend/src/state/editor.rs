//! # Editor Dialog Module
//!
//! The category and ledger management dialogs. Both are the same two-page
//! wizard (list of items, then one edit page used for create and update)
//! with a delete confirmation sub-flow, so one generic dialog serves both and
//! an [`EditorKind`] supplies the per-entity parts.
//!
//! ## Responsibilities:
//! - Fetching the list on open and after every successful mutation
//! - Create/update with the name collision shown as its own message
//! - Delete confirmation, including the minimum item floor (one ledger)
//! - At most one submission in flight
//! - Ignoring results that arrive after the dialog was closed or reopened

use async_trait::async_trait;
use log::{debug, info, warn};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::notification::{NotificationQueue, Severity};
use super::store::Store;
use super::wizard::{BackAtRoot, WizardAction, WizardState};
use crate::config::NotificationDurations;
use crate::error::PolicyError;
use crate::services::data_service::{DataService, ServiceError, ServiceResult};
use crate::services::error_messages::{conflict_message, message_for};
use crate::services::validation::{validate_name_field, ValidationError};
use shared::{Category, CategoryId, Ledger, LedgerId, NewCategory, NewLedger};

pub const LIST_PAGE: usize = 0;
pub const EDIT_PAGE: usize = 1;
const PAGE_COUNT: usize = 2;

/// The entity-specific half of an editor dialog
#[async_trait]
pub trait EditorKind: Send + Sync + 'static {
    type Item: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;
    type Id: Copy + fmt::Display + Send + Sync + 'static;
    type Draft: Clone + Send + Sync + 'static;

    /// Lower-case entity name used in messages
    const NOUN: &'static str;
    /// Deleting is refused when it would leave fewer than this many items
    const MIN_ITEMS: usize;

    fn id_of(item: &Self::Item) -> Self::Id;

    /// Field values for the edit page
    fn draft_of(item: &Self::Item) -> Self::Draft;

    fn validate(draft: &Self::Draft) -> Result<(), ValidationError>;

    async fn list(service: &dyn DataService) -> ServiceResult<Vec<Self::Item>>;

    async fn create(service: &dyn DataService, draft: Self::Draft) -> ServiceResult<Self::Item>;

    async fn update(
        service: &dyn DataService,
        id: Self::Id,
        draft: Self::Draft,
    ) -> ServiceResult<Self::Item>;

    async fn delete(service: &dyn DataService, id: Self::Id) -> ServiceResult<()>;
}

pub struct CategoryKind;

#[async_trait]
impl EditorKind for CategoryKind {
    type Item = Category;
    type Id = CategoryId;
    type Draft = NewCategory;

    const NOUN: &'static str = "category";
    const MIN_ITEMS: usize = 0;

    fn id_of(item: &Category) -> CategoryId {
        item.id
    }

    fn draft_of(item: &Category) -> NewCategory {
        NewCategory {
            name: item.name.clone(),
            color: item.color.clone(),
        }
    }

    fn validate(draft: &NewCategory) -> Result<(), ValidationError> {
        validate_name_field(&draft.name)
    }

    async fn list(service: &dyn DataService) -> ServiceResult<Vec<Category>> {
        service.list_categories().await
    }

    async fn create(service: &dyn DataService, draft: NewCategory) -> ServiceResult<Category> {
        service.add_category(draft).await
    }

    async fn update(service: &dyn DataService, id: CategoryId, draft: NewCategory) -> ServiceResult<Category> {
        service.update_category(id, draft).await
    }

    async fn delete(service: &dyn DataService, id: CategoryId) -> ServiceResult<()> {
        service.delete_category(id).await
    }
}

pub struct LedgerKind;

#[async_trait]
impl EditorKind for LedgerKind {
    type Item = Ledger;
    type Id = LedgerId;
    type Draft = NewLedger;

    const NOUN: &'static str = "ledger";
    const MIN_ITEMS: usize = 1;

    fn id_of(item: &Ledger) -> LedgerId {
        item.id
    }

    fn draft_of(item: &Ledger) -> NewLedger {
        NewLedger {
            name: item.name.clone(),
            currency_code: item.currency_code.clone(),
        }
    }

    fn validate(draft: &NewLedger) -> Result<(), ValidationError> {
        validate_name_field(&draft.name)?;
        if draft.currency_code.trim().is_empty() {
            return Err(ValidationError::Required);
        }
        Ok(())
    }

    async fn list(service: &dyn DataService) -> ServiceResult<Vec<Ledger>> {
        service.list_ledgers().await
    }

    async fn create(service: &dyn DataService, draft: NewLedger) -> ServiceResult<Ledger> {
        service.add_ledger(draft).await
    }

    async fn update(service: &dyn DataService, id: LedgerId, draft: NewLedger) -> ServiceResult<Ledger> {
        service.update_ledger(id, draft).await
    }

    async fn delete(service: &dyn DataService, id: LedgerId) -> ServiceResult<()> {
        service.delete_ledger(id).await
    }
}

/// Result of submitting the edit page
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<T> {
    Saved(T),
    /// Rejected locally; shown next to the field
    Invalid(ValidationError),
    /// The name is already used by another item of this kind
    NameTaken,
    Failed(ServiceError),
    /// Another submission is still running
    Busy,
    /// The dialog was closed or reopened before the result arrived
    Stale,
}

/// Result of confirming a pending delete
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    Deleted,
    Blocked(PolicyError),
    Failed(ServiceError),
    NothingPending,
    Busy,
    Stale,
}

/// Clears the in-flight flag when the submission ends, however it ends
pub(crate) struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::SeqCst) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn capitalized(noun: &str) -> String {
    let mut chars = noun.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A list/edit dialog for one kind of entity
pub struct EditorDialog<K: EditorKind> {
    service: Arc<dyn DataService>,
    store: Store<WizardState<K::Item>>,
    items: Mutex<Vec<K::Item>>,
    notifications: NotificationQueue,
    submitting: AtomicBool,
    durations: NotificationDurations,
}

pub type CategoryEditor = EditorDialog<CategoryKind>;
pub type LedgerEditor = EditorDialog<LedgerKind>;

impl<K: EditorKind> EditorDialog<K> {
    pub fn new(service: Arc<dyn DataService>, durations: NotificationDurations) -> Self {
        let store = Store::new(WizardState::new(PAGE_COUNT, BackAtRoot::Close));
        let notifications = NotificationQueue::new(Arc::new(store.clone()));
        Self {
            service,
            store,
            items: Mutex::new(Vec::new()),
            notifications,
            submitting: AtomicBool::new(false),
            durations,
        }
    }

    pub fn store(&self) -> &Store<WizardState<K::Item>> {
        &self.store
    }

    pub fn state(&self) -> Arc<WizardState<K::Item>> {
        self.store.state()
    }

    /// Items as of the last successful fetch
    pub fn items(&self) -> Vec<K::Item> {
        self.lock_items().clone()
    }

    /// Values to prefill the edit page with; `None` when creating
    pub fn draft(&self) -> Option<K::Draft> {
        self.state().edit_target.as_ref().map(K::draft_of)
    }

    /// Open afresh and load the list. A seeded item opens straight on its edit page.
    pub async fn open(&self, seed: Option<K::Item>) -> ServiceResult<()> {
        let edit_now = seed.is_some();
        self.store.dispatch(WizardAction::Open { edit_target: seed });
        if edit_now {
            self.store.dispatch(WizardAction::GoTo(EDIT_PAGE));
        }
        debug!("Opened {} editor", K::NOUN);
        self.refresh().await
    }

    /// Refetch the list. Results for an earlier opening are dropped.
    pub async fn refresh(&self) -> ServiceResult<()> {
        let session = self.state().session;
        let result = K::list(self.service.as_ref()).await;
        if !self.is_current(session) {
            debug!("Dropping stale {} list", K::NOUN);
            return Ok(());
        }

        match result {
            Ok(items) => {
                *self.lock_items() = items;
                Ok(())
            }
            Err(e) => {
                warn!("Failed to list {} items: {}", K::NOUN, e);
                self.notifications
                    .show(message_for(&e), Severity::Error, Some(self.durations.error()));
                Err(e)
            }
        }
    }

    pub fn open_create(&self) {
        self.store.dispatch(WizardAction::OpenCreate { edit_page: EDIT_PAGE });
    }

    pub fn open_edit(&self, item: K::Item) {
        self.store.dispatch(WizardAction::OpenEdit {
            target: item,
            edit_page: EDIT_PAGE,
        });
    }

    pub fn go_back(&self) {
        self.store.dispatch(WizardAction::GoBack);
    }

    /// Create or update, depending on whether an edit target is set
    pub async fn submit(&self, draft: K::Draft) -> SubmitOutcome<K::Item> {
        let Some(_in_flight) = InFlight::acquire(&self.submitting) else {
            return SubmitOutcome::Busy;
        };

        let state = self.state();
        if !state.is_open {
            return SubmitOutcome::Stale;
        }
        if let Err(e) = K::validate(&draft) {
            return SubmitOutcome::Invalid(e);
        }

        let result = match state.edit_target.as_ref() {
            Some(item) => K::update(self.service.as_ref(), K::id_of(item), draft).await,
            None => K::create(self.service.as_ref(), draft).await,
        };
        if !self.is_current(state.session) {
            debug!("Dropping stale {} submission", K::NOUN);
            return SubmitOutcome::Stale;
        }

        match result {
            Ok(item) => {
                let message = if state.is_creating() {
                    format!("New {} created", K::NOUN)
                } else {
                    format!("{} updated", capitalized(K::NOUN))
                };
                info!("{}: {} {}", message, K::NOUN, K::id_of(&item));
                self.notifications
                    .show(message, Severity::Info, Some(self.durations.short()));

                // A failed refetch has already been reported
                let _ = self.refresh().await;
                self.store.dispatch(WizardAction::SetEditTarget(None));
                self.store.dispatch(WizardAction::ReturnToStart);
                SubmitOutcome::Saved(item)
            }
            Err(e) if e.is_conflict() => {
                warn!("Name collision saving {}: {}", K::NOUN, e);
                self.notifications.show(
                    conflict_message(K::NOUN),
                    Severity::Error,
                    Some(self.durations.error()),
                );
                SubmitOutcome::NameTaken
            }
            Err(e) => {
                warn!("Failed to save {}: {}", K::NOUN, e);
                self.notifications
                    .show(message_for(&e), Severity::Error, Some(self.durations.error()));
                SubmitOutcome::Failed(e)
            }
        }
    }

    /// Ask for confirmation before deleting `item`
    pub fn request_delete(&self, item: K::Item) {
        self.store.dispatch(WizardAction::RequestDelete(item));
    }

    pub fn cancel_delete(&self) {
        self.store.dispatch(WizardAction::CancelDelete);
    }

    /// Delete the item awaiting confirmation
    pub async fn confirm_delete(&self) -> DeleteOutcome {
        let Some(_in_flight) = InFlight::acquire(&self.submitting) else {
            return DeleteOutcome::Busy;
        };

        let state = self.state();
        let Some(target) = state.pending_delete.clone() else {
            return DeleteOutcome::NothingPending;
        };

        if K::MIN_ITEMS > 0 {
            // The floor is checked against the server, not the cached list
            let fetched = K::list(self.service.as_ref()).await;
            if !self.is_current(state.session) {
                debug!("Dropping stale {} delete", K::NOUN);
                return DeleteOutcome::Stale;
            }
            match fetched {
                Ok(items) => *self.lock_items() = items,
                Err(e) => {
                    warn!("Failed to count {} items before delete: {}", K::NOUN, e);
                    self.notifications
                        .show(message_for(&e), Severity::Error, Some(self.durations.error()));
                    return DeleteOutcome::Failed(e);
                }
            }
        }

        if K::MIN_ITEMS > 0 && self.lock_items().len() <= K::MIN_ITEMS {
            let error = PolicyError::below_minimum(K::NOUN, K::MIN_ITEMS);
            warn!("Refusing to delete {} {}: {}", K::NOUN, K::id_of(&target), error);
            self.store.dispatch(WizardAction::CancelDelete);
            self.notifications
                .show(error.to_string(), Severity::Error, Some(self.durations.error()));
            return DeleteOutcome::Blocked(error);
        }

        let id = K::id_of(&target);
        let result = K::delete(self.service.as_ref(), id).await;
        if !self.is_current(state.session) {
            debug!("Dropping stale {} delete", K::NOUN);
            return DeleteOutcome::Stale;
        }
        self.store.dispatch(WizardAction::CancelDelete);

        match result {
            Ok(()) => {
                info!("Deleted {} {}", K::NOUN, id);
                self.notifications.show(
                    format!("{} deleted", capitalized(K::NOUN)),
                    Severity::Info,
                    Some(self.durations.short()),
                );
                let _ = self.refresh().await;
                self.store.dispatch(WizardAction::ReturnToStart);
                DeleteOutcome::Deleted
            }
            Err(e) => {
                warn!("Failed to delete {} {}: {}", K::NOUN, id, e);
                self.notifications
                    .show(message_for(&e), Severity::Error, Some(self.durations.error()));
                DeleteOutcome::Failed(e)
            }
        }
    }

    /// Close the dialog and cancel its pending message timer
    pub fn close(&self) {
        self.store.dispatch(WizardAction::Close);
        self.notifications.cancel_pending();
        self.lock_items().clear();
    }

    fn is_current(&self, session: u64) -> bool {
        let state = self.state();
        state.is_open && state.session == session
    }

    fn lock_items(&self) -> MutexGuard<'_, Vec<K::Item>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
