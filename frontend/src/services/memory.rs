//! # In-Memory Data Service
//!
//! A complete [`DataService`](super::data_service::DataService) held in
//! process memory. It mirrors the observable behaviour of the remote
//! collaborator: per-user ownership, per-owner name uniqueness on categories
//! and ledgers (reported with wire code `23505`), auth provider error codes,
//! and session change notifications. Used by tests and demos.

use async_trait::async_trait;
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::data_service::{
    AuthService, CategoryService, EntryService, ErrorCode, LedgerService, ServiceError,
    ServiceResult, SessionCallback, Subscription, CONFLICT_WIRE_CODE,
};
use shared::{
    AuthSession, Category, CategoryId, Entry, EntryId, Ledger, LedgerId, NewCategory, NewEntry,
    NewLedger, SessionState,
};

type Listener = Arc<dyn Fn(&SessionState) + Send + Sync>;

struct UserRecord {
    password: String,
    session: AuthSession,
}

#[derive(Default)]
struct MemoryData {
    users: HashMap<String, UserRecord>,
    providers: HashSet<String>,
    session: SessionState,
    listeners: BTreeMap<u64, Listener>,
    next_listener_id: u64,
    entries: Vec<Entry>,
    categories: Vec<Category>,
    ledgers: Vec<Ledger>,
    current_ledger: HashMap<String, LedgerId>,
    reset_requests: Vec<String>,
    queued_failures: Vec<ServiceError>,
}

impl MemoryData {
    fn owner_id(&self) -> ServiceResult<String> {
        self.session
            .session()
            .map(|session| session.user_id.clone())
            .ok_or_else(ServiceError::unauthenticated)
    }

    fn take_failure(&mut self) -> ServiceResult<()> {
        if self.queued_failures.is_empty() {
            Ok(())
        } else {
            Err(self.queued_failures.remove(0))
        }
    }

    /// Set the session and collect the listeners that must hear about it
    fn set_session(&mut self, session: SessionState) -> (SessionState, Vec<Listener>) {
        self.session = session.clone();
        (session, self.listeners.values().cloned().collect())
    }
}

fn unique_violation(table: &str) -> ServiceError {
    ServiceError::from_wire(
        CONFLICT_WIRE_CODE,
        format!("duplicate key value violates unique constraint \"{}_name_owner_key\"", table),
    )
}

fn notify(session: &SessionState, listeners: Vec<Listener>) {
    for listener in listeners {
        listener(session);
    }
}

/// In-memory implementation of every data service trait
#[derive(Clone, Default)]
pub struct MemoryDataService {
    data: Arc<Mutex<MemoryData>>,
}

impl MemoryDataService {
    pub fn new() -> Self {
        let service = Self::default();
        service.lock().session = SessionState::SignedOut;
        service
    }

    /// Seed an account that can sign in with `email` / `password`
    pub fn with_user(self, email: &str, password: &str, display_name: &str) -> Self {
        {
            let mut data = self.lock();
            let session = AuthSession {
                user_id: format!("user-{}", data.users.len() + 1),
                email: email.to_string(),
                display_name: display_name.to_string(),
                email_verified: true,
                photo_url: None,
            };
            data.users.insert(
                email.to_lowercase(),
                UserRecord {
                    password: password.to_string(),
                    session,
                },
            );
        }
        self
    }

    /// Allow sign in through an external identity provider
    pub fn with_provider(self, provider_id: &str) -> Self {
        self.lock().providers.insert(provider_id.to_string());
        self
    }

    /// Make the next call that reaches the service fail with `error`
    pub fn fail_next(&self, error: ServiceError) {
        self.lock().queued_failures.push(error);
    }

    /// Mark the account for `email` as verified, as following the emailed
    /// link would. A signed-in session for that account is refreshed and
    /// listeners hear about it. Returns `false` for an unknown email.
    pub fn confirm_email(&self, email: &str) -> bool {
        let refreshed = {
            let mut data = self.lock();
            let Some(record) = data.users.get_mut(&email.to_lowercase()) else {
                warn!("Cannot verify unknown email {}", email);
                return false;
            };
            record.session.email_verified = true;
            let session = record.session.clone();
            let is_current = data
                .session
                .session()
                .map_or(false, |current| current.user_id == session.user_id);
            is_current.then_some(session)
        };

        info!("Verified email {}", email);
        if let Some(session) = refreshed {
            self.sign_in_as(session);
        }
        true
    }

    /// Emails that requested a password reset, oldest first
    pub fn reset_requests(&self) -> Vec<String> {
        self.lock().reset_requests.clone()
    }

    pub fn session(&self) -> SessionState {
        self.lock().session.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sign_in_as(&self, session: AuthSession) -> AuthSession {
        let (state, listeners) = self.lock().set_session(SessionState::SignedIn(session.clone()));
        notify(&state, listeners);
        session
    }
}

#[async_trait]
impl AuthService for MemoryDataService {
    async fn sign_in(&self, email: &str, password: &str) -> ServiceResult<AuthSession> {
        let session = {
            let mut data = self.lock();
            data.take_failure()?;
            let record = data.users.get(&email.to_lowercase()).ok_or_else(|| {
                ServiceError::from_wire("auth/user-not-found", "There is no user record for this email")
            })?;
            if record.password != password {
                return Err(ServiceError::from_wire("auth/wrong-password", "The password is invalid"));
            }
            record.session.clone()
        };

        info!("Signed in user {}", session.user_id);
        Ok(self.sign_in_as(session))
    }

    async fn sign_in_with_provider(&self, provider_id: &str) -> ServiceResult<AuthSession> {
        let session = {
            let mut data = self.lock();
            data.take_failure()?;
            if !data.providers.contains(provider_id) {
                return Err(ServiceError::from_wire(
                    "auth/operation-not-allowed",
                    format!("Provider {} is not enabled", provider_id),
                ));
            }
            let email = format!("user@{}.example", provider_id);
            let next_id = data.users.len() + 1;
            let record = data.users.entry(email.clone()).or_insert_with(|| UserRecord {
                password: String::new(),
                session: AuthSession {
                    user_id: format!("user-{}", next_id),
                    email: email.clone(),
                    display_name: provider_id.to_string(),
                    email_verified: true,
                    photo_url: None,
                },
            });
            record.session.clone()
        };

        info!("Signed in user {} through {}", session.user_id, provider_id);
        Ok(self.sign_in_as(session))
    }

    async fn register(&self, email: &str, password: &str) -> ServiceResult<AuthSession> {
        let session = {
            let mut data = self.lock();
            data.take_failure()?;
            let key = email.to_lowercase();
            if data.users.contains_key(&key) {
                return Err(ServiceError::from_wire(
                    "auth/email-already-in-use",
                    "The email address is already in use by another account",
                ));
            }
            let session = AuthSession {
                user_id: format!("user-{}", data.users.len() + 1),
                email: email.to_string(),
                display_name: email.split('@').next().unwrap_or_default().to_string(),
                email_verified: false,
                photo_url: None,
            };
            data.users.insert(
                key,
                UserRecord {
                    password: password.to_string(),
                    session: session.clone(),
                },
            );
            session
        };

        info!("Registered user {}", session.user_id);
        Ok(self.sign_in_as(session))
    }

    async fn reset_password(&self, email: &str) -> ServiceResult<()> {
        let mut data = self.lock();
        data.take_failure()?;
        if !data.users.contains_key(&email.to_lowercase()) {
            return Err(ServiceError::from_wire(
                "auth/user-not-found",
                "There is no user record for this email",
            ));
        }
        data.reset_requests.push(email.to_string());
        debug!("Password reset requested for {}", email);
        Ok(())
    }

    fn sign_out(&self) {
        let (state, listeners) = self.lock().set_session(SessionState::SignedOut);
        info!("Signed out");
        notify(&state, listeners);
    }

    fn on_session_change(&self, callback: SessionCallback) -> Subscription {
        let listener: Listener = Arc::from(callback);
        let (id, current) = {
            let mut data = self.lock();
            let id = data.next_listener_id;
            data.next_listener_id += 1;
            data.listeners.insert(id, listener.clone());
            (id, data.session.clone())
        };
        listener(&current);

        let weak: Weak<Mutex<MemoryData>> = Arc::downgrade(&self.data);
        Subscription::new(move || {
            if let Some(data) = weak.upgrade() {
                data.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .listeners
                    .remove(&id);
            }
        })
    }
}

#[async_trait]
impl EntryService for MemoryDataService {
    async fn add_entry(&self, entry: NewEntry) -> ServiceResult<Entry> {
        let mut data = self.lock();
        data.take_failure()?;
        let owner_id = data.owner_id()?;
        if let Some(ledger_id) = entry.ledger_id {
            if !data.ledgers.iter().any(|l| l.id == ledger_id && l.owner_id == owner_id) {
                return Err(ServiceError::not_found(format!("Ledger not found: {}", ledger_id)));
            }
        }

        let entry = Entry::from_new(EntryId::generate(), owner_id, entry);
        data.entries.push(entry.clone());
        info!("Created entry {}", entry.id);
        Ok(entry)
    }

    async fn update_entry(&self, id: EntryId, entry: NewEntry) -> ServiceResult<Entry> {
        let mut data = self.lock();
        data.take_failure()?;
        let owner_id = data.owner_id()?;
        let existing = data
            .entries
            .iter_mut()
            .find(|e| e.id == id && e.owner_id == owner_id)
            .ok_or_else(|| ServiceError::not_found(format!("Entry not found: {}", id)))?;

        *existing = Entry::from_new(id, owner_id, entry);
        info!("Updated entry {}", id);
        Ok(existing.clone())
    }

    async fn delete_entry(&self, id: EntryId) -> ServiceResult<()> {
        let mut data = self.lock();
        data.take_failure()?;
        let owner_id = data.owner_id()?;
        let before = data.entries.len();
        data.entries.retain(|e| !(e.id == id && e.owner_id == owner_id));
        if data.entries.len() == before {
            return Err(ServiceError::not_found(format!("Entry not found: {}", id)));
        }
        info!("Deleted entry {}", id);
        Ok(())
    }

    async fn list_entries(&self) -> ServiceResult<Vec<Entry>> {
        let mut data = self.lock();
        data.take_failure()?;
        let owner_id = data.owner_id()?;
        let mut entries: Vec<Entry> = data
            .entries
            .iter()
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(entries)
    }

    async fn list_recent_entries(&self, limit: usize) -> ServiceResult<Vec<Entry>> {
        let mut entries = self.list_entries().await?;
        entries.truncate(limit);
        Ok(entries)
    }
}

#[async_trait]
impl CategoryService for MemoryDataService {
    async fn add_category(&self, category: NewCategory) -> ServiceResult<Category> {
        let mut data = self.lock();
        data.take_failure()?;
        let owner_id = data.owner_id()?;
        let name = category.name.trim().to_string();
        if data.categories.iter().any(|c| c.owner_id == owner_id && c.name == name) {
            warn!("Rejected duplicate category name '{}'", name);
            return Err(unique_violation("category"));
        }

        let category = Category {
            id: CategoryId::generate(),
            owner_id,
            name,
            color: category.color,
        };
        data.categories.push(category.clone());
        info!("Created category {} ({})", category.name, category.id);
        Ok(category)
    }

    async fn update_category(&self, id: CategoryId, category: NewCategory) -> ServiceResult<Category> {
        let mut data = self.lock();
        data.take_failure()?;
        let owner_id = data.owner_id()?;
        let name = category.name.trim().to_string();
        if data
            .categories
            .iter()
            .any(|c| c.owner_id == owner_id && c.name == name && c.id != id)
        {
            warn!("Rejected duplicate category name '{}'", name);
            return Err(unique_violation("category"));
        }

        let existing = data
            .categories
            .iter_mut()
            .find(|c| c.id == id && c.owner_id == owner_id)
            .ok_or_else(|| ServiceError::not_found(format!("Category not found: {}", id)))?;
        existing.name = name;
        existing.color = category.color;
        info!("Updated category {}", id);
        Ok(existing.clone())
    }

    async fn delete_category(&self, id: CategoryId) -> ServiceResult<()> {
        let mut data = self.lock();
        data.take_failure()?;
        let owner_id = data.owner_id()?;
        let before = data.categories.len();
        data.categories.retain(|c| !(c.id == id && c.owner_id == owner_id));
        if data.categories.len() == before {
            return Err(ServiceError::not_found(format!("Category not found: {}", id)));
        }

        for entry in data.entries.iter_mut().filter(|e| e.category_id == Some(id)) {
            entry.category_id = None;
        }
        info!("Deleted category {}", id);
        Ok(())
    }

    async fn list_categories(&self) -> ServiceResult<Vec<Category>> {
        let mut data = self.lock();
        data.take_failure()?;
        let owner_id = data.owner_id()?;
        let mut categories: Vec<Category> = data
            .categories
            .iter()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }
}

#[async_trait]
impl LedgerService for MemoryDataService {
    async fn add_ledger(&self, ledger: NewLedger) -> ServiceResult<Ledger> {
        let mut data = self.lock();
        data.take_failure()?;
        let owner_id = data.owner_id()?;
        let name = ledger.name.trim().to_string();
        if data.ledgers.iter().any(|l| l.owner_id == owner_id && l.name == name) {
            warn!("Rejected duplicate ledger name '{}'", name);
            return Err(unique_violation("ledger"));
        }

        let ledger = Ledger {
            id: LedgerId::generate(),
            owner_id: owner_id.clone(),
            name,
            currency_code: ledger.currency_code,
        };
        data.ledgers.push(ledger.clone());
        data.current_ledger.entry(owner_id).or_insert(ledger.id);
        info!("Created ledger {} ({})", ledger.name, ledger.id);
        Ok(ledger)
    }

    async fn update_ledger(&self, id: LedgerId, ledger: NewLedger) -> ServiceResult<Ledger> {
        let mut data = self.lock();
        data.take_failure()?;
        let owner_id = data.owner_id()?;
        let name = ledger.name.trim().to_string();
        if data
            .ledgers
            .iter()
            .any(|l| l.owner_id == owner_id && l.name == name && l.id != id)
        {
            warn!("Rejected duplicate ledger name '{}'", name);
            return Err(unique_violation("ledger"));
        }

        let existing = data
            .ledgers
            .iter_mut()
            .find(|l| l.id == id && l.owner_id == owner_id)
            .ok_or_else(|| ServiceError::not_found(format!("Ledger not found: {}", id)))?;
        existing.name = name;
        existing.currency_code = ledger.currency_code;
        info!("Updated ledger {}", id);
        Ok(existing.clone())
    }

    async fn delete_ledger(&self, id: LedgerId) -> ServiceResult<()> {
        let mut data = self.lock();
        data.take_failure()?;
        let owner_id = data.owner_id()?;
        let before = data.ledgers.len();
        data.ledgers.retain(|l| !(l.id == id && l.owner_id == owner_id));
        if data.ledgers.len() == before {
            return Err(ServiceError::not_found(format!("Ledger not found: {}", id)));
        }

        data.entries.retain(|e| e.ledger_id != Some(id));
        if data.current_ledger.get(&owner_id) == Some(&id) {
            let replacement = data
                .ledgers
                .iter()
                .find(|l| l.owner_id == owner_id)
                .map(|l| l.id);
            match replacement {
                Some(next) => {
                    data.current_ledger.insert(owner_id, next);
                }
                None => {
                    data.current_ledger.remove(&owner_id);
                }
            }
        }
        info!("Deleted ledger {}", id);
        Ok(())
    }

    async fn list_ledgers(&self) -> ServiceResult<Vec<Ledger>> {
        let mut data = self.lock();
        data.take_failure()?;
        let owner_id = data.owner_id()?;
        let mut ledgers: Vec<Ledger> = data
            .ledgers
            .iter()
            .filter(|l| l.owner_id == owner_id)
            .cloned()
            .collect();
        ledgers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(ledgers)
    }

    async fn select_current_ledger(&self, id: LedgerId) -> ServiceResult<()> {
        let mut data = self.lock();
        data.take_failure()?;
        let owner_id = data.owner_id()?;
        if !data.ledgers.iter().any(|l| l.id == id && l.owner_id == owner_id) {
            return Err(ServiceError::new(
                ErrorCode::NotFound,
                format!("Ledger not found: {}", id),
            ));
        }
        data.current_ledger.insert(owner_id, id);
        Ok(())
    }

    async fn current_ledger(&self) -> ServiceResult<Option<LedgerId>> {
        let mut data = self.lock();
        data.take_failure()?;
        let owner_id = data.owner_id()?;
        Ok(data.current_ledger.get(&owner_id).copied())
    }
}
