//! # Data Service Traits
//!
//! This module defines the contract the client core consumes from the remote
//! persistence/auth collaborator. Backends (document store, relational store,
//! the in-memory reference implementation) implement these traits; the state
//! machines only ever see `Arc<dyn DataService>`.
//!
//! Every mutating call returns either a payload or a [`ServiceError`] whose
//! [`ErrorCode`] can tell a uniqueness conflict apart from any other failure.

use async_trait::async_trait;
use shared::{
    AuthSession, Category, CategoryId, Entry, EntryId, Ledger, LedgerId, NewCategory, NewEntry,
    NewLedger, SessionState,
};
use std::fmt;

/// Wire code reported by the relational backend for a unique constraint violation
pub const CONFLICT_WIRE_CODE: &str = "23505";

/// Wire code for a local password confirmation mismatch
pub const PASSWORD_MISMATCH_WIRE_CODE: &str = "PASSWORD_MISMATCH";

/// Classified error code of a failed data service call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// A name uniqueness constraint was violated
    Conflict,
    /// Password and confirmation differ (raised before any network call)
    PasswordMismatch,
    NotFound,
    Unauthenticated,
    Network,
    /// Auth provider error, e.g. `auth/wrong-password`
    Auth(String),
    /// Anything else, keeping the raw code for diagnosis
    Other(String),
}

impl ErrorCode {
    /// Classify a raw backend code
    pub fn from_wire(code: &str) -> Self {
        match code {
            CONFLICT_WIRE_CODE => ErrorCode::Conflict,
            PASSWORD_MISMATCH_WIRE_CODE => ErrorCode::PasswordMismatch,
            "NOT_FOUND" => ErrorCode::NotFound,
            "UNAUTHENTICATED" => ErrorCode::Unauthenticated,
            "NETWORK" | "auth/network-request-failed" => ErrorCode::Network,
            other if other.starts_with("auth/") => ErrorCode::Auth(other.to_string()),
            other => ErrorCode::Other(other.to_string()),
        }
    }

    pub fn as_wire(&self) -> &str {
        match self {
            ErrorCode::Conflict => CONFLICT_WIRE_CODE,
            ErrorCode::PasswordMismatch => PASSWORD_MISMATCH_WIRE_CODE,
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Unauthenticated => "UNAUTHENTICATED",
            ErrorCode::Network => "NETWORK",
            ErrorCode::Auth(code) | ErrorCode::Other(code) => code,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Structured failure of a data service call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ServiceError {
    pub code: ErrorCode,
    pub message: String,
}

impl ServiceError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Build from a raw backend code
    pub fn from_wire(code: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::from_wire(code), message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn unauthenticated() -> Self {
        Self::new(ErrorCode::Unauthenticated, "No user is signed in")
    }

    pub fn password_mismatch() -> Self {
        Self::new(ErrorCode::PasswordMismatch, "Passwords do not match")
    }

    pub fn is_conflict(&self) -> bool {
        self.code == ErrorCode::Conflict
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Listener invoked with the new session state on every change
pub type SessionCallback = Box<dyn Fn(&SessionState) + Send + Sync>;

/// Handle returned by [`AuthService::on_session_change`].
///
/// Dropping the handle unsubscribes the listener.
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

/// Authentication operations
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> ServiceResult<AuthSession>;

    async fn sign_in_with_provider(&self, provider_id: &str) -> ServiceResult<AuthSession>;

    /// Create an account; only reached once the confirmation matched
    async fn register(&self, email: &str, password: &str) -> ServiceResult<AuthSession>;

    /// Create an account, failing locally with `PASSWORD_MISMATCH` before any
    /// remote call when the confirmation differs
    async fn sign_up(&self, email: &str, password: &str, confirm: &str) -> ServiceResult<AuthSession> {
        if password != confirm {
            return Err(ServiceError::password_mismatch());
        }
        self.register(email, password).await
    }

    async fn reset_password(&self, email: &str) -> ServiceResult<()>;

    /// Fire-and-forget
    fn sign_out(&self);

    /// Register a listener for session changes. The listener is invoked with
    /// the current state immediately and again after every change.
    fn on_session_change(&self, callback: SessionCallback) -> Subscription;
}

/// Entry storage operations for the signed-in user
#[async_trait]
pub trait EntryService: Send + Sync {
    async fn add_entry(&self, entry: NewEntry) -> ServiceResult<Entry>;

    async fn update_entry(&self, id: EntryId, entry: NewEntry) -> ServiceResult<Entry>;

    async fn delete_entry(&self, id: EntryId) -> ServiceResult<()>;

    /// All entries, most recent first
    async fn list_entries(&self) -> ServiceResult<Vec<Entry>>;

    /// The `limit` most recent entries
    async fn list_recent_entries(&self, limit: usize) -> ServiceResult<Vec<Entry>>;
}

/// Category storage operations for the signed-in user
#[async_trait]
pub trait CategoryService: Send + Sync {
    async fn add_category(&self, category: NewCategory) -> ServiceResult<Category>;

    async fn update_category(&self, id: CategoryId, category: NewCategory) -> ServiceResult<Category>;

    async fn delete_category(&self, id: CategoryId) -> ServiceResult<()>;

    async fn list_categories(&self) -> ServiceResult<Vec<Category>>;
}

/// Ledger storage operations for the signed-in user
#[async_trait]
pub trait LedgerService: Send + Sync {
    async fn add_ledger(&self, ledger: NewLedger) -> ServiceResult<Ledger>;

    async fn update_ledger(&self, id: LedgerId, ledger: NewLedger) -> ServiceResult<Ledger>;

    async fn delete_ledger(&self, id: LedgerId) -> ServiceResult<()>;

    async fn list_ledgers(&self) -> ServiceResult<Vec<Ledger>>;

    /// Make `id` the ledger new entries go to
    async fn select_current_ledger(&self, id: LedgerId) -> ServiceResult<()>;

    async fn current_ledger(&self) -> ServiceResult<Option<LedgerId>>;
}

/// Everything the client core needs from the backend
pub trait DataService: AuthService + EntryService + CategoryService + LedgerService {}

impl<T> DataService for T where T: AuthService + EntryService + CategoryService + LedgerService {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_conflict_code_is_distinguishable() {
        let error = ServiceError::from_wire("23505", "duplicate key value");
        assert!(error.is_conflict());
        assert_eq!(error.code, ErrorCode::Conflict);

        let other = ServiceError::from_wire("42501", "permission denied");
        assert!(!other.is_conflict());
        assert_eq!(other.code, ErrorCode::Other("42501".to_string()));
    }

    #[test]
    fn test_auth_codes_are_classified() {
        assert_eq!(
            ErrorCode::from_wire("auth/wrong-password"),
            ErrorCode::Auth("auth/wrong-password".to_string())
        );
        assert_eq!(ErrorCode::from_wire("auth/network-request-failed"), ErrorCode::Network);
        assert_eq!(ErrorCode::from_wire("PASSWORD_MISMATCH"), ErrorCode::PasswordMismatch);
    }

    #[test]
    fn test_error_display_includes_code() {
        let error = ServiceError::conflict("name taken");
        assert_eq!(error.to_string(), "23505: name taken");
    }

    #[test]
    fn test_subscription_unsubscribes_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let subscription = Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        subscription.unsubscribe();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let counter = calls.clone();
        drop(Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
