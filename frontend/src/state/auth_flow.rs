//! # Auth Flow Module
//!
//! Sign in, sign up and password reset from the home screen, plus the
//! session tracker every signed-in screen reads from.
//!
//! ## Responsibilities:
//! - Field checks before any call (shown inline, never as a notification)
//! - Calling the auth service and flashing the outcome on the home indicator
//! - Switching the home screen form after a reset request
//! - Keeping one read-only copy of the session state for all consumers

use log::{info, warn};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError};

use super::editor::InFlight;
use super::home::{HomeAction, HomeState};
use super::notification::{NotificationQueue, Severity};
use super::store::Store;
use crate::config::NotificationDurations;
use crate::error::PolicyError;
use crate::services::data_service::{AuthService, DataService, ErrorCode, ServiceError, Subscription};
use crate::services::error_messages::message_for;
use crate::services::validation::{validate_email_field, validate_new_password_field, ValidationError};
use shared::{AuthSession, SessionState};

/// Inline errors of the auth forms
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthFieldErrors {
    pub email: Option<ValidationError>,
    pub password: Option<ValidationError>,
    pub confirm: Option<ValidationError>,
}

impl AuthFieldErrors {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none() && self.confirm.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    SignedIn(AuthSession),
    ResetRequested,
    Invalid(AuthFieldErrors),
    Rejected(PolicyError),
    Failed(ServiceError),
    Busy,
}

/// Drives the home screen forms against the auth service
pub struct AuthFlow {
    service: Arc<dyn DataService>,
    home: Store<HomeState>,
    notifications: NotificationQueue,
    durations: NotificationDurations,
    submitting: AtomicBool,
}

impl AuthFlow {
    pub fn new(service: Arc<dyn DataService>, durations: NotificationDurations) -> Self {
        let home = Store::new(HomeState::default());
        let notifications = NotificationQueue::new(Arc::new(home.clone()));
        Self {
            service,
            home,
            notifications,
            durations,
            submitting: AtomicBool::new(false),
        }
    }

    pub fn home(&self) -> Arc<HomeState> {
        self.home.state()
    }

    pub fn store(&self) -> &Store<HomeState> {
        &self.home
    }

    pub fn show_login(&self) {
        self.home.dispatch(HomeAction::GoToLogin);
    }

    pub fn show_registration(&self) {
        self.home.dispatch(HomeAction::GoToRegistration);
    }

    pub fn show_forgot_password(&self) {
        self.home.dispatch(HomeAction::GoToForgotPassword);
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthOutcome {
        let Some(_in_flight) = InFlight::acquire(&self.submitting) else {
            return AuthOutcome::Busy;
        };

        let errors = AuthFieldErrors {
            email: validate_email_field(email).err(),
            password: password.is_empty().then_some(ValidationError::Required),
            confirm: None,
        };
        if !errors.is_empty() {
            return AuthOutcome::Invalid(errors);
        }

        let result = self.service.sign_in(email.trim(), password).await;
        self.finish_sign_in(result)
    }

    pub async fn sign_in_with_provider(&self, provider_id: &str) -> AuthOutcome {
        let Some(_in_flight) = InFlight::acquire(&self.submitting) else {
            return AuthOutcome::Busy;
        };

        let result = self.service.sign_in_with_provider(provider_id).await;
        self.finish_sign_in(result)
    }

    pub async fn sign_up(&self, email: &str, password: &str, confirm: &str) -> AuthOutcome {
        let Some(_in_flight) = InFlight::acquire(&self.submitting) else {
            return AuthOutcome::Busy;
        };

        let errors = AuthFieldErrors {
            email: validate_email_field(email).err(),
            password: validate_new_password_field(password).err(),
            confirm: confirm.is_empty().then_some(ValidationError::Required),
        };
        if !errors.is_empty() {
            return AuthOutcome::Invalid(errors);
        }

        match self.service.sign_up(email.trim(), password, confirm).await {
            Ok(session) => {
                info!("Registered {}", session.user_id);
                self.flash("Your account has been created.", Severity::Info);
                AuthOutcome::SignedIn(session)
            }
            Err(e) if e.code == ErrorCode::PasswordMismatch => {
                let error = PolicyError::PasswordMismatch;
                self.flash(error.to_string(), Severity::Error);
                AuthOutcome::Rejected(error)
            }
            Err(e) => self.fail("register", e),
        }
    }

    pub async fn reset_password(&self, email: &str) -> AuthOutcome {
        let Some(_in_flight) = InFlight::acquire(&self.submitting) else {
            return AuthOutcome::Busy;
        };

        if let Err(e) = validate_email_field(email) {
            return AuthOutcome::Invalid(AuthFieldErrors {
                email: Some(e),
                ..AuthFieldErrors::default()
            });
        }

        match self.service.reset_password(email.trim()).await {
            Ok(()) => {
                info!("Password reset requested");
                self.flash("Check your inbox for a password reset link.", Severity::Info);
                self.home.dispatch(HomeAction::GoToLogin);
                AuthOutcome::ResetRequested
            }
            Err(e) => self.fail("reset password", e),
        }
    }

    pub fn sign_out(&self) {
        self.service.sign_out();
        self.notifications.cancel_pending();
        self.home.dispatch(HomeAction::GoToLogin);
    }

    fn finish_sign_in(&self, result: Result<AuthSession, ServiceError>) -> AuthOutcome {
        match result {
            Ok(session) => {
                info!("Signed in {}", session.user_id);
                self.flash(format!("Welcome back, {}!", session.display_name), Severity::Info);
                AuthOutcome::SignedIn(session)
            }
            Err(e) => self.fail("sign in", e),
        }
    }

    fn fail(&self, operation: &str, error: ServiceError) -> AuthOutcome {
        warn!("Failed to {}: {}", operation, error);
        self.flash(message_for(&error), Severity::Error);
        AuthOutcome::Failed(error)
    }

    fn flash(&self, message: impl Into<String>, severity: Severity) {
        self.notifications
            .show(message, severity, Some(self.durations.short()));
    }
}

/// Read-only view of the session state, kept current by the auth service
pub struct SessionTracker {
    state: Arc<Mutex<SessionState>>,
    _subscription: Subscription,
}

impl SessionTracker {
    pub fn new(service: &dyn AuthService) -> Self {
        let state = Arc::new(Mutex::new(SessionState::Loading));
        let sink = state.clone();
        let subscription = service.on_session_change(Box::new(move |session: &SessionState| {
            let mut current = sink.lock().unwrap_or_else(PoisonError::into_inner);
            if *current != *session {
                match session {
                    SessionState::SignedIn(s) => info!("Session started for {}", s.user_id),
                    SessionState::SignedOut => info!("Session ended"),
                    SessionState::Loading => {}
                }
                *current = session.clone();
            }
        }));

        Self {
            state,
            _subscription: subscription,
        }
    }

    pub fn current(&self) -> SessionState {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn session(&self) -> Option<AuthSession> {
        self.current().session().cloned()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current().is_signed_in()
    }
}
