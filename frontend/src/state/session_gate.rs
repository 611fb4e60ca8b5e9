//! # Session Gate Module
//!
//! Decides whether a top-level page may render for the current session, or
//! where the user has to be sent instead. Signed-out users belong on the home
//! page, users who have not verified their email wait on the verification
//! page, and verified users go to the dashboard.

use log::debug;
use std::sync::Arc;

use super::auth_flow::SessionTracker;
use super::navigation::Router;
use crate::services::data_service::AuthService;
use shared::SessionState;

pub const HOME_PATH: &str = "/";
pub const AWAITING_VERIFICATION_PATH: &str = "/awaiting-verification";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Pages whose access depends on the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatedPage {
    Home,
    AwaitingVerification,
    Dashboard,
}

impl GatedPage {
    pub fn path(&self) -> &'static str {
        match self {
            GatedPage::Home => HOME_PATH,
            GatedPage::AwaitingVerification => AWAITING_VERIFICATION_PATH,
            GatedPage::Dashboard => DASHBOARD_PATH,
        }
    }

    /// The page a session belongs on, or `None` while it is still loading
    pub fn for_session(session: &SessionState) -> Option<Self> {
        match session {
            SessionState::Loading => None,
            SessionState::SignedOut => Some(GatedPage::Home),
            SessionState::SignedIn(s) if !s.email_verified => Some(GatedPage::AwaitingVerification),
            SessionState::SignedIn(_) => Some(GatedPage::Dashboard),
        }
    }
}

/// What a page should do for the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Session not known yet; show the loading placeholder
    Loading,
    Allowed,
    Redirect(GatedPage),
}

pub fn access_for(page: GatedPage, session: &SessionState) -> Access {
    match GatedPage::for_session(session) {
        None => Access::Loading,
        Some(home) if home == page => Access::Allowed,
        Some(home) => Access::Redirect(home),
    }
}

/// Applies [`access_for`] against the live session and routes on redirect
pub struct SessionGate {
    tracker: SessionTracker,
    router: Arc<dyn Router>,
}

impl SessionGate {
    pub fn new(service: &dyn AuthService, router: Arc<dyn Router>) -> Self {
        Self {
            tracker: SessionTracker::new(service),
            router,
        }
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    /// Check `page` and navigate away when the session belongs elsewhere
    pub fn check(&self, page: GatedPage) -> Access {
        let access = access_for(page, &self.tracker.current());
        if let Access::Redirect(target) = access {
            debug!("Redirecting from {} to {}", page.path(), target.path());
            self.router.navigate(target.path());
        }
        access
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::MemoryDataService;
    use crate::state::auth_flow::AuthFlow;
    use crate::config::NotificationDurations;
    use shared::AuthSession;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRouter {
        visited: Mutex<Vec<String>>,
    }

    impl Router for RecordingRouter {
        fn navigate(&self, path: &str) {
            self.visited.lock().unwrap().push(path.to_string());
        }
    }

    fn signed_in(email_verified: bool) -> SessionState {
        SessionState::SignedIn(AuthSession {
            user_id: "user-1".to_string(),
            email: "alice@example.com".to_string(),
            display_name: "Alice".to_string(),
            email_verified,
            photo_url: None,
        })
    }

    #[test]
    fn test_loading_session_waits_everywhere() {
        for page in [GatedPage::Home, GatedPage::AwaitingVerification, GatedPage::Dashboard] {
            assert_eq!(access_for(page, &SessionState::Loading), Access::Loading);
        }
    }

    #[test]
    fn test_dashboard_access() {
        assert_eq!(
            access_for(GatedPage::Dashboard, &SessionState::SignedOut),
            Access::Redirect(GatedPage::Home)
        );
        assert_eq!(
            access_for(GatedPage::Dashboard, &signed_in(false)),
            Access::Redirect(GatedPage::AwaitingVerification)
        );
        assert_eq!(access_for(GatedPage::Dashboard, &signed_in(true)), Access::Allowed);
    }

    #[test]
    fn test_home_and_verification_pages_send_users_onward() {
        assert_eq!(access_for(GatedPage::Home, &SessionState::SignedOut), Access::Allowed);
        assert_eq!(
            access_for(GatedPage::Home, &signed_in(true)),
            Access::Redirect(GatedPage::Dashboard)
        );
        assert_eq!(
            access_for(GatedPage::AwaitingVerification, &SessionState::SignedOut),
            Access::Redirect(GatedPage::Home)
        );
        assert_eq!(
            access_for(GatedPage::AwaitingVerification, &signed_in(true)),
            Access::Redirect(GatedPage::Dashboard)
        );
        assert_eq!(access_for(GatedPage::AwaitingVerification, &signed_in(false)), Access::Allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_follows_live_session() {
        let service = Arc::new(MemoryDataService::new());
        let router = Arc::new(RecordingRouter::default());
        let gate = SessionGate::new(service.as_ref(), router.clone());

        assert_eq!(gate.check(GatedPage::Dashboard), Access::Redirect(GatedPage::Home));

        let flow = AuthFlow::new(service.clone(), NotificationDurations::default());
        flow.sign_up("carol@example.com", "Str0ng!pass", "Str0ng!pass").await;
        assert_eq!(
            gate.check(GatedPage::Dashboard),
            Access::Redirect(GatedPage::AwaitingVerification)
        );

        assert!(service.confirm_email("carol@example.com"));
        assert_eq!(gate.check(GatedPage::Dashboard), Access::Allowed);
        assert_eq!(
            *router.visited.lock().unwrap(),
            vec![HOME_PATH.to_string(), AWAITING_VERIFICATION_PATH.to_string()]
        );
    }
}
