//! # Navigation State Module
//!
//! State of the dashboard shell: the active top-level page, the hover
//! highlight in the menu, and the overlays (profile dropdown, sidebar, modal)
//! drawn above the page.
//!
//! ## Responsibilities:
//! - Page index and hover highlight, kept within the configured page count
//! - Back/forward synchronization through a static path to index table
//! - Overlay visibility with Escape closing the most recently opened overlay
//!
//! Open overlays are tracked in a single stack ordered by opening time. The
//! boolean flags are derived from that stack and kept in step with it. The
//! backdrop is shown while the sidebar or a modal is open, so closing the
//! sidebar by any route also drops the backdrop it brought up.

use log::{debug, warn};
use serde::Deserialize;
use std::sync::Arc;

use super::notification::{NotificationQueue, NotificationState, Severity};
use super::reducer::{update_if_changed, Reducible};
use super::store::Store;
use crate::config::NotificationDurations;

/// Static lookup between route paths and page indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRoutes {
    paths: Vec<String>,
}

impl PageRoutes {
    pub fn new(paths: Vec<String>) -> Self {
        Self { paths }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Index of `path`, ignoring a trailing slash
    pub fn index_of(&self, path: &str) -> Option<usize> {
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        self.paths.iter().position(|known| known == path)
    }

    pub fn path_of(&self, index: usize) -> Option<&str> {
        self.paths.get(index).map(String::as_str)
    }
}

/// Something drawn above the dashboard page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Overlay {
    Dropdown,
    Sidebar,
    Modal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    pub current_page_index: usize,
    pub hover_index: usize,
    pub page_count: usize,
    pub is_dropdown_open: bool,
    pub is_sidebar_open: bool,
    /// Backdrop shown behind the sidebar or a modal dialog
    pub is_modal_open: bool,
    /// Open overlays, most recently opened last
    pub overlay_stack: Vec<Overlay>,
    pub notification: NotificationState,
}

impl NavigationState {
    pub fn new(page_count: usize) -> Self {
        Self {
            current_page_index: 0,
            hover_index: 0,
            page_count,
            is_dropdown_open: false,
            is_sidebar_open: false,
            is_modal_open: false,
            overlay_stack: Vec::new(),
            notification: NotificationState::hidden(),
        }
    }

    pub fn topmost_overlay(&self) -> Option<Overlay> {
        self.overlay_stack.last().copied()
    }

    fn set_overlay(&mut self, overlay: Overlay, open: bool) {
        self.overlay_stack.retain(|o| *o != overlay);
        if open {
            self.overlay_stack.push(overlay);
        }
        let dropdown = self.overlay_stack.contains(&Overlay::Dropdown);
        let sidebar = self.overlay_stack.contains(&Overlay::Sidebar);
        let modal = self.overlay_stack.contains(&Overlay::Modal);
        self.is_dropdown_open = dropdown;
        self.is_sidebar_open = sidebar;
        self.is_modal_open = modal || sidebar;
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NavAction {
    Redirect(usize),
    Hover(usize),
    /// Restore the highlight to the active page
    HoverEnd,
    ToggleDropdown(bool),
    ToggleSidebar(bool),
    ToggleModal(bool),
    ToggleMessage(NotificationState),
    /// Close the topmost overlay
    Escape,
    ClickOutsideDropdown,
    /// Close the sidebar and any modal behind the backdrop
    ClickBackdrop,
}

impl From<NotificationState> for NavAction {
    fn from(notification: NotificationState) -> Self {
        NavAction::ToggleMessage(notification)
    }
}

impl Reducible for NavigationState {
    type Action = NavAction;

    fn reduce(self: Arc<Self>, action: NavAction) -> Arc<Self> {
        match action {
            NavAction::Redirect(index) | NavAction::Hover(index) if index >= self.page_count => {
                warn!("Ignoring page index {} (only {} pages)", index, self.page_count);
                self
            }
            NavAction::Redirect(index) => update_if_changed(self, |s| s.current_page_index = index),
            NavAction::Hover(index) => update_if_changed(self, |s| s.hover_index = index),
            NavAction::HoverEnd => update_if_changed(self, |s| s.hover_index = s.current_page_index),
            NavAction::ToggleDropdown(open) => {
                update_if_changed(self, |s| s.set_overlay(Overlay::Dropdown, open))
            }
            NavAction::ToggleSidebar(open) => {
                update_if_changed(self, |s| s.set_overlay(Overlay::Sidebar, open))
            }
            NavAction::ToggleModal(open) => update_if_changed(self, |s| s.set_overlay(Overlay::Modal, open)),
            NavAction::ToggleMessage(notification) => {
                update_if_changed(self, |s| s.notification = notification)
            }
            NavAction::Escape => match self.topmost_overlay() {
                Some(overlay) => update_if_changed(self, |s| s.set_overlay(overlay, false)),
                None => self,
            },
            NavAction::ClickOutsideDropdown => {
                update_if_changed(self, |s| s.set_overlay(Overlay::Dropdown, false))
            }
            NavAction::ClickBackdrop => update_if_changed(self, |s| {
                s.set_overlay(Overlay::Sidebar, false);
                s.set_overlay(Overlay::Modal, false);
            }),
        }
    }
}

/// Page routing capability of the host framework
pub trait Router: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Result of synchronizing with a back/forward navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteChange {
    Applied(usize),
    /// The path is not a known page; the previous page stays active
    Ignored,
}

/// Drives the dashboard shell state from user and router events
pub struct NavigationController {
    store: Store<NavigationState>,
    routes: PageRoutes,
    router: Arc<dyn Router>,
    notifications: NotificationQueue,
    durations: NotificationDurations,
}

impl NavigationController {
    pub fn new(routes: PageRoutes, router: Arc<dyn Router>, durations: NotificationDurations) -> Self {
        let store = Store::new(NavigationState::new(routes.len()));
        let notifications = NotificationQueue::new(Arc::new(store.clone()));
        Self {
            store,
            routes,
            router,
            notifications,
            durations,
        }
    }

    pub fn store(&self) -> &Store<NavigationState> {
        &self.store
    }

    pub fn state(&self) -> Arc<NavigationState> {
        self.store.state()
    }

    pub fn routes(&self) -> &PageRoutes {
        &self.routes
    }

    /// Follow a menu link: route to the page, mark it active and close the sidebar
    pub fn activate_link(&self, index: usize) -> bool {
        let Some(path) = self.routes.path_of(index) else {
            warn!("No page at index {}", index);
            return false;
        };

        debug!("Navigating to {}", path);
        self.router.navigate(path);
        self.store.dispatch(NavAction::Redirect(index));
        self.store.dispatch(NavAction::Hover(index));
        self.store.dispatch(NavAction::ToggleSidebar(false));
        true
    }

    /// Re-derive the active page after browser back/forward
    pub fn on_route_change(&self, path: &str) -> RouteChange {
        match self.routes.index_of(path) {
            Some(index) => {
                self.store.dispatch(NavAction::Redirect(index));
                self.store.dispatch(NavAction::Hover(index));
                RouteChange::Applied(index)
            }
            None => {
                warn!(
                    "Unknown route '{}', keeping page {}",
                    path,
                    self.state().current_page_index
                );
                RouteChange::Ignored
            }
        }
    }

    pub fn hover(&self, index: usize) {
        self.store.dispatch(NavAction::Hover(index));
    }

    pub fn hover_end(&self) {
        self.store.dispatch(NavAction::HoverEnd);
    }

    pub fn toggle_dropdown(&self, open: bool) {
        self.store.dispatch(NavAction::ToggleDropdown(open));
    }

    /// Opening the sidebar also shows the backdrop
    pub fn toggle_sidebar(&self, open: bool) {
        self.store.dispatch(NavAction::ToggleSidebar(open));
    }

    pub fn toggle_modal(&self, open: bool) {
        self.store.dispatch(NavAction::ToggleModal(open));
    }

    pub fn escape(&self) -> Option<Overlay> {
        let closed = self.state().topmost_overlay();
        self.store.dispatch(NavAction::Escape);
        closed
    }

    pub fn click_outside_profile(&self) {
        self.store.dispatch(NavAction::ClickOutsideDropdown);
    }

    pub fn click_backdrop(&self) {
        self.store.dispatch(NavAction::ClickBackdrop);
    }

    pub fn show_message(&self, message: impl Into<String>, severity: Severity) {
        self.notifications
            .show(message, severity, Some(self.durations.short()));
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
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

    fn routes() -> PageRoutes {
        PageRoutes::new(vec![
            "/dashboard".to_string(),
            "/dashboard/account".to_string(),
            "/dashboard/records".to_string(),
            "/dashboard/analytics".to_string(),
        ])
    }

    fn controller() -> (Arc<RecordingRouter>, NavigationController) {
        let router = Arc::new(RecordingRouter::default());
        let controller =
            NavigationController::new(routes(), router.clone(), NotificationDurations::default());
        (router, controller)
    }

    #[test]
    fn test_route_lookup_ignores_trailing_slash() {
        let routes = routes();
        assert_eq!(routes.index_of("/dashboard/records/"), Some(2));
        assert_eq!(routes.index_of("/dashboard"), Some(0));
        assert_eq!(routes.index_of("/elsewhere"), None);
    }

    #[test]
    fn test_activate_link_routes_and_highlights() {
        let (router, controller) = controller();
        controller.toggle_sidebar(true);

        assert!(controller.activate_link(2));
        let state = controller.state();
        assert_eq!(state.current_page_index, 2);
        assert_eq!(state.hover_index, 2);
        assert!(!state.is_sidebar_open);
        assert!(!state.is_modal_open);
        assert!(state.overlay_stack.is_empty());
        assert_eq!(*router.visited.lock().unwrap(), vec!["/dashboard/records".to_string()]);

        assert!(!controller.activate_link(9));
        assert_eq!(controller.state().current_page_index, 2);
    }

    #[test]
    fn test_back_forward_sync() {
        let (router, controller) = controller();
        assert_eq!(controller.on_route_change("/dashboard/analytics"), RouteChange::Applied(3));
        assert_eq!(controller.state().current_page_index, 3);

        assert_eq!(controller.on_route_change("/not-a-page"), RouteChange::Ignored);
        assert_eq!(controller.state().current_page_index, 3);
        assert!(router.visited.lock().unwrap().is_empty());
    }

    #[test]
    fn test_out_of_range_index_keeps_reference() {
        let state = Arc::new(NavigationState::new(4));
        let next = state.clone().reduce(NavAction::Redirect(4));
        assert!(Arc::ptr_eq(&state, &next));
        let next = state.clone().reduce(NavAction::Hover(17));
        assert!(Arc::ptr_eq(&state, &next));
    }

    #[test]
    fn test_hover_end_restores_active_page() {
        let (_, controller) = controller();
        controller.activate_link(1);
        controller.hover(3);
        assert_eq!(controller.state().hover_index, 3);
        controller.hover_end();
        assert_eq!(controller.state().hover_index, 1);
    }

    #[test]
    fn test_escape_closes_topmost_overlay_first() {
        let (_, controller) = controller();
        controller.toggle_sidebar(true);
        controller.toggle_dropdown(true);

        assert_eq!(controller.escape(), Some(Overlay::Dropdown));
        let state = controller.state();
        assert!(!state.is_dropdown_open);
        assert!(state.is_sidebar_open);
        assert!(state.is_modal_open);

        assert_eq!(controller.escape(), Some(Overlay::Sidebar));
        let state = controller.state();
        assert!(!state.is_sidebar_open);
        assert!(!state.is_modal_open);
        assert_eq!(controller.escape(), None);
        assert!(controller.state().overlay_stack.is_empty());
    }

    #[test]
    fn test_sidebar_brings_backdrop_with_it() {
        let (_, controller) = controller();
        controller.toggle_sidebar(true);
        let state = controller.state();
        assert!(state.is_sidebar_open && state.is_modal_open);
        assert_eq!(state.overlay_stack, vec![Overlay::Sidebar]);

        controller.toggle_sidebar(false);
        assert!(!controller.state().is_modal_open);
    }

    #[test]
    fn test_backdrop_click_closes_sidebar() {
        let (_, controller) = controller();
        controller.toggle_sidebar(true);
        controller.toggle_dropdown(true);
        controller.click_backdrop();

        let state = controller.state();
        assert!(!state.is_sidebar_open);
        assert!(!state.is_modal_open);
        assert!(state.is_dropdown_open);
        assert_eq!(state.overlay_stack, vec![Overlay::Dropdown]);
    }

    #[test]
    fn test_modal_keeps_backdrop_after_sidebar_closes() {
        let (_, controller) = controller();
        controller.toggle_modal(true);
        controller.toggle_sidebar(true);
        controller.activate_link(1);

        let state = controller.state();
        assert!(!state.is_sidebar_open);
        assert!(state.is_modal_open);
        assert_eq!(state.overlay_stack, vec![Overlay::Modal]);
    }

    #[test]
    fn test_reopening_overlay_moves_it_to_top() {
        let state = Arc::new(NavigationState::new(4))
            .reduce(NavAction::ToggleDropdown(true))
            .reduce(NavAction::ToggleModal(true))
            .reduce(NavAction::ToggleDropdown(true));
        assert_eq!(state.overlay_stack, vec![Overlay::Modal, Overlay::Dropdown]);
    }

    #[test]
    fn test_click_outside_only_closes_dropdown() {
        let (_, controller) = controller();
        controller.toggle_modal(true);
        controller.toggle_dropdown(true);
        controller.click_outside_profile();

        let state = controller.state();
        assert!(!state.is_dropdown_open);
        assert!(state.is_modal_open);

        let before = controller.state();
        controller.click_outside_profile();
        assert!(Arc::ptr_eq(&before, &controller.state()));
    }

    #[test]
    fn test_flag_and_stack_agree_after_escape() {
        let state = Arc::new(NavigationState::new(4))
            .reduce(NavAction::ToggleSidebar(true))
            .reduce(NavAction::Escape);
        assert!(!state.is_sidebar_open);
        assert_eq!(state.topmost_overlay(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_message_lands_in_navigation_state() {
        let (_, controller) = controller();
        controller.show_message("Profile saved", Severity::Info);
        assert!(controller.state().notification.visible);

        tokio::time::sleep(std::time::Duration::from_millis(3001)).await;
        assert!(!controller.state().notification.visible);
    }

    fn nav_action(pages: usize) -> impl Strategy<Value = NavAction> {
        prop_oneof![
            (0..pages).prop_map(NavAction::Redirect),
            (0..pages).prop_map(NavAction::Hover),
            Just(NavAction::HoverEnd),
            any::<bool>().prop_map(NavAction::ToggleDropdown),
            any::<bool>().prop_map(NavAction::ToggleSidebar),
            any::<bool>().prop_map(NavAction::ToggleModal),
            Just(NavAction::Escape),
            Just(NavAction::ClickBackdrop),
        ]
    }

    proptest! {
        #[test]
        fn hover_end_always_restores_current_page(
            actions in prop::collection::vec(nav_action(4), 0..32),
            last_hover in 0usize..4,
        ) {
            let mut state = Arc::new(NavigationState::new(4));
            for action in actions {
                state = state.reduce(action);
            }
            state = state.reduce(NavAction::Hover(last_hover)).reduce(NavAction::HoverEnd);
            prop_assert_eq!(state.hover_index, state.current_page_index);
        }

        #[test]
        fn backdrop_follows_sidebar_and_modal(actions in prop::collection::vec(nav_action(4), 0..32)) {
            let mut state = Arc::new(NavigationState::new(4));
            for action in actions {
                state = state.reduce(action);
                let modal = state.overlay_stack.contains(&Overlay::Modal);
                prop_assert_eq!(state.is_modal_open, state.is_sidebar_open || modal);
                prop_assert_eq!(state.is_sidebar_open, state.overlay_stack.contains(&Overlay::Sidebar));
            }
        }
    }
}
