//! # Notification Module
//!
//! Transient status messages with optional auto-dismiss.
//!
//! ## Responsibilities:
//! - The single visible message (last write wins, nothing is buffered)
//! - One cancellable auto-clear timer per queue
//! - Cancel-and-replace on every new message so an old timer can never clear
//!   a newer message
//!
//! The queue does not own the message state itself. It writes through a
//! [`NotificationSink`], normally the [`Store`] of the screen that renders the
//! message, which dispatches the machine's `ToggleMessage` action.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::reducer::Reducible;
use super::store::Store;
pub use shared::Severity;

/// The message currently shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NotificationState {
    pub severity: Severity,
    pub message: String,
    pub visible: bool,
}

impl NotificationState {
    pub fn hidden() -> Self {
        Self::default()
    }

    pub fn shown(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            severity,
            message: message.into(),
            visible: true,
        }
    }
}

/// Destination for notification state changes
pub trait NotificationSink: Send + Sync + 'static {
    fn apply(&self, notification: NotificationState);
}

impl<R> NotificationSink for Store<R>
where
    R: Reducible + Send + Sync + 'static,
    R::Action: From<NotificationState>,
{
    fn apply(&self, notification: NotificationState) {
        self.dispatch(R::Action::from(notification));
    }
}

#[derive(Default)]
struct TimerSlot {
    /// Bumped by every show/clear; a timer only fires for its own generation
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

/// Shows one message at a time and owns its auto-clear timer.
///
/// Dropping the queue cancels the pending timer.
pub struct NotificationQueue {
    sink: Arc<dyn NotificationSink>,
    timer: Arc<Mutex<TimerSlot>>,
}

impl NotificationQueue {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            sink,
            timer: Arc::new(Mutex::new(TimerSlot::default())),
        }
    }

    /// Show `message`. With no duration (or a zero one) the message stays until
    /// cleared or replaced; otherwise it is cleared after `duration`.
    pub fn show(&self, message: impl Into<String>, severity: Severity, duration: Option<Duration>) {
        let message = message.into();
        let mut slot = self.lock();
        let generation = Self::invalidate(&mut slot);

        debug!("Showing {} message: {}", severity, message);
        self.sink.apply(NotificationState::shown(message, severity));

        let Some(duration) = duration.filter(|d| !d.is_zero()) else {
            return;
        };

        match Handle::try_current() {
            Ok(runtime) => {
                let sink = self.sink.clone();
                let timer = Arc::downgrade(&self.timer);
                slot.handle = Some(runtime.spawn(auto_clear(timer, sink, generation, duration)));
            }
            Err(_) => warn!("No async runtime available; message will persist until cleared"),
        }
    }

    /// Show a message that clears itself after `millis` milliseconds
    pub fn flash(&self, message: impl Into<String>, severity: Severity, millis: u64) {
        self.show(message, severity, Some(Duration::from_millis(millis)));
    }

    /// Hide the current message now
    pub fn clear(&self) {
        let mut slot = self.lock();
        Self::invalidate(&mut slot);
        self.sink.apply(NotificationState::hidden());
    }

    /// Drop the pending auto-clear, leaving the current message as is
    pub fn cancel_pending(&self) {
        let mut slot = self.lock();
        Self::invalidate(&mut slot);
    }

    pub fn has_pending_clear(&self) -> bool {
        self.lock()
            .handle
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }

    fn invalidate(slot: &mut TimerSlot) -> u64 {
        slot.generation += 1;
        if let Some(handle) = slot.handle.take() {
            handle.abort();
        }
        slot.generation
    }

    fn lock(&self) -> MutexGuard<'_, TimerSlot> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for NotificationQueue {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

async fn auto_clear(
    timer: Weak<Mutex<TimerSlot>>,
    sink: Arc<dyn NotificationSink>,
    generation: u64,
    duration: Duration,
) {
    tokio::time::sleep(duration).await;

    let Some(timer) = timer.upgrade() else {
        return;
    };
    let mut slot = timer.lock().unwrap_or_else(PoisonError::into_inner);
    if slot.generation != generation {
        return;
    }
    slot.handle = None;
    sink.apply(NotificationState::hidden());
    debug!("Auto-cleared message after {:?}", duration);
}
