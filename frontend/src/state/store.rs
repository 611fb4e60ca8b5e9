use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::reducer::Reducible;

/// Shared handle to one reducer-driven state.
///
/// Cloning the handle shares the state. Dispatches are applied one at a time
/// in call order; readers get the current `Arc` snapshot.
pub struct Store<R: Reducible> {
    current: Arc<Mutex<Arc<R>>>,
}

impl<R: Reducible> Clone for Store<R> {
    fn clone(&self) -> Self {
        Self {
            current: self.current.clone(),
        }
    }
}

impl<R: Reducible> Store<R> {
    pub fn new(initial: R) -> Self {
        Self {
            current: Arc::new(Mutex::new(Arc::new(initial))),
        }
    }

    /// Current state snapshot
    pub fn state(&self) -> Arc<R> {
        self.lock().clone()
    }

    /// Apply an action. Returns `true` when the state reference changed.
    pub fn dispatch(&self, action: R::Action) -> bool {
        let mut current = self.lock();
        let next = current.clone().reduce(action);
        if Arc::ptr_eq(&current, &next) {
            false
        } else {
            *current = next;
            true
        }
    }

    /// Replace the state wholesale, e.g. when a dialog is reopened
    pub fn replace(&self, state: R) {
        *self.lock() = Arc::new(state);
    }

    /// Apply an action given in the string-keyed `{ "type": ..., "value": ... }`
    /// form. `payload` is accepted in place of `value`. An unknown type or a
    /// malformed value leaves the state untouched.
    pub fn dispatch_json(&self, message: &Value) -> bool
    where
        R::Action: DeserializeOwned,
    {
        let mut message = message.clone();
        if let Some(fields) = message.as_object_mut() {
            if !fields.contains_key("value") {
                if let Some(payload) = fields.remove("payload") {
                    fields.insert("value".to_string(), payload);
                }
            }
        }

        match serde_json::from_value::<R::Action>(message) {
            Ok(action) => self.dispatch(action),
            Err(e) => {
                warn!("Ignoring action: {}", e);
                false
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Arc<R>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R: Reducible + fmt::Debug> fmt::Debug for Store<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Store").field(&*self.state()).finish()
    }
}

impl<R: Reducible + Default> Default for Store<R> {
    fn default() -> Self {
        debug!("Creating store with default state");
        Self::new(R::default())
    }
}
