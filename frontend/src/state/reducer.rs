//! # Reducer Contract
//!
//! Every form, dialog and shell state in this crate is a value updated only
//! by `reduce(state, action) -> state`. Actions are closed enums, so each
//! machine handles every action it declares with an exhaustive match.
//!
//! ## Reference stability
//! A reducer that has nothing to change must hand back the `Arc` it was given.
//! Callers compare with [`Arc::ptr_eq`] to skip re-rendering, and the same
//! action dispatched twice in a row leaves the second dispatch a no-op.

use std::sync::Arc;

/// A state value that can be advanced by an action
pub trait Reducible: Sized {
    type Action;

    /// Compute the next state. Return `self` unchanged when the action has no effect.
    fn reduce(self: Arc<Self>, action: Self::Action) -> Arc<Self>;
}

/// Apply `update` to a copy of `state`, returning the original `Arc` when the
/// copy ends up equal to it
pub fn update_if_changed<S, F>(state: Arc<S>, update: F) -> Arc<S>
where
    S: Clone + PartialEq,
    F: FnOnce(&mut S),
{
    let mut next = (*state).clone();
    update(&mut next);
    if next == *state {
        state
    } else {
        Arc::new(next)
    }
}
