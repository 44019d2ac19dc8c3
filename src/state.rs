//! Observable holder for an [`OperationState`].
//!
//! Each controller owns one cell per tracked activity. Readers either poll
//! [`StateCell::get`] or `subscribe()` and await changes on the returned
//! `watch::Receiver`.

use thiserror::Error;
use tokio::sync::watch;
use tracing::warn;

use crate::model::OperationState;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("invalid transition {from} -> {to}")]
    InvalidTransition {
        from: OperationState,
        to: OperationState,
    },
}

#[derive(Debug)]
pub struct StateCell {
    name: &'static str,
    tx: watch::Sender<OperationState>,
}

impl StateCell {
    pub fn new(name: &'static str) -> Self {
        let (tx, _rx) = watch::channel(OperationState::NotStarted);
        Self { name, tx }
    }

    pub fn get(&self) -> OperationState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<OperationState> {
        self.tx.subscribe()
    }

    /// Move to `next` if the transition is legal; observers are notified only
    /// on success.
    pub fn transition(&self, next: OperationState) -> Result<(), StateError> {
        let mut result = Ok(());
        self.tx.send_if_modified(|current| {
            if current.can_transition_to(next) {
                *current = next;
                true
            } else {
                result = Err(StateError::InvalidTransition {
                    from: *current,
                    to: next,
                });
                false
            }
        });
        if let Err(err) = &result {
            warn!(state = self.name, %err, "rejected state transition");
        }
        result
    }

    // Controllers drive these; a rejected move is already logged by
    // `transition` and leaves the state as it was.

    pub fn begin(&self) {
        let _ = self.transition(OperationState::Loading);
    }

    pub fn succeed(&self) {
        let _ = self.transition(OperationState::Success);
    }

    pub fn fail(&self) {
        let _ = self.transition(OperationState::Failure);
    }
}
