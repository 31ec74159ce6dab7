//! Errors raised while driving a machine instance.

use crate::core::{EventId, StateId};
use thiserror::Error;

/// Errors from the persisted firing path.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FireError {
    /// No transition of the event matches the current state and arguments
    #[error("Event '{event}' cannot fire from state {}", describe(.from))]
    FailedTransition {
        event: EventId,
        from: Option<StateId>,
    },

    #[error("Event '{event}' is not declared")]
    UnknownEvent { event: EventId },
}

/// Errors from the pre-create hook.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LifecycleError {
    /// The initial-state rule produced a state the definition does not declare
    #[error("Initial state '{state}' is not declared")]
    UndeclaredInitialState { state: StateId },
}

fn describe(state: &Option<StateId>) -> String {
    match state {
        Some(state) => format!("'{state}'"),
        None => "<none>".to_string(),
    }
}
