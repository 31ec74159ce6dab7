//! Declaration errors for state machine definitions.

use crate::core::{EventId, StateId};
use thiserror::Error;

/// A single problem found while checking declarations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DeclarationViolation {
    #[error("State '{state}' is declared more than once")]
    DuplicateState { state: StateId },

    #[error("Event '{event}' is declared more than once")]
    DuplicateEvent { event: EventId },

    #[error("States '{first}' and '{second}' are both marked initial")]
    MultipleInitialStates { first: StateId, second: StateId },

    #[error("Event '{event}' references undeclared state '{state}'")]
    UndeclaredTransitionState { event: EventId, state: StateId },

    #[error("Initial state '{state}' is not declared")]
    UndeclaredInitialState { state: StateId },

    #[error("Backing column name is empty")]
    EmptyColumn,
}

/// Malformed declaration, raised when a definition is built.
///
/// Carries every violation found, not only the first one.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Invalid state machine definition: {}", summarize(.violations))]
pub struct DefinitionError {
    violations: Vec<DeclarationViolation>,
}

impl DefinitionError {
    pub(crate) fn new(violations: Vec<DeclarationViolation>) -> Self {
        Self { violations }
    }

    pub fn violations(&self) -> &[DeclarationViolation] {
        &self.violations
    }
}

fn summarize(violations: &[DeclarationViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
