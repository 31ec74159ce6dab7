//! Registration errors.

use crate::definition::DefinitionError;
use thiserror::Error;

/// Errors that can occur when attaching machines and scopes to models.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistryError {
    #[error("Model {model} already has a state machine")]
    AlreadyRegistered { model: &'static str },

    #[error("Model {model} inherits from {parent}, which has no state machine")]
    UnknownParent {
        model: &'static str,
        parent: &'static str,
    },

    #[error("Model {model} has no state machine")]
    NotRegistered { model: &'static str },

    #[error("Scope {name} is already defined on {model}")]
    DuplicateScope { model: &'static str, name: String },

    /// Entry stored under the model does not match its host type.
    ///
    /// Entries are only ever written under `TypeId::of::<M>()` with
    /// `M::Host`, so this is unreachable through the builder API. It is the
    /// error form of the failed downcast in the type-erased table.
    #[error("Model {model} is registered with a different host type")]
    HostMismatch { model: &'static str },

    #[error(transparent)]
    Definition(#[from] DefinitionError),
}
