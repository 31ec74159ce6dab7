//! Reference store errors.

use crate::machine::LifecycleError;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when creating or saving records.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// The pre-create hook refused the record
    #[error("Pre-create hook failed: {0}")]
    Hook(#[from] LifecycleError),

    /// The record's own validation failed
    #[error("Record is invalid: {0}")]
    Invalid(String),

    #[error("Record has already been created")]
    AlreadyCreated,

    #[error("Record was not created yet")]
    NotCreated,

    #[error("Record {0} not found")]
    NotFound(Uuid),
}
