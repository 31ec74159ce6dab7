//! Driving a definition against a concrete record.
//!
//! A [`MachineInstance`] resolves the current state of its host, fires
//! events, and materializes the initial state before the host is created.
//!
//! # Firing
//!
//! - [`MachineInstance::fire`] writes the new state in memory and reports a
//!   missing transition as `false`.
//! - [`MachineInstance::fire_persisted`] writes durably through the adapter
//!   and reports a missing transition as [`FireError::FailedTransition`].
//!
//! When a durable write is rejected the backing field is restored to its
//! previous value and the call returns `Ok(false)`.

mod error;
mod instance;

pub use error::{FireError, LifecycleError};
pub use instance::MachineInstance;
