//! Core state machine types.
//!
//! This module contains the immutable building blocks a definition is made of:
//! - String identifiers for states and events
//! - Declared states with optional enter/exit callbacks
//! - Events owning ordered transitions with guards
//! - Immutable history of fired transitions
//!
//! Nothing in this module touches a backing store.

mod event;
mod guard;
mod history;
mod id;
mod state;

pub use event::{Event, FromStates, Transition};
pub use guard::{Callback, Guard};
pub use history::{StateHistory, StateTransition};
pub use id::{EventId, StateId};
pub use state::{StateDef, StateOptions};
