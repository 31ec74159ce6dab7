//! Declaring state machines.
//!
//! A definition is declared once per model through [`DefinitionBuilder`] and
//! is immutable afterwards. Declarations are checked when the definition is
//! built; a malformed declaration yields a [`DefinitionError`] listing every
//! violation found.

pub mod builder;
pub mod error;
pub mod machine;
pub mod options;

pub use builder::{DefinitionBuilder, EventBuilder, TransitionBuilder};
pub use error::{DeclarationViolation, DefinitionError};
pub use machine::{InitialState, StateMachineDefinition};
pub use options::{MachineOptions, DEFAULT_COLUMN};
