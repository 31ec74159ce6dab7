//! Statekeeper: declarative state machines bound to records
//!
//! A state machine is declared once per model type and is immutable
//! afterwards. Each record of the model carries its current state in a
//! backing field; a [`MachineInstance`] binds a record to the definition and
//! fires events against it.
//!
//! # Core Concepts
//!
//! - **Definition**: States, events and transitions, checked when built
//! - **Persistence adapter**: Optional hooks for reading and writing the state
//! - **Initial state**: Materialized on new records before they are created
//! - **Scopes**: One named record query per declared state
//! - **Registry**: Attaches definitions to model types, shared by inheritance
//!
//! # Example
//!
//! ```rust
//! use statekeeper::definition::{DefinitionBuilder, TransitionBuilder};
//! use statekeeper::machine::MachineInstance;
//! use statekeeper::persistence::Record;
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Job {
//!     state: Option<String>,
//! }
//!
//! impl Record for Job {
//!     fn is_new_record(&self) -> bool {
//!         true
//!     }
//!
//!     fn read_attribute(&self, column: &str) -> Option<String> {
//!         (column == "state").then(|| self.state.clone()).flatten()
//!     }
//!
//!     fn write_attribute(&mut self, column: &str, value: Option<&str>) {
//!         if column == "state" {
//!             self.state = value.map(str::to_string);
//!         }
//!     }
//! }
//!
//! let definition = DefinitionBuilder::new()
//!     .initial("sleeping")
//!     .state("running")
//!     .event("run", |e| e.transition(TransitionBuilder::to("running").from("sleeping")))
//!     .event("sleep", |e| e.transition(TransitionBuilder::to("sleeping").from("running")))
//!     .build()
//!     .unwrap();
//!
//! let mut job = MachineInstance::new(Arc::new(definition), Job::default());
//! assert_eq!(job.current_state().as_deref(), Some("sleeping"));
//!
//! assert!(job.fire("run", &[]));
//! assert!(job.is_in("running"));
//! assert!(!job.fire("run", &[]));
//! ```

pub mod core;
pub mod definition;
pub mod machine;
pub mod persistence;
pub mod registry;
pub mod scope;
pub mod store;

// Re-export commonly used types
pub use core::{EventId, StateHistory, StateId, StateTransition};
pub use definition::{DefinitionBuilder, DefinitionError, StateMachineDefinition, TransitionBuilder};
pub use machine::{FireError, MachineInstance};
pub use persistence::{DefaultAdapter, PersistenceAdapter, Record};
pub use registry::{Model, Registry, RegistryError};
pub use scope::{Scope, ScopeSet};
