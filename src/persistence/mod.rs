//! Contract between a machine instance and the record backing it.
//!
//! A host record only has to expose its backing field through [`Record`].
//! Reading and writing the state goes through a [`PersistenceAdapter`], whose
//! three capabilities all have default bodies: an adapter overrides exactly
//! the ones its storage needs and inherits the plain field access for the
//! rest. Which capabilities are customised is fixed per adapter type at
//! compile time.

use crate::core::StateId;

/// Raw field access on a host record.
pub trait Record {
    /// Whether the record has never been stored.
    fn is_new_record(&self) -> bool;

    /// Raw value of a field, `None` when unset.
    fn read_attribute(&self, column: &str) -> Option<String>;

    /// Assign a field in memory only.
    fn write_attribute(&mut self, column: &str, value: Option<&str>);
}

/// Optional read/write hooks between the engine and a backing store.
///
/// # Example
///
/// ```rust
/// use statekeeper::core::StateId;
/// use statekeeper::persistence::{PersistenceAdapter, Record};
///
/// struct Ticket {
///     state: Option<String>,
/// }
///
/// impl Record for Ticket {
///     fn is_new_record(&self) -> bool {
///         false
///     }
///
///     fn read_attribute(&self, _column: &str) -> Option<String> {
///         self.state.clone()
///     }
///
///     fn write_attribute(&mut self, _column: &str, value: Option<&str>) {
///         self.state = value.map(str::to_string);
///     }
/// }
///
/// /// Stores states upper-cased; writes keep the default behaviour.
/// struct UpperCase;
///
/// impl PersistenceAdapter<Ticket> for UpperCase {
///     fn read_state(&self, host: &Ticket, column: &str) -> Option<StateId> {
///         host.read_attribute(column).map(|s| StateId::from(s.to_lowercase()))
///     }
/// }
///
/// let ticket = Ticket { state: Some("OPEN".into()) };
/// assert_eq!(UpperCase.read_state(&ticket, "state"), Some(StateId::from("open")));
/// ```
pub trait PersistenceAdapter<H: Record> {
    /// Current state as stored. Empty values read as no state.
    fn read_state(&self, host: &H, column: &str) -> Option<StateId> {
        host.read_attribute(column)
            .filter(|value| !value.is_empty())
            .map(StateId::from)
    }

    /// Write the state durably. `false` means the write was rejected.
    fn write_state(&self, host: &mut H, column: &str, state: &StateId) -> bool {
        host.write_attribute(column, Some(state.as_str()));
        true
    }

    /// Write the state in memory, leaving durability to a later save.
    fn write_state_without_persistence(&self, host: &mut H, column: &str, state: &StateId) {
        host.write_attribute(column, Some(state.as_str()));
    }
}

/// Adapter using plain field access for every capability.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultAdapter;

impl<H: Record> PersistenceAdapter<H> for DefaultAdapter {}
