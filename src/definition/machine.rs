//! Immutable state machine definition shared by every instance of a model.

use crate::core::{Event, EventId, StateDef, StateId};
use crate::definition::options::MachineOptions;
use std::fmt;
use std::sync::Arc;

/// Rule that yields the state of a freshly created record.
pub enum InitialState<H> {
    /// Always the same state
    Literal(StateId),
    /// Computed from the record's own data
    Dynamic(Arc<dyn Fn(&H) -> StateId + Send + Sync>),
}

impl<H> InitialState<H> {
    pub fn literal(state: impl Into<StateId>) -> Self {
        Self::Literal(state.into())
    }

    pub fn dynamic<F>(rule: F) -> Self
    where
        F: Fn(&H) -> StateId + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(rule))
    }

    /// Evaluate the rule against a record.
    pub fn resolve(&self, host: &H) -> StateId {
        match self {
            Self::Literal(state) => state.clone(),
            Self::Dynamic(rule) => (**rule)(host),
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }
}

impl<H> Clone for InitialState<H> {
    fn clone(&self) -> Self {
        match self {
            Self::Literal(state) => Self::Literal(state.clone()),
            Self::Dynamic(rule) => Self::Dynamic(Arc::clone(rule)),
        }
    }
}

impl<H> fmt::Debug for InitialState<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(state) => f.debug_tuple("Literal").field(state).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic"),
        }
    }
}

impl<H> From<&str> for InitialState<H> {
    fn from(state: &str) -> Self {
        Self::literal(state)
    }
}

impl<H> From<StateId> for InitialState<H> {
    fn from(state: StateId) -> Self {
        Self::Literal(state)
    }
}

/// States, events, initial-state rule and backing column of one model.
///
/// Built once through [`DefinitionBuilder`](crate::definition::DefinitionBuilder)
/// and never mutated afterwards, so it can be shared behind an `Arc` by all
/// instances of the model.
pub struct StateMachineDefinition<H> {
    pub(crate) states: Vec<StateDef<H>>,
    pub(crate) events: Vec<Event<H>>,
    pub(crate) column: String,
    /// Rule set explicitly at declaration, if any
    pub(crate) declared_initial: Option<InitialState<H>>,
    /// Rule actually used: explicit, flagged state, or first state
    pub(crate) initial: Option<InitialState<H>>,
    pub(crate) options: MachineOptions,
}

impl<H> StateMachineDefinition<H> {
    /// Declared states in declaration order.
    pub fn states(&self) -> &[StateDef<H>] {
        &self.states
    }

    pub fn state_ids(&self) -> impl Iterator<Item = &StateId> {
        self.states.iter().map(StateDef::id)
    }

    pub fn state(&self, id: &str) -> Option<&StateDef<H>> {
        self.states.iter().find(|s| s.id() == id)
    }

    pub fn has_state(&self, id: &str) -> bool {
        self.state(id).is_some()
    }

    /// Declared events in declaration order.
    pub fn events(&self) -> &[Event<H>] {
        &self.events
    }

    pub fn event_ids(&self) -> impl Iterator<Item = &EventId> {
        self.events.iter().map(Event::id)
    }

    pub fn event(&self, id: &str) -> Option<&Event<H>> {
        self.events.iter().find(|e| e.id() == id)
    }

    /// Name of the record field backing the current state.
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn options(&self) -> &MachineOptions {
        &self.options
    }

    /// The rule used to derive the state of a new record.
    pub fn initial_rule(&self) -> Option<&InitialState<H>> {
        self.initial.as_ref()
    }

    /// Initial state for this record, or `None` when nothing is declared.
    pub fn initial_state_for(&self, host: &H) -> Option<StateId> {
        self.initial.as_ref().map(|rule| rule.resolve(host))
    }
}

impl<H> fmt::Debug for StateMachineDefinition<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachineDefinition")
            .field("states", &self.states)
            .field("events", &self.events)
            .field("column", &self.column)
            .field("initial", &self.initial)
            .finish()
    }
}
