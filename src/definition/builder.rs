//! Builders for declaring state machines.

use crate::core::{Callback, Event, EventId, FromStates, Guard, StateDef, StateId, StateOptions, Transition};
use crate::definition::error::{DeclarationViolation, DefinitionError};
use crate::definition::machine::{InitialState, StateMachineDefinition};
use crate::definition::options::MachineOptions;
use serde_json::Value;
use std::collections::HashSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::debug;

type Check = Validation<(), NonEmptyVec<DeclarationViolation>>;

/// Builder for a single transition.
///
/// A transition always has a target, so the builder starts from it. Without
/// any `from` call the transition matches every current state.
pub struct TransitionBuilder<H> {
    to: StateId,
    from: Vec<StateId>,
    guard: Option<Guard<H>>,
    before: Option<Callback<H>>,
    after: Option<Callback<H>>,
}

impl<H> TransitionBuilder<H> {
    /// Start a transition into `state`.
    pub fn to(state: impl Into<StateId>) -> Self {
        Self {
            to: state.into(),
            from: Vec::new(),
            guard: None,
            before: None,
            after: None,
        }
    }

    /// Add a source state. Call repeatedly for several sources.
    pub fn from(mut self, state: impl Into<StateId>) -> Self {
        self.from.push(state.into());
        self
    }

    /// Add several source states at once.
    pub fn from_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<StateId>,
    {
        self.from.extend(states.into_iter().map(Into::into));
        self
    }

    /// Add a guard (optional).
    pub fn guard(mut self, guard: Guard<H>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Add a guard using a closure (optional).
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&H, &[Value]) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::new(predicate));
        self
    }

    /// Run `action` once the transition is selected, before anything is written.
    pub fn before<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut H, &[Value]) + Send + Sync + 'static,
    {
        self.before = Some(Callback::new(action));
        self
    }

    /// Run `action` after the new state has been written.
    pub fn after<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut H, &[Value]) + Send + Sync + 'static,
    {
        self.after = Some(Callback::new(action));
        self
    }

    fn build(self) -> Transition<H> {
        let from = if self.from.is_empty() {
            FromStates::Any
        } else {
            FromStates::States(self.from)
        };

        Transition {
            from,
            to: self.to,
            guard: self.guard,
            before: self.before,
            after: self.after,
        }
    }
}

/// Collects the transitions of one event, in declaration order.
pub struct EventBuilder<H> {
    transitions: Vec<Transition<H>>,
}

impl<H> EventBuilder<H> {
    fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    pub fn transition(mut self, transition: TransitionBuilder<H>) -> Self {
        self.transitions.push(transition.build());
        self
    }
}

/// Builder for constructing state machine definitions with a fluent API.
///
/// # Example
///
/// ```rust
/// use statekeeper::definition::{DefinitionBuilder, TransitionBuilder};
///
/// struct Worker {
///     state: Option<String>,
/// }
///
/// let definition = DefinitionBuilder::<Worker>::new()
///     .column("status")
///     .initial("sleeping")
///     .state("running")
///     .event("run", |e| e.transition(TransitionBuilder::to("running").from("sleeping")))
///     .event("sleep", |e| e.transition(TransitionBuilder::to("sleeping").from("running")))
///     .build()
///     .unwrap();
///
/// assert_eq!(definition.column(), "status");
/// assert_eq!(definition.states().len(), 2);
/// assert!(definition.event("run").is_some());
/// ```
pub struct DefinitionBuilder<H> {
    states: Vec<StateDef<H>>,
    events: Vec<Event<H>>,
    column: Option<String>,
    initial: Option<InitialState<H>>,
    options: MachineOptions,
}

impl<H> DefinitionBuilder<H> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            events: Vec::new(),
            column: None,
            initial: None,
            options: MachineOptions::default(),
        }
    }

    /// Start from everything an existing definition declares.
    ///
    /// The column, options and explicit initial rule carry over, so a derived
    /// model only has to declare what it adds.
    pub fn extending(parent: &StateMachineDefinition<H>) -> Self {
        Self {
            states: parent.states.clone(),
            events: parent.events.clone(),
            column: Some(parent.column.clone()),
            initial: parent.declared_initial.clone(),
            options: parent.options.clone(),
        }
    }

    /// Declare a state.
    pub fn state(self, id: impl Into<StateId>) -> Self {
        self.state_with(id, StateOptions::new())
    }

    /// Declare a state flagged as initial.
    pub fn initial(self, id: impl Into<StateId>) -> Self {
        self.state_with(id, StateOptions::new().initial())
    }

    /// Declare a state with options.
    pub fn state_with(mut self, id: impl Into<StateId>, options: StateOptions<H>) -> Self {
        self.states.push(StateDef::new(id.into(), options));
        self
    }

    /// Declare an event and its transitions.
    pub fn event<F>(mut self, id: impl Into<EventId>, declare: F) -> Self
    where
        F: FnOnce(EventBuilder<H>) -> EventBuilder<H>,
    {
        let transitions = declare(EventBuilder::new()).transitions;
        self.events.push(Event::new(id.into(), transitions));
        self
    }

    /// Set the backing column. Overrides `options.column`.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Set an explicit initial-state rule, overriding any flagged state.
    pub fn initial_state(mut self, rule: impl Into<InitialState<H>>) -> Self {
        self.initial = Some(rule.into());
        self
    }

    /// Derive the initial state from the record itself.
    pub fn initial_state_with<F>(self, rule: F) -> Self
    where
        F: Fn(&H) -> StateId + Send + Sync + 'static,
    {
        self.initial_state(InitialState::dynamic(rule))
    }

    pub fn options(mut self, options: MachineOptions) -> Self {
        self.options = options;
        self
    }

    /// Check every declaration and build the definition.
    ///
    /// All violations are collected before failing, so a single error lists
    /// every problem in the declaration.
    pub fn build(self) -> Result<StateMachineDefinition<H>, DefinitionError> {
        let column = self
            .column
            .clone()
            .unwrap_or_else(|| self.options.column.clone());

        let mut checks = vec![check_column(&column)];
        checks.extend(self.check_unique_states());
        checks.extend(self.check_unique_events());
        checks.extend(self.check_transition_states());
        checks.extend(self.check_initial());

        if let Validation::Failure(errors) = Validation::all_vec(checks) {
            return Err(DefinitionError::new(errors.iter().cloned().collect()));
        }

        let initial = self.resolve_initial();
        let mut options = self.options;
        options.column = column.clone();

        debug!(
            states = self.states.len(),
            events = self.events.len(),
            column = %column,
            "State machine definition built"
        );

        Ok(StateMachineDefinition {
            states: self.states,
            events: self.events,
            column,
            declared_initial: self.initial,
            initial,
            options,
        })
    }

    fn check_unique_states(&self) -> Vec<Check> {
        let mut seen = HashSet::new();
        self.states
            .iter()
            .map(|state| {
                if seen.insert(state.id().clone()) {
                    Validation::success(())
                } else {
                    Validation::fail(DeclarationViolation::DuplicateState {
                        state: state.id().clone(),
                    })
                }
            })
            .collect()
    }

    fn check_unique_events(&self) -> Vec<Check> {
        let mut seen = HashSet::new();
        self.events
            .iter()
            .map(|event| {
                if seen.insert(event.id().clone()) {
                    Validation::success(())
                } else {
                    Validation::fail(DeclarationViolation::DuplicateEvent {
                        event: event.id().clone(),
                    })
                }
            })
            .collect()
    }

    fn check_transition_states(&self) -> Vec<Check> {
        let mut checks = Vec::new();
        for event in &self.events {
            for transition in event.transitions() {
                let sources = match &transition.from {
                    FromStates::Any => &[][..],
                    FromStates::States(states) => states.as_slice(),
                };
                for state in sources.iter().chain(std::iter::once(&transition.to)) {
                    checks.push(if self.declares(state) {
                        Validation::success(())
                    } else {
                        Validation::fail(DeclarationViolation::UndeclaredTransitionState {
                            event: event.id().clone(),
                            state: state.clone(),
                        })
                    });
                }
            }
        }
        checks
    }

    fn check_initial(&self) -> Vec<Check> {
        match &self.initial {
            // A literal rule must name a declared state; flags no longer matter.
            Some(InitialState::Literal(state)) => vec![if self.declares(state) {
                Validation::success(())
            } else {
                Validation::fail(DeclarationViolation::UndeclaredInitialState {
                    state: state.clone(),
                })
            }],
            Some(InitialState::Dynamic(_)) => Vec::new(),
            None => {
                let mut flagged = self.states.iter().filter(|s| s.is_initial());
                let Some(first) = flagged.next() else {
                    return Vec::new();
                };
                flagged
                    .map(|second| {
                        Validation::fail(DeclarationViolation::MultipleInitialStates {
                            first: first.id().clone(),
                            second: second.id().clone(),
                        })
                    })
                    .collect()
            }
        }
    }

    fn declares(&self, state: &StateId) -> bool {
        self.states.iter().any(|s| s.id() == state)
    }

    fn resolve_initial(&self) -> Option<InitialState<H>> {
        if let Some(rule) = &self.initial {
            return Some(rule.clone());
        }

        self.states
            .iter()
            .find(|s| s.is_initial())
            .or_else(|| self.states.first())
            .map(|s| InitialState::Literal(s.id().clone()))
    }
}

impl<H> Default for DefinitionBuilder<H> {
    fn default() -> Self {
        Self::new()
    }
}

fn check_column(column: &str) -> Check {
    if column.trim().is_empty() {
        Validation::fail(DeclarationViolation::EmptyColumn)
    } else {
        Validation::success(())
    }
}
