//! Runtime binding of a definition to one host record.

use crate::core::{EventId, StateDef, StateHistory, StateId, StateTransition};
use crate::definition::StateMachineDefinition;
use crate::machine::error::{FireError, LifecycleError};
use crate::persistence::{DefaultAdapter, PersistenceAdapter, Record};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WriteMode {
    Durable,
    InMemory,
}

/// A host record driven by a shared definition.
///
/// The instance owns its host and the adapter chosen for it. Apart from the
/// recorded history it keeps a single flag remembering whether the initial
/// state has been ensured; the current state always lives in the host.
///
/// Not meant for concurrent firing: wrap it in a lock if several threads
/// drive the same record.
pub struct MachineInstance<H, A = DefaultAdapter> {
    definition: Arc<StateMachineDefinition<H>>,
    host: H,
    adapter: A,
    initial_ensured: bool,
    history: StateHistory,
}

impl<H: Record> MachineInstance<H, DefaultAdapter> {
    /// Bind a host using plain field access for persistence.
    pub fn new(definition: Arc<StateMachineDefinition<H>>, host: H) -> Self {
        Self::with_adapter(definition, host, DefaultAdapter)
    }
}

impl<H: Record, A: PersistenceAdapter<H>> MachineInstance<H, A> {
    pub fn with_adapter(definition: Arc<StateMachineDefinition<H>>, host: H, adapter: A) -> Self {
        Self {
            definition,
            host,
            adapter,
            initial_ensured: false,
            history: StateHistory::new(),
        }
    }

    pub fn definition(&self) -> &Arc<StateMachineDefinition<H>> {
        &self.definition
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    /// Hand over the recorded history and start a fresh one.
    pub fn take_history(&mut self) -> StateHistory {
        std::mem::take(&mut self.history)
    }

    /// Resolve the current state.
    ///
    /// A new record with an unset or empty field reports the initial state.
    /// Anything else is read through the adapter, so an existing record with
    /// an empty field has no state.
    pub fn current_state(&self) -> Option<StateId> {
        let column = self.definition.column();

        if self.host.is_new_record() {
            let raw = self.host.read_attribute(column);
            if raw.as_deref().is_none_or(str::is_empty) {
                return self.definition.initial_state_for(&self.host);
            }
        }

        self.adapter.read_state(&self.host, column)
    }

    pub fn is_in(&self, state: &str) -> bool {
        self.current_state().is_some_and(|current| current == state)
    }

    /// Whether `event` has a transition that could fire right now.
    pub fn may_fire(&self, event: &str, args: &[Value]) -> bool {
        let Some(event) = self.definition.event(event) else {
            return false;
        };
        let current = self.current_state();
        event.select(current.as_ref(), &self.host, args).is_some()
    }

    /// Events that could fire from the current state, in declaration order.
    pub fn permitted_events(&self, args: &[Value]) -> Vec<EventId> {
        let current = self.current_state();
        self.definition
            .events()
            .iter()
            .filter(|event| event.select(current.as_ref(), &self.host, args).is_some())
            .map(|event| event.id().clone())
            .collect()
    }

    /// Fire an event, writing the new state in memory only.
    ///
    /// Returns `false` when no transition matches or the event is unknown;
    /// nothing is mutated in that case.
    pub fn fire(&mut self, event: &str, args: &[Value]) -> bool {
        match self.run(event, args, WriteMode::InMemory) {
            Ok(fired) => fired,
            Err(err) => {
                trace!(%err, "Event not fired");
                false
            }
        }
    }

    /// Fire an event and write the new state durably.
    ///
    /// `Ok(false)` means the adapter rejected the write; the field is then
    /// restored to its previous value. A missing transition is an error
    /// unless the definition turns off `whiny_transitions`.
    pub fn fire_persisted(&mut self, event: &str, args: &[Value]) -> Result<bool, FireError> {
        match self.run(event, args, WriteMode::Durable) {
            Err(FireError::FailedTransition { .. })
                if !self.definition.options().whiny_transitions =>
            {
                Ok(false)
            }
            other => other,
        }
    }

    /// Pre-create hook: materialize the initial state into the backing field.
    ///
    /// Runs once, and only while the record is new. A field that already
    /// holds a value is left alone. Returns whether the hook ran. A failed
    /// hook is not remembered, so the next call runs it again.
    pub fn before_create(&mut self) -> Result<bool, LifecycleError> {
        if self.initial_ensured || !self.host.is_new_record() {
            return Ok(false);
        }
        self.ensure_initial_state()?;
        self.initial_ensured = true;
        Ok(true)
    }

    pub fn initial_state_ensured(&self) -> bool {
        self.initial_ensured
    }

    fn ensure_initial_state(&mut self) -> Result<(), LifecycleError> {
        let definition = Arc::clone(&self.definition);
        let column = definition.column();

        let raw = self.host.read_attribute(column);
        if raw.as_deref().is_some_and(|value| !value.is_empty()) {
            return Ok(());
        }

        let Some(state) = definition.initial_state_for(&self.host) else {
            return Ok(());
        };

        if !definition.has_state(state.as_str()) {
            warn!(%state, "Initial state rule produced an undeclared state");
            return Err(LifecycleError::UndeclaredInitialState { state });
        }

        self.adapter
            .write_state_without_persistence(&mut self.host, column, &state);
        debug!(%state, column, "Initial state ensured");
        Ok(())
    }

    fn run(&mut self, event_id: &str, args: &[Value], mode: WriteMode) -> Result<bool, FireError> {
        let definition = Arc::clone(&self.definition);
        let event = definition.event(event_id).ok_or_else(|| FireError::UnknownEvent {
            event: EventId::from(event_id),
        })?;

        let from = self.current_state();
        let Some(transition) = event.select(from.as_ref(), &self.host, args) else {
            trace!(event = %event.id(), ?from, "No transition matches");
            return Err(FireError::FailedTransition {
                event: event.id().clone(),
                from,
            });
        };

        if let Some(before) = &transition.before {
            before.run(&mut self.host, args);
        }
        if let Some(exit) = from
            .as_ref()
            .and_then(|state| definition.state(state.as_str()))
            .and_then(StateDef::exit)
        {
            exit.run(&mut self.host, args);
        }

        let column = definition.column();
        let previous = self.host.read_attribute(column);
        let written = match mode {
            WriteMode::Durable => self.adapter.write_state(&mut self.host, column, &transition.to),
            WriteMode::InMemory => {
                self.adapter
                    .write_state_without_persistence(&mut self.host, column, &transition.to);
                true
            }
        };

        if !written {
            self.host.write_attribute(column, previous.as_deref());
            warn!(
                event = %event.id(),
                to = %transition.to,
                "Durable state write failed, field rolled back"
            );
            return Ok(false);
        }

        if let Some(enter) = definition.state(transition.to.as_str()).and_then(StateDef::enter) {
            enter.run(&mut self.host, args);
        }
        if let Some(after) = &transition.after {
            after.run(&mut self.host, args);
        }

        debug!(
            event = %event.id(),
            ?from,
            to = %transition.to,
            persisted = mode == WriteMode::Durable,
            "Event fired"
        );
        self.history.push(StateTransition {
            event: event.id().clone(),
            from,
            to: transition.to.clone(),
            timestamp: Utc::now(),
            persisted: mode == WriteMode::Durable,
        });

        Ok(true)
    }
}
