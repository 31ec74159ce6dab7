//! Events and the transitions they own.

use super::guard::{Callback, Guard};
use super::id::{EventId, StateId};
use serde_json::Value;
use std::fmt;

/// Source side of a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FromStates {
    /// Matches whatever the current state is, including no state at all.
    Any,
    /// Matches when the current state is one of these.
    States(Vec<StateId>),
}

impl FromStates {
    pub fn includes(&self, current: Option<&StateId>) -> bool {
        match self {
            Self::Any => true,
            Self::States(states) => current.is_some_and(|c| states.contains(c)),
        }
    }
}

/// A move to a single target state, owned by exactly one event.
pub struct Transition<H> {
    pub from: FromStates,
    pub to: StateId,
    pub guard: Option<Guard<H>>,
    pub before: Option<Callback<H>>,
    pub after: Option<Callback<H>>,
}

impl<H> Transition<H> {
    /// Check if this transition can fire from the current state (pure).
    pub fn can_fire(&self, current: Option<&StateId>, host: &H, args: &[Value]) -> bool {
        if !self.from.includes(current) {
            return false;
        }

        self.guard.as_ref().is_none_or(|g| g.check(host, args))
    }
}

impl<H> Clone for Transition<H> {
    fn clone(&self) -> Self {
        Self {
            from: self.from.clone(),
            to: self.to.clone(),
            guard: self.guard.clone(),
            before: self.before.clone(),
            after: self.after.clone(),
        }
    }
}

impl<H> fmt::Debug for Transition<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("guarded", &self.guard.is_some())
            .finish_non_exhaustive()
    }
}

/// A named event with its transitions in declaration order.
pub struct Event<H> {
    id: EventId,
    transitions: Vec<Transition<H>>,
}

impl<H> Event<H> {
    pub(crate) fn new(id: EventId, transitions: Vec<Transition<H>>) -> Self {
        Self { id, transitions }
    }

    pub fn id(&self) -> &EventId {
        &self.id
    }

    pub fn transitions(&self) -> &[Transition<H>] {
        &self.transitions
    }

    /// First transition, in declaration order, that can fire.
    pub fn select(&self, current: Option<&StateId>, host: &H, args: &[Value]) -> Option<&Transition<H>> {
        self.transitions
            .iter()
            .find(|t| t.can_fire(current, host, args))
    }
}

impl<H> Clone for Event<H> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            transitions: self.transitions.clone(),
        }
    }
}

impl<H> fmt::Debug for Event<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.id)
            .field("transitions", &self.transitions)
            .finish()
    }
}
