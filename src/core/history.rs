//! State transition history tracking.
//!
//! Provides immutable tracking of fired transitions over the life of a
//! machine instance.

use super::id::{EventId, StateId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single fired transition.
///
/// # Example
///
/// ```rust
/// use statekeeper::core::{EventId, StateId, StateTransition};
/// use chrono::Utc;
///
/// let transition = StateTransition {
///     event: EventId::from("run"),
///     from: Some(StateId::from("sleeping")),
///     to: StateId::from("running"),
///     timestamp: Utc::now(),
///     persisted: true,
/// };
/// assert_eq!(transition.to, "running");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    /// The event that fired
    pub event: EventId,
    /// The state being left; absent when the record had no state
    pub from: Option<StateId>,
    /// The state being entered
    pub to: StateId,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
    /// Whether the state was written durably
    pub persisted: bool,
}

/// Ordered history of fired transitions.
///
/// History is immutable - `record` returns a new history with the
/// transition added.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StateHistory {
    transitions: Vec<StateTransition>,
}

impl StateHistory {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Record a transition, returning a new history.
    ///
    /// # Example
    ///
    /// ```rust
    /// use statekeeper::core::{EventId, StateHistory, StateId, StateTransition};
    /// use chrono::Utc;
    ///
    /// let history = StateHistory::new();
    /// let new_history = history.record(StateTransition {
    ///     event: EventId::from("open"),
    ///     from: Some(StateId::from("closed")),
    ///     to: StateId::from("opened"),
    ///     timestamp: Utc::now(),
    ///     persisted: false,
    /// });
    ///
    /// assert_eq!(new_history.transitions().len(), 1);
    /// assert_eq!(history.transitions().len(), 0); // Previous history untouched
    /// ```
    pub fn record(&self, transition: StateTransition) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(transition);
        Self { transitions }
    }

    /// Append a transition in place.
    pub fn push(&mut self, transition: StateTransition) {
        self.transitions.push(transition);
    }

    /// Get the path of states traversed.
    ///
    /// Returns the source of the first transition (when it had one), then
    /// the target of each transition.
    pub fn get_path(&self) -> Vec<&StateId> {
        let mut path = Vec::new();
        if let Some(from) = self.transitions.first().and_then(|t| t.from.as_ref()) {
            path.push(from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Calculate total duration from first to last transition.
    ///
    /// Returns `None` if there are no transitions.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    pub fn last(&self) -> Option<&StateTransition> {
        self.transitions.last()
    }

    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(from: Option<&str>, to: &str) -> StateTransition {
        StateTransition {
            event: EventId::from("step"),
            from: from.map(StateId::from),
            to: StateId::from(to),
            timestamp: Utc::now(),
            persisted: false,
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history = StateHistory::new();
        assert_eq!(history.transitions().len(), 0);
        assert!(history.get_path().is_empty());
        assert!(history.duration().is_none());
        assert!(history.last().is_none());
    }

    #[test]
    fn record_is_immutable() {
        let history = StateHistory::new();
        let new_history = history.record(transition(Some("sleeping"), "running"));

        assert_eq!(history.transitions().len(), 0);
        assert_eq!(new_history.transitions().len(), 1);
    }

    #[test]
    fn push_appends_in_place() {
        let mut history = StateHistory::new();
        history.push(transition(Some("sleeping"), "running"));
        history.push(transition(Some("running"), "sleeping"));

        assert_eq!(history.transitions().len(), 2);
        assert_eq!(history.last().map(|t| t.to.as_str()), Some("sleeping"));
    }

    #[test]
    fn get_path_returns_state_sequence() {
        let history = StateHistory::new()
            .record(transition(Some("sleeping"), "running"))
            .record(transition(Some("running"), "sleeping"));

        let path = history.get_path();
        assert_eq!(path.len(), 3);
        assert_eq!(path[0], "sleeping");
        assert_eq!(path[1], "running");
        assert_eq!(path[2], "sleeping");
    }

    #[test]
    fn get_path_skips_absent_origin() {
        let history = StateHistory::new().record(transition(None, "opened"));

        let path = history.get_path();
        assert_eq!(path.len(), 1);
        assert_eq!(path[0], "opened");
    }

    #[test]
    fn duration_calculates_elapsed_time() {
        let history = StateHistory::new().record(transition(Some("a"), "b"));

        std::thread::sleep(std::time::Duration::from_millis(10));

        let history = history.record(transition(Some("b"), "c"));

        let duration = history.duration();
        assert!(duration.is_some());
        assert!(duration.unwrap() >= std::time::Duration::from_millis(10));
    }

    #[test]
    fn history_serializes_correctly() {
        let history = StateHistory::new().record(transition(Some("a"), "b"));

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: StateHistory = serde_json::from_str(&json).unwrap();

        assert_eq!(history.transitions(), deserialized.transitions());
    }
}
