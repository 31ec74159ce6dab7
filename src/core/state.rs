//! Declared states.

use super::guard::Callback;
use super::id::StateId;
use serde_json::Value;
use std::fmt;

/// Options accepted when declaring a state.
///
/// # Example
///
/// ```rust
/// use statekeeper::core::StateOptions;
///
/// struct Job {
///     started: u32,
/// }
///
/// let options = StateOptions::new()
///     .initial()
///     .on_exit(|job: &mut Job, _args| job.started += 1);
/// assert!(options.is_initial());
/// ```
pub struct StateOptions<H> {
    initial: bool,
    enter: Option<Callback<H>>,
    exit: Option<Callback<H>>,
}

impl<H> StateOptions<H> {
    pub fn new() -> Self {
        Self {
            initial: false,
            enter: None,
            exit: None,
        }
    }

    /// Flag the state as the initial one.
    pub fn initial(mut self) -> Self {
        self.initial = true;
        self
    }

    pub fn is_initial(&self) -> bool {
        self.initial
    }

    /// Run `action` after the state has been entered and written.
    pub fn on_enter<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut H, &[Value]) + Send + Sync + 'static,
    {
        self.enter = Some(Callback::new(action));
        self
    }

    /// Run `action` before leaving the state.
    pub fn on_exit<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut H, &[Value]) + Send + Sync + 'static,
    {
        self.exit = Some(Callback::new(action));
        self
    }
}

impl<H> Default for StateOptions<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// A state as stored in a definition.
pub struct StateDef<H> {
    id: StateId,
    initial: bool,
    enter: Option<Callback<H>>,
    exit: Option<Callback<H>>,
}

impl<H> StateDef<H> {
    pub(crate) fn new(id: StateId, options: StateOptions<H>) -> Self {
        Self {
            id,
            initial: options.initial,
            enter: options.enter,
            exit: options.exit,
        }
    }

    pub fn id(&self) -> &StateId {
        &self.id
    }

    /// Whether the state was flagged initial at declaration.
    pub fn is_initial(&self) -> bool {
        self.initial
    }

    pub(crate) fn enter(&self) -> Option<&Callback<H>> {
        self.enter.as_ref()
    }

    pub(crate) fn exit(&self) -> Option<&Callback<H>> {
        self.exit.as_ref()
    }
}

impl<H> Clone for StateDef<H> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            initial: self.initial,
            enter: self.enter.clone(),
            exit: self.exit.clone(),
        }
    }
}

impl<H> fmt::Debug for StateDef<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateDef")
            .field("id", &self.id)
            .field("initial", &self.initial)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Lamp {
        lit: bool,
    }

    #[test]
    fn plain_state_is_not_initial() {
        let state: StateDef<Lamp> = StateDef::new(StateId::from("off"), StateOptions::new());

        assert_eq!(state.id(), &StateId::from("off"));
        assert!(!state.is_initial());
        assert!(state.enter().is_none());
        assert!(state.exit().is_none());
    }

    #[test]
    fn options_carry_callbacks() {
        let state = StateDef::new(
            StateId::from("on"),
            StateOptions::new()
                .initial()
                .on_enter(|lamp: &mut Lamp, _args| lamp.lit = true)
                .on_exit(|lamp: &mut Lamp, _args| lamp.lit = false),
        );
        let mut lamp = Lamp { lit: false };

        assert!(state.is_initial());
        state.enter().unwrap().run(&mut lamp, &[]);
        assert!(lamp.lit);
        state.exit().unwrap().run(&mut lamp, &[]);
        assert!(!lamp.lit);
    }

    #[test]
    fn clone_keeps_flags() {
        let state: StateDef<Lamp> =
            StateDef::new(StateId::from("on"), StateOptions::new().initial());
        let cloned = state.clone();

        assert_eq!(cloned.id(), state.id());
        assert!(cloned.is_initial());
    }
}
