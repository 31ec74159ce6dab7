//! Named queries over records of a model.
//!
//! Every declared state gets a scope of the same name selecting the records
//! whose backing field holds that state. Installation never replaces a name
//! the model already exposes.

use crate::core::StateId;
use crate::definition::StateMachineDefinition;
use crate::persistence::Record;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Where a scope came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScopeOrigin {
    /// Declared by hand on the model
    Custom,
    /// Installed for a declared state
    State(StateId),
}

/// A named record predicate.
pub struct Scope<H> {
    name: String,
    origin: ScopeOrigin,
    predicate: Arc<dyn Fn(&H) -> bool + Send + Sync>,
}

impl<H> Scope<H> {
    pub fn custom<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&H) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            origin: ScopeOrigin::Custom,
            predicate: Arc::new(predicate),
        }
    }

    /// Scope selecting records whose `column` equals `state`.
    pub fn for_state(column: impl Into<String>, state: StateId) -> Self
    where
        H: Record,
    {
        let column = column.into();
        let expected = state.clone();
        Self {
            name: state.to_string(),
            origin: ScopeOrigin::State(state),
            predicate: Arc::new(move |host: &H| {
                host.read_attribute(&column).as_deref() == Some(expected.as_str())
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> &ScopeOrigin {
        &self.origin
    }

    pub fn matches(&self, host: &H) -> bool {
        (self.predicate)(host)
    }

    /// Lazily keep the records this scope selects.
    pub fn filter<'a, I>(&'a self, records: I) -> impl Iterator<Item = &'a H> + 'a
    where
        I: IntoIterator<Item = &'a H>,
        I::IntoIter: 'a,
    {
        records.into_iter().filter(move |host| self.matches(host))
    }
}

impl<H> Clone for Scope<H> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            origin: self.origin.clone(),
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<H> fmt::Debug for Scope<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// The scopes a model exposes, by name, in installation order.
pub struct ScopeSet<H> {
    scopes: Vec<Scope<H>>,
}

impl<H> ScopeSet<H> {
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    pub fn get(&self, name: &str) -> Option<&Scope<H>> {
        self.scopes.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scope<H>> {
        self.scopes.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Add a scope unless the name is taken. Hands the scope back on conflict.
    pub fn insert(&mut self, scope: Scope<H>) -> Result<(), Scope<H>> {
        if self.contains(&scope.name) {
            return Err(scope);
        }
        self.scopes.push(scope);
        Ok(())
    }
}

impl<H> Default for ScopeSet<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Clone for ScopeSet<H> {
    fn clone(&self) -> Self {
        Self {
            scopes: self.scopes.clone(),
        }
    }
}

impl<H> fmt::Debug for ScopeSet<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Install one scope per declared state, skipping every name already taken
/// by `members` or by an existing scope. Returns the installed names.
pub fn install_state_scopes<H: Record>(
    scopes: &mut ScopeSet<H>,
    members: &[&str],
    definition: &StateMachineDefinition<H>,
) -> Vec<String> {
    let mut installed = Vec::new();

    for state in definition.state_ids() {
        if members.contains(&state.as_str()) {
            trace!(scope = %state, "Scope name is a model member, skipped");
            continue;
        }
        match scopes.insert(Scope::for_state(definition.column(), state.clone())) {
            Ok(()) => {
                debug!(scope = %state, column = definition.column(), "State scope installed");
                installed.push(state.to_string());
            }
            Err(_) => trace!(scope = %state, "Scope name already defined, skipped"),
        }
    }

    installed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::DefinitionBuilder;

    #[derive(Clone, Debug, PartialEq)]
    struct Job {
        status: Option<String>,
        priority: u8,
    }

    impl Record for Job {
        fn is_new_record(&self) -> bool {
            false
        }

        fn read_attribute(&self, column: &str) -> Option<String> {
            match column {
                "status" => self.status.clone(),
                _ => None,
            }
        }

        fn write_attribute(&mut self, column: &str, value: Option<&str>) {
            if column == "status" {
                self.status = value.map(str::to_string);
            }
        }
    }

    fn job(status: &str, priority: u8) -> Job {
        Job {
            status: Some(status.to_string()),
            priority,
        }
    }

    fn definition() -> StateMachineDefinition<Job> {
        DefinitionBuilder::new()
            .column("status")
            .state("queued")
            .state("running")
            .state("new")
            .build()
            .unwrap()
    }

    #[test]
    fn state_scope_selects_matching_records() {
        let scope = Scope::<Job>::for_state("status", StateId::from("running"));
        let jobs = vec![job("queued", 1), job("running", 2), job("running", 3)];

        let running: Vec<_> = scope.filter(&jobs).map(|j| j.priority).collect();
        assert_eq!(running, vec![2, 3]);
        assert_eq!(scope.origin(), &ScopeOrigin::State(StateId::from("running")));
    }

    #[test]
    fn installs_one_scope_per_state() {
        let mut scopes = ScopeSet::new();
        let installed = install_state_scopes(&mut scopes, &[], &definition());

        assert_eq!(installed, vec!["queued", "running", "new"]);
        assert_eq!(scopes.names().collect::<Vec<_>>(), vec!["queued", "running", "new"]);
        assert!(scopes.get("queued").unwrap().matches(&job("queued", 1)));
    }

    #[test]
    fn members_are_never_shadowed() {
        let mut scopes = ScopeSet::new();
        let installed = install_state_scopes(&mut scopes, &["new"], &definition());

        assert_eq!(installed, vec!["queued", "running"]);
        assert!(!scopes.contains("new"));
    }

    #[test]
    fn existing_scope_keeps_its_behavior() {
        let mut scopes = ScopeSet::new();
        scopes
            .insert(Scope::custom("running", |j: &Job| j.priority > 5))
            .unwrap();

        let installed = install_state_scopes(&mut scopes, &[], &definition());

        assert_eq!(installed, vec!["queued", "new"]);
        let running = scopes.get("running").unwrap();
        assert_eq!(running.origin(), &ScopeOrigin::Custom);
        assert!(running.matches(&job("queued", 9)));
        assert!(!running.matches(&job("running", 1)));
    }

    #[test]
    fn second_installation_is_a_no_op() {
        let mut scopes = ScopeSet::new();
        install_state_scopes(&mut scopes, &[], &definition());

        let again = install_state_scopes(&mut scopes, &[], &definition());
        assert!(again.is_empty());
        assert_eq!(scopes.len(), 3);
    }

    #[test]
    fn insert_rejects_duplicates() {
        let mut scopes = ScopeSet::new();
        assert!(scopes.insert(Scope::custom("urgent", |j: &Job| j.priority > 8)).is_ok());

        let rejected = scopes.insert(Scope::custom("urgent", |_j: &Job| true));
        assert_eq!(rejected.unwrap_err().name(), "urgent");
    }
}
