//! Attaching state machines to model types.
//!
//! A [`Registry`] is assembled once through [`RegistryBuilder`] and is
//! read-only afterwards, so it can live in a `static` and be shared between
//! threads. Each model type gets one of:
//!
//! - its own definition ([`RegistryBuilder::define`]),
//! - its ancestor's definition, shared by identity ([`RegistryBuilder::inherit`]),
//! - an independent copy of its ancestor's definition with additions
//!   ([`RegistryBuilder::extend`]).
//!
//! Attaching a definition also installs one scope per declared state, unless
//! the name is already a member of the model or an existing scope.

mod error;

pub use error::RegistryError;

use crate::definition::{DefinitionBuilder, StateMachineDefinition};
use crate::machine::MachineInstance;
use crate::persistence::{PersistenceAdapter, Record};
use crate::scope::{install_state_scopes, Scope, ScopeOrigin, ScopeSet};
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A model type a state machine can be attached to.
///
/// # Example
///
/// ```rust
/// use statekeeper::persistence::Record;
/// use statekeeper::registry::Model;
///
/// struct Job {
///     state: Option<String>,
/// }
///
/// impl Record for Job {
///     fn is_new_record(&self) -> bool {
///         true
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
/// impl Model for Job {
///     type Host = Job;
///     const MEMBERS: &'static [&'static str] = &["new", "find"];
/// }
/// ```
pub trait Model: 'static {
    /// Record type instances of the model are stored as.
    type Host: Record + 'static;

    /// Names already exposed by the model. State scopes never replace them.
    const MEMBERS: &'static [&'static str] = &[];
}

type Entries = HashMap<TypeId, Box<dyn Any + Send + Sync>>;

struct ModelEntry<H> {
    attached: bool,
    /// `None` while the definition is delegated to `parent`
    definition: Option<Arc<StateMachineDefinition<H>>>,
    parent: Option<TypeId>,
    scopes: ScopeSet<H>,
}

impl<H> ModelEntry<H> {
    fn new() -> Self {
        Self {
            attached: false,
            definition: None,
            parent: None,
            scopes: ScopeSet::new(),
        }
    }
}

fn entry_of<H: 'static>(entries: &Entries, id: TypeId) -> Option<&ModelEntry<H>> {
    entries.get(&id).and_then(|entry| entry.downcast_ref::<ModelEntry<H>>())
}

/// Follow delegation up the ancestor chain to the owning definition.
fn resolve<H: 'static>(entries: &Entries, mut id: TypeId) -> Option<Arc<StateMachineDefinition<H>>> {
    loop {
        let entry = entry_of::<H>(entries, id)?;
        match (&entry.definition, entry.parent) {
            (Some(definition), _) => return Some(Arc::clone(definition)),
            (None, Some(parent)) => id = parent,
            (None, None) => return None,
        }
    }
}

/// Builder for a [`Registry`].
///
/// # Example
///
/// ```rust
/// use statekeeper::definition::{DefinitionBuilder, TransitionBuilder};
/// use statekeeper::persistence::Record;
/// use statekeeper::registry::{Model, Registry};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Job {
///     state: Option<String>,
/// }
///
/// impl Record for Job {
///     fn is_new_record(&self) -> bool {
///         true
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
/// impl Model for Job {
///     type Host = Job;
/// }
///
/// struct UrgentJob;
///
/// impl Model for UrgentJob {
///     type Host = Job;
/// }
///
/// let registry = Registry::builder()
///     .define::<Job>(
///         DefinitionBuilder::new()
///             .initial("queued")
///             .state("done")
///             .event("finish", |e| e.transition(TransitionBuilder::to("done")))
///             .build()
///             .unwrap(),
///     )
///     .unwrap()
///     .inherit::<UrgentJob, Job>()
///     .unwrap()
///     .build();
///
/// let job = registry.definition::<Job>().unwrap();
/// let urgent = registry.definition::<UrgentJob>().unwrap();
/// assert!(Arc::ptr_eq(&job, &urgent));
/// assert!(registry.scope::<UrgentJob>("done").is_some());
/// ```
#[derive(Default)]
pub struct RegistryBuilder {
    entries: Entries,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a custom scope on a model.
    ///
    /// Scopes may be declared before or after the machine is attached; either
    /// way they take precedence over the state scope of the same name.
    pub fn scope<M, F>(mut self, name: impl Into<String>, predicate: F) -> Result<Self, RegistryError>
    where
        M: Model,
        F: Fn(&M::Host) -> bool + Send + Sync + 'static,
    {
        let name = name.into();
        let model = type_name::<M>();
        if M::MEMBERS.contains(&name.as_str()) {
            return Err(RegistryError::DuplicateScope { model, name });
        }

        self.entry_mut::<M>()?
            .scopes
            .insert(Scope::custom(name, predicate))
            .map_err(|scope| RegistryError::DuplicateScope {
                model,
                name: scope.name().to_string(),
            })?;
        Ok(self)
    }

    /// Attach a definition owned by this model.
    pub fn define<M: Model>(
        self,
        definition: StateMachineDefinition<M::Host>,
    ) -> Result<Self, RegistryError> {
        self.attach::<M>(Some(Arc::new(definition)), None)
    }

    /// Share the ancestor's definition with a derived model.
    ///
    /// The derived model sees the very same definition object, so anything the
    /// ancestor declares is visible through both. The ancestor's scopes are
    /// exposed on the derived model as well.
    pub fn inherit<M, P>(self) -> Result<Self, RegistryError>
    where
        M: Model,
        P: Model<Host = M::Host>,
    {
        self.require_parent::<M, P>()?;
        self.attach::<M>(None, Some(TypeId::of::<P>()))
    }

    /// Give a derived model its own copy of the ancestor's definition, with
    /// additional declarations.
    ///
    /// The copy is independent: nothing declared here is visible on the
    /// ancestor.
    pub fn extend<M, P, F>(self, declare: F) -> Result<Self, RegistryError>
    where
        M: Model,
        P: Model<Host = M::Host>,
        F: FnOnce(DefinitionBuilder<M::Host>) -> DefinitionBuilder<M::Host>,
    {
        let parent = self.require_parent::<M, P>()?;
        let definition = declare(DefinitionBuilder::extending(&parent)).build()?;
        self.attach::<M>(Some(Arc::new(definition)), Some(TypeId::of::<P>()))
    }

    pub fn build(self) -> Registry {
        debug!(models = self.entries.len(), "Registry built");
        Registry {
            entries: self.entries,
        }
    }

    fn require_parent<M, P>(&self) -> Result<Arc<StateMachineDefinition<M::Host>>, RegistryError>
    where
        M: Model,
        P: Model<Host = M::Host>,
    {
        resolve::<M::Host>(&self.entries, TypeId::of::<P>()).ok_or(RegistryError::UnknownParent {
            model: type_name::<M>(),
            parent: type_name::<P>(),
        })
    }

    fn entry_mut<M: Model>(&mut self) -> Result<&mut ModelEntry<M::Host>, RegistryError> {
        self.entries
            .entry(TypeId::of::<M>())
            .or_insert_with(|| Box::new(ModelEntry::<M::Host>::new()))
            .downcast_mut::<ModelEntry<M::Host>>()
            .ok_or(RegistryError::HostMismatch {
                model: type_name::<M>(),
            })
    }

    fn attach<M: Model>(
        mut self,
        definition: Option<Arc<StateMachineDefinition<M::Host>>>,
        parent: Option<TypeId>,
    ) -> Result<Self, RegistryError> {
        let model = type_name::<M>();
        let resolved = match (&definition, parent) {
            (Some(definition), _) => Some(Arc::clone(definition)),
            (None, Some(parent)) => resolve::<M::Host>(&self.entries, parent),
            (None, None) => None,
        };
        let inherited = parent
            .and_then(|parent| entry_of::<M::Host>(&self.entries, parent))
            .map(|entry| entry.scopes.clone());

        let entry = self.entry_mut::<M>()?;
        if entry.attached {
            return Err(RegistryError::AlreadyRegistered { model });
        }
        entry.attached = true;
        entry.definition = definition;
        entry.parent = parent;

        // State scopes are rebuilt from the resolved definition below, so a
        // derived column applies. Custom ones carry over; own scopes win.
        if let Some(inherited) = inherited {
            for scope in inherited.iter() {
                if scope.origin() == &ScopeOrigin::Custom && !M::MEMBERS.contains(&scope.name()) {
                    let _ = entry.scopes.insert(scope.clone());
                }
            }
        }

        let installed = match &resolved {
            Some(definition) if definition.options().create_scopes => {
                install_state_scopes(&mut entry.scopes, M::MEMBERS, definition)
            }
            _ => Vec::new(),
        };

        debug!(
            model,
            inherited = parent.is_some(),
            scopes = installed.len(),
            "State machine attached"
        );
        Ok(self)
    }
}

/// Read-only lookup of the machines attached to model types.
pub struct Registry {
    entries: Entries,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    fn entry<M: Model>(&self) -> Option<&ModelEntry<M::Host>> {
        entry_of::<M::Host>(&self.entries, TypeId::of::<M>()).filter(|entry| entry.attached)
    }

    pub fn is_registered<M: Model>(&self) -> bool {
        self.entry::<M>().is_some()
    }

    /// Whether the model shares its ancestor's definition.
    pub fn is_inherited<M: Model>(&self) -> bool {
        self.entry::<M>()
            .is_some_and(|entry| entry.definition.is_none() && entry.parent.is_some())
    }

    /// Definition in effect for the model.
    ///
    /// For an inheriting model this is the ancestor's definition itself, not
    /// a copy.
    pub fn definition<M: Model>(&self) -> Option<Arc<StateMachineDefinition<M::Host>>> {
        self.entry::<M>()?;
        resolve::<M::Host>(&self.entries, TypeId::of::<M>())
    }

    pub fn column<M: Model>(&self) -> Option<String> {
        self.definition::<M>()
            .map(|definition| definition.column().to_string())
    }

    pub fn scopes<M: Model>(&self) -> Option<&ScopeSet<M::Host>> {
        self.entry::<M>().map(|entry| &entry.scopes)
    }

    pub fn scope<M: Model>(&self, name: &str) -> Option<&Scope<M::Host>> {
        self.scopes::<M>()?.get(name)
    }

    /// Bind a record of the model to its machine.
    pub fn bind<M: Model>(&self, host: M::Host) -> Result<MachineInstance<M::Host>, RegistryError> {
        let definition = self.require::<M>()?;
        Ok(MachineInstance::new(definition, host))
    }

    /// Bind a record of the model to its machine through a custom adapter.
    pub fn bind_with<M, A>(
        &self,
        host: M::Host,
        adapter: A,
    ) -> Result<MachineInstance<M::Host, A>, RegistryError>
    where
        M: Model,
        A: PersistenceAdapter<M::Host>,
    {
        let definition = self.require::<M>()?;
        Ok(MachineInstance::with_adapter(definition, host, adapter))
    }

    fn require<M: Model>(&self) -> Result<Arc<StateMachineDefinition<M::Host>>, RegistryError> {
        self.definition::<M>().ok_or(RegistryError::NotRegistered {
            model: type_name::<M>(),
        })
    }
}
