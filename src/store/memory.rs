//! In-memory record table.

use crate::core::StateId;
use crate::machine::MachineInstance;
use crate::persistence::{PersistenceAdapter, Record};
use crate::scope::Scope;
use crate::store::error::StoreError;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

pub type RecordId = Uuid;

/// A record the reference store can keep.
pub trait StoredRecord: Record + Clone {
    fn id(&self) -> Option<RecordId>;

    fn assign_id(&mut self, id: RecordId);

    /// Record-level validation run before every create and save.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Table of records kept in memory, in insertion order.
pub struct MemoryStore<H> {
    rows: RwLock<Vec<H>>,
}

impl<H: StoredRecord> MemoryStore<H> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }

    /// Run the pre-create hook for new records, then the record's validation.
    pub fn validate<A: PersistenceAdapter<H>>(
        &self,
        machine: &mut MachineInstance<H, A>,
    ) -> Result<(), StoreError> {
        machine.before_create()?;
        machine.host().validate().map_err(StoreError::Invalid)
    }

    pub fn is_valid<A: PersistenceAdapter<H>>(&self, machine: &mut MachineInstance<H, A>) -> bool {
        self.validate(machine).is_ok()
    }

    /// Store a new record. Any hook or validation failure aborts the create.
    pub fn create<A: PersistenceAdapter<H>>(
        &self,
        machine: &mut MachineInstance<H, A>,
    ) -> Result<RecordId, StoreError> {
        if !machine.host().is_new_record() {
            return Err(StoreError::AlreadyCreated);
        }
        self.validate(machine)?;

        let id = Uuid::new_v4();
        machine.host_mut().assign_id(id);
        self.rows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(machine.host().clone());

        debug!(%id, "Record created");
        Ok(id)
    }

    /// Overwrite the stored copy of an existing record.
    pub fn save(&self, host: &H) -> Result<(), StoreError> {
        let id = host.id().ok_or(StoreError::NotCreated)?;
        host.validate().map_err(StoreError::Invalid)?;

        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        let row = rows
            .iter_mut()
            .find(|row| row.id() == Some(id))
            .ok_or(StoreError::NotFound(id))?;
        *row = host.clone();
        Ok(())
    }

    /// A fresh copy of the stored record.
    pub fn find(&self, id: RecordId) -> Option<H> {
        self.rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|row| row.id() == Some(id))
            .cloned()
    }

    pub fn all(&self) -> Vec<H> {
        self.rows.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Stored records selected by a scope.
    pub fn select(&self, scope: &Scope<H>) -> Vec<H> {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        scope.filter(rows.iter()).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rows.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<H: StoredRecord> Default for MemoryStore<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Adapter whose durable write saves the whole record through a store.
pub struct StoreAdapter<H> {
    store: Arc<MemoryStore<H>>,
}

impl<H> StoreAdapter<H> {
    pub fn new(store: Arc<MemoryStore<H>>) -> Self {
        Self { store }
    }
}

impl<H> Clone for StoreAdapter<H> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<H: StoredRecord> PersistenceAdapter<H> for StoreAdapter<H> {
    fn write_state(&self, host: &mut H, column: &str, state: &StateId) -> bool {
        host.write_attribute(column, Some(state.as_str()));
        match self.store.save(host) {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, %state, "Durable state write rejected");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{DefinitionBuilder, StateMachineDefinition, TransitionBuilder};

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Note {
        id: Option<RecordId>,
        title: String,
        state: Option<String>,
    }

    impl Record for Note {
        fn is_new_record(&self) -> bool {
            self.id.is_none()
        }

        fn read_attribute(&self, column: &str) -> Option<String> {
            match column {
                "state" => self.state.clone(),
                "title" => Some(self.title.clone()),
                _ => None,
            }
        }

        fn write_attribute(&mut self, column: &str, value: Option<&str>) {
            match column {
                "state" => self.state = value.map(str::to_string),
                "title" => self.title = value.unwrap_or_default().to_string(),
                _ => {}
            }
        }
    }

    impl StoredRecord for Note {
        fn id(&self) -> Option<RecordId> {
            self.id
        }

        fn assign_id(&mut self, id: RecordId) {
            self.id = Some(id);
        }

        fn validate(&self) -> Result<(), String> {
            if self.title.is_empty() {
                Err("title can't be blank".to_string())
            } else {
                Ok(())
            }
        }
    }

    fn definition() -> Arc<StateMachineDefinition<Note>> {
        Arc::new(
            DefinitionBuilder::new()
                .initial("draft")
                .state("published")
                .event("publish", |e| e.transition(TransitionBuilder::to("published").from("draft")))
                .build()
                .unwrap(),
        )
    }

    fn note(title: &str) -> Note {
        Note {
            title: title.to_string(),
            ..Note::default()
        }
    }

    #[test]
    fn create_materializes_initial_state() {
        let store = Arc::new(MemoryStore::new());
        let mut machine = MachineInstance::new(definition(), note("hello"));

        let id = store.create(&mut machine).unwrap();

        let found = store.find(id).unwrap();
        assert_eq!(found.state.as_deref(), Some("draft"));
        assert_eq!(found, *machine.host());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn invalid_record_is_not_created() {
        let store: MemoryStore<Note> = MemoryStore::new();
        let mut machine = MachineInstance::new(definition(), note(""));

        assert_eq!(
            store.create(&mut machine),
            Err(StoreError::Invalid("title can't be blank".to_string()))
        );
        assert!(store.is_empty());
        // The hook already ran and its value stays in memory.
        assert_eq!(machine.host().state.as_deref(), Some("draft"));
        assert!(machine.initial_state_ensured());
    }

    #[test]
    fn create_twice_is_rejected() {
        let store = MemoryStore::new();
        let mut machine = MachineInstance::new(definition(), note("hello"));

        store.create(&mut machine).unwrap();
        assert_eq!(store.create(&mut machine), Err(StoreError::AlreadyCreated));
    }

    #[test]
    fn save_requires_created_record() {
        let store = MemoryStore::new();
        assert_eq!(store.save(&note("hello")), Err(StoreError::NotCreated));

        let stranger = Note {
            id: Some(Uuid::new_v4()),
            ..note("hello")
        };
        assert!(matches!(store.save(&stranger), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn store_adapter_persists_state() {
        let store = Arc::new(MemoryStore::new());
        let mut machine = MachineInstance::with_adapter(
            definition(),
            note("hello"),
            StoreAdapter::new(Arc::clone(&store)),
        );
        let id = store.create(&mut machine).unwrap();

        assert_eq!(machine.fire_persisted("publish", &[]), Ok(true));
        assert_eq!(store.find(id).unwrap().state.as_deref(), Some("published"));
    }

    #[test]
    fn store_adapter_reports_rejected_save() {
        let store = Arc::new(MemoryStore::new());
        let mut machine = MachineInstance::with_adapter(
            definition(),
            note("hello"),
            StoreAdapter::new(Arc::clone(&store)),
        );
        let id = store.create(&mut machine).unwrap();

        machine.host_mut().title.clear();
        assert_eq!(machine.fire_persisted("publish", &[]), Ok(false));
        assert!(machine.is_in("draft"));
        assert_eq!(store.find(id).unwrap().state.as_deref(), Some("draft"));
    }

    #[test]
    fn select_applies_scope() {
        let store = Arc::new(MemoryStore::new());
        for title in ["a", "b", "c"] {
            let mut machine = MachineInstance::with_adapter(
                definition(),
                note(title),
                StoreAdapter::new(Arc::clone(&store)),
            );
            store.create(&mut machine).unwrap();
            if title != "b" {
                assert_eq!(machine.fire_persisted("publish", &[]), Ok(true));
            }
        }

        let published = Scope::for_state("state", "published".into());
        let titles: Vec<_> = store.select(&published).into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["a", "c"]);
        assert_eq!(store.all().len(), 3);
    }
}
