use log::{debug, error, info, warn};
use serde::Serialize;

use super::engine::{self, Transition};
use super::groups::{GroupKind, Slot, SlotModel, REST_GROUP, REST_TITLE, WATER_GROUP, WATER_TITLE};
use super::store::AssignmentStore;
use crate::directory::{matches_search, DirectorySource, Person, PersonnelDirectory};
use crate::error::{AssignmentError, DirectoryError};
use crate::notes;
use crate::storage::{GroupMeta, PersistedState, SlotCounts, Storage};

/// Subscriber notified after every successful mutation of a [`Session`].
pub trait ChangeListener: Send {
    fn on_change(&mut self, state: &PersistedState);
}

/// One line of the roster display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub code: String,
    pub name: String,
    pub assigned: bool,
    pub hidden: bool,
}

/// Everything one scheduling session works on: the directory, the slot
/// model and the assignment store.
///
/// A session only exists once both the directory and the saved state have
/// been loaded, so no mutation can race the initial population.
pub struct Session {
    directory: PersonnelDirectory,
    model: SlotModel,
    store: AssignmentStore,
    notes: String,
    listeners: Vec<Box<dyn ChangeListener>>,
}

impl Session {
    pub fn new(directory: PersonnelDirectory) -> Self {
        Self::restore(directory, None)
    }

    /// Loads the directory and the saved state concurrently.
    ///
    /// An unreadable saved state is logged and the session starts empty.
    pub async fn open(
        source: &dyn DirectorySource,
        storage: &dyn Storage,
    ) -> Result<Self, DirectoryError> {
        let (directory, saved) = tokio::join!(source.load(), storage.get_assignment_state());
        let saved = saved.unwrap_or_else(|e| {
            warn!("Ignoring unreadable saved state: {}", e);
            None
        });
        Ok(Self::restore(directory?, saved))
    }

    /// Rebuilds a session from a saved state without notifying anybody.
    pub fn restore(directory: PersonnelDirectory, saved: Option<PersistedState>) -> Self {
        if directory.is_empty() {
            warn!("Personnel directory is empty; the roster will have nobody to assign");
        }
        let mut session = Self {
            directory,
            model: SlotModel::new(),
            store: AssignmentStore::new(),
            notes: String::new(),
            listeners: Vec::new(),
        };

        if let Some(saved) = saved {
            session.restore_groups(&saved);
            for (role, person) in saved.assignments {
                if !session.model.contains_slot(&role) {
                    warn!("Dropping saved assignment of {} to unknown slot {}", person.code, role);
                } else if let Some(held) = session.store.role_of(&person.code) {
                    warn!("Dropping saved assignment of {} to {}: already in {}", person.code, role, held);
                } else {
                    session.store.fill(&role, person);
                }
            }
            info!("Restored {} assignments", session.store.len());
        }
        session.notes = notes::generate(&session.model, &session.store);
        session
    }

    fn restore_groups(&mut self, saved: &PersistedState) {
        let title_of = |id: &str, default: &str| {
            saved
                .groups
                .iter()
                .find(|g| g.id == id)
                .map(|g| g.title.clone())
                .unwrap_or_else(|| default.to_string())
        };
        let live = |id: &str| saved.slots.get(id).map(Vec::as_slice);

        self.model.restore_group(
            REST_GROUP,
            &title_of(REST_GROUP, REST_TITLE),
            saved.slot_counts.rest,
            live(REST_GROUP),
        );
        self.model.restore_group(
            WATER_GROUP,
            &title_of(WATER_GROUP, WATER_TITLE),
            saved.slot_counts.water,
            live(WATER_GROUP),
        );
        for group in &saved.groups {
            if group.id == REST_GROUP || group.id == WATER_GROUP {
                continue;
            }
            let count = saved.slot_counts.custom.get(&group.id).copied().unwrap_or(0);
            self.model
                .restore_group(&group.id, &group.title, count, live(&group.id));
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn ChangeListener>) {
        self.listeners.push(listener);
    }

    pub fn directory(&self) -> &PersonnelDirectory {
        &self.directory
    }

    pub fn directory_is_empty(&self) -> bool {
        self.directory.is_empty()
    }

    pub fn model(&self) -> &SlotModel {
        &self.model
    }

    pub fn store(&self) -> &AssignmentStore {
        &self.store
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Roster lines with visibility derived from the store: an entry is
    /// hidden when it is assigned or does not match the search term.
    pub fn roster_view(&self, search: &str) -> Vec<RosterEntry> {
        self.directory
            .roster()
            .into_iter()
            .map(|person| {
                let assigned = !self.store.is_available(&person.code);
                let hidden = assigned || !matches_search(&person, search);
                RosterEntry {
                    code: person.code,
                    name: person.name,
                    assigned,
                    hidden,
                }
            })
            .collect()
    }

    /// Roster people not sitting in any slot.
    pub fn available(&self) -> Vec<Person> {
        self.directory
            .roster()
            .into_iter()
            .filter(|p| self.store.is_available(&p.code))
            .collect()
    }

    pub fn slot(&self, role: &str) -> Option<Slot> {
        if !self.model.contains_slot(role) {
            return None;
        }
        let dynamic = self.model.dynamic_group_of(role).is_some();
        Some(Slot {
            role: role.to_string(),
            occupant: self.store.occupant(role).cloned(),
            dynamic,
            group_id: self.model.group_of(role).map(str::to_string),
        })
    }

    pub fn slots(&self) -> Vec<Slot> {
        self.model
            .slot_roles()
            .iter()
            .filter_map(|role| self.slot(role))
            .collect()
    }

    pub fn place(&mut self, person: &Person, role: &str) -> Result<Transition, AssignmentError> {
        let transition = engine::place(&self.model, &mut self.store, person, role)?;
        if transition != Transition::Unchanged {
            self.changed();
        }
        Ok(transition)
    }

    /// Places a person by code, looking them up in the directory or, for
    /// people restored from an older schedule, among current occupants.
    pub fn place_code(&mut self, code: &str, role: &str) -> Result<Transition, AssignmentError> {
        let person = self
            .directory
            .person(code)
            .or_else(|| {
                self.store
                    .role_of(code)
                    .and_then(|held| self.store.occupant(held))
                    .cloned()
            })
            .ok_or_else(|| AssignmentError::UnknownPerson(code.to_string()))?;
        self.place(&person, role)
    }

    pub fn clear(&mut self, role: &str) -> Result<Transition, AssignmentError> {
        let transition = engine::clear(&self.model, &mut self.store, role)?;
        if transition != Transition::Unchanged {
            self.changed();
        }
        Ok(transition)
    }

    pub fn create_dynamic_slot(&mut self, group_id: &str) -> Result<String, AssignmentError> {
        let role = self.model.create_dynamic_slot(group_id)?;
        debug!("Created slot {}", role);
        self.changed();
        Ok(role)
    }

    /// Removes a dynamic slot, returning its occupant to the roster.
    pub fn delete_slot(&mut self, role: &str) -> Result<Option<Person>, AssignmentError> {
        self.model.remove_slot(role)?;
        let released = engine::release_all(&mut self.store, [role]).pop();
        debug!("Deleted slot {}", role);
        self.changed();
        Ok(released)
    }

    pub fn create_custom_group(&mut self, title: &str) -> String {
        let id = self.model.create_custom_group(title);
        debug!("Created group {} ({})", id, title);
        self.changed();
        id
    }

    /// Deletes a custom group after returning all of its occupants to the roster.
    pub fn delete_group(&mut self, id: &str) -> Result<Vec<Person>, AssignmentError> {
        let group = self.model.remove_group(id)?;
        let released = engine::release_all(&mut self.store, group.slot_roles());
        debug!("Deleted group {}, released {} people", id, released.len());
        self.changed();
        Ok(released)
    }

    pub fn rename_group(&mut self, id: &str, title: &str) -> Result<(), AssignmentError> {
        self.model.rename_group(id, title)?;
        self.changed();
        Ok(())
    }

    /// Swaps in a freshly read directory.
    ///
    /// Assignments made against the previous schedule are not carried over:
    /// the store, custom groups and slot counters are all reset. Refused
    /// unless `confirmed`.
    pub fn reload(
        &mut self,
        directory: PersonnelDirectory,
        confirmed: bool,
    ) -> Result<(), AssignmentError> {
        if !confirmed {
            return Err(AssignmentError::ReloadNotConfirmed);
        }
        if directory.is_empty() {
            warn!("Reloaded personnel directory is empty");
        }
        self.directory = directory;
        self.model = SlotModel::new();
        self.store.clear_all();
        info!(
            "Directory reloaded with {} personnel; assignments cleared",
            self.directory.id_to_name.len()
        );
        self.changed();
        Ok(())
    }

    pub fn persisted_state(&self) -> PersistedState {
        let mut state = PersistedState {
            assignments: self.store.assignments().clone(),
            notes: self.notes.clone(),
            slot_counts: SlotCounts::default(),
            ..PersistedState::default()
        };
        for group in self.model.dynamic_groups() {
            state.groups.push(GroupMeta {
                id: group.id.clone(),
                title: group.title.clone(),
            });
            state
                .slots
                .insert(group.id.clone(), group.ordinals().to_vec());
            match group.kind {
                GroupKind::Rest => state.slot_counts.rest = group.slot_count(),
                GroupKind::Water => state.slot_counts.water = group.slot_count(),
                GroupKind::Custom => {
                    state
                        .slot_counts
                        .custom
                        .insert(group.id.clone(), group.slot_count());
                }
            }
        }
        state
    }

    /// Regenerates notes and notifies subscribers.
    fn changed(&mut self) {
        if let Err(violation) = self.store.verify() {
            error!("Assignment store invariant broken: {}", violation);
            debug_assert!(false, "{}", violation);
        }
        self.notes = notes::generate(&self.model, &self.store);
        let state = self.persisted_state();
        for listener in &mut self.listeners {
            listener.on_change(&state);
        }
    }
}
