use std::collections::{BTreeMap, HashMap};

use crate::directory::Person;
use crate::error::InvariantViolation;

/// Role → occupant map, keyed by slot role.
pub type Assignments = BTreeMap<String, Person>;

/// Who sits where, plus the reverse index of occupied codes.
///
/// The reverse index is the availability set: a person is available exactly
/// when their code is absent from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentStore {
    slots: Assignments,
    occupied: HashMap<String, String>, // code -> role
}

impl AssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assignments(&self) -> &Assignments {
        &self.slots
    }

    pub fn occupant(&self, role: &str) -> Option<&Person> {
        self.slots.get(role)
    }

    /// Slot currently held by a person.
    pub fn role_of(&self, code: &str) -> Option<&str> {
        self.occupied.get(code).map(String::as_str)
    }

    pub fn is_available(&self, code: &str) -> bool {
        !self.occupied.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Puts a person into a slot and returns whoever was there. The person
    /// must not hold another slot; the engine vacates the source first.
    pub(crate) fn fill(&mut self, role: &str, person: Person) -> Option<Person> {
        let previous = self.vacate(role);
        self.occupied.insert(person.code.clone(), role.to_string());
        self.slots.insert(role.to_string(), person);
        previous
    }

    /// Empties a slot and returns its occupant to availability.
    pub(crate) fn vacate(&mut self, role: &str) -> Option<Person> {
        let previous = self.slots.remove(role)?;
        if self.occupied.get(&previous.code).map(String::as_str) == Some(role) {
            self.occupied.remove(&previous.code);
        }
        Some(previous)
    }

    pub(crate) fn clear_all(&mut self) {
        self.slots.clear();
        self.occupied.clear();
    }

    /// Checks that nobody holds two slots and that the availability set is
    /// exactly the complement of the slot map's occupants.
    pub fn verify(&self) -> Result<(), InvariantViolation> {
        let mut seen: HashMap<&str, &str> = HashMap::new();
        for (role, person) in &self.slots {
            if let Some(first) = seen.insert(person.code.as_str(), role.as_str()) {
                return Err(InvariantViolation::DoubleBooked {
                    code: person.code.clone(),
                    first: first.to_string(),
                    second: role.clone(),
                });
            }
        }
        for (role, person) in &self.slots {
            if self.occupied.get(&person.code) != Some(role) {
                return Err(InvariantViolation::AvailabilityDrift(person.code.clone()));
            }
        }
        if let Some(code) = self.occupied.keys().find(|code| !seen.contains_key(code.as_str())) {
            return Err(InvariantViolation::AvailabilityDrift(code.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_and_vacate_track_availability() {
        let mut store = AssignmentStore::new();
        let a = Person::new("1", "甲");

        assert!(store.fill("attack_driver", a.clone()).is_none());
        assert!(!store.is_available("1"));
        assert_eq!(store.role_of("1"), Some("attack_driver"));

        assert_eq!(store.vacate("attack_driver"), Some(a));
        assert!(store.is_available("1"));
        assert!(store.is_empty());
        store.verify().unwrap();
    }

    #[test]
    fn overwriting_releases_previous_occupant() {
        let mut store = AssignmentStore::new();
        store.fill("rest_0", Person::new("1", "甲"));
        let previous = store.fill("rest_0", Person::new("2", "乙"));

        assert_eq!(previous, Some(Person::new("1", "甲")));
        assert!(store.is_available("1"));
        assert!(!store.is_available("2"));
        store.verify().unwrap();
    }

    #[test]
    fn verify_detects_double_booking() {
        let mut store = AssignmentStore::new();
        store.fill("rest_0", Person::new("1", "甲"));
        store.fill("rest_1", Person::new("1", "甲"));

        assert!(matches!(
            store.verify(),
            Err(InvariantViolation::DoubleBooked { .. })
        ));
    }
}
