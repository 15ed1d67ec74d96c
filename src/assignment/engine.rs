use log::debug;
use serde::Serialize;

use super::groups::SlotModel;
use super::store::AssignmentStore;
use crate::directory::Person;
use crate::error::AssignmentError;

/// What a placement or clear did to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    /// Nothing changed (dropping a person onto their own slot, clearing an empty slot).
    Unchanged,
    /// An available person took an empty slot.
    Occupied { role: String },
    /// A person moved from one slot into an empty one.
    Moved { from: String, to: String },
    /// An available person displaced the slot's occupant, who became available.
    Replaced { role: String, released: Person },
    /// Two slots exchanged occupants.
    Swapped { first: String, second: String },
    /// A slot was emptied and its occupant became available.
    Cleared { role: String, released: Person },
}

/// Drops a person onto a slot.
///
/// Whether the person comes from the roster or from another slot is read
/// from the store, so a drag source can never disagree with it.
pub fn place(
    model: &SlotModel,
    store: &mut AssignmentStore,
    person: &Person,
    target: &str,
) -> Result<Transition, AssignmentError> {
    if !model.contains_slot(target) {
        return Err(AssignmentError::UnknownSlot(target.to_string()));
    }

    let source = store.role_of(&person.code).map(str::to_string);

    let transition = match source {
        Some(from) if from == target => Transition::Unchanged,
        Some(from) => {
            // The source must be emptied before the person lands anywhere else.
            store.vacate(&from);
            match store.vacate(target) {
                Some(displaced) => {
                    store.fill(target, person.clone());
                    store.fill(&from, displaced);
                    Transition::Swapped {
                        first: from,
                        second: target.to_string(),
                    }
                }
                None => {
                    store.fill(target, person.clone());
                    Transition::Moved {
                        from,
                        to: target.to_string(),
                    }
                }
            }
        }
        None => match store.fill(target, person.clone()) {
            Some(released) => Transition::Replaced {
                role: target.to_string(),
                released,
            },
            None => Transition::Occupied {
                role: target.to_string(),
            },
        },
    };

    debug!("place {} -> {}: {:?}", person.code, target, transition);
    Ok(transition)
}

/// Empties a slot; a no-op when it is already empty.
pub fn clear(
    model: &SlotModel,
    store: &mut AssignmentStore,
    role: &str,
) -> Result<Transition, AssignmentError> {
    if !model.contains_slot(role) {
        return Err(AssignmentError::UnknownSlot(role.to_string()));
    }
    Ok(match store.vacate(role) {
        Some(released) => Transition::Cleared {
            role: role.to_string(),
            released,
        },
        None => Transition::Unchanged,
    })
}

/// Returns the occupants of the given slots to availability.
pub fn release_all<I, S>(store: &mut AssignmentStore, roles: I) -> Vec<Person>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    roles
        .into_iter()
        .filter_map(|role| store.vacate(role.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::groups::REST_GROUP;
    use proptest::prelude::*;

    fn setup() -> (SlotModel, AssignmentStore) {
        let mut model = SlotModel::new();
        model.create_dynamic_slot(REST_GROUP).unwrap();
        model.create_dynamic_slot(REST_GROUP).unwrap();
        (model, AssignmentStore::new())
    }

    fn p(code: &str) -> Person {
        Person::new(code, format!("name-{}", code))
    }

    #[test]
    fn aliased_role_keys_are_unknown_slots() {
        let (model, mut store) = setup();
        for alias in ["rest_+0", "rest_00"] {
            assert_eq!(
                place(&model, &mut store, &p("1"), alias),
                Err(AssignmentError::UnknownSlot(alias.into()))
            );
        }
        assert!(store.is_empty());
        assert!(store.is_available("1"));
    }

    #[test]
    fn occupy_empty_slot() {
        let (model, mut store) = setup();
        let t = place(&model, &mut store, &p("1"), "attack_driver").unwrap();
        assert_eq!(t, Transition::Occupied { role: "attack_driver".into() });
        assert!(!store.is_available("1"));
        store.verify().unwrap();
    }

    #[test]
    fn move_into_empty_slot() {
        let (model, mut store) = setup();
        place(&model, &mut store, &p("1"), "attack_driver").unwrap();
        let t = place(&model, &mut store, &p("1"), "rest_0").unwrap();

        assert_eq!(
            t,
            Transition::Moved { from: "attack_driver".into(), to: "rest_0".into() }
        );
        assert!(store.occupant("attack_driver").is_none());
        assert_eq!(store.role_of("1"), Some("rest_0"));
        store.verify().unwrap();
    }

    #[test]
    fn replace_releases_previous_occupant() {
        let (model, mut store) = setup();
        place(&model, &mut store, &p("1"), "relay_leader").unwrap();
        let t = place(&model, &mut store, &p("2"), "relay_leader").unwrap();

        assert_eq!(
            t,
            Transition::Replaced { role: "relay_leader".into(), released: p("1") }
        );
        assert!(store.is_available("1"));
        assert!(!store.is_available("2"));
        store.verify().unwrap();
    }

    #[test]
    fn swap_is_its_own_inverse() {
        let (model, mut store) = setup();
        place(&model, &mut store, &p("1"), "attack_driver").unwrap();
        place(&model, &mut store, &p("2"), "rest_1").unwrap();
        let before = store.clone();

        let t = place(&model, &mut store, &p("1"), "rest_1").unwrap();
        assert_eq!(
            t,
            Transition::Swapped { first: "attack_driver".into(), second: "rest_1".into() }
        );
        assert_eq!(store.occupant("attack_driver"), Some(&p("2")));
        assert_eq!(store.occupant("rest_1"), Some(&p("1")));
        assert_eq!(store.len(), 2);
        store.verify().unwrap();

        place(&model, &mut store, &p("1"), "attack_driver").unwrap();
        assert_eq!(store, before);
    }

    #[test]
    fn place_then_clear_round_trips() {
        let (model, mut store) = setup();
        place(&model, &mut store, &p("9"), "ladder_asst").unwrap();
        let before = store.clone();

        place(&model, &mut store, &p("3"), "rest_0").unwrap();
        let t = clear(&model, &mut store, "rest_0").unwrap();

        assert_eq!(t, Transition::Cleared { role: "rest_0".into(), released: p("3") });
        assert_eq!(store, before);
        assert_eq!(clear(&model, &mut store, "rest_0").unwrap(), Transition::Unchanged);
    }

    #[test]
    fn dropping_on_own_slot_is_unchanged() {
        let (model, mut store) = setup();
        place(&model, &mut store, &p("1"), "rest_0").unwrap();
        assert_eq!(
            place(&model, &mut store, &p("1"), "rest_0").unwrap(),
            Transition::Unchanged
        );
    }

    #[test]
    fn unknown_slot_rejected() {
        let (model, mut store) = setup();
        assert_eq!(
            place(&model, &mut store, &p("1"), "rest_7"),
            Err(AssignmentError::UnknownSlot("rest_7".into()))
        );
        assert!(store.is_empty());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Place(usize, usize),
        Clear(usize),
    }

    const ROLES: [&str; 6] = [
        "attack_driver",
        "attack_leader",
        "relay_driver",
        "ladder_attendant",
        "rest_0",
        "rest_1",
    ];

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..5usize, 0..ROLES.len()).prop_map(|(who, slot)| Op::Place(who, slot)),
            (0..ROLES.len()).prop_map(Op::Clear),
        ]
    }

    proptest! {
        #[test]
        fn nobody_ever_holds_two_slots(ops in prop::collection::vec(op(), 1..60)) {
            let (model, mut store) = setup();
            for op in ops {
                match op {
                    Op::Place(who, slot) => {
                        place(&model, &mut store, &p(&who.to_string()), ROLES[slot]).unwrap();
                    }
                    Op::Clear(slot) => {
                        clear(&model, &mut store, ROLES[slot]).unwrap();
                    }
                }
                prop_assert!(store.verify().is_ok());
                for code in 0..5 {
                    let code = code.to_string();
                    let holders = store
                        .assignments()
                        .values()
                        .filter(|person| person.code == code)
                        .count();
                    prop_assert!(holders <= 1);
                    prop_assert_eq!(store.is_available(&code), holders == 0);
                }
            }
        }
    }
}
