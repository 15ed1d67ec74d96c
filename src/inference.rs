//! Derives the relay and ladder crews from the attack crew.
//!
//! Rules are applied to a copy of the assignments at projection time and
//! depend only on which crew positions are filled in that snapshot. The
//! result is never written back to the session.

use log::info;
use serde::Serialize;

use crate::assignment::roles::{Position, Vehicle};
use crate::assignment::Assignments;

/// Which rule produced the crews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InferencePattern {
    /// Relay and ladder were empty and both take the attack crew.
    FullCopy,
    /// One of relay/ladder had only a driver, the other nothing; the driver is shared.
    SharedDriver,
    /// Relay and ladder were already staffed independently.
    AsGiven,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredCrews {
    pub assignments: Assignments,
    pub pattern: InferencePattern,
}

/// Attack position → (relay position, ladder position). The search
/// position has no ladder equivalent.
const FULL_COPY: [(Position, Position, Option<Position>); 5] = [
    (Position::Driver, Position::Driver, Some(Position::Driver)),
    (Position::Leader, Position::Leader, Some(Position::Leader)),
    (Position::Nozzle, Position::Nozzle, Some(Position::Attendant)),
    (Position::AsstNozzle, Position::AsstNozzle, Some(Position::Assistant)),
    (Position::Search, Position::Search, None),
];

fn filled_roles(assignments: &Assignments, vehicle: Vehicle) -> Vec<&'static str> {
    vehicle
        .role_keys()
        .into_iter()
        .filter(|key| assignments.contains_key(*key))
        .collect()
}

fn key(vehicle: Vehicle, position: Position) -> &'static str {
    // Every position used here exists on its vehicle.
    vehicle.role_key(position).unwrap_or_default()
}

pub fn infer_crews(assignments: &Assignments) -> InferredCrews {
    let mut augmented = assignments.clone();
    let relay = filled_roles(assignments, Vehicle::Relay);
    let ladder = filled_roles(assignments, Vehicle::Ladder);
    let relay_driver = key(Vehicle::Relay, Position::Driver);
    let ladder_driver = key(Vehicle::Ladder, Position::Driver);

    let pattern = if relay.is_empty() && ladder.is_empty() {
        for (attack_pos, relay_pos, ladder_pos) in FULL_COPY {
            let Some(person) = assignments.get(key(Vehicle::Attack, attack_pos)) else {
                continue;
            };
            augmented.insert(key(Vehicle::Relay, relay_pos).to_string(), person.clone());
            if let Some(ladder_pos) = ladder_pos {
                augmented.insert(key(Vehicle::Ladder, ladder_pos).to_string(), person.clone());
            }
        }
        InferencePattern::FullCopy
    } else if relay == [relay_driver] && ladder.is_empty() {
        if let Some(driver) = assignments.get(relay_driver) {
            augmented.insert(ladder_driver.to_string(), driver.clone());
        }
        InferencePattern::SharedDriver
    } else if ladder == [ladder_driver] && relay.is_empty() {
        if let Some(driver) = assignments.get(ladder_driver) {
            augmented.insert(relay_driver.to_string(), driver.clone());
        }
        InferencePattern::SharedDriver
    } else {
        InferencePattern::AsGiven
    };

    info!("Crew inference pattern: {:?}", pattern);
    InferredCrews {
        assignments: augmented,
        pattern,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::Person;

    fn assignments(entries: &[(&str, &str, &str)]) -> Assignments {
        entries
            .iter()
            .map(|(role, code, name)| (role.to_string(), Person::new(*code, *name)))
            .collect()
    }

    #[test]
    fn full_copy_from_attack() {
        let given = assignments(&[
            ("attack_driver", "A01", "甲"),
            ("attack_leader", "A02", "乙"),
            ("attack_nozzle", "A03", "丙"),
        ]);
        let inferred = infer_crews(&given);
        let a = &inferred.assignments;

        assert_eq!(inferred.pattern, InferencePattern::FullCopy);
        assert_eq!(a["relay_driver"].code, "A01");
        assert_eq!(a["ladder_driver"].code, "A01");
        assert_eq!(a["relay_leader"].code, "A02");
        assert_eq!(a["ladder_leader"].code, "A02");
        assert_eq!(a["relay_nozzle"].code, "A03");
        assert_eq!(a["ladder_attendant"].code, "A03");
        assert!(!a.contains_key("ladder_asst"));
        assert!(!a.contains_key("relay_search"));
        assert_eq!(a.len(), 9);
    }

    #[test]
    fn full_copy_maps_assistant_and_search() {
        let given = assignments(&[
            ("attack_asst_nozzle", "4", "丁"),
            ("attack_search", "5", "戊"),
        ]);
        let a = infer_crews(&given).assignments;

        assert_eq!(a["relay_asst_nozzle"].code, "4");
        assert_eq!(a["ladder_asst"].code, "4");
        assert_eq!(a["relay_search"].code, "5");
        assert_eq!(a.len(), 5);
    }

    #[test]
    fn shared_driver_from_relay() {
        let given = assignments(&[
            ("attack_driver", "A01", "甲"),
            ("relay_driver", "R1", "己"),
        ]);
        let inferred = infer_crews(&given);

        assert_eq!(inferred.pattern, InferencePattern::SharedDriver);
        assert_eq!(inferred.assignments["ladder_driver"].code, "R1");
        assert_eq!(inferred.assignments["relay_driver"].code, "R1");
        assert_eq!(inferred.assignments.len(), 3);
    }

    #[test]
    fn shared_driver_from_ladder() {
        let given = assignments(&[("ladder_driver", "L1", "庚")]);
        let inferred = infer_crews(&given);

        assert_eq!(inferred.pattern, InferencePattern::SharedDriver);
        assert_eq!(inferred.assignments["relay_driver"].code, "L1");
        assert_eq!(inferred.assignments.len(), 2);
    }

    #[test]
    fn independent_crews_left_alone() {
        let given = assignments(&[
            ("attack_driver", "A01", "甲"),
            ("relay_driver", "R1", "己"),
            ("ladder_leader", "L2", "辛"),
        ]);
        let inferred = infer_crews(&given);

        assert_eq!(inferred.pattern, InferencePattern::AsGiven);
        assert_eq!(inferred.assignments, given);
    }

    #[test]
    fn relay_with_more_than_a_driver_is_not_shared() {
        let given = assignments(&[
            ("relay_driver", "R1", "己"),
            ("relay_nozzle", "R3", "壬"),
        ]);
        let inferred = infer_crews(&given);

        assert_eq!(inferred.pattern, InferencePattern::AsGiven);
        assert!(!inferred.assignments.contains_key("ladder_driver"));
    }

    #[test]
    fn inference_depends_only_on_the_snapshot() {
        let given = assignments(&[("attack_driver", "A01", "甲")]);
        assert_eq!(infer_crews(&given), infer_crews(&given));
    }
}
