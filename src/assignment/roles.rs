use serde::{Deserialize, Serialize};

/// Role key of the fire-watch duty.
pub const FIRE_WATCH: &str = "fire_watch";
pub const FIRE_WATCH_GROUP: &str = "fire_watch";
pub const FIRE_WATCH_LABEL: &str = "火警值班";

/// Vehicles whose crews are predeclared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vehicle {
    Attack,
    Relay,
    Ladder,
    Ambulance,
}

/// A crew position on a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Driver,
    Leader,
    Nozzle,
    AsstNozzle,
    Search,
    Attendant,
    Assistant,
    Emt,
}

impl Position {
    /// Label printed next to the position on the target form.
    pub fn label(self) -> &'static str {
        match self {
            Position::Driver => "司機",
            Position::Leader => "帶隊官",
            Position::Nozzle => "瞄子手",
            Position::AsstNozzle => "副瞄子手",
            Position::Search => "搜救手",
            Position::Attendant => "隨員",
            Position::Assistant => "助手",
            Position::Emt => "救護技術員1",
        }
    }
}

impl Vehicle {
    pub const ALL: [Vehicle; 4] = [
        Vehicle::Attack,
        Vehicle::Relay,
        Vehicle::Ladder,
        Vehicle::Ambulance,
    ];

    pub fn group_id(self) -> &'static str {
        match self {
            Vehicle::Attack => "attack",
            Vehicle::Relay => "relay",
            Vehicle::Ladder => "ladder",
            Vehicle::Ambulance => "ambulance",
        }
    }

    /// Vehicle attribute text as the target form spells it.
    pub fn attribute(self) -> &'static str {
        match self {
            Vehicle::Attack => "攻擊水箱車",
            Vehicle::Relay => "中繼水箱車",
            Vehicle::Ladder => "雲梯車",
            Vehicle::Ambulance => "一般型救護車",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Vehicle::Ambulance => "救護車",
            other => other.attribute(),
        }
    }

    /// Crew positions in seating order.
    pub fn positions(self) -> &'static [Position] {
        match self {
            Vehicle::Attack | Vehicle::Relay => &[
                Position::Driver,
                Position::Leader,
                Position::Nozzle,
                Position::AsstNozzle,
                Position::Search,
            ],
            Vehicle::Ladder => &[
                Position::Driver,
                Position::Leader,
                Position::Attendant,
                Position::Assistant,
            ],
            Vehicle::Ambulance => &[Position::Driver, Position::Emt],
        }
    }

    pub fn role_key(self, position: Position) -> Option<&'static str> {
        let key = match (self, position) {
            (Vehicle::Attack, Position::Driver) => "attack_driver",
            (Vehicle::Attack, Position::Leader) => "attack_leader",
            (Vehicle::Attack, Position::Nozzle) => "attack_nozzle",
            (Vehicle::Attack, Position::AsstNozzle) => "attack_asst_nozzle",
            (Vehicle::Attack, Position::Search) => "attack_search",
            (Vehicle::Relay, Position::Driver) => "relay_driver",
            (Vehicle::Relay, Position::Leader) => "relay_leader",
            (Vehicle::Relay, Position::Nozzle) => "relay_nozzle",
            (Vehicle::Relay, Position::AsstNozzle) => "relay_asst_nozzle",
            (Vehicle::Relay, Position::Search) => "relay_search",
            (Vehicle::Ladder, Position::Driver) => "ladder_driver",
            (Vehicle::Ladder, Position::Leader) => "ladder_leader",
            (Vehicle::Ladder, Position::Attendant) => "ladder_attendant",
            (Vehicle::Ladder, Position::Assistant) => "ladder_asst",
            (Vehicle::Ambulance, Position::Driver) => "ambulance_driver",
            (Vehicle::Ambulance, Position::Emt) => "ambulance_emt",
            _ => return None,
        };
        Some(key)
    }

    /// Role keys of the whole crew, in seating order.
    pub fn role_keys(self) -> Vec<&'static str> {
        self.positions()
            .iter()
            .filter_map(|&p| self.role_key(p))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedRole {
    pub key: &'static str,
    pub label: &'static str,
}

/// A predeclared group: its roles can be filled and cleared, never added or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedGroup {
    pub id: &'static str,
    pub title: &'static str,
    pub roles: Vec<FixedRole>,
}

/// Fire-watch first, then the vehicles.
pub fn fixed_groups() -> Vec<FixedGroup> {
    let mut groups = vec![FixedGroup {
        id: FIRE_WATCH_GROUP,
        title: FIRE_WATCH_LABEL,
        roles: vec![FixedRole {
            key: FIRE_WATCH,
            label: FIRE_WATCH_LABEL,
        }],
    }];
    for vehicle in Vehicle::ALL {
        groups.push(FixedGroup {
            id: vehicle.group_id(),
            title: vehicle.title(),
            roles: vehicle
                .positions()
                .iter()
                .filter_map(|&p| {
                    vehicle
                        .role_key(p)
                        .map(|key| FixedRole { key, label: p.label() })
                })
                .collect(),
        });
    }
    groups
}

pub fn is_fixed_group(id: &str) -> bool {
    id == FIRE_WATCH_GROUP || Vehicle::ALL.iter().any(|v| v.group_id() == id)
}

pub fn is_fixed_role(key: &str) -> bool {
    key == FIRE_WATCH || Vehicle::ALL.iter().any(|v| v.role_keys().contains(&key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_position_has_a_key() {
        for vehicle in Vehicle::ALL {
            assert_eq!(vehicle.role_keys().len(), vehicle.positions().len());
        }
    }

    #[test]
    fn ladder_has_no_search_position() {
        assert_eq!(Vehicle::Ladder.role_key(Position::Search), None);
        assert_eq!(Vehicle::Ladder.role_keys().len(), 4);
    }

    #[test]
    fn fixed_role_lookup() {
        assert!(is_fixed_role("relay_asst_nozzle"));
        assert!(is_fixed_role(FIRE_WATCH));
        assert!(!is_fixed_role("rest_0"));
        assert!(is_fixed_group("ladder"));
        assert!(!is_fixed_group("rest"));
    }

    #[test]
    fn fixed_groups_start_with_fire_watch() {
        let groups = fixed_groups();
        assert_eq!(groups[0].id, FIRE_WATCH_GROUP);
        assert_eq!(groups.len(), 5);
        assert_eq!(groups[1].roles[1].label, "帶隊官");
    }
}
