use std::collections::HashSet;

use crate::assignment::roles::{Position, Vehicle};

/// Where a role lands on the form: the row whose vehicle attribute and role
/// label match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleTarget {
    pub key: &'static str,
    pub attribute: &'static str,
    pub label: &'static str,
}

impl RoleTarget {
    pub fn display(&self) -> String {
        format!("{} {}", self.attribute, self.label)
    }
}

/// Every crew role in vehicle order, positions in seating order.
pub fn role_table() -> Vec<RoleTarget> {
    Vehicle::ALL
        .iter()
        .flat_map(|&vehicle| {
            vehicle.positions().iter().filter_map(move |&position| {
                vehicle.role_key(position).map(|key| RoleTarget {
                    key,
                    attribute: vehicle.attribute(),
                    label: position.label(),
                })
            })
        })
        .collect()
}

/// Vehicle attribute mentioned in the row. When several are mentioned the
/// one latest in vehicle order wins.
pub fn detect_attribute(cells: &[String]) -> Option<&'static str> {
    Vehicle::ALL
        .iter()
        .rev()
        .map(|v| v.attribute())
        .find(|attribute| cells.iter().any(|cell| cell.contains(attribute)))
}

/// Role labels present in the row.
///
/// Labels must fill the whole cell, except the search position which the
/// form decorates (破壞搜救手).
pub fn detect_roles(cells: &[String]) -> HashSet<&'static str> {
    const EXACT: [Position; 7] = [
        Position::Driver,
        Position::Leader,
        Position::Nozzle,
        Position::AsstNozzle,
        Position::Attendant,
        Position::Assistant,
        Position::Emt,
    ];
    let mut found = HashSet::new();
    for cell in cells {
        let cell = cell.trim();
        if let Some(position) = EXACT.iter().find(|p| p.label() == cell) {
            found.insert(position.label());
        } else if cell.contains(Position::Search.label()) {
            found.insert(Position::Search.label());
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn table_covers_every_crew_role() {
        let table = role_table();
        assert_eq!(table.len(), 16);
        assert_eq!(table[0].key, "attack_driver");
        assert_eq!(table[0].display(), "攻擊水箱車 司機");
        assert!(table.iter().any(|t| t.key == "ambulance_emt" && t.label == "救護技術員1"));
    }

    #[test]
    fn assistant_nozzle_is_not_read_as_nozzle() {
        let roles = detect_roles(&cells(&["副瞄子手"]));
        assert!(roles.contains("副瞄子手"));
        assert!(!roles.contains("瞄子手"));
    }

    #[test]
    fn search_matches_by_containment() {
        let roles = detect_roles(&cells(&["1", "破壞搜救手", "x"]));
        assert_eq!(roles.into_iter().collect::<Vec<_>>(), vec!["搜救手"]);
    }

    #[test]
    fn attribute_found_inside_longer_text() {
        assert_eq!(detect_attribute(&cells(&["91 雲梯車 (A)"])), Some("雲梯車"));
        assert_eq!(detect_attribute(&cells(&["司機"])), None);
        assert_eq!(
            detect_attribute(&cells(&["雲梯車", "支援攻擊水箱車"])),
            Some("雲梯車")
        );
        assert_eq!(
            detect_attribute(&cells(&["一般型救護車 / 中繼水箱車"])),
            Some("一般型救護車")
        );
    }
}
