use serde::{Deserialize, Serialize};

use super::roles::{fixed_groups, is_fixed_group, is_fixed_role};
use crate::directory::Person;
use crate::error::AssignmentError;

pub const REST_GROUP: &str = "rest";
pub const WATER_GROUP: &str = "water";
pub const REST_TITLE: &str = "休息";
pub const WATER_TITLE: &str = "水源查察";
pub const DEFAULT_CUSTOM_TITLE: &str = "新增欄位";
const CUSTOM_PREFIX: &str = "custom_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    Rest,
    Water,
    Custom,
}

/// A resizable, nameable group of slots.
///
/// Ordinals are handed out by a per-group counter and never reused, so
/// deleting a slot leaves the role keys of its siblings untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DynamicGroup {
    pub id: String,
    pub title: String,
    pub kind: GroupKind,
    next_ordinal: u32,
    ordinals: Vec<u32>,
}

impl DynamicGroup {
    fn new(id: impl Into<String>, title: impl Into<String>, kind: GroupKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            next_ordinal: 0,
            ordinals: Vec::new(),
        }
    }

    /// Value of the ordinal counter, persisted as the group's slot count.
    pub fn slot_count(&self) -> u32 {
        self.next_ordinal
    }

    pub fn ordinals(&self) -> &[u32] {
        &self.ordinals
    }

    /// Role keys of the live slots, in slot order.
    pub fn slot_roles(&self) -> Vec<String> {
        self.ordinals
            .iter()
            .map(|&ordinal| slot_role(&self.id, ordinal))
            .collect()
    }

    /// Ordinal of a live slot, matched on the canonical role key only.
    fn ordinal_of(&self, role: &str) -> Option<u32> {
        self.ordinals
            .iter()
            .copied()
            .find(|&ordinal| slot_role(&self.id, ordinal) == role)
    }

    fn owns(&self, role: &str) -> bool {
        self.ordinal_of(role).is_some()
    }
}

/// Role key of a dynamic slot.
pub fn slot_role(group_id: &str, ordinal: u32) -> String {
    format!("{}_{}", group_id, ordinal)
}

/// Read-only view of one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub role: String,
    pub occupant: Option<Person>,
    pub dynamic: bool,
    pub group_id: Option<String>,
}

/// Fixed roles plus the dynamic groups, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotModel {
    groups: Vec<DynamicGroup>,
}

impl Default for SlotModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotModel {
    /// Rest and water groups with no slots, no custom groups.
    pub fn new() -> Self {
        Self {
            groups: vec![
                DynamicGroup::new(REST_GROUP, REST_TITLE, GroupKind::Rest),
                DynamicGroup::new(WATER_GROUP, WATER_TITLE, GroupKind::Water),
            ],
        }
    }

    pub fn dynamic_groups(&self) -> &[DynamicGroup] {
        &self.groups
    }

    pub fn group(&self, id: &str) -> Option<&DynamicGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    fn group_mut(&mut self, id: &str) -> Result<&mut DynamicGroup, AssignmentError> {
        if is_fixed_group(id) {
            return Err(AssignmentError::FixedGroup(id.to_string()));
        }
        self.groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| AssignmentError::UnknownGroup(id.to_string()))
    }

    pub fn contains_slot(&self, role: &str) -> bool {
        is_fixed_role(role) || self.dynamic_group_of(role).is_some()
    }

    pub fn dynamic_group_of(&self, role: &str) -> Option<&DynamicGroup> {
        self.groups.iter().find(|g| g.owns(role))
    }

    /// Group id of any slot, fixed or dynamic.
    pub fn group_of(&self, role: &str) -> Option<&str> {
        if let Some(group) = self.dynamic_group_of(role) {
            return Some(group.id.as_str());
        }
        fixed_groups()
            .into_iter()
            .find(|g| g.roles.iter().any(|r| r.key == role))
            .map(|g| g.id)
    }

    /// Every slot role: fixed roles first, then dynamic slots group by group.
    pub fn slot_roles(&self) -> Vec<String> {
        let mut roles: Vec<String> = fixed_groups()
            .into_iter()
            .flat_map(|g| g.roles.into_iter().map(|r| r.key.to_string()))
            .collect();
        for group in &self.groups {
            roles.extend(group.slot_roles());
        }
        roles
    }

    /// Appends an empty slot to a dynamic group and returns its role key.
    pub fn create_dynamic_slot(&mut self, group_id: &str) -> Result<String, AssignmentError> {
        let group = self.group_mut(group_id)?;
        let ordinal = group.next_ordinal;
        group.next_ordinal += 1;
        group.ordinals.push(ordinal);
        Ok(slot_role(&group.id, ordinal))
    }

    /// Removes a dynamic slot. The caller is responsible for its occupant.
    pub fn remove_slot(&mut self, role: &str) -> Result<(), AssignmentError> {
        if is_fixed_role(role) {
            return Err(AssignmentError::FixedSlot(role.to_string()));
        }
        let (group, ordinal) = self
            .groups
            .iter_mut()
            .find_map(|g| g.ordinal_of(role).map(|ordinal| (g, ordinal)))
            .ok_or_else(|| AssignmentError::UnknownSlot(role.to_string()))?;
        group.ordinals.retain(|&o| o != ordinal);
        Ok(())
    }

    /// Allocates a custom group with a time-based id and no slots.
    pub fn create_custom_group(&mut self, title: &str) -> String {
        let mut stamp = chrono::Utc::now().timestamp_millis();
        let mut id = format!("{}{}", CUSTOM_PREFIX, stamp);
        while self.group(&id).is_some() {
            stamp += 1;
            id = format!("{}{}", CUSTOM_PREFIX, stamp);
        }
        self.groups
            .push(DynamicGroup::new(id.clone(), title, GroupKind::Custom));
        id
    }

    /// Removes a custom group and hands back its slots so the caller can
    /// release their occupants.
    pub fn remove_group(&mut self, id: &str) -> Result<DynamicGroup, AssignmentError> {
        let kind = self.group_mut(id)?.kind;
        if kind != GroupKind::Custom {
            return Err(AssignmentError::BuiltinGroup(id.to_string()));
        }
        let index = self
            .groups
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| AssignmentError::UnknownGroup(id.to_string()))?;
        Ok(self.groups.remove(index))
    }

    pub fn rename_group(&mut self, id: &str, title: &str) -> Result<(), AssignmentError> {
        self.group_mut(id)?.title = title.to_string();
        Ok(())
    }

    /// Re-creates a group from persisted metadata.
    ///
    /// `ordinals` lists the live slots; without it every ordinal below
    /// `count` is live.
    pub fn restore_group(&mut self, id: &str, title: &str, count: u32, ordinals: Option<&[u32]>) {
        let mut live: Vec<u32> = match ordinals {
            Some(list) => list.iter().copied().filter(|&o| o < count).collect(),
            None => (0..count).collect(),
        };
        live.sort_unstable();
        live.dedup();

        if let Some(group) = self.groups.iter_mut().find(|g| g.id == id) {
            group.title = title.to_string();
            group.next_ordinal = count;
            group.ordinals = live;
            return;
        }
        if is_fixed_group(id) {
            return;
        }
        let mut group = DynamicGroup::new(id, title, GroupKind::Custom);
        group.next_ordinal = count;
        group.ordinals = live;
        self.groups.push(group);
    }
}
