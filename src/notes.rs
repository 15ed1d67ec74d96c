use crate::assignment::groups::SlotModel;
use crate::assignment::store::AssignmentStore;

const NAME_SEPARATOR: &str = "、";

/// Remarks text summarising the dynamic groups.
///
/// One `title:name、name` line per group that has at least one occupant, in
/// group declaration order with names in slot order. Empty groups are left
/// out.
pub fn generate(model: &SlotModel, store: &AssignmentStore) -> String {
    model
        .dynamic_groups()
        .iter()
        .filter_map(|group| {
            let names: Vec<&str> = group
                .slot_roles()
                .iter()
                .filter_map(|role| store.occupant(role))
                .map(|person| person.name.as_str())
                .collect();
            if names.is_empty() {
                None
            } else {
                Some(format!("{}:{}", group.title, names.join(NAME_SEPARATOR)))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
