use crate::assignment::roles::fixed_groups;
use crate::assignment::{AssignmentStore, SlotModel};
use crate::directory::Person;
use crate::form::ProjectionReport;

/// Formats a person as shown on chips and in the roster: `code name`
pub fn format_person(person: &Person) -> String {
    if person.code.is_empty() {
        person.name.clone()
    } else {
        format!("{} {}", person.code, person.name)
    }
}

/// Read-only summary of the assignment, one line per non-empty group.
///
/// Fixed groups list `label:name` pairs, dynamic groups list names.
pub fn summary(model: &SlotModel, store: &AssignmentStore) -> String {
    let mut lines = Vec::new();

    for group in fixed_groups() {
        let items: Vec<String> = group
            .roles
            .iter()
            .filter_map(|role| {
                store
                    .occupant(role.key)
                    .map(|p| format!("{}:{}", role.label, p.name))
            })
            .collect();
        if !items.is_empty() {
            lines.push(format!("【{}】{}", group.title, items.join(" ｜ ")));
        }
    }

    for group in model.dynamic_groups() {
        let names: Vec<&str> = group
            .slot_roles()
            .iter()
            .filter_map(|role| store.occupant(role))
            .map(|p| p.name.as_str())
            .collect();
        if !names.is_empty() {
            lines.push(format!("【{}】{}", group.title, names.join("、")));
        }
    }

    if lines.is_empty() {
        "尚無作戰編組資料。".to_string()
    } else {
        lines.join("\n")
    }
}

/// Text shown to the user once a projection has finished.
pub fn render_report(report: &ProjectionReport) -> String {
    if report.is_success() {
        return format!("快速填寫完成！({} 個職務)", report.filled.len());
    }
    let mut text = String::from("快速填入遇到錯誤：");
    for failure in &report.failures {
        text.push('\n');
        text.push_str(&failure.to_string());
    }
    text
}

/// Prints a projection report in a readable format
pub fn print_report(report: &ProjectionReport) {
    println!("\n=== Quick Fill ===");
    if let Some(pattern) = report.pattern {
        println!("Crew pattern: {:?}", pattern);
    }
    println!("Filled roles ({}):", report.filled.len());
    for role in &report.filled {
        println!("  - {}", role);
    }
    println!("{}", render_report(report));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::engine::place;
    use crate::assignment::groups::REST_GROUP;
    use crate::form::projection::{ProjectionState, UnmatchedOption};

    #[test]
    fn summary_groups_fixed_and_dynamic_roles() {
        let mut model = SlotModel::new();
        let mut store = AssignmentStore::new();
        let rest = model.create_dynamic_slot(REST_GROUP).unwrap();
        place(&model, &mut store, &Person::new("1", "甲"), "attack_driver").unwrap();
        place(&model, &mut store, &Person::new("2", "乙"), "attack_leader").unwrap();
        place(&model, &mut store, &Person::new("3", "丙"), &rest).unwrap();

        assert_eq!(
            summary(&model, &store),
            "【攻擊水箱車】司機:甲 ｜ 帶隊官:乙\n【休息】丙"
        );
    }

    #[test]
    fn empty_summary_has_placeholder() {
        assert_eq!(
            summary(&SlotModel::new(), &AssignmentStore::new()),
            "尚無作戰編組資料。"
        );
    }

    #[test]
    fn report_lists_every_failure() {
        let report = ProjectionReport {
            state: ProjectionState::PartialFailure,
            pattern: None,
            filled: vec![],
            failures: vec![
                UnmatchedOption { role: "雲梯車 司機".into(), person: "甲".into() },
                UnmatchedOption { role: "火警值班".into(), person: "乙".into() },
            ],
        };
        assert_eq!(
            render_report(&report),
            "快速填入遇到錯誤：\n雲梯車 司機: 找不到 甲\n火警值班: 找不到 乙"
        );
        assert_eq!(format_person(&Person::new("7", "丁")), "7 丁");
    }
}
