use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use super::role_map::{detect_attribute, detect_roles, role_table};
use super::target::TargetForm;
use crate::assignment::roles::{Position, FIRE_WATCH, FIRE_WATCH_LABEL};
use crate::assignment::Assignments;
use crate::directory::Person;
use crate::inference::{infer_crews, InferencePattern};

/// Written into a leader's call-sign field whenever the leader is filled.
pub const LEADER_CALL_SIGN: &str = "02";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionState {
    Idle,
    Resetting,
    Scanning,
    Matching,
    Done,
    PartialFailure,
}

/// A role whose person has no option on the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedOption {
    pub role: String,
    pub person: String,
}

impl fmt::Display for UnmatchedOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: 找不到 {}", self.role, self.person)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectionReport {
    pub state: ProjectionState,
    pub pattern: Option<InferencePattern>,
    /// Role keys written to the form, in the order they were written.
    pub filled: Vec<String>,
    pub failures: Vec<UnmatchedOption>,
}

impl ProjectionReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Index of the first option whose text contains the person's name.
///
/// Matching is case-sensitive containment because option labels wrap the
/// name in codes and unit tags.
pub fn find_option(options: &[String], person: &Person) -> Option<usize> {
    let name = person.name.trim();
    if name.is_empty() {
        return None;
    }
    options.iter().position(|text| text.contains(name))
}

/// Writes an assignment into a [`TargetForm`].
///
/// Runs `Idle → Resetting → Scanning → (Matching per row) → Done |
/// PartialFailure`. A person without a matching option is recorded and the
/// scan carries on; writes already made are kept.
#[derive(Debug)]
pub struct Projector {
    state: ProjectionState,
}

impl Default for Projector {
    fn default() -> Self {
        Self::new()
    }
}

impl Projector {
    pub fn new() -> Self {
        Self {
            state: ProjectionState::Idle,
        }
    }

    pub fn state(&self) -> ProjectionState {
        self.state
    }

    fn enter(&mut self, next: ProjectionState) {
        debug!("projection {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    pub fn project<F>(&mut self, form: &mut F, assignments: &Assignments, notes: &str) -> ProjectionReport
    where
        F: TargetForm + ?Sized,
    {
        let mut filled = Vec::new();
        let mut failures = Vec::new();

        self.enter(ProjectionState::Resetting);
        form.reset();

        self.enter(ProjectionState::Scanning);
        if let (Some(person), Some(options)) = (assignments.get(FIRE_WATCH), form.fire_watch_options()) {
            match find_option(&options, person) {
                Some(index) => {
                    form.select_fire_watch(index);
                    filled.push(FIRE_WATCH.to_string());
                }
                None => failures.push(unmatched(FIRE_WATCH_LABEL.to_string(), person)),
            }
        }

        let table = role_table();
        let mut done: HashSet<&'static str> = HashSet::new();
        let mut attribute: Option<&'static str> = None;

        for row in 0..form.row_count() {
            let cells = form.cell_texts(row);
            // Attribute labels span rows: a row without one belongs to the last vehicle seen.
            if let Some(found) = detect_attribute(&cells) {
                attribute = Some(found);
            }
            let Some(options) = form.person_options(row) else {
                continue;
            };
            let roles = detect_roles(&cells);

            self.enter(ProjectionState::Matching);
            for target in &table {
                if done.contains(target.key)
                    || attribute != Some(target.attribute)
                    || !roles.contains(target.label)
                {
                    continue;
                }
                let Some(person) = assignments.get(target.key) else {
                    continue;
                };
                done.insert(target.key);
                match find_option(&options, person) {
                    Some(index) => {
                        form.select_person(row, index);
                        if target.label == Position::Leader.label() {
                            form.set_call_sign(row, LEADER_CALL_SIGN);
                        }
                        filled.push(target.key.to_string());
                    }
                    None => failures.push(unmatched(target.display(), person)),
                }
                // One role per row.
                break;
            }
            self.enter(ProjectionState::Scanning);
        }

        form.set_remarks(notes);

        if failures.is_empty() {
            self.enter(ProjectionState::Done);
            info!("Projection filled {} roles", filled.len());
        } else {
            self.enter(ProjectionState::PartialFailure);
        }

        ProjectionReport {
            state: self.state,
            pattern: None,
            filled,
            failures,
        }
    }
}

fn unmatched(role: String, person: &Person) -> UnmatchedOption {
    let entry = UnmatchedOption {
        role,
        person: person.name.clone(),
    };
    warn!("{}", entry);
    entry
}

/// Infers the relay and ladder crews, then projects the result together with
/// the notes. The session's own assignments are left untouched.
pub fn quick_fill<F>(form: &mut F, assignments: &Assignments, notes: &str) -> ProjectionReport
where
    F: TargetForm + ?Sized,
{
    let inferred = infer_crews(assignments);
    let mut report = Projector::new().project(form, &inferred.assignments, notes);
    report.pattern = Some(inferred.pattern);
    report
}
