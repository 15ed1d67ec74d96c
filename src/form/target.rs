use serde::{Deserialize, Serialize};

/// An externally owned, row-oriented form the projection writes into.
///
/// Rows are addressed by index. Option lists are the visible option texts of
/// a dropdown in document order; index 0 is its placeholder.
pub trait TargetForm {
    /// Blank every call sign, deselect every radio id, put every dropdown
    /// back on its placeholder and empty the remarks.
    fn reset(&mut self);

    fn row_count(&self) -> usize;

    /// Text of each cell in the row, as displayed.
    fn cell_texts(&self, row: usize) -> Vec<String>;

    /// Options of the row's person selector, if it has one.
    fn person_options(&self, row: usize) -> Option<Vec<String>>;

    fn select_person(&mut self, row: usize, option: usize);

    fn set_call_sign(&mut self, row: usize, value: &str);

    /// Options of the global fire-watch selector, if the form has one.
    fn fire_watch_options(&self) -> Option<Vec<String>>;

    fn select_fire_watch(&mut self, option: usize);

    fn set_remarks(&mut self, text: &str);
}

/// Single-choice dropdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleSelect {
    pub options: Vec<String>,
    #[serde(default)]
    pub selected: usize,
}

/// Multi-choice list, e.g. the radio identifiers of a crew member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiSelect {
    pub options: Vec<String>,
    #[serde(default)]
    pub selected: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormRow {
    #[serde(default)]
    pub cells: Vec<String>,
    #[serde(default)]
    pub person: Option<SingleSelect>,
    #[serde(default)]
    pub call_sign: Option<String>,
    #[serde(default)]
    pub radio_ids: Option<MultiSelect>,
}

/// Plain-data description of a form, exchanged as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDocument {
    #[serde(default)]
    pub fire_watch: Option<SingleSelect>,
    #[serde(default)]
    pub rows: Vec<FormRow>,
    #[serde(default)]
    pub remarks: String,
}

impl FormDocument {
    /// Option text currently chosen in a row's person selector, placeholder excluded.
    pub fn selected_person(&self, row: usize) -> Option<&str> {
        self.rows
            .get(row)?
            .person
            .as_ref()
            .filter(|select| select.selected > 0)
            .and_then(|select| select.options.get(select.selected))
            .map(String::as_str)
    }
}

impl TargetForm for FormDocument {
    fn reset(&mut self) {
        for row in &mut self.rows {
            if let Some(call_sign) = row.call_sign.as_mut() {
                call_sign.clear();
            }
            if let Some(radio_ids) = row.radio_ids.as_mut() {
                radio_ids.selected.clear();
            }
            if let Some(person) = row.person.as_mut() {
                person.selected = 0;
            }
        }
        if let Some(fire_watch) = self.fire_watch.as_mut() {
            fire_watch.selected = 0;
        }
        self.remarks.clear();
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn cell_texts(&self, row: usize) -> Vec<String> {
        self.rows
            .get(row)
            .map(|r| r.cells.iter().map(|c| c.trim().to_string()).collect())
            .unwrap_or_default()
    }

    fn person_options(&self, row: usize) -> Option<Vec<String>> {
        self.rows.get(row)?.person.as_ref().map(|s| s.options.clone())
    }

    fn select_person(&mut self, row: usize, option: usize) {
        if let Some(select) = self.rows.get_mut(row).and_then(|r| r.person.as_mut()) {
            if option < select.options.len() {
                select.selected = option;
            }
        }
    }

    fn set_call_sign(&mut self, row: usize, value: &str) {
        if let Some(call_sign) = self.rows.get_mut(row).and_then(|r| r.call_sign.as_mut()) {
            *call_sign = value.to_string();
        }
    }

    fn fire_watch_options(&self) -> Option<Vec<String>> {
        self.fire_watch.as_ref().map(|s| s.options.clone())
    }

    fn select_fire_watch(&mut self, option: usize) {
        if let Some(select) = self.fire_watch.as_mut() {
            if option < select.options.len() {
                select.selected = option;
            }
        }
    }

    fn set_remarks(&mut self, text: &str) {
        self.remarks = text.to_string();
    }
}
