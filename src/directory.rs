use async_trait::async_trait;
use csv::ReaderBuilder;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::DirectoryError;

/// A member of staff as read from the duty schedule. Identity is the code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Person {
    #[serde(alias = "id")]
    pub code: String,
    pub name: String,
}

impl Person {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Code → name table plus the codes working the current schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonnelDirectory {
    pub id_to_name: HashMap<String, String>,
    pub on_duty: Vec<String>,
}

impl PersonnelDirectory {
    pub fn is_empty(&self) -> bool {
        self.id_to_name.is_empty()
    }

    pub fn person(&self, code: &str) -> Option<Person> {
        self.id_to_name
            .get(code)
            .map(|name| Person::new(code, name.clone()))
    }

    /// People offered for assignment, ordered by the numeric part of their code.
    ///
    /// Only on-duty people are listed when an on-duty list exists; a schedule
    /// without one lists everybody in the table.
    pub fn roster(&self) -> Vec<Person> {
        let mut people: Vec<Person> = if self.on_duty.is_empty() {
            self.id_to_name
                .iter()
                .map(|(code, name)| Person::new(code.clone(), name.clone()))
                .collect()
        } else {
            let mut seen = std::collections::HashSet::new();
            self.on_duty
                .iter()
                .filter(|code| seen.insert(code.as_str()))
                .filter_map(|code| self.person(code))
                .collect()
        };
        people.sort_by(|a, b| {
            numeric_key(&a.code)
                .cmp(&numeric_key(&b.code))
                .then_with(|| a.code.cmp(&b.code))
        });
        people
    }
}

/// Digits of a code read as a number; codes without digits sort first.
pub fn numeric_key(code: &str) -> u64 {
    let digits: String = code.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Case-insensitive match of a search term against `"<code> <name>"`.
pub fn matches_search(person: &Person, term: &str) -> bool {
    let haystack = format!("{} {}", person.code, person.name).to_lowercase();
    haystack.contains(&term.to_lowercase())
}

/// Where the personnel directory comes from.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    async fn load(&self) -> Result<PersonnelDirectory, DirectoryError>;
}

/// Directory read from a CSV export of the duty schedule.
pub struct CsvDirectory {
    pub path: PathBuf,
}

impl CsvDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DirectorySource for CsvDirectory {
    async fn load(&self) -> Result<PersonnelDirectory, DirectoryError> {
        let data = tokio::fs::read(&self.path).await?;
        let directory = parse_roster_csv(&data)?;
        if directory.is_empty() {
            warn!("No personnel found in {}", self.path.display());
        } else {
            info!(
                "Loaded {} personnel ({} on duty) from {}",
                directory.id_to_name.len(),
                directory.on_duty.len(),
                self.path.display()
            );
        }
        Ok(directory)
    }
}

/// Fixed directory, used when the table has already been extracted upstream.
pub struct StaticDirectory(pub PersonnelDirectory);

#[async_trait]
impl DirectorySource for StaticDirectory {
    async fn load(&self) -> Result<PersonnelDirectory, DirectoryError> {
        Ok(self.0.clone())
    }
}

/// Parses a boolean value from the spellings found in schedule exports
fn parse_bool(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    lower == "yes" || lower == "true" || lower == "1" || lower == "v" || lower == "是"
}

/// Reads a roster CSV.
///
/// A header row naming a code and a name column is read as a roster with an
/// optional on-duty column. Anything else is treated as a raw schedule table
/// and handed to [`scan_id_table`].
pub fn parse_roster_csv(data: &[u8]) -> Result<PersonnelDirectory, DirectoryError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(|cell| cell.trim().to_string()).collect());
    }

    let Some(header) = rows.first() else {
        return Ok(PersonnelDirectory::default());
    };

    // Find column indices
    let find = |keys: &[&str]| {
        header.iter().position(|h| {
            let h = h.to_lowercase();
            keys.iter().any(|k| h.contains(k))
        })
    };
    let on_duty_col = find(&["on duty", "on_duty", "上班"]);
    let code_col = find(&["代號", "code"]).or_else(|| find(&["id"]));
    let name_col = find(&["姓名", "name"]);

    let (Some(code_col), Some(name_col)) = (code_col, name_col) else {
        return Ok(PersonnelDirectory {
            id_to_name: scan_id_table(&rows),
            on_duty: Vec::new(),
        });
    };

    let mut directory = PersonnelDirectory::default();
    for row in rows.iter().skip(1) {
        let code = row.get(code_col).map(String::as_str).unwrap_or("");
        let name = row.get(name_col).map(String::as_str).unwrap_or("");

        // Skip if essential fields are missing
        if code.is_empty() || name.is_empty() {
            continue;
        }

        let on_duty = on_duty_col
            .and_then(|col| row.get(col))
            .map(|v| parse_bool(v))
            .unwrap_or(false);
        if on_duty && !directory.on_duty.iter().any(|c| c == code) {
            directory.on_duty.push(code.to_string());
        }
        directory.id_to_name.insert(code.to_string(), name.to_string());
    }
    Ok(directory)
}

/// Extracts `code → name` pairs from a schedule's personnel table: any purely
/// numeric cell followed by a non-empty cell is one entry.
pub fn scan_id_table(rows: &[Vec<String>]) -> HashMap<String, String> {
    let mut id_to_name = HashMap::new();
    for row in rows {
        for pair in row.windows(2) {
            let current = pair[0].trim();
            let next = pair[1].trim();
            if !current.is_empty() && current.chars().all(|c| c.is_ascii_digit()) && !next.is_empty() {
                id_to_name.insert(current.to_string(), next.to_string());
            }
        }
    }
    id_to_name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory(entries: &[(&str, &str)], on_duty: &[&str]) -> PersonnelDirectory {
        PersonnelDirectory {
            id_to_name: entries
                .iter()
                .map(|(c, n)| (c.to_string(), n.to_string()))
                .collect(),
            on_duty: on_duty.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn roster_orders_by_numeric_code() {
        let dir = directory(&[("10", "丁"), ("2", "乙"), ("A1", "甲")], &[]);
        let codes: Vec<_> = dir.roster().into_iter().map(|p| p.code).collect();
        assert_eq!(codes, vec!["A1", "2", "10"]);
    }

    #[test]
    fn roster_restricted_to_on_duty() {
        let dir = directory(&[("1", "甲"), ("2", "乙"), ("3", "丙")], &["3", "1", "99"]);
        let codes: Vec<_> = dir.roster().into_iter().map(|p| p.code).collect();
        assert_eq!(codes, vec!["1", "3"]);
    }

    #[test]
    fn search_is_case_insensitive_over_code_and_name() {
        let person = Person::new("A07", "Wang");
        assert!(matches_search(&person, "a07"));
        assert!(matches_search(&person, "WANG"));
        assert!(!matches_search(&person, "lin"));
    }

    #[test]
    fn parses_roster_with_headers() {
        let csv = "代號,姓名,上班\n1,王小明,是\n2,陳大文,\n3,林美,yes\n";
        let dir = parse_roster_csv(csv.as_bytes()).unwrap();
        assert_eq!(dir.id_to_name.len(), 3);
        assert_eq!(dir.on_duty, vec!["1", "3"]);
        assert_eq!(dir.person("2").unwrap().name, "陳大文");
    }

    #[test]
    fn falls_back_to_table_scan() {
        let csv = "勤務輪流順序與服勤人員對照表,,,\n1,詹博鈞,2,王小明\n3,,x,y\n";
        let dir = parse_roster_csv(csv.as_bytes()).unwrap();
        assert_eq!(dir.id_to_name.len(), 2);
        assert_eq!(dir.id_to_name["1"], "詹博鈞");
        assert_eq!(dir.id_to_name["2"], "王小明");
        assert!(dir.on_duty.is_empty());
    }

    #[test]
    fn empty_csv_gives_empty_directory() {
        let dir = parse_roster_csv(b"").unwrap();
        assert!(dir.is_empty());
    }

    #[tokio::test]
    async fn csv_directory_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.csv");
        std::fs::write(&path, "code,name,on duty\n5,林美,1\n").unwrap();

        let loaded = CsvDirectory::new(&path).load().await.unwrap();
        assert_eq!(loaded.roster(), vec![Person::new("5", "林美")]);
    }

    #[test]
    fn person_accepts_legacy_id_field() {
        let person: Person = serde_json::from_str(r#"{"id":"7","name":"甲"}"#).unwrap();
        assert_eq!(person, Person::new("7", "甲"));
    }
}
