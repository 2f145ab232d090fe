//! Student roster import from the placement cell's CSV exports.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use super::domain::{
    CollegeId, PlacementStatus, StudentId, StudentProfile, VerificationStatus,
};
use crate::eligibility::{Skill, StudentRecord};
use crate::matching::PlacementPreferences;

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("failed to read roster: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid roster CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("roster line {line}: {reason}")]
    InvalidRow { line: usize, reason: String },
    #[error("roster lists student '{0}' more than once")]
    DuplicateStudent(String),
}

/// One student as listed on a roster.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub student_id: StudentId,
    pub full_name: String,
    pub record: StudentRecord,
}

impl RosterEntry {
    /// Roster rows come from the placement cell, so the profile counts as complete and verified.
    pub fn into_profile(self, college_id: CollegeId) -> StudentProfile {
        StudentProfile {
            id: self.student_id,
            college_id,
            full_name: self.full_name,
            roll_number: None,
            record: self.record,
            preferences: PlacementPreferences::default(),
            profile_completed: true,
            placement_status: PlacementStatus::Unplaced,
            verification: VerificationStatus::Verified,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    student_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    full_name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    branch: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    cgpa: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    tenth_percentage: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    twelfth_percentage: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    current_backlogs: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    total_backlogs: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    year_of_study: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    skills: Option<String>,
}

impl RosterRow {
    fn into_entry(self, line: usize) -> Result<RosterEntry, RosterError> {
        let student_id = self.student_id.ok_or_else(|| RosterError::InvalidRow {
            line,
            reason: "student_id is required".to_string(),
        })?;

        let skills = self
            .skills
            .as_deref()
            .map(|raw| {
                raw.split(';')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(Skill::named)
                    .collect()
            })
            .unwrap_or_default();

        let record = StudentRecord {
            cgpa: parse_field(self.cgpa.as_deref(), "cgpa", line)?,
            tenth_percentage: parse_field(self.tenth_percentage.as_deref(), "tenth_percentage", line)?,
            twelfth_percentage: parse_field(
                self.twelfth_percentage.as_deref(),
                "twelfth_percentage",
                line,
            )?,
            branch: self.branch,
            current_backlogs: parse_field(self.current_backlogs.as_deref(), "current_backlogs", line)?,
            total_backlogs: parse_field(self.total_backlogs.as_deref(), "total_backlogs", line)?,
            year_of_study: parse_field(self.year_of_study.as_deref(), "year_of_study", line)?,
            semester: None,
            skills,
        };

        Ok(RosterEntry {
            full_name: self.full_name.unwrap_or_else(|| student_id.clone()),
            student_id: StudentId(student_id),
            record,
        })
    }
}

fn parse_field<T: FromStr>(
    value: Option<&str>,
    column: &str,
    line: usize,
) -> Result<Option<T>, RosterError> {
    match value {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| RosterError::InvalidRow {
                line,
                reason: format!("{column} '{raw}' is not a valid number"),
            }),
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

pub fn parse_roster<R: Read>(reader: R) -> Result<Vec<RosterEntry>, RosterError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for (index, row) in csv_reader.deserialize::<RosterRow>().enumerate() {
        // Line 1 is the header.
        let entry = row?.into_entry(index + 2)?;
        if !seen.insert(entry.student_id.clone()) {
            return Err(RosterError::DuplicateStudent(entry.student_id.0));
        }
        entries.push(entry);
    }
    Ok(entries)
}

pub fn load_roster<P: AsRef<Path>>(path: P) -> Result<Vec<RosterEntry>, RosterError> {
    let file = std::fs::File::open(path)?;
    parse_roster(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROSTER: &str = "\
student_id,full_name,branch,cgpa,tenth_percentage,twelfth_percentage,current_backlogs,total_backlogs,year_of_study,skills
s-001, Asha Rao ,CSE,8.2,88,91,0,0,4,Rust; SQL ;Docker
s-002,Vikram N,MECH,6.1,,72,1,2,,
";

    #[test]
    fn parses_rows_with_optional_cells() {
        let entries = parse_roster(ROSTER.as_bytes()).expect("roster parses");
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.student_id, StudentId::new("s-001"));
        assert_eq!(first.full_name, "Asha Rao");
        assert_eq!(first.record.cgpa, Some(8.2));
        assert_eq!(first.record.year_of_study, Some(4));
        assert!(first.record.has_skill("sql"));
        assert_eq!(first.record.skills.len(), 3);

        let second = &entries[1];
        assert_eq!(second.record.tenth_percentage, None);
        assert_eq!(second.record.total_backlogs, Some(2));
        assert_eq!(second.record.year_of_study, None);
        assert!(second.record.skills.is_empty());
    }

    #[test]
    fn reports_line_of_unparseable_number() {
        let data = "student_id,cgpa\ns-001,8.0\ns-002,eight\n";
        match parse_roster(data.as_bytes()) {
            Err(RosterError::InvalidRow { line, reason }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("cgpa"));
            }
            other => panic!("expected invalid row, got {other:?}"),
        }
    }

    #[test]
    fn rejects_duplicate_students() {
        let data = "student_id,cgpa\ns-001,8.0\ns-001,7.0\n";
        assert!(matches!(
            parse_roster(data.as_bytes()),
            Err(RosterError::DuplicateStudent(id)) if id == "s-001"
        ));
    }

    #[test]
    fn imported_profiles_are_ready_for_screening() {
        let entries = parse_roster(ROSTER.as_bytes()).expect("roster parses");
        let profile = entries[0]
            .clone()
            .into_profile(CollegeId::new("college-1"));

        assert!(profile.profile_completed);
        assert!(profile.is_verified());
        assert_eq!(profile.college_id, CollegeId::new("college-1"));
    }
}
