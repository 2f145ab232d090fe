use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{ApplicationStatus, Job, JobId, PlacementStatus, StudentId};
use crate::eligibility::JobEligibility;
use crate::matching::MatchComponent;

/// Answer to "can this student apply to this job right now?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityCheck {
    pub is_eligible: bool,
    pub eligibility_issues: Vec<String>,
    pub already_applied: bool,
    pub application_status: Option<ApplicationStatus>,
    pub can_apply: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueList {
    pub is_eligible: bool,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobEligibilityView {
    pub job: Job,
    pub eligibility_check: IssueList,
    pub already_applied: bool,
    pub can_apply: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibleJobsReport {
    pub jobs: Vec<JobEligibilityView>,
    pub total_jobs: usize,
    pub eligible_jobs: usize,
    pub applied_jobs: usize,
}

impl EligibleJobsReport {
    pub fn from_views(jobs: Vec<JobEligibilityView>) -> Self {
        let eligible_jobs = jobs
            .iter()
            .filter(|view| view.eligibility_check.is_eligible)
            .count();
        let applied_jobs = jobs.iter().filter(|view| view.already_applied).count();
        Self {
            total_jobs: jobs.len(),
            eligible_jobs,
            applied_jobs,
            jobs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentEligibilityRow {
    pub student_id: StudentId,
    pub full_name: String,
    pub roll_number: Option<String>,
    pub branch: Option<String>,
    pub cgpa: Option<f64>,
    pub tenth_percentage: Option<f64>,
    pub twelfth_percentage: Option<f64>,
    pub current_backlogs: Option<u32>,
    pub total_backlogs: Option<u32>,
    pub placement_status: PlacementStatus,
    pub is_eligible: bool,
    pub eligibility_issues: Vec<String>,
    pub has_applied: bool,
    pub application_status: Option<ApplicationStatus>,
    pub application_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibleStudentsSummary {
    pub total_students: usize,
    pub eligible: usize,
    pub ineligible: usize,
    pub applied: usize,
    /// Eligible students who have not applied yet.
    pub not_applied: usize,
}

/// The job a student listing was screened against, including the criteria applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobHeader {
    pub id: JobId,
    pub title: String,
    pub company: String,
    pub eligibility: JobEligibility,
}

#[derive(Debug, Clone, Serialize)]
pub struct EligibleStudentsReport {
    pub students: Vec<StudentEligibilityRow>,
    pub summary: EligibleStudentsSummary,
    pub job: JobHeader,
}

impl EligibleStudentsReport {
    pub fn new(job: JobHeader, students: Vec<StudentEligibilityRow>) -> Self {
        let summary = EligibleStudentsSummary {
            total_students: students.len(),
            eligible: students.iter().filter(|row| row.is_eligible).count(),
            ineligible: students.iter().filter(|row| !row.is_eligible).count(),
            applied: students.iter().filter(|row| row.has_applied).count(),
            not_applied: students
                .iter()
                .filter(|row| row.is_eligible && !row.has_applied)
                .count(),
        };
        Self {
            students,
            summary,
            job,
        }
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        write_rows(
            writer,
            self.students.iter().map(|row| CsvRow {
                student_id: row.student_id.as_str(),
                full_name: &row.full_name,
                branch: row.branch.as_deref().unwrap_or_default(),
                is_eligible: row.is_eligible,
                issues: row.eligibility_issues.join("; "),
            }),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkEligibilityRow {
    pub student_id: StudentId,
    pub full_name: String,
    pub branch: Option<String>,
    pub is_eligible: bool,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkEligibilityReport {
    pub total: usize,
    pub eligible: usize,
    pub ineligible: usize,
    pub results: Vec<BulkEligibilityRow>,
}

impl BulkEligibilityReport {
    pub fn from_rows(results: Vec<BulkEligibilityRow>) -> Self {
        let eligible = results.iter().filter(|row| row.is_eligible).count();
        Self {
            total: results.len(),
            eligible,
            ineligible: results.len() - eligible,
            results,
        }
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        write_rows(
            writer,
            self.results.iter().map(|row| CsvRow {
                student_id: row.student_id.as_str(),
                full_name: &row.full_name,
                branch: row.branch.as_deref().unwrap_or_default(),
                is_eligible: row.is_eligible,
                issues: row.issues.join("; "),
            }),
        )
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub job: Job,
    pub match_score: u32,
    pub is_eligible: bool,
    pub eligibility_issues: Vec<String>,
    pub components: Vec<MatchComponent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationsReport {
    pub recommendations: Vec<Recommendation>,
    pub total: usize,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    student_id: &'a str,
    full_name: &'a str,
    branch: &'a str,
    is_eligible: bool,
    issues: String,
}

fn write_rows<'a, W, I>(writer: W, rows: I) -> Result<(), csv::Error>
where
    W: Write,
    I: IntoIterator<Item = CsvRow<'a>>,
{
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(["student_id", "full_name", "branch", "is_eligible", "issues"])?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}
