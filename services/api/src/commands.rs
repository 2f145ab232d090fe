use crate::infra::{
    load_seed, parse_timestamp, InMemoryPlacementRepository, LoggingNotificationPublisher,
};
use campus_placement::config::{AppConfig, EligibilityConfig};
use campus_placement::eligibility::{
    legacy, EligibilityEngine, EligibilityError, EligibilityResult,
};
use campus_placement::error::AppError;
use campus_placement::matching::JobPosting;
use campus_placement::workflows::placement::{
    load_roster, BulkEligibilityReport, BulkEligibilityRow, PlacementService, RosterEntry,
    StudentId,
};
use chrono::{DateTime, Utc};
use clap::Args;
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct CheckArgs {
    /// Job document (JSON) in any supported eligibility layout
    #[arg(long)]
    pub(crate) job: PathBuf,
    /// Student document (JSON), flat or education-nested
    #[arg(long)]
    pub(crate) student: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct BulkArgs {
    /// Job document (JSON) in any supported eligibility layout
    #[arg(long)]
    pub(crate) job: PathBuf,
    /// Roster CSV with one student per row
    #[arg(long)]
    pub(crate) roster: PathBuf,
    /// Write the CSV report here instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct RecommendArgs {
    /// Seed file (JSON) with `jobs` and `students`
    #[arg(long)]
    pub(crate) seed: PathBuf,
    /// Student to rank jobs for
    #[arg(long)]
    pub(crate) student: String,
    /// Maximum number of recommendations (defaults to PLACEMENT_RECOMMENDATION_LIMIT)
    #[arg(long)]
    pub(crate) limit: Option<usize>,
    /// Evaluation instant (RFC 3339). Defaults to now.
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) now: Option<DateTime<Utc>>,
}

fn read_document(path: &Path) -> Result<Value, AppError> {
    let file = std::fs::File::open(path)?;
    Ok(serde_json::from_reader(io::BufReader::new(file))?)
}

pub(crate) fn run_check(args: CheckArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let job = read_document(&args.job)?;
    let student = read_document(&args.student)?;

    let result = check_documents(&config.eligibility, &job, &student)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn check_documents(
    config: &EligibilityConfig,
    job: &Value,
    student: &Value,
) -> Result<EligibilityResult, EligibilityError> {
    EligibilityEngine::new(config.department_matching).screen_value(
        job,
        student,
        config.unresolved_department,
    )
}

pub(crate) fn run_bulk(args: BulkArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let posting = legacy::normalize_job(&read_document(&args.job)?)?;
    let roster = load_roster(&args.roster)?;

    let report = screen_roster(&config.eligibility, &posting, roster)?;
    match args.output {
        Some(path) => report.write_csv(std::fs::File::create(path)?)?,
        None => report.write_csv(io::stdout().lock())?,
    }
    eprintln!(
        "{} students screened: {} eligible, {} ineligible",
        report.total, report.eligible, report.ineligible
    );
    Ok(())
}

fn screen_roster(
    config: &EligibilityConfig,
    posting: &JobPosting,
    roster: Vec<RosterEntry>,
) -> Result<BulkEligibilityReport, EligibilityError> {
    let engine = EligibilityEngine::new(config.department_matching);
    let mut rows = Vec::with_capacity(roster.len());
    for entry in roster {
        let verdict = engine.screen_in_batch(
            &posting.eligibility,
            &entry.record,
            config.unresolved_department,
        )?;
        rows.push(BulkEligibilityRow {
            student_id: entry.student_id,
            full_name: entry.full_name,
            branch: entry.record.branch,
            is_eligible: verdict.is_eligible,
            issues: verdict.issues,
        });
    }
    Ok(BulkEligibilityReport::from_rows(rows))
}

pub(crate) fn run_recommend(args: RecommendArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let seed = load_seed(&args.seed)?;
    let repository = InMemoryPlacementRepository::seeded(seed)
        .map_err(io::Error::other)?;
    let service = PlacementService::new(
        Arc::new(repository),
        Arc::new(LoggingNotificationPublisher),
        config.eligibility,
    );

    let now = args.now.unwrap_or_else(Utc::now);
    let report = service.recommendations(&StudentId::new(args.student), args.limit, now)?;

    if report.recommendations.is_empty() {
        println!("No open jobs to recommend.");
        return Ok(());
    }
    for (rank, item) in report.recommendations.iter().enumerate() {
        let verdict = if item.is_eligible {
            "eligible".to_string()
        } else {
            format!("not eligible: {}", item.eligibility_issues.join("; "))
        };
        println!(
            "{:>2}. [{:>3}] {} at {} ({})",
            rank + 1,
            item.match_score,
            item.job.title,
            item.job.company,
            verdict
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_placement::eligibility::UnresolvedDepartmentPolicy;
    use campus_placement::workflows::placement::parse_roster;
    use serde_json::json;

    fn department_job() -> Value {
        json!({
            "eligibilityType": "department-wise",
            "departmentWiseEligibility": [
                { "department": "CSE", "cgpa": 7.0, "tenth": 60, "twelfth": 60 },
                { "department": "ECE", "cgpa": 6.5, "tenth": 55, "twelfth": 55 }
            ]
        })
    }

    #[test]
    fn check_reports_issues_for_flat_student_document() {
        let student = json!({
            "cgpa": 6.8,
            "tenthPercentage": 72,
            "twelfthPercentage": 70,
            "branch": "CSE"
        });

        let result = check_documents(&EligibilityConfig::default(), &department_job(), &student)
            .expect("evaluates");

        assert!(!result.is_eligible);
        assert_eq!(result.issues, vec!["CGPA 6.8 below required 7".to_string()]);
    }

    #[test]
    fn check_applies_unresolved_department_policy() {
        let student = json!({ "cgpa": 9.0, "branch": "MECH" });
        let allow = EligibilityConfig {
            unresolved_department: UnresolvedDepartmentPolicy::Allow,
            ..EligibilityConfig::default()
        };

        let blocked = check_documents(&EligibilityConfig::default(), &department_job(), &student)
            .expect("evaluates");
        let allowed = check_documents(&allow, &department_job(), &student).expect("evaluates");

        assert!(!blocked.is_eligible);
        assert_eq!(blocked.issues.len(), 1);
        assert!(allowed.is_eligible);
        assert!(allowed.issues.is_empty());
    }

    #[test]
    fn check_rejects_non_object_documents() {
        let result = check_documents(&EligibilityConfig::default(), &json!([]), &json!({}));
        assert!(matches!(result, Err(EligibilityError::MalformedInput { .. })));
    }

    #[test]
    fn roster_screening_counts_each_row() {
        let csv = "\
student_id,full_name,branch,cgpa,tenth_percentage,twelfth_percentage
stu-1,Asha Rao,ECE,7.2,80,78
stu-2,Ravi Kumar,CSE,6.1,82,75
";
        let roster = parse_roster(csv.as_bytes()).expect("roster parses");
        let posting = legacy::normalize_job(&department_job()).expect("job normalizes");

        let report =
            screen_roster(&EligibilityConfig::default(), &posting, roster).expect("screens");

        assert_eq!(report.total, 2);
        assert_eq!(report.eligible, 1);
        assert_eq!(report.ineligible, 1);
        assert!(report.results[0].is_eligible);
        assert_eq!(report.results[1].issues, vec!["CGPA 6.1 below required 7".to_string()]);
    }

    #[test]
    fn roster_screening_flags_rows_on_the_wrong_scale() {
        let csv = "\
student_id,full_name,branch,cgpa,tenth_percentage,twelfth_percentage
stu-1,Asha Rao,ECE,7.2,80,78
stu-2,Meera Nair,CSE,82,90,88
";
        let roster = parse_roster(csv.as_bytes()).expect("roster parses");
        let posting = legacy::normalize_job(&department_job()).expect("job normalizes");

        let report =
            screen_roster(&EligibilityConfig::default(), &posting, roster).expect("screens");

        assert_eq!(report.total, 2);
        assert_eq!(report.eligible, 1);
        assert!(!report.results[1].is_eligible);
        assert!(report.results[1].issues[0].starts_with("Invalid student record: "));
    }
}
