use super::domain::{EligibilityResult, StudentRecord, Thresholds};
use super::error::EligibilityError;
use super::resolver::{Resolution, RuleSet};

pub(crate) const UNRESOLVED_DEPARTMENT_ISSUE: &str =
    "No eligibility criteria defined for your department";
pub(crate) const BRANCH_ISSUE: &str = "Not eligible for your branch";

const PERCENTAGE_SCALE: f64 = 100.0;
const CGPA_SCALE: f64 = 10.0;

/// Check every rule in `rules` against `student`, collecting one issue per violation.
pub fn evaluate(
    rules: &RuleSet<'_>,
    student: &StudentRecord,
) -> Result<EligibilityResult, EligibilityError> {
    validate_thresholds(&rules.minimums)?;
    validate_student(student)?;

    let mut issues = Vec::new();
    collect_issues(rules, student, &mut issues);
    Ok(EligibilityResult::from_issues(issues))
}

/// Evaluate a resolved posting. Unresolved departments still get the posting-wide checks.
pub fn evaluate_resolution(
    resolution: &Resolution<'_>,
    student: &StudentRecord,
) -> Result<EligibilityResult, EligibilityError> {
    match resolution {
        Resolution::Rules(rules) => evaluate(rules, student),
        Resolution::Unresolved { department, shared } => {
            validate_student(student)?;

            let mut issues = vec![UNRESOLVED_DEPARTMENT_ISSUE.to_string()];
            collect_issues(shared, student, &mut issues);

            let mut result = EligibilityResult::from_issues(issues);
            result.unresolved_department = Some(department.clone());
            Ok(result)
        }
    }
}

fn collect_issues(rules: &RuleSet<'_>, student: &StudentRecord, issues: &mut Vec<String>) {
    let minimums = &rules.minimums;

    if let Some(issue) = below_minimum("CGPA", student.cgpa, minimums.cgpa) {
        issues.push(issue);
    }
    if let Some(issue) = below_minimum("10th percentage", student.tenth_percentage, minimums.tenth)
    {
        issues.push(issue);
    }
    if let Some(issue) = below_minimum(
        "12th percentage",
        student.twelfth_percentage,
        minimums.twelfth,
    ) {
        issues.push(issue);
    }

    if let Some(issue) = above_maximum(
        "Current backlogs",
        student.current_backlogs,
        rules.max_current_backlogs,
    ) {
        issues.push(issue);
    }
    if let Some(issue) = above_maximum(
        "Total backlogs",
        student.total_backlogs,
        rules.max_total_backlogs,
    ) {
        issues.push(issue);
    }

    if rules.restricts_branches() {
        if let Some(branch) = student.branch.as_deref() {
            let allowed = rules
                .eligible_branches
                .iter()
                .any(|eligible| rules.branch_matching.matches(eligible, branch));
            if !allowed {
                issues.push(BRANCH_ISSUE.to_string());
            }
        }
    }

    if !rules.eligible_years.is_empty() {
        if let Some(year) = student.academic_year() {
            if !rules.eligible_years.contains(&year) {
                issues.push(format!("Year {year} is not eligible for this job"));
            }
        }
    }
}

fn below_minimum(label: &str, actual: Option<f64>, minimum: Option<f64>) -> Option<String> {
    match (actual, minimum) {
        (Some(actual), Some(minimum)) if actual < minimum => {
            Some(format!("{label} {actual} below required {minimum}"))
        }
        _ => None,
    }
}

fn above_maximum(label: &str, actual: Option<u32>, maximum: Option<u32>) -> Option<String> {
    match (actual, maximum) {
        (Some(actual), Some(maximum)) if actual > maximum => {
            Some(format!("{label} {actual} exceed allowed {maximum}"))
        }
        _ => None,
    }
}

pub(crate) fn validate_thresholds(thresholds: &Thresholds) -> Result<(), EligibilityError> {
    check_scale("required CGPA", thresholds.cgpa, CGPA_SCALE)?;
    check_scale("required 10th percentage", thresholds.tenth, PERCENTAGE_SCALE)?;
    check_scale("required 12th percentage", thresholds.twelfth, PERCENTAGE_SCALE)
}

pub(crate) fn validate_student(student: &StudentRecord) -> Result<(), EligibilityError> {
    check_scale("student CGPA", student.cgpa, CGPA_SCALE)?;
    check_scale(
        "student 10th percentage",
        student.tenth_percentage,
        PERCENTAGE_SCALE,
    )?;
    check_scale(
        "student 12th percentage",
        student.twelfth_percentage,
        PERCENTAGE_SCALE,
    )
}

fn check_scale(field: &str, value: Option<f64>, scale: f64) -> Result<(), EligibilityError> {
    match value {
        Some(value) if !value.is_finite() => Err(EligibilityError::malformed(format!(
            "{field} must be a finite number"
        ))),
        Some(value) if !(0.0..=scale).contains(&value) => Err(EligibilityError::malformed(
            format!("{field} {value} is outside 0-{scale}"),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eligibility::resolver::DepartmentMatching;

    fn rules<'a>(branches: &'a [String], years: &'a [u8]) -> RuleSet<'a> {
        RuleSet {
            minimums: Thresholds::new(60.0, 60.0, 7.0),
            max_current_backlogs: Some(0),
            max_total_backlogs: Some(2),
            open_to_all_branches: branches.is_empty(),
            eligible_branches: branches,
            eligible_years: years,
            branch_matching: DepartmentMatching::Exact,
        }
    }

    fn strong_student() -> StudentRecord {
        StudentRecord {
            cgpa: Some(8.1),
            tenth_percentage: Some(88.0),
            twelfth_percentage: Some(79.5),
            branch: Some("CSE".to_string()),
            current_backlogs: Some(0),
            total_backlogs: Some(1),
            year_of_study: Some(4),
            ..StudentRecord::default()
        }
    }

    #[test]
    fn passes_when_every_rule_is_met() {
        let branches = vec!["CSE".to_string(), "IT".to_string()];
        let result = evaluate(&rules(&branches, &[4]), &strong_student()).expect("evaluates");

        assert!(result.is_eligible);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn thresholds_are_inclusive() {
        let mut student = strong_student();
        student.cgpa = Some(7.0);
        student.tenth_percentage = Some(60.0);
        student.twelfth_percentage = Some(60.0);
        student.total_backlogs = Some(2);

        let result = evaluate(&rules(&[], &[]), &student).expect("evaluates");

        assert!(result.is_eligible, "unexpected issues: {:?}", result.issues);
    }

    #[test]
    fn reports_every_violation_in_order() {
        let branches = vec!["ECE".to_string()];
        let student = StudentRecord {
            cgpa: Some(6.2),
            tenth_percentage: Some(59.0),
            twelfth_percentage: Some(58.5),
            branch: Some("CSE".to_string()),
            current_backlogs: Some(1),
            total_backlogs: Some(3),
            year_of_study: Some(2),
            ..StudentRecord::default()
        };

        let result = evaluate(&rules(&branches, &[3, 4]), &student).expect("evaluates");

        assert!(!result.is_eligible);
        assert_eq!(
            result.issues,
            vec![
                "CGPA 6.2 below required 7",
                "10th percentage 59 below required 60",
                "12th percentage 58.5 below required 60",
                "Current backlogs 1 exceed allowed 0",
                "Total backlogs 3 exceed allowed 2",
                "Not eligible for your branch",
                "Year 2 is not eligible for this job",
            ]
        );
    }

    #[test]
    fn absent_fields_skip_their_rules() {
        let branches = vec!["ECE".to_string()];
        let student = StudentRecord::default();

        let result = evaluate(&rules(&branches, &[4]), &student).expect("evaluates");

        assert!(result.is_eligible);
    }

    #[test]
    fn semester_stands_in_for_missing_year() {
        let mut student = strong_student();
        student.year_of_study = None;
        student.semester = Some(5);

        let result = evaluate(&rules(&[], &[4]), &student).expect("evaluates");

        assert_eq!(result.issues, vec!["Year 3 is not eligible for this job"]);
    }

    #[test]
    fn open_to_all_branches_ignores_branch_list() {
        let branches = vec!["ECE".to_string()];
        let mut set = rules(&branches, &[]);
        set.open_to_all_branches = true;

        let result = evaluate(&set, &strong_student()).expect("evaluates");

        assert!(result.is_eligible);
    }

    #[test]
    fn rejects_out_of_scale_values() {
        let mut student = strong_student();
        student.cgpa = Some(f64::NAN);
        assert!(matches!(
            evaluate(&rules(&[], &[]), &student),
            Err(EligibilityError::MalformedInput { .. })
        ));

        student.cgpa = Some(82.0);
        assert!(matches!(
            evaluate(&rules(&[], &[]), &student),
            Err(EligibilityError::MalformedInput { .. })
        ));
    }
}
