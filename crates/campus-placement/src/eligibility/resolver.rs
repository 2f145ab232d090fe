use serde::{Deserialize, Serialize};

use super::domain::{DepartmentRule, EligibilityBasis, JobEligibility, Thresholds};

/// How department and branch names are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepartmentMatching {
    /// Case-sensitive exact comparison.
    #[default]
    Exact,
    /// Trimmed, case-insensitive comparison.
    Normalized,
}

impl DepartmentMatching {
    pub fn matches(self, expected: &str, actual: &str) -> bool {
        match self {
            DepartmentMatching::Exact => expected == actual,
            DepartmentMatching::Normalized => {
                expected.trim().to_lowercase() == actual.trim().to_lowercase()
            }
        }
    }
}

/// Rules that apply to one student after the posting's basis has been resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet<'a> {
    pub minimums: Thresholds,
    pub max_current_backlogs: Option<u32>,
    pub max_total_backlogs: Option<u32>,
    pub open_to_all_branches: bool,
    pub eligible_branches: &'a [String],
    pub eligible_years: &'a [u8],
    pub branch_matching: DepartmentMatching,
}

impl<'a> RuleSet<'a> {
    fn shared(
        criteria: &'a JobEligibility,
        minimums: Thresholds,
        matching: DepartmentMatching,
    ) -> Self {
        Self {
            minimums,
            max_current_backlogs: criteria.max_current_backlogs,
            max_total_backlogs: criteria.max_total_backlogs,
            open_to_all_branches: criteria.open_to_all_branches,
            eligible_branches: &criteria.eligible_branches,
            eligible_years: &criteria.eligible_years,
            branch_matching: matching,
        }
    }

    fn for_department(
        criteria: &'a JobEligibility,
        rule: &DepartmentRule,
        matching: DepartmentMatching,
    ) -> Self {
        let mut rules = Self::shared(criteria, rule.thresholds, matching);
        rules.max_current_backlogs =
            match (rules.max_current_backlogs, rule.max_current_backlogs) {
                (Some(posting), Some(department)) => Some(posting.min(department)),
                (posting, department) => posting.or(department),
            };
        rules
    }

    pub(crate) fn restricts_branches(&self) -> bool {
        !self.open_to_all_branches && !self.eligible_branches.is_empty()
    }
}

/// Outcome of selecting the applicable rules for a student's department.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a> {
    Rules(RuleSet<'a>),
    /// Department-wise posting without an entry for the student's department.
    /// `shared` holds the posting-wide restrictions with no minimums.
    Unresolved {
        department: String,
        shared: RuleSet<'a>,
    },
}

impl Resolution<'_> {
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Resolution::Unresolved { .. })
    }
}

pub fn resolve<'a>(
    criteria: &'a JobEligibility,
    department: Option<&str>,
    matching: DepartmentMatching,
) -> Resolution<'a> {
    match &criteria.basis {
        EligibilityBasis::Common(thresholds) => {
            Resolution::Rules(RuleSet::shared(criteria, *thresholds, matching))
        }
        EligibilityBasis::DepartmentWise(rules) => {
            let selected = department.and_then(|department| {
                rules
                    .iter()
                    .find(|rule| matching.matches(&rule.department, department))
            });

            match (selected, criteria.fallback) {
                (Some(rule), _) => {
                    Resolution::Rules(RuleSet::for_department(criteria, rule, matching))
                }
                (None, Some(fallback)) => {
                    Resolution::Rules(RuleSet::shared(criteria, fallback, matching))
                }
                (None, None) => Resolution::Unresolved {
                    department: department.unwrap_or_default().to_string(),
                    shared: RuleSet::shared(criteria, Thresholds::default(), matching),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn department_wise() -> JobEligibility {
        JobEligibility::department_wise(vec![
            DepartmentRule {
                department: "CSE".to_string(),
                max_current_backlogs: None,
                thresholds: Thresholds::new(60.0, 60.0, 7.0),
            },
            DepartmentRule {
                department: "ECE".to_string(),
                max_current_backlogs: None,
                thresholds: Thresholds::new(55.0, 55.0, 6.5),
            },
        ])
        .expect("valid department rules")
    }

    #[test]
    fn common_basis_resolves_for_any_department() {
        let criteria = JobEligibility::common(Thresholds::new(60.0, 60.0, 6.5));

        for department in [Some("MECH"), Some("cse"), None] {
            match resolve(&criteria, department, DepartmentMatching::Exact) {
                Resolution::Rules(rules) => assert_eq!(rules.minimums.cgpa, Some(6.5)),
                other => panic!("expected common rules, got {other:?}"),
            }
        }
    }

    #[test]
    fn department_wise_selects_matching_entry() {
        let criteria = department_wise();

        match resolve(&criteria, Some("ECE"), DepartmentMatching::Exact) {
            Resolution::Rules(rules) => assert_eq!(rules.minimums.cgpa, Some(6.5)),
            other => panic!("expected ECE rules, got {other:?}"),
        }
    }

    #[test]
    fn unknown_department_is_unresolved() {
        let criteria = department_wise();

        match resolve(&criteria, Some("MECH"), DepartmentMatching::Exact) {
            Resolution::Unresolved { department, shared } => {
                assert_eq!(department, "MECH");
                assert_eq!(shared.minimums, Thresholds::default());
            }
            other => panic!("expected unresolved sentinel, got {other:?}"),
        }
    }

    #[test]
    fn exact_matching_is_case_sensitive() {
        let criteria = department_wise();

        assert!(resolve(&criteria, Some("cse"), DepartmentMatching::Exact).is_unresolved());
        assert!(resolve(&criteria, Some(" CSE "), DepartmentMatching::Exact).is_unresolved());
        assert!(!resolve(&criteria, Some(" cse "), DepartmentMatching::Normalized).is_unresolved());
    }

    #[test]
    fn missing_department_is_unresolved() {
        let criteria = department_wise();

        match resolve(&criteria, None, DepartmentMatching::Exact) {
            Resolution::Unresolved { department, .. } => assert!(department.is_empty()),
            other => panic!("expected unresolved sentinel, got {other:?}"),
        }
    }

    #[test]
    fn fallback_covers_unlisted_departments() {
        let criteria = JobEligibility {
            fallback: Some(Thresholds::new(60.0, 0.0, 6.0)),
            ..department_wise()
        };

        match resolve(&criteria, Some("MECH"), DepartmentMatching::Exact) {
            Resolution::Rules(rules) => assert_eq!(rules.minimums.cgpa, Some(6.0)),
            other => panic!("expected fallback rules, got {other:?}"),
        }
        match resolve(&criteria, Some("CSE"), DepartmentMatching::Exact) {
            Resolution::Rules(rules) => assert_eq!(rules.minimums.cgpa, Some(7.0)),
            other => panic!("expected CSE rules, got {other:?}"),
        }
    }

    #[test]
    fn department_backlog_limit_tightens_posting_limit() {
        let mut criteria = department_wise();
        criteria.max_current_backlogs = Some(2);
        if let EligibilityBasis::DepartmentWise(rules) = &mut criteria.basis {
            rules[0].max_current_backlogs = Some(0);
        }

        match resolve(&criteria, Some("CSE"), DepartmentMatching::Exact) {
            Resolution::Rules(rules) => assert_eq!(rules.max_current_backlogs, Some(0)),
            other => panic!("expected CSE rules, got {other:?}"),
        }
        match resolve(&criteria, Some("ECE"), DepartmentMatching::Exact) {
            Resolution::Rules(rules) => assert_eq!(rules.max_current_backlogs, Some(2)),
            other => panic!("expected ECE rules, got {other:?}"),
        }
    }
}
