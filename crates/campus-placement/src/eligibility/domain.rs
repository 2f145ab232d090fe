use serde::{Deserialize, Serialize};

use super::error::CriteriaError;

/// Minimum academic scores a posting requires. `None` means the posting sets no minimum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twelfth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cgpa: Option<f64>,
}

impl Thresholds {
    pub fn new(tenth: f64, twelfth: f64, cgpa: f64) -> Self {
        Self {
            tenth: Some(tenth),
            twelfth: Some(twelfth),
            cgpa: Some(cgpa),
        }
    }

    /// Drops zero minimums, which postings use to mean "no requirement".
    pub(crate) fn without_zero_minimums(self) -> Self {
        let keep = |value: Option<f64>| value.filter(|minimum| *minimum != 0.0);
        Self {
            tenth: keep(self.tenth),
            twelfth: keep(self.twelfth),
            cgpa: keep(self.cgpa),
        }
    }
}

/// Thresholds that apply to a single department on a department-wise posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentRule {
    pub department: String,
    #[serde(flatten)]
    pub thresholds: Thresholds,
    /// Tighter current-backlog limit for this department only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_current_backlogs: Option<u32>,
}

/// Whether the posting screens every student with one threshold set or per department.
#[derive(Debug, Clone, PartialEq)]
pub enum EligibilityBasis {
    Common(Thresholds),
    DepartmentWise(Vec<DepartmentRule>),
}

impl Default for EligibilityBasis {
    fn default() -> Self {
        Self::Common(Thresholds::default())
    }
}

/// Canonical eligibility criteria for a job posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CriteriaDocument", into = "CriteriaDocument")]
pub struct JobEligibility {
    pub basis: EligibilityBasis,
    /// Minimums for departments a department-wise posting does not list.
    /// Without them such departments resolve as unresolved.
    pub fallback: Option<Thresholds>,
    pub max_current_backlogs: Option<u32>,
    pub max_total_backlogs: Option<u32>,
    pub open_to_all_branches: bool,
    pub eligible_branches: Vec<String>,
    pub eligible_years: Vec<u8>,
}

impl Default for JobEligibility {
    fn default() -> Self {
        Self {
            basis: EligibilityBasis::default(),
            fallback: None,
            max_current_backlogs: None,
            max_total_backlogs: None,
            open_to_all_branches: true,
            eligible_branches: Vec::new(),
            eligible_years: Vec::new(),
        }
    }
}

impl JobEligibility {
    pub fn common(thresholds: Thresholds) -> Self {
        Self {
            basis: EligibilityBasis::Common(thresholds),
            ..Self::default()
        }
    }

    pub fn department_wise(rules: Vec<DepartmentRule>) -> Result<Self, CriteriaError> {
        let criteria = Self {
            basis: EligibilityBasis::DepartmentWise(rules),
            ..Self::default()
        };
        criteria.validate()?;
        Ok(criteria)
    }

    /// Restrict the posting to the listed branches.
    pub fn restrict_branches<I, S>(mut self, branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.eligible_branches = branches.into_iter().map(Into::into).collect();
        self.open_to_all_branches = self.eligible_branches.is_empty();
        self
    }

    pub(crate) fn validate(&self) -> Result<(), CriteriaError> {
        if let EligibilityBasis::DepartmentWise(rules) = &self.basis {
            if rules.is_empty() {
                return Err(CriteriaError::EmptyDepartmentRules);
            }
            if let Some(position) = rules
                .iter()
                .position(|rule| rule.department.trim().is_empty())
            {
                return Err(CriteriaError::MissingDepartment {
                    index: position + 1,
                });
            }
        }
        Ok(())
    }
}

/// Wire form of the eligibility criteria (`eligibilityType` + threshold blocks).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CriteriaDocument {
    #[serde(default)]
    pub(crate) eligibility_type: Option<EligibilityKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) common_eligibility: Option<Thresholds>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) department_wise_eligibility: Vec<DepartmentRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) fallback_eligibility: Option<Thresholds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) max_current_backlogs: Option<u32>,
    #[serde(
        default,
        alias = "maxBacklogsAllowed",
        skip_serializing_if = "Option::is_none"
    )]
    pub(crate) max_total_backlogs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) open_to_all_branches: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) eligible_branches: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) eligible_years: Vec<u8>,
}

/// Posting-level switch between the two threshold shapes. Unknown values read as common.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum EligibilityKind {
    #[serde(rename = "common")]
    Common,
    #[serde(rename = "department-wise")]
    DepartmentWise,
    #[serde(other)]
    Unrecognized,
}

impl TryFrom<CriteriaDocument> for JobEligibility {
    type Error = CriteriaError;

    fn try_from(document: CriteriaDocument) -> Result<Self, Self::Error> {
        let basis = match document.eligibility_type {
            Some(EligibilityKind::DepartmentWise) => EligibilityBasis::DepartmentWise(
                document
                    .department_wise_eligibility
                    .into_iter()
                    .map(|rule| DepartmentRule {
                        department: rule.department,
                        max_current_backlogs: rule.max_current_backlogs,
                        thresholds: rule.thresholds.without_zero_minimums(),
                    })
                    .collect(),
            ),
            _ => EligibilityBasis::Common(
                document
                    .common_eligibility
                    .unwrap_or_default()
                    .without_zero_minimums(),
            ),
        };

        let eligible_branches = document.eligible_branches;
        let open_to_all_branches = document
            .open_to_all_branches
            .unwrap_or(eligible_branches.is_empty());

        let criteria = JobEligibility {
            basis,
            fallback: document
                .fallback_eligibility
                .map(Thresholds::without_zero_minimums),
            max_current_backlogs: document.max_current_backlogs,
            max_total_backlogs: document.max_total_backlogs,
            open_to_all_branches,
            eligible_branches,
            eligible_years: document.eligible_years,
        };
        criteria.validate()?;
        Ok(criteria)
    }
}

impl From<JobEligibility> for CriteriaDocument {
    fn from(criteria: JobEligibility) -> Self {
        let (eligibility_type, common_eligibility, department_wise_eligibility) =
            match criteria.basis {
                EligibilityBasis::Common(thresholds) => {
                    (EligibilityKind::Common, Some(thresholds), Vec::new())
                }
                EligibilityBasis::DepartmentWise(rules) => {
                    (EligibilityKind::DepartmentWise, None, rules)
                }
            };

        Self {
            eligibility_type: Some(eligibility_type),
            common_eligibility,
            department_wise_eligibility,
            fallback_eligibility: criteria.fallback,
            max_current_backlogs: criteria.max_current_backlogs,
            max_total_backlogs: criteria.max_total_backlogs,
            open_to_all_branches: Some(criteria.open_to_all_branches),
            eligible_branches: criteria.eligible_branches,
            eligible_years: criteria.eligible_years,
        }
    }
}

/// A skill listed on a student profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Skill {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: None,
        }
    }
}

/// Academic attributes read from a student profile. Absent values mean "no data", not zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cgpa: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenth_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twelfth_percentage: Option<f64>,
    #[serde(default, alias = "department", skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_backlogs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_backlogs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_of_study: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<Skill>,
}

impl StudentRecord {
    /// Year of study, falling back to the year implied by the current semester.
    pub fn academic_year(&self) -> Option<u8> {
        self.year_of_study.or_else(|| {
            self.semester
                .filter(|semester| *semester > 0)
                .map(|semester| semester.div_ceil(2))
        })
    }

    pub fn has_skill(&self, name: &str) -> bool {
        let wanted = name.trim();
        self.skills
            .iter()
            .any(|skill| skill.name.trim().eq_ignore_ascii_case(wanted))
    }
}

/// Verdict for one student against one posting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityResult {
    pub is_eligible: bool,
    pub issues: Vec<String>,
    /// Set when a department-wise posting has no rule for the student's department.
    #[serde(skip)]
    pub unresolved_department: Option<String>,
}

impl EligibilityResult {
    pub fn from_issues(issues: Vec<String>) -> Self {
        Self {
            is_eligible: issues.is_empty(),
            issues,
            unresolved_department: None,
        }
    }

    /// Verdict for a student whose record could not be evaluated.
    pub fn invalid_record(reason: &str) -> Self {
        Self::from_issues(vec![format!("Invalid student record: {reason}")])
    }

    pub fn is_unresolved(&self) -> bool {
        self.unresolved_department.is_some()
    }
}
