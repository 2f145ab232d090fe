//! Adapters from every persisted job and student document shape to the canonical types.
//!
//! Job documents have carried eligibility in three layouts over time:
//! top-level `eligibilityType`/`commonEligibility`/`departmentWiseEligibility`,
//! an `eligibilityCriteria` block with `minCGPA`-style fields, and an `eligibility`
//! block with `tenthPct`/`deptList`/`customDeptRules`. Only [`JobEligibility`] leaves
//! this module.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::domain::{
    CriteriaDocument, DepartmentRule, EligibilityBasis, EligibilityKind, JobEligibility, Skill,
    StudentRecord, Thresholds,
};
use super::error::{CriteriaError, EligibilityError};
use crate::matching::{CompanyTier, JobPosting, JobType};

/// Normalize any persisted job document into a [`JobPosting`].
pub fn normalize_job(document: &Value) -> Result<JobPosting, CriteriaError> {
    if !document.is_object() {
        return Err(CriteriaError::NotAnObject);
    }

    let job: JobDocument = parse(document)?;
    let nested: Option<NestedCriteria> = job
        .eligibility_criteria
        .as_ref()
        .filter(|value| value.is_object())
        .map(parse)
        .transpose()?;
    let ts: Option<TsEligibility> = job
        .eligibility
        .as_ref()
        .filter(|value| value.is_object())
        .map(parse)
        .transpose()?;

    let mut builder = CriteriaBuilder::default();
    builder.absorb_modern(job.criteria);
    if let Some(nested) = &nested {
        builder.absorb_modern(nested.criteria.clone());
        builder.absorb_minimums(Thresholds {
            tenth: nested.min_tenth_percentage,
            twelfth: nested.min_twelfth_percentage,
            cgpa: nested.min_cgpa,
        });
    }
    if let Some(ts) = &ts {
        builder.absorb_ts(ts);
    }
    let eligibility = builder.finish()?;

    let mut required_skills = job.required_skills;
    required_skills.extend(job.skills_required);
    if let Some(nested) = nested {
        required_skills.extend(nested.required_skills);
    }
    if let Some(ts) = ts {
        required_skills.extend(ts.required_skills);
    }
    dedup_preserving_order(&mut required_skills);

    let location = job
        .work_location
        .filter(|location| !location.trim().is_empty())
        .or(job.location.filter(|location| !location.trim().is_empty()));

    Ok(JobPosting {
        eligibility,
        required_skills,
        location,
        company_tier: job
            .company_tier
            .as_deref()
            .map(CompanyTier::parse)
            .unwrap_or_default(),
        job_type: job.job_type.as_deref().and_then(JobType::parse),
    })
}

/// Normalize a student document (flat or `education`-nested) into a [`StudentRecord`].
pub fn normalize_student(document: &Value) -> Result<StudentRecord, EligibilityError> {
    if !document.is_object() {
        return Err(EligibilityError::malformed("student must be a JSON object"));
    }

    let student: StudentDocument = serde_json::from_value(document.clone())
        .map_err(|err| EligibilityError::malformed(format!("invalid student document: {err}")))?;
    let education = student.education.unwrap_or_default();
    let graduation = education.graduation.unwrap_or_default();

    let branch = student
        .branch
        .or(student.department)
        .or(graduation.branch)
        .filter(|branch| !branch.trim().is_empty());

    Ok(StudentRecord {
        cgpa: student.cgpa.or(graduation.cgpa),
        tenth_percentage: student
            .tenth_percentage
            .or(education.tenth.and_then(|score| score.percentage)),
        twelfth_percentage: student
            .twelfth_percentage
            .or(education.twelfth.and_then(|score| score.percentage)),
        branch,
        current_backlogs: student.current_backlogs,
        total_backlogs: student.total_backlogs,
        year_of_study: student.year_of_study,
        semester: student.semester,
        skills: student
            .skills
            .into_iter()
            .map(SkillEntry::into_skill)
            .filter(|skill| !skill.name.trim().is_empty())
            .collect(),
    })
}

fn parse<T: DeserializeOwned>(value: &Value) -> Result<T, CriteriaError> {
    serde_json::from_value(value.clone()).map_err(|err| CriteriaError::Invalid(err.to_string()))
}

fn dedup_preserving_order(values: &mut Vec<String>) {
    let mut seen = Vec::<String>::new();
    values.retain(|value| {
        let key = value.trim().to_lowercase();
        if key.is_empty() || seen.contains(&key) {
            false
        } else {
            seen.push(key);
            true
        }
    });
}

/// Merges the layouts; earlier sources win for each field.
#[derive(Default)]
struct CriteriaBuilder {
    basis: Option<EligibilityBasis>,
    fallback: Option<Thresholds>,
    minimums: Thresholds,
    max_current_backlogs: Option<u32>,
    max_total_backlogs: Option<u32>,
    open_to_all_branches: Option<bool>,
    eligible_branches: Vec<String>,
    eligible_years: Vec<u8>,
}

impl CriteriaBuilder {
    fn absorb_modern(&mut self, document: CriteriaDocument) {
        let declares_basis = document.eligibility_type.is_some()
            || document.common_eligibility.is_some()
            || !document.department_wise_eligibility.is_empty();

        if declares_basis && self.basis.is_none() {
            self.basis = Some(match document.eligibility_type {
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
            });
        }

        self.fallback = self.fallback.or(
            document
                .fallback_eligibility
                .map(Thresholds::without_zero_minimums),
        );
        self.absorb_restrictions(
            document.max_current_backlogs,
            document.max_total_backlogs,
            document.open_to_all_branches,
            document.eligible_branches,
            document.eligible_years,
        );
    }

    fn absorb_minimums(&mut self, minimums: Thresholds) {
        let minimums = minimums.without_zero_minimums();
        self.minimums.tenth = self.minimums.tenth.or(minimums.tenth);
        self.minimums.twelfth = self.minimums.twelfth.or(minimums.twelfth);
        self.minimums.cgpa = self.minimums.cgpa.or(minimums.cgpa);
    }

    fn absorb_ts(&mut self, ts: &TsEligibility) {
        let global = Thresholds {
            tenth: ts.tenth_pct,
            twelfth: ts.twelfth_pct,
            cgpa: ts.cgpa.or(ts.min_cgpa),
        }
        .without_zero_minimums();

        if self.basis.is_none() {
            if ts.kind == Some(EligibilityKind::DepartmentWise) && !ts.departments.is_empty() {
                self.basis = Some(EligibilityBasis::DepartmentWise(
                    ts.departments
                        .iter()
                        .map(|rule| DepartmentRule {
                            department: rule.department.clone(),
                            max_current_backlogs: rule.max_current_backlogs,
                            thresholds: rule.thresholds.without_zero_minimums(),
                        })
                        .collect(),
                ));
            } else if !ts.custom_dept_rules.is_empty() {
                // Custom rules tighten the global minimums; other departments keep the globals.
                self.basis = Some(EligibilityBasis::DepartmentWise(
                    ts.custom_dept_rules
                        .iter()
                        .map(|rule| DepartmentRule {
                            department: rule.department.clone(),
                            thresholds: stricter(
                                global,
                                Thresholds {
                                    tenth: rule.min_tenth_pct,
                                    twelfth: rule.min_twelfth_pct,
                                    cgpa: rule.min_cgpa,
                                }
                                .without_zero_minimums(),
                            ),
                            max_current_backlogs: match rule.allow_arrears {
                                Some(false) => Some(0),
                                _ => None,
                            },
                        })
                        .collect(),
                ));
                self.fallback = self.fallback.or(Some(global));
            }
        }
        self.absorb_minimums(global);

        let max_current_backlogs = match ts.allow_arrears {
            Some(false) => Some(0),
            _ => None,
        };
        let mut branches = ts.dept_list.clone();
        branches.extend(ts.allowed_branches.iter().cloned());
        dedup_preserving_order(&mut branches);

        self.absorb_restrictions(
            max_current_backlogs,
            ts.max_backlogs,
            None,
            branches,
            ts.allowed_years.clone(),
        );
    }

    fn absorb_restrictions(
        &mut self,
        max_current_backlogs: Option<u32>,
        max_total_backlogs: Option<u32>,
        open_to_all_branches: Option<bool>,
        eligible_branches: Vec<String>,
        eligible_years: Vec<u8>,
    ) {
        self.max_current_backlogs = self.max_current_backlogs.or(max_current_backlogs);
        self.max_total_backlogs = self.max_total_backlogs.or(max_total_backlogs);
        self.open_to_all_branches = self.open_to_all_branches.or(open_to_all_branches);
        if self.eligible_branches.is_empty() {
            self.eligible_branches = eligible_branches;
        }
        if self.eligible_years.is_empty() {
            self.eligible_years = eligible_years;
        }
    }

    fn finish(self) -> Result<JobEligibility, CriteriaError> {
        let basis = match self.basis {
            Some(EligibilityBasis::Common(thresholds)) => EligibilityBasis::Common(Thresholds {
                tenth: thresholds.tenth.or(self.minimums.tenth),
                twelfth: thresholds.twelfth.or(self.minimums.twelfth),
                cgpa: thresholds.cgpa.or(self.minimums.cgpa),
            }),
            Some(department_wise) => department_wise,
            None => EligibilityBasis::Common(self.minimums),
        };

        let open_to_all_branches = self
            .open_to_all_branches
            .unwrap_or(self.eligible_branches.is_empty());

        let fallback = match &basis {
            EligibilityBasis::DepartmentWise(_) => self.fallback,
            EligibilityBasis::Common(_) => None,
        };

        let criteria = JobEligibility {
            basis,
            fallback,
            max_current_backlogs: self.max_current_backlogs,
            max_total_backlogs: self.max_total_backlogs,
            open_to_all_branches,
            eligible_branches: self.eligible_branches,
            eligible_years: self.eligible_years,
        };
        criteria.validate()?;
        Ok(criteria)
    }
}

fn stricter(left: Thresholds, right: Thresholds) -> Thresholds {
    let max = |a: Option<f64>, b: Option<f64>| match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };
    Thresholds {
        tenth: max(left.tenth, right.tenth),
        twelfth: max(left.twelfth, right.twelfth),
        cgpa: max(left.cgpa, right.cgpa),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobDocument {
    #[serde(flatten)]
    criteria: CriteriaDocument,
    #[serde(default)]
    eligibility_criteria: Option<Value>,
    #[serde(default)]
    eligibility: Option<Value>,
    #[serde(default)]
    work_location: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    company_tier: Option<String>,
    #[serde(default)]
    job_type: Option<String>,
    #[serde(default)]
    required_skills: Vec<String>,
    #[serde(default)]
    skills_required: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NestedCriteria {
    #[serde(flatten)]
    criteria: CriteriaDocument,
    #[serde(default, rename = "minCGPA")]
    min_cgpa: Option<f64>,
    #[serde(default)]
    min_tenth_percentage: Option<f64>,
    #[serde(default)]
    min_twelfth_percentage: Option<f64>,
    #[serde(default)]
    required_skills: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TsEligibility {
    #[serde(default, rename = "type")]
    kind: Option<EligibilityKind>,
    #[serde(default)]
    departments: Vec<DepartmentRule>,
    #[serde(default)]
    tenth_pct: Option<f64>,
    #[serde(default)]
    twelfth_pct: Option<f64>,
    #[serde(default)]
    cgpa: Option<f64>,
    #[serde(default, rename = "minCGPA")]
    min_cgpa: Option<f64>,
    #[serde(default)]
    allow_arrears: Option<bool>,
    #[serde(default)]
    max_backlogs: Option<u32>,
    #[serde(default)]
    dept_list: Vec<String>,
    #[serde(default)]
    allowed_branches: Vec<String>,
    #[serde(default)]
    allowed_years: Vec<u8>,
    #[serde(default)]
    custom_dept_rules: Vec<CustomDeptRule>,
    #[serde(default)]
    required_skills: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomDeptRule {
    department: String,
    #[serde(default)]
    allow_arrears: Option<bool>,
    #[serde(default, rename = "minCGPA")]
    min_cgpa: Option<f64>,
    #[serde(default)]
    min_tenth_pct: Option<f64>,
    #[serde(default)]
    min_twelfth_pct: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudentDocument {
    #[serde(default)]
    cgpa: Option<f64>,
    #[serde(default)]
    tenth_percentage: Option<f64>,
    #[serde(default)]
    twelfth_percentage: Option<f64>,
    #[serde(default)]
    branch: Option<String>,
    #[serde(default)]
    department: Option<String>,
    #[serde(default)]
    current_backlogs: Option<u32>,
    #[serde(default)]
    total_backlogs: Option<u32>,
    #[serde(default)]
    year_of_study: Option<u8>,
    #[serde(default)]
    semester: Option<u8>,
    #[serde(default)]
    skills: Vec<SkillEntry>,
    #[serde(default)]
    education: Option<Education>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SkillEntry {
    Name(String),
    Detailed(Skill),
}

impl SkillEntry {
    fn into_skill(self) -> Skill {
        match self {
            SkillEntry::Name(name) => Skill::named(name),
            SkillEntry::Detailed(skill) => skill,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Education {
    #[serde(default)]
    tenth: Option<ScoreEntry>,
    #[serde(default)]
    twelfth: Option<ScoreEntry>,
    #[serde(default)]
    graduation: Option<Graduation>,
}

#[derive(Debug, Default, Deserialize)]
struct ScoreEntry {
    #[serde(default)]
    percentage: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct Graduation {
    #[serde(default)]
    branch: Option<String>,
    #[serde(default)]
    cgpa: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eligibility::EligibilityEngine;
    use serde_json::json;

    #[test]
    fn reads_modern_common_document() {
        let posting = normalize_job(&json!({
            "title": "Graduate Engineer",
            "eligibilityType": "common",
            "commonEligibility": { "tenth": 60, "twelfth": 60, "cgpa": 6.5 },
            "workLocation": "Pune",
            "companyTier": "dream",
            "jobType": "full-time",
            "skillsRequired": ["Rust", "SQL"]
        }))
        .expect("normalizes");

        assert_eq!(
            posting.eligibility.basis,
            EligibilityBasis::Common(Thresholds::new(60.0, 60.0, 6.5))
        );
        assert_eq!(posting.location.as_deref(), Some("Pune"));
        assert_eq!(posting.company_tier, CompanyTier::Dream);
        assert_eq!(posting.job_type, Some(JobType::FullTime));
        assert_eq!(posting.required_skills, vec!["Rust", "SQL"]);
    }

    #[test]
    fn unrecognized_type_falls_back_to_common() {
        let posting = normalize_job(&json!({
            "eligibilityType": "per-campus",
            "commonEligibility": { "tenth": 0, "twelfth": 0, "cgpa": 7 }
        }))
        .expect("normalizes");

        assert_eq!(
            posting.eligibility.basis,
            EligibilityBasis::Common(Thresholds {
                cgpa: Some(7.0),
                ..Thresholds::default()
            })
        );
    }

    #[test]
    fn department_wise_requires_entries() {
        let result = normalize_job(&json!({
            "eligibilityType": "department-wise",
            "departmentWiseEligibility": []
        }));

        assert_eq!(result, Err(CriteriaError::EmptyDepartmentRules));
    }

    #[test]
    fn reads_legacy_criteria_block() {
        let posting = normalize_job(&json!({
            "eligibilityCriteria": {
                "minCGPA": 7.5,
                "minTenthPercentage": 70,
                "maxCurrentBacklogs": 0,
                "maxBacklogsAllowed": 2,
                "openToAllBranches": false,
                "eligibleBranches": ["CSE", "IT"],
                "eligibleYears": [4],
                "requiredSkills": ["Java"]
            },
            "location": "Chennai"
        }))
        .expect("normalizes");

        let criteria = posting.eligibility;
        assert_eq!(
            criteria.basis,
            EligibilityBasis::Common(Thresholds {
                tenth: Some(70.0),
                twelfth: None,
                cgpa: Some(7.5),
            })
        );
        assert_eq!(criteria.max_current_backlogs, Some(0));
        assert_eq!(criteria.max_total_backlogs, Some(2));
        assert!(!criteria.open_to_all_branches);
        assert_eq!(criteria.eligible_branches, vec!["CSE", "IT"]);
        assert_eq!(criteria.eligible_years, vec![4]);
        assert_eq!(posting.required_skills, vec!["Java"]);
        assert_eq!(posting.location.as_deref(), Some("Chennai"));
    }

    #[test]
    fn reads_ts_eligibility_block_with_custom_department_rules() {
        let posting = normalize_job(&json!({
            "eligibility": {
                "tenthPct": 60,
                "cgpa": 6,
                "allowArrears": false,
                "deptList": ["CSE", "ECE"],
                "customDeptRules": [
                    { "department": "CSE", "minCGPA": 7.5 },
                    { "department": "ECE", "minCGPA": 5.5, "minTwelfthPct": 65 }
                ]
            }
        }))
        .expect("normalizes");

        let criteria = posting.eligibility;
        assert_eq!(
            criteria.fallback,
            Some(Thresholds {
                tenth: Some(60.0),
                cgpa: Some(6.0),
                ..Thresholds::default()
            })
        );
        match criteria.basis {
            EligibilityBasis::DepartmentWise(rules) => {
                assert_eq!(rules.len(), 2);
                assert_eq!(rules[0].thresholds.cgpa, Some(7.5));
                assert_eq!(rules[0].thresholds.tenth, Some(60.0));
                assert_eq!(rules[1].thresholds.cgpa, Some(6.0));
                assert_eq!(rules[1].thresholds.twelfth, Some(65.0));
            }
            other => panic!("expected department-wise basis, got {other:?}"),
        }
        assert_eq!(criteria.max_current_backlogs, Some(0));
        assert!(!criteria.open_to_all_branches);
    }

    #[test]
    fn unlisted_department_falls_back_to_global_ts_minimums() {
        let job = json!({
            "eligibility": {
                "tenthPct": 60,
                "cgpa": 6,
                "customDeptRules": [{ "department": "CSE", "minCGPA": 7.5 }]
            }
        });
        let student = json!({ "branch": "MECH", "tenthPercentage": 40, "cgpa": 5.0 });

        let result = EligibilityEngine::default()
            .evaluate_value(&job, &student)
            .expect("evaluates");

        assert!(!result.is_unresolved());
        assert_eq!(
            result.issues,
            vec![
                "CGPA 5 below required 6".to_string(),
                "10th percentage 40 below required 60".to_string(),
            ]
        );
    }

    #[test]
    fn custom_rule_without_arrears_limits_that_department_only() {
        let job = json!({
            "eligibility": {
                "customDeptRules": [
                    { "department": "CSE", "allowArrears": false },
                    { "department": "ECE", "minCGPA": 6 }
                ]
            }
        });
        let engine = EligibilityEngine::default();

        let cse = engine
            .evaluate_value(&job, &json!({ "branch": "CSE", "currentBacklogs": 1 }))
            .expect("evaluates");
        let ece = engine
            .evaluate_value(&job, &json!({ "branch": "ECE", "currentBacklogs": 1 }))
            .expect("evaluates");

        assert_eq!(cse.issues, vec!["Current backlogs 1 exceed allowed 0".to_string()]);
        assert!(ece.is_eligible);
    }

    #[test]
    fn reads_nested_student_education() {
        let record = normalize_student(&json!({
            "education": {
                "tenth": { "percentage": 91.2 },
                "twelfth": { "percentage": 84 },
                "graduation": { "branch": "ECE", "cgpa": 8.4 }
            },
            "currentBacklogs": 0,
            "skills": ["Rust", { "name": "Docker", "category": "tools" }]
        }))
        .expect("normalizes");

        assert_eq!(record.cgpa, Some(8.4));
        assert_eq!(record.tenth_percentage, Some(91.2));
        assert_eq!(record.twelfth_percentage, Some(84.0));
        assert_eq!(record.branch.as_deref(), Some("ECE"));
        assert_eq!(record.skills.len(), 2);
        assert_eq!(record.skills[1].category.as_deref(), Some("tools"));
    }

    #[test]
    fn null_student_fields_stay_absent() {
        let record = normalize_student(&json!({
            "cgpa": null,
            "tenthPercentage": 72,
            "department": "MECH"
        }))
        .expect("normalizes");

        assert_eq!(record.cgpa, None);
        assert_eq!(record.branch.as_deref(), Some("MECH"));
    }
}
