//! Job eligibility screening: resolve a posting's criteria for a student's department,
//! then check every rule and report each violation.

mod domain;
mod error;
pub mod legacy;
mod policy;
mod resolver;
mod rules;

pub use domain::{
    DepartmentRule, EligibilityBasis, EligibilityResult, JobEligibility, Skill, StudentRecord,
    Thresholds,
};
pub use error::{CriteriaError, EligibilityError};
pub use policy::UnresolvedDepartmentPolicy;
pub use resolver::{resolve, DepartmentMatching, Resolution, RuleSet};
pub use rules::{evaluate, evaluate_resolution};

use serde_json::Value;
use tracing::warn;

/// Stateless evaluator applying posting criteria to student records.
#[derive(Debug, Clone, Copy, Default)]
pub struct EligibilityEngine {
    matching: DepartmentMatching,
}

impl EligibilityEngine {
    pub fn new(matching: DepartmentMatching) -> Self {
        Self { matching }
    }

    pub fn matching(&self) -> DepartmentMatching {
        self.matching
    }

    pub fn resolve<'a>(
        &self,
        criteria: &'a JobEligibility,
        student: &StudentRecord,
    ) -> Resolution<'a> {
        resolve(criteria, student.branch.as_deref(), self.matching)
    }

    pub fn evaluate(
        &self,
        criteria: &JobEligibility,
        student: &StudentRecord,
    ) -> Result<EligibilityResult, EligibilityError> {
        criteria.validate()?;
        let resolution = self.resolve(criteria, student);
        evaluate_resolution(&resolution, student)
    }

    /// Evaluate raw job and student documents in any of the persisted shapes.
    pub fn evaluate_value(
        &self,
        job: &Value,
        student: &Value,
    ) -> Result<EligibilityResult, EligibilityError> {
        if !job.is_object() {
            return Err(EligibilityError::malformed("job must be a JSON object"));
        }
        if !student.is_object() {
            return Err(EligibilityError::malformed("student must be a JSON object"));
        }

        let posting = legacy::normalize_job(job)?;
        let record = legacy::normalize_student(student)?;
        self.evaluate(&posting.eligibility, &record)
    }

    /// Evaluate, then let `policy` settle an unresolved department.
    pub fn screen(
        &self,
        criteria: &JobEligibility,
        student: &StudentRecord,
        policy: UnresolvedDepartmentPolicy,
    ) -> Result<EligibilityResult, EligibilityError> {
        Ok(policy.apply(self.evaluate(criteria, student)?))
    }

    pub fn screen_value(
        &self,
        job: &Value,
        student: &Value,
        policy: UnresolvedDepartmentPolicy,
    ) -> Result<EligibilityResult, EligibilityError> {
        Ok(policy.apply(self.evaluate_value(job, student)?))
    }

    /// Screen one student of a batch. A malformed student record comes back ineligible with
    /// the problem as its issue; a broken posting still fails the batch.
    pub fn screen_in_batch(
        &self,
        criteria: &JobEligibility,
        student: &StudentRecord,
        policy: UnresolvedDepartmentPolicy,
    ) -> Result<EligibilityResult, EligibilityError> {
        if let Err(EligibilityError::MalformedInput { reason }) = rules::validate_student(student)
        {
            warn!(%reason, branch = ?student.branch, "student record failed validation");
            return Ok(EligibilityResult::invalid_record(&reason));
        }
        self.screen(criteria, student, policy)
    }
}
