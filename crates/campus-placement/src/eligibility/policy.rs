use serde::{Deserialize, Serialize};

use super::domain::EligibilityResult;
use super::rules::UNRESOLVED_DEPARTMENT_ISSUE;

/// Caller-side decision for department-wise postings that have no rule for a student.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedDepartmentPolicy {
    /// Treat the missing rule as a failed check.
    #[default]
    Block,
    /// Ignore the missing rule; the posting-wide restrictions still apply.
    Allow,
}

impl UnresolvedDepartmentPolicy {
    pub fn apply(self, mut result: EligibilityResult) -> EligibilityResult {
        if self == UnresolvedDepartmentPolicy::Allow && result.is_unresolved() {
            result
                .issues
                .retain(|issue| issue != UNRESOLVED_DEPARTMENT_ISSUE);
            result.is_eligible = result.issues.is_empty();
        }
        result
    }
}
