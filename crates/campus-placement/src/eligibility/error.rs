/// Failure to evaluate a student against a posting. Ineligibility is never an error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EligibilityError {
    #[error("malformed eligibility input: {reason}")]
    MalformedInput { reason: String },
    #[error(transparent)]
    Criteria(#[from] CriteriaError),
}

impl EligibilityError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            reason: reason.into(),
        }
    }
}

/// Structural problems with a posting's eligibility configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CriteriaError {
    #[error("department-wise eligibility requires at least one department rule")]
    EmptyDepartmentRules,
    #[error("department name is required for criteria #{index}")]
    MissingDepartment { index: usize },
    #[error("job document is not a JSON object")]
    NotAnObject,
    #[error("invalid eligibility document: {0}")]
    Invalid(String),
}
