use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::eligibility::{EligibilityResult, StudentRecord};
use crate::matching::{JobPosting, PlacementPreferences};

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

identifier!(
    /// Identifier of a job posting.
    JobId
);
identifier!(StudentId);
identifier!(
    /// Tenant boundary: jobs and students are only matched within one college.
    CollegeId
);
identifier!(ApplicationId);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    #[default]
    Active,
    Inactive,
    Closed,
    Cancelled,
}

/// A posting as stored by the placement cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub college_id: CollegeId,
    pub title: String,
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub posting: JobPosting,
}

impl Job {
    /// Active and not past its deadline. The deadline instant itself is still open.
    pub fn accepts_registrations(&self, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::Active && self.deadline.map_or(true, |deadline| deadline >= now)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStatus {
    #[default]
    Unplaced,
    Placed,
    Barred,
    OptedOut,
}

impl PlacementStatus {
    pub fn blocks_applications(self) -> bool {
        !matches!(self, PlacementStatus::Unplaced)
    }

    pub const fn label(self) -> &'static str {
        match self {
            PlacementStatus::Unplaced => "unplaced",
            PlacementStatus::Placed => "placed",
            PlacementStatus::Barred => "barred",
            PlacementStatus::OptedOut => "opted_out",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Verified,
    Rejected {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub id: StudentId,
    pub college_id: CollegeId,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll_number: Option<String>,
    #[serde(default)]
    pub record: StudentRecord,
    #[serde(default)]
    pub preferences: PlacementPreferences,
    #[serde(default)]
    pub profile_completed: bool,
    #[serde(default)]
    pub placement_status: PlacementStatus,
    #[serde(default)]
    pub verification: VerificationStatus,
}

impl StudentProfile {
    pub fn is_verified(&self) -> bool {
        self.verification == VerificationStatus::Verified
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Shortlisted,
    Rejected,
    Selected,
    Withdrawn,
}

/// Verdict captured at submission time so later criteria edits do not rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilitySnapshot {
    pub is_eligible: bool,
    pub issues: Vec<String>,
    pub checked_date: DateTime<Utc>,
}

impl EligibilitySnapshot {
    pub fn capture(result: &EligibilityResult, checked_date: DateTime<Utc>) -> Self {
        Self {
            is_eligible: result.is_eligible,
            issues: result.issues.clone(),
            checked_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub student_id: StudentId,
    pub college_id: CollegeId,
    pub status: ApplicationStatus,
    pub eligibility: EligibilitySnapshot,
    pub applied_at: DateTime<Utc>,
}
