//! Placement-cell workflow: application intake gated by eligibility, job and student
//! listings, bulk screening, and recommendations.

pub mod domain;
pub mod report;
pub mod repository;
pub mod roster;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, CollegeId, EligibilitySnapshot, Job,
    JobId, JobStatus, PlacementStatus, StudentId, StudentProfile, VerificationStatus,
};
pub use report::{
    BulkEligibilityReport, BulkEligibilityRow, EligibilityCheck, EligibleJobsReport,
    EligibleStudentsReport, EligibleStudentsSummary, JobEligibilityView, Recommendation,
    RecommendationsReport, StudentEligibilityRow,
};
pub use repository::{
    NotificationError, NotificationPublisher, PlacementNotification, PlacementRepository,
    RepositoryError,
};
pub use roster::{load_roster, parse_roster, RosterEntry, RosterError};
pub use router::placement_router;
pub use service::{JobFilter, PlacementService, PlacementServiceError, StudentFilter};
