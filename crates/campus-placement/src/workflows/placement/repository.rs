use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{ApplicationRecord, CollegeId, Job, JobId, StudentId, StudentProfile};

/// Storage abstraction over jobs, student profiles, and applications.
pub trait PlacementRepository: Send + Sync {
    fn job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
    fn jobs_for_college(&self, college: &CollegeId) -> Result<Vec<Job>, RepositoryError>;
    fn student(&self, id: &StudentId) -> Result<Option<StudentProfile>, RepositoryError>;
    fn students_for_college(
        &self,
        college: &CollegeId,
    ) -> Result<Vec<StudentProfile>, RepositoryError>;
    fn application(
        &self,
        student: &StudentId,
        job: &JobId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn applications_for_student(
        &self,
        student: &StudentId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError>;
    fn applications_for_job(&self, job: &JobId)
        -> Result<Vec<ApplicationRecord>, RepositoryError>;
    /// Fails with [`RepositoryError::Conflict`] when the student already applied to the job.
    fn insert_application(
        &self,
        record: ApplicationRecord,
    ) -> Result<ApplicationRecord, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook for student-facing notifications (in-app, e-mail, ...).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: PlacementNotification) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementNotification {
    pub template: String,
    pub student_id: StudentId,
    pub job_id: JobId,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
