use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

use campus_placement::error::AppError;
use campus_placement::workflows::placement::{
    ApplicationRecord, CollegeId, Job, JobId, NotificationError, NotificationPublisher,
    PlacementNotification, PlacementRepository, RepositoryError, StudentId, StudentProfile,
};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Jobs and student profiles loaded at startup from a JSON seed file.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SeedData {
    #[serde(default)]
    pub(crate) jobs: Vec<Job>,
    #[serde(default)]
    pub(crate) students: Vec<StudentProfile>,
}

pub(crate) fn load_seed(path: &Path) -> Result<SeedData, AppError> {
    let file = std::fs::File::open(path)?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryPlacementRepository {
    jobs: Arc<Mutex<BTreeMap<JobId, Job>>>,
    students: Arc<Mutex<BTreeMap<StudentId, StudentProfile>>>,
    applications: Arc<Mutex<Vec<ApplicationRecord>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("in-memory store poisoned".to_string()))
}

impl InMemoryPlacementRepository {
    pub(crate) fn seeded(seed: SeedData) -> Result<Self, RepositoryError> {
        let repository = Self::default();
        {
            let mut jobs = lock(&repository.jobs)?;
            for job in seed.jobs {
                jobs.insert(job.id.clone(), job);
            }
            let mut students = lock(&repository.students)?;
            for student in seed.students {
                students.insert(student.id.clone(), student);
            }
        }
        Ok(repository)
    }
}

impl PlacementRepository for InMemoryPlacementRepository {
    fn job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(lock(&self.jobs)?.get(id).cloned())
    }

    fn jobs_for_college(&self, college: &CollegeId) -> Result<Vec<Job>, RepositoryError> {
        Ok(lock(&self.jobs)?
            .values()
            .filter(|job| &job.college_id == college)
            .cloned()
            .collect())
    }

    fn student(&self, id: &StudentId) -> Result<Option<StudentProfile>, RepositoryError> {
        Ok(lock(&self.students)?.get(id).cloned())
    }

    fn students_for_college(
        &self,
        college: &CollegeId,
    ) -> Result<Vec<StudentProfile>, RepositoryError> {
        Ok(lock(&self.students)?
            .values()
            .filter(|student| &student.college_id == college)
            .cloned()
            .collect())
    }

    fn application(
        &self,
        student: &StudentId,
        job: &JobId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(lock(&self.applications)?
            .iter()
            .find(|record| &record.student_id == student && &record.job_id == job)
            .cloned())
    }

    fn applications_for_student(
        &self,
        student: &StudentId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Ok(lock(&self.applications)?
            .iter()
            .filter(|record| &record.student_id == student)
            .cloned()
            .collect())
    }

    fn applications_for_job(
        &self,
        job: &JobId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Ok(lock(&self.applications)?
            .iter()
            .filter(|record| &record.job_id == job)
            .cloned()
            .collect())
    }

    fn insert_application(
        &self,
        record: ApplicationRecord,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = lock(&self.applications)?;
        if guard.iter().any(|existing| {
            existing.student_id == record.student_id && existing.job_id == record.job_id
        }) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(record.clone());
        Ok(record)
    }
}

/// Publisher that records notifications in the service log.
#[derive(Default, Clone)]
pub(crate) struct LoggingNotificationPublisher;

impl NotificationPublisher for LoggingNotificationPublisher {
    fn publish(&self, notification: PlacementNotification) -> Result<(), NotificationError> {
        info!(
            template = %notification.template,
            student = %notification.student_id,
            job = %notification.job_id,
            details = ?notification.details,
            "notification queued"
        );
        Ok(())
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|err| format!("failed to parse '{raw}' as an RFC 3339 timestamp ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seed() -> SeedData {
        serde_json::from_value(json!({
            "jobs": [{
                "id": "job-1",
                "collegeId": "college-1",
                "title": "Backend Engineer",
                "company": "Acme",
                "createdAt": "2025-01-05T00:00:00Z",
                "eligibilityType": "common",
                "commonEligibility": { "tenth": 60, "twelfth": 60, "cgpa": 6.5 },
                "requiredSkills": ["Rust"],
                "companyTier": "dream"
            }],
            "students": [{
                "id": "s-1",
                "collegeId": "college-1",
                "fullName": "Asha Rao",
                "record": { "cgpa": 8.0, "branch": "CSE" },
                "profileCompleted": true,
                "verification": { "state": "verified" }
            }]
        }))
        .expect("seed deserializes")
    }

    #[test]
    fn seeded_repository_serves_jobs_and_students() {
        let repository = InMemoryPlacementRepository::seeded(seed()).expect("seeds");

        let job = repository
            .job(&JobId::new("job-1"))
            .expect("lookup succeeds")
            .expect("job present");
        assert_eq!(job.posting.required_skills, vec!["Rust".to_string()]);
        assert_eq!(
            repository
                .students_for_college(&CollegeId::new("college-1"))
                .expect("lookup succeeds")
                .len(),
            1
        );
        assert!(repository
            .jobs_for_college(&CollegeId::new("college-2"))
            .expect("lookup succeeds")
            .is_empty());
    }

    #[test]
    fn parse_timestamp_accepts_offsets() {
        let parsed = parse_timestamp("2025-03-01T14:30:00+05:30").expect("parses");
        assert_eq!(parsed.to_rfc3339(), "2025-03-01T09:00:00+00:00");
        assert!(parse_timestamp("yesterday").is_err());
    }
}
