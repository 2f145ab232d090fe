use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::config::EligibilityConfig;
use crate::eligibility::{JobEligibility, Skill, StudentRecord, Thresholds};
use crate::matching::{CompanyTier, JobPosting, PlacementPreferences};
use crate::workflows::placement::domain::{
    ApplicationRecord, CollegeId, Job, JobId, JobStatus, PlacementStatus, StudentId,
    StudentProfile, VerificationStatus,
};
use crate::workflows::placement::repository::{
    NotificationError, NotificationPublisher, PlacementNotification, PlacementRepository,
    RepositoryError,
};
use crate::workflows::placement::{placement_router, PlacementService};

pub(super) type MemoryService = PlacementService<MemoryRepository, MemoryNotifications>;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn college() -> CollegeId {
    CollegeId::new("college-1")
}

pub(super) fn common_criteria() -> JobEligibility {
    JobEligibility::common(Thresholds::new(60.0, 60.0, 6.5))
}

/// An active job in `college()` created `age_days` before `now()`.
pub(super) fn job(id: &str, criteria: JobEligibility, age_days: i64) -> Job {
    Job {
        id: JobId::new(id),
        college_id: college(),
        title: format!("Engineer {id}"),
        company: "Acme Systems".to_string(),
        category: Some("IT".to_string()),
        status: JobStatus::Active,
        deadline: Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).single(),
        created_at: now() - Duration::days(age_days),
        posting: JobPosting {
            eligibility: criteria,
            ..JobPosting::default()
        },
    }
}

pub(super) fn strong_record() -> StudentRecord {
    StudentRecord {
        cgpa: Some(8.1),
        tenth_percentage: Some(86.0),
        twelfth_percentage: Some(82.0),
        branch: Some("CSE".to_string()),
        current_backlogs: Some(0),
        total_backlogs: Some(0),
        year_of_study: Some(4),
        skills: ["Rust", "SQL"].into_iter().map(Skill::named).collect(),
        ..StudentRecord::default()
    }
}

pub(super) fn weak_record() -> StudentRecord {
    StudentRecord {
        cgpa: Some(5.0),
        tenth_percentage: Some(70.0),
        twelfth_percentage: Some(55.0),
        branch: Some("CSE".to_string()),
        ..StudentRecord::default()
    }
}

/// A completed, verified, unplaced profile in `college()`.
pub(super) fn student(id: &str, record: StudentRecord) -> StudentProfile {
    StudentProfile {
        id: StudentId::new(id),
        college_id: college(),
        full_name: format!("Student {id}"),
        roll_number: Some(format!("R-{id}")),
        record,
        preferences: PlacementPreferences {
            preferred_locations: vec!["Bengaluru".to_string()],
            preferred_job_types: Vec::new(),
        },
        profile_completed: true,
        placement_status: PlacementStatus::Unplaced,
        verification: VerificationStatus::Verified,
    }
}

pub(super) fn build_service() -> (
    MemoryService,
    Arc<MemoryRepository>,
    Arc<MemoryNotifications>,
) {
    build_service_with(EligibilityConfig::default())
}

pub(super) fn build_service_with(
    config: EligibilityConfig,
) -> (
    MemoryService,
    Arc<MemoryRepository>,
    Arc<MemoryNotifications>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let service = PlacementService::new(repository.clone(), notifications.clone(), config);
    (service, repository, notifications)
}

pub(super) fn tiered(mut job: Job, tier: CompanyTier) -> Job {
    job.posting.company_tier = tier;
    job
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    jobs: Mutex<BTreeMap<JobId, Job>>,
    students: Mutex<BTreeMap<StudentId, StudentProfile>>,
    applications: Mutex<Vec<ApplicationRecord>>,
}

impl MemoryRepository {
    pub(super) fn add_job(&self, job: Job) {
        self.jobs
            .lock()
            .expect("jobs mutex poisoned")
            .insert(job.id.clone(), job);
    }

    pub(super) fn add_student(&self, student: StudentProfile) {
        self.students
            .lock()
            .expect("students mutex poisoned")
            .insert(student.id.clone(), student);
    }

    pub(super) fn stored_applications(&self) -> Vec<ApplicationRecord> {
        self.applications
            .lock()
            .expect("applications mutex poisoned")
            .clone()
    }
}

impl PlacementRepository for MemoryRepository {
    fn job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(self.jobs.lock().expect("jobs mutex poisoned").get(id).cloned())
    }

    fn jobs_for_college(&self, college: &CollegeId) -> Result<Vec<Job>, RepositoryError> {
        let guard = self.jobs.lock().expect("jobs mutex poisoned");
        Ok(guard
            .values()
            .filter(|job| &job.college_id == college)
            .cloned()
            .collect())
    }

    fn student(&self, id: &StudentId) -> Result<Option<StudentProfile>, RepositoryError> {
        Ok(self
            .students
            .lock()
            .expect("students mutex poisoned")
            .get(id)
            .cloned())
    }

    fn students_for_college(
        &self,
        college: &CollegeId,
    ) -> Result<Vec<StudentProfile>, RepositoryError> {
        let guard = self.students.lock().expect("students mutex poisoned");
        Ok(guard
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
        let guard = self.applications.lock().expect("applications mutex poisoned");
        Ok(guard
            .iter()
            .find(|record| &record.student_id == student && &record.job_id == job)
            .cloned())
    }

    fn applications_for_student(
        &self,
        student: &StudentId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.applications.lock().expect("applications mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| &record.student_id == student)
            .cloned()
            .collect())
    }

    fn applications_for_job(
        &self,
        job: &JobId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.applications.lock().expect("applications mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| &record.job_id == job)
            .cloned()
            .collect())
    }

    fn insert_application(
        &self,
        record: ApplicationRecord,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.applications.lock().expect("applications mutex poisoned");
        if guard
            .iter()
            .any(|existing| existing.student_id == record.student_id && existing.job_id == record.job_id)
        {
            return Err(RepositoryError::Conflict);
        }
        guard.push(record.clone());
        Ok(record)
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifications {
    events: Mutex<Vec<PlacementNotification>>,
    failing: bool,
}

impl MemoryNotifications {
    pub(super) fn failing() -> Self {
        Self {
            events: Mutex::default(),
            failing: true,
        }
    }

    pub(super) fn events(&self) -> Vec<PlacementNotification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notification: PlacementNotification) -> Result<(), NotificationError> {
        if self.failing {
            return Err(NotificationError::Transport("smtp offline".to_string()));
        }
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf8 body")
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    placement_router(Arc::new(service))
}
