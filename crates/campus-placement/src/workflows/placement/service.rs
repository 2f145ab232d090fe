use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};

use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, EligibilitySnapshot, Job, JobId,
    StudentId, StudentProfile,
};
use super::report::{
    BulkEligibilityReport, BulkEligibilityRow, EligibilityCheck, EligibleJobsReport,
    EligibleStudentsReport, IssueList, JobEligibilityView, JobHeader, Recommendation,
    RecommendationsReport, StudentEligibilityRow,
};
use super::repository::{
    NotificationError, NotificationPublisher, PlacementNotification, PlacementRepository,
    RepositoryError,
};
use crate::config::EligibilityConfig;
use crate::eligibility::{
    EligibilityEngine, EligibilityError, EligibilityResult, UnresolvedDepartmentPolicy,
};
use crate::matching::{CompanyTier, MatchScorer};

/// Narrows the job listing shown to a student.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub category: Option<String>,
    pub tier: Option<CompanyTier>,
    pub include_ineligible: bool,
}

/// Narrows the student listing shown for a job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentFilter {
    pub department: Option<String>,
    pub include_ineligible: bool,
}

/// Service composing the eligibility engine, match scorer, repository, and notifications.
pub struct PlacementService<R, N> {
    repository: Arc<R>,
    notifications: Arc<N>,
    engine: EligibilityEngine,
    policy: UnresolvedDepartmentPolicy,
    scorer: MatchScorer,
    recommendation_limit: usize,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

impl<R, N> PlacementService<R, N>
where
    R: PlacementRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(repository: Arc<R>, notifications: Arc<N>, config: EligibilityConfig) -> Self {
        let engine = EligibilityEngine::new(config.department_matching);
        let scorer = MatchScorer::new(engine, config.unresolved_department, config.weights);

        Self {
            repository,
            notifications,
            engine,
            policy: config.unresolved_department,
            scorer,
            recommendation_limit: config.recommendation_limit,
        }
    }

    /// Apply for a job, enforcing registration, profile, placement, verification,
    /// duplicate, and eligibility gates in that order.
    pub fn submit_application(
        &self,
        student_id: &StudentId,
        job_id: &JobId,
        now: DateTime<Utc>,
    ) -> Result<ApplicationRecord, PlacementServiceError> {
        let job = self.load_job(job_id)?;
        if !job.accepts_registrations(now) {
            return Err(PlacementServiceError::JobClosed(job_id.clone()));
        }

        let student = self.load_student(student_id)?;
        if student.college_id != job.college_id {
            return Err(PlacementServiceError::JobNotFound(job_id.clone()));
        }
        if !student.profile_completed {
            return Err(PlacementServiceError::ProfileIncomplete);
        }
        if student.placement_status.blocks_applications() {
            return Err(PlacementServiceError::PlacementLocked {
                status: student.placement_status.label(),
            });
        }
        if !student.is_verified() {
            return Err(PlacementServiceError::NotVerified);
        }
        if self.repository.application(student_id, job_id)?.is_some() {
            return Err(PlacementServiceError::AlreadyApplied);
        }

        let verdict = self.verdict(&job, &student)?;
        if !verdict.is_eligible {
            warn!(
                student = %student_id,
                job = %job_id,
                issues = ?verdict.issues,
                "application rejected by eligibility check"
            );
            return Err(PlacementServiceError::Ineligible {
                issues: verdict.issues,
            });
        }

        let record = ApplicationRecord {
            id: next_application_id(),
            job_id: job.id.clone(),
            student_id: student.id.clone(),
            college_id: job.college_id.clone(),
            status: ApplicationStatus::Pending,
            eligibility: EligibilitySnapshot::capture(&verdict, now),
            applied_at: now,
        };

        let stored = match self.repository.insert_application(record) {
            Ok(stored) => stored,
            Err(RepositoryError::Conflict) => return Err(PlacementServiceError::AlreadyApplied),
            Err(other) => return Err(other.into()),
        };
        info!(
            application = %stored.id,
            student = %student_id,
            job = %job_id,
            "application submitted"
        );

        if let Err(error) = self.notify_submitted(&job, &stored) {
            warn!(application = %stored.id, %error, "application notification failed");
        }

        Ok(stored)
    }

    pub fn check_eligibility(
        &self,
        student_id: &StudentId,
        job_id: &JobId,
        now: DateTime<Utc>,
    ) -> Result<EligibilityCheck, PlacementServiceError> {
        let job = self.load_job(job_id)?;
        let student = self.load_student(student_id)?;
        if student.college_id != job.college_id {
            return Err(PlacementServiceError::JobNotFound(job_id.clone()));
        }
        if !student.profile_completed {
            return Err(PlacementServiceError::ProfileIncomplete);
        }

        let verdict = self.verdict(&job, &student)?;
        let existing = self.repository.application(student_id, job_id)?;
        let can_apply =
            verdict.is_eligible && existing.is_none() && job.accepts_registrations(now);

        Ok(EligibilityCheck {
            is_eligible: verdict.is_eligible,
            eligibility_issues: verdict.issues,
            already_applied: existing.is_some(),
            application_status: existing.map(|record| record.status),
            can_apply,
        })
    }

    /// Open jobs in the student's college, newest first.
    pub fn eligible_jobs(
        &self,
        student_id: &StudentId,
        filter: &JobFilter,
        now: DateTime<Utc>,
    ) -> Result<EligibleJobsReport, PlacementServiceError> {
        let student = self.load_student(student_id)?;
        let applied = self.applied_job_ids(student_id)?;

        let mut views = Vec::new();
        for job in self.open_jobs(&student, now)? {
            if let Some(category) = filter.category.as_deref() {
                let matches = job
                    .category
                    .as_deref()
                    .is_some_and(|value| value.eq_ignore_ascii_case(category.trim()));
                if !matches {
                    continue;
                }
            }
            if filter.tier.is_some_and(|tier| tier != job.posting.company_tier) {
                continue;
            }

            let verdict = self.verdict(&job, &student)?;
            if !verdict.is_eligible && !filter.include_ineligible {
                continue;
            }

            let already_applied = applied.contains(&job.id);
            views.push(JobEligibilityView {
                can_apply: verdict.is_eligible && !already_applied,
                eligibility_check: IssueList {
                    is_eligible: verdict.is_eligible,
                    issues: verdict.issues,
                },
                already_applied,
                job,
            });
        }

        Ok(EligibleJobsReport::from_views(views))
    }

    /// Completed profiles in the job's college, annotated with verdict and application state.
    pub fn eligible_students(
        &self,
        job_id: &JobId,
        filter: &StudentFilter,
    ) -> Result<EligibleStudentsReport, PlacementServiceError> {
        let job = self.load_job(job_id)?;
        let applications: HashMap<StudentId, ApplicationRecord> = self
            .repository
            .applications_for_job(job_id)?
            .into_iter()
            .map(|record| (record.student_id.clone(), record))
            .collect();

        let department = filter
            .department
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty());

        let mut rows = Vec::new();
        for student in self.repository.students_for_college(&job.college_id)? {
            if !student.profile_completed {
                continue;
            }
            if let Some(department) = department {
                let matches = student
                    .record
                    .branch
                    .as_deref()
                    .is_some_and(|branch| self.engine.matching().matches(department, branch));
                if !matches {
                    continue;
                }
            }

            let verdict = self.batch_verdict(&job, &student)?;
            if !verdict.is_eligible && !filter.include_ineligible {
                continue;
            }

            let application = applications.get(&student.id);
            rows.push(StudentEligibilityRow {
                roll_number: student.roll_number.clone(),
                branch: student.record.branch.clone(),
                cgpa: student.record.cgpa,
                tenth_percentage: student.record.tenth_percentage,
                twelfth_percentage: student.record.twelfth_percentage,
                current_backlogs: student.record.current_backlogs,
                total_backlogs: student.record.total_backlogs,
                placement_status: student.placement_status,
                is_eligible: verdict.is_eligible,
                eligibility_issues: verdict.issues,
                has_applied: application.is_some(),
                application_status: application.map(|record| record.status),
                application_date: application.map(|record| record.applied_at),
                student_id: student.id,
                full_name: student.full_name,
            });
        }

        let header = JobHeader {
            id: job.id,
            title: job.title,
            company: job.company,
            eligibility: job.posting.eligibility,
        };
        Ok(EligibleStudentsReport::new(header, rows))
    }

    /// Screen a batch of students. Unknown students and students of other colleges are skipped.
    pub fn bulk_check(
        &self,
        job_id: &JobId,
        student_ids: &[StudentId],
    ) -> Result<BulkEligibilityReport, PlacementServiceError> {
        let job = self.load_job(job_id)?;

        let mut seen = HashSet::new();
        let mut rows = Vec::new();
        for student_id in student_ids {
            if !seen.insert(student_id) {
                continue;
            }
            let Some(student) = self.repository.student(student_id)? else {
                continue;
            };
            if student.college_id != job.college_id {
                continue;
            }

            let verdict = self.batch_verdict(&job, &student)?;
            rows.push(BulkEligibilityRow {
                branch: student.record.branch.clone(),
                student_id: student.id,
                full_name: student.full_name,
                is_eligible: verdict.is_eligible,
                issues: verdict.issues,
            });
        }

        Ok(BulkEligibilityReport::from_rows(rows))
    }

    /// Open jobs the student has not applied to, best match first.
    pub fn recommendations(
        &self,
        student_id: &StudentId,
        limit: Option<usize>,
        now: DateTime<Utc>,
    ) -> Result<RecommendationsReport, PlacementServiceError> {
        let student = self.load_student(student_id)?;
        if !student.profile_completed {
            return Err(PlacementServiceError::ProfileIncomplete);
        }
        let applied = self.applied_job_ids(student_id)?;

        let mut scored = Vec::new();
        for job in self.open_jobs(&student, now)? {
            if applied.contains(&job.id) {
                continue;
            }
            let verdict = self.verdict(&job, &student)?;
            let score = self.scorer.score_with_verdict(
                verdict,
                &job.posting,
                &student.record,
                Some(&student.preferences),
            );
            scored.push(Recommendation {
                job,
                match_score: score.total,
                is_eligible: score.eligibility.is_eligible,
                eligibility_issues: score.eligibility.issues,
                components: score.components,
            });
        }

        // Stable sort keeps the newest-first order of `open_jobs` for equal scores.
        scored.sort_by_key(|recommendation| Reverse(recommendation.match_score));
        scored.truncate(limit.unwrap_or(self.recommendation_limit));

        Ok(RecommendationsReport {
            total: scored.len(),
            recommendations: scored,
        })
    }

    /// Evaluate raw job and student documents without touching the repository.
    pub fn evaluate_documents(
        &self,
        job: &Value,
        student: &Value,
    ) -> Result<EligibilityResult, EligibilityError> {
        self.engine.screen_value(job, student, self.policy)
    }

    fn verdict(
        &self,
        job: &Job,
        student: &StudentProfile,
    ) -> Result<EligibilityResult, EligibilityError> {
        self.engine
            .screen(&job.posting.eligibility, &student.record, self.policy)
    }

    fn batch_verdict(
        &self,
        job: &Job,
        student: &StudentProfile,
    ) -> Result<EligibilityResult, EligibilityError> {
        self.engine
            .screen_in_batch(&job.posting.eligibility, &student.record, self.policy)
    }

    fn load_job(&self, job_id: &JobId) -> Result<Job, PlacementServiceError> {
        self.repository
            .job(job_id)?
            .ok_or_else(|| PlacementServiceError::JobNotFound(job_id.clone()))
    }

    fn load_student(&self, student_id: &StudentId) -> Result<StudentProfile, PlacementServiceError> {
        self.repository
            .student(student_id)?
            .ok_or_else(|| PlacementServiceError::StudentNotFound(student_id.clone()))
    }

    fn applied_job_ids(&self, student_id: &StudentId) -> Result<HashSet<JobId>, RepositoryError> {
        Ok(self
            .repository
            .applications_for_student(student_id)?
            .into_iter()
            .map(|record| record.job_id)
            .collect())
    }

    fn open_jobs(
        &self,
        student: &StudentProfile,
        now: DateTime<Utc>,
    ) -> Result<Vec<Job>, RepositoryError> {
        let mut jobs: Vec<Job> = self
            .repository
            .jobs_for_college(&student.college_id)?
            .into_iter()
            .filter(|job| job.accepts_registrations(now))
            .collect();
        jobs.sort_by(|left, right| {
            right
                .created_at
                .cmp(&left.created_at)
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(jobs)
    }

    fn notify_submitted(
        &self,
        job: &Job,
        record: &ApplicationRecord,
    ) -> Result<(), PlacementServiceError> {
        let mut details = BTreeMap::new();
        details.insert("application_id".to_string(), record.id.to_string());
        details.insert("job_title".to_string(), job.title.clone());
        details.insert("company".to_string(), job.company.clone());

        self.notifications.publish(PlacementNotification {
            template: "application_submitted".to_string(),
            student_id: record.student_id.clone(),
            job_id: record.job_id.clone(),
            details,
        })?;
        Ok(())
    }
}

/// Error raised by the placement service.
#[derive(Debug, thiserror::Error)]
pub enum PlacementServiceError {
    #[error("job {0} not found")]
    JobNotFound(JobId),
    #[error("student {0} not found")]
    StudentNotFound(StudentId),
    #[error("complete your profile before applying or checking eligibility")]
    ProfileIncomplete,
    #[error("job {0} is not accepting applications")]
    JobClosed(JobId),
    #[error("applications are locked for students marked {status}")]
    PlacementLocked { status: &'static str },
    #[error("profile must be verified by the placement cell before applying")]
    NotVerified,
    #[error("you have already applied to this job")]
    AlreadyApplied,
    #[error("you are not eligible for this job")]
    Ineligible { issues: Vec<String> },
    #[error(transparent)]
    Eligibility(#[from] EligibilityError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
}
