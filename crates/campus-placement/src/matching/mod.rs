//! Ranking of job postings for a student. Scores order listings; they never gate applications.

mod posting;
mod weights;

pub use posting::{CompanyTier, JobPosting, JobType, PlacementPreferences};
pub use weights::{ScoreWeights, DEFAULT_WEIGHTS};

use serde::{Deserialize, Serialize};

use crate::eligibility::{
    EligibilityEngine, EligibilityError, EligibilityResult, StudentRecord,
    UnresolvedDepartmentPolicy,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchFactor {
    Eligibility,
    Skills,
    Location,
    CompanyTier,
    JobType,
}

/// Points awarded for one ranking signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchComponent {
    pub factor: MatchFactor,
    pub points: f64,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchScore {
    pub total: u32,
    pub eligibility: EligibilityResult,
    pub components: Vec<MatchComponent>,
}

/// Weighted scorer layered over the eligibility engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchScorer {
    engine: EligibilityEngine,
    policy: UnresolvedDepartmentPolicy,
    weights: ScoreWeights,
}

impl MatchScorer {
    pub fn new(
        engine: EligibilityEngine,
        policy: UnresolvedDepartmentPolicy,
        weights: ScoreWeights,
    ) -> Self {
        Self {
            engine,
            policy,
            weights,
        }
    }

    pub fn score(
        &self,
        job: &JobPosting,
        student: &StudentRecord,
        preferences: Option<&PlacementPreferences>,
    ) -> Result<MatchScore, EligibilityError> {
        let verdict = self
            .engine
            .screen(&job.eligibility, student, self.policy)?;
        Ok(self.score_with_verdict(verdict, job, student, preferences))
    }

    /// Score using a verdict the caller already computed for this job and student.
    pub fn score_with_verdict(
        &self,
        verdict: EligibilityResult,
        job: &JobPosting,
        student: &StudentRecord,
        preferences: Option<&PlacementPreferences>,
    ) -> MatchScore {
        let weights = &self.weights;
        let mut components = Vec::new();

        if verdict.is_eligible {
            components.push(MatchComponent {
                factor: MatchFactor::Eligibility,
                points: weights.eligibility as f64,
                notes: "meets all eligibility criteria".to_string(),
            });
        }

        if !job.required_skills.is_empty() {
            let matched = job
                .required_skills
                .iter()
                .filter(|skill| student.has_skill(skill))
                .count();
            if matched > 0 {
                let ratio = matched as f64 / job.required_skills.len() as f64;
                components.push(MatchComponent {
                    factor: MatchFactor::Skills,
                    points: ratio * weights.skills as f64,
                    notes: format!(
                        "{matched} of {} required skills",
                        job.required_skills.len()
                    ),
                });
            }
        }

        if let (Some(location), Some(preferences)) = (job.location.as_deref(), preferences) {
            if preferences.prefers_location(location) {
                components.push(MatchComponent {
                    factor: MatchFactor::Location,
                    points: weights.location as f64,
                    notes: format!("preferred location {location}"),
                });
            }
        }

        let tier_points = match job.company_tier {
            CompanyTier::SuperDream => weights.company_tier as f64,
            CompanyTier::Dream => weights.company_tier as f64 / 2.0,
            CompanyTier::Normal => 0.0,
        };
        if tier_points > 0.0 {
            components.push(MatchComponent {
                factor: MatchFactor::CompanyTier,
                points: tier_points,
                notes: format!("{} company", job.company_tier.label()),
            });
        }

        if let (Some(job_type), Some(preferences)) = (job.job_type, preferences) {
            if preferences.preferred_job_types.contains(&job_type) {
                components.push(MatchComponent {
                    factor: MatchFactor::JobType,
                    points: weights.job_type as f64,
                    notes: "preferred job type".to_string(),
                });
            }
        }

        let total = components
            .iter()
            .map(|component| component.points)
            .sum::<f64>()
            .round() as u32;

        MatchScore {
            total,
            eligibility: verdict,
            components,
        }
    }
}
