use serde::{Deserialize, Serialize};

use crate::eligibility::JobEligibility;

/// Company classification used by placement cells to limit dream offers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyTier {
    SuperDream,
    Dream,
    #[default]
    #[serde(other)]
    Normal,
}

impl CompanyTier {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "super_dream" => Self::SuperDream,
            "dream" => Self::Dream,
            _ => Self::Normal,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            CompanyTier::SuperDream => "super_dream",
            CompanyTier::Dream => "dream",
            CompanyTier::Normal => "normal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobType {
    #[serde(rename = "full-time")]
    FullTime,
    #[serde(rename = "internship")]
    Internship,
    #[serde(rename = "internship-ppo")]
    InternshipWithPpo,
    #[serde(rename = "contract")]
    Contract,
}

impl JobType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "full-time" | "fulltime" => Some(Self::FullTime),
            "internship" => Some(Self::Internship),
            "internship-ppo" | "internship-with-ppo" => Some(Self::InternshipWithPpo),
            "contract" => Some(Self::Contract),
            _ => None,
        }
    }
}

/// Everything the scorer reads from a job: its eligibility plus ranking traits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    #[serde(flatten)]
    pub eligibility: JobEligibility,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub company_tier: CompanyTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<JobType>,
}

/// Student preferences consulted only for ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementPreferences {
    #[serde(default)]
    pub preferred_locations: Vec<String>,
    #[serde(default)]
    pub preferred_job_types: Vec<JobType>,
}

impl PlacementPreferences {
    pub fn prefers_location(&self, location: &str) -> bool {
        let location = location.trim();
        self.preferred_locations
            .iter()
            .any(|preferred| preferred.trim().eq_ignore_ascii_case(location))
    }
}
