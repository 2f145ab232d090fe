use serde::{Deserialize, Serialize};

/// Points each ranking signal contributes at full strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreWeights {
    pub eligibility: u32,
    pub skills: u32,
    pub location: u32,
    pub company_tier: u32,
    pub job_type: u32,
}

pub const DEFAULT_WEIGHTS: ScoreWeights = ScoreWeights {
    eligibility: 40,
    skills: 30,
    location: 15,
    company_tier: 10,
    job_type: 5,
};

impl Default for ScoreWeights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}
