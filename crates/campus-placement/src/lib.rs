//! Campus placement eligibility: criteria resolution, rule evaluation, match scoring,
//! and the application workflow that enforces them.

pub mod config;
pub mod eligibility;
pub mod error;
pub mod matching;
pub mod telemetry;
pub mod workflows;

pub use error::AppError;
