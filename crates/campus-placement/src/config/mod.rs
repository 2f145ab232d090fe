use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::eligibility::{DepartmentMatching, UnresolvedDepartmentPolicy};
use crate::matching::ScoreWeights;

const DEFAULT_RECOMMENDATION_LIMIT: usize = 10;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub eligibility: EligibilityConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            eligibility: EligibilityConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Screening and ranking dials shared by the evaluator, scorer, and placement service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityConfig {
    pub department_matching: DepartmentMatching,
    pub unresolved_department: UnresolvedDepartmentPolicy,
    pub weights: ScoreWeights,
    pub recommendation_limit: usize,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            department_matching: DepartmentMatching::default(),
            unresolved_department: UnresolvedDepartmentPolicy::default(),
            weights: ScoreWeights::default(),
            recommendation_limit: DEFAULT_RECOMMENDATION_LIMIT,
        }
    }
}

impl EligibilityConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let department_matching = match env::var("PLACEMENT_DEPARTMENT_MATCH") {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "exact" => DepartmentMatching::Exact,
                "normalized" | "normalised" => DepartmentMatching::Normalized,
                _ => {
                    return Err(ConfigError::InvalidChoice {
                        key: "PLACEMENT_DEPARTMENT_MATCH",
                        value,
                    })
                }
            },
            Err(_) => defaults.department_matching,
        };

        let unresolved_department = match env::var("PLACEMENT_UNRESOLVED_DEPARTMENT") {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "block" => UnresolvedDepartmentPolicy::Block,
                "allow" => UnresolvedDepartmentPolicy::Allow,
                _ => {
                    return Err(ConfigError::InvalidChoice {
                        key: "PLACEMENT_UNRESOLVED_DEPARTMENT",
                        value,
                    })
                }
            },
            Err(_) => defaults.unresolved_department,
        };

        let base = defaults.weights;
        let weights = ScoreWeights {
            eligibility: env_number("PLACEMENT_WEIGHT_ELIGIBILITY", base.eligibility)?,
            skills: env_number("PLACEMENT_WEIGHT_SKILLS", base.skills)?,
            location: env_number("PLACEMENT_WEIGHT_LOCATION", base.location)?,
            company_tier: env_number("PLACEMENT_WEIGHT_COMPANY_TIER", base.company_tier)?,
            job_type: env_number("PLACEMENT_WEIGHT_JOB_TYPE", base.job_type)?,
        };

        let recommendation_limit =
            env_number("PLACEMENT_RECOMMENDATION_LIMIT", defaults.recommendation_limit)?;

        Ok(Self {
            department_matching,
            unresolved_department,
            weights,
            recommendation_limit,
        })
    }
}

fn env_number<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
    InvalidChoice { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a non-negative integer (found '{value}')")
            }
            ConfigError::InvalidChoice { key, value } => {
                write!(f, "{key} has unsupported value '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidChoice { .. } => None,
        }
    }
}
