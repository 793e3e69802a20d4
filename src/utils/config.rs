//! Simulator configuration
//!
//! Loaded from an optional `simulator` file (YAML/TOML/JSON, any format the
//! `config` crate recognizes) with `ELEARN_SIM_*` environment overrides.
//! A missing or malformed configuration degrades to the built-in defaults
//! with a warning; it never aborts the run.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

/// Execution mode for the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimMode {
    /// Every actor runs its own independent behavior loop
    Free,
    /// A single orchestrator drives session rounds across the population
    Session,
}

/// Number of actors to build per role
#[derive(Debug, Clone, Deserialize)]
pub struct PopulationCounts {
    pub admins: usize,
    pub instructors: usize,
    pub students: usize,
}

/// Per-role passwords used at registration time
#[derive(Debug, Clone, Deserialize)]
pub struct RolePasswords {
    pub admin: String,
    pub instructor: String,
    pub student: String,
}

/// Request client tuning
#[derive(Debug, Clone, Deserialize)]
pub struct RequestConfig {
    /// Per-call timeout in seconds, independent of retry backoff
    pub timeout_secs: u64,
    /// Attempt cap including the first call
    pub max_attempts: u32,
    /// Base backoff delay in milliseconds
    pub base_delay_ms: u64,
    /// Backoff multiplier applied after each failed attempt
    pub backoff_multiplier: f64,
    /// Upper bound on a single backoff sleep, milliseconds
    pub max_delay_ms: u64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            max_attempts: 3,
            base_delay_ms: 500,
            backoff_multiplier: 2.0,
            max_delay_ms: 5_000,
        }
    }
}

/// Top-level simulator configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Base URL of the e-learning backend API
    pub api_url: String,

    /// Execution mode
    pub mode: SimMode,

    /// Actor counts per role
    pub population: PopulationCounts,

    /// Course topic vocabulary for instructors
    pub course_topics: Vec<String>,

    /// Content type vocabulary for course material
    pub content_types: Vec<String>,

    /// Per-role passwords
    pub passwords: RolePasswords,

    /// Minimum inter-action delay in seconds
    pub min_delay_secs: f64,

    /// Maximum inter-action delay in seconds
    pub max_delay_secs: f64,

    /// Request client tuning
    pub request: RequestConfig,

    /// Interval between activity summaries, seconds
    pub summary_interval_secs: u64,

    /// Per-task join timeout when stopping, seconds
    pub stop_timeout_secs: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000/api".to_string(),
            mode: SimMode::Free,
            population: PopulationCounts {
                admins: 1,
                instructors: 3,
                students: 6,
            },
            course_topics: vec![
                "Web Development".to_string(),
                "Data Science".to_string(),
                "Machine Learning".to_string(),
            ],
            content_types: vec![
                "video".to_string(),
                "pdf".to_string(),
                "quiz".to_string(),
            ],
            passwords: RolePasswords {
                admin: "admin123".to_string(),
                instructor: "instructor123".to_string(),
                student: "student123".to_string(),
            },
            min_delay_secs: 3.0,
            max_delay_secs: 8.0,
            request: RequestConfig::default(),
            summary_interval_secs: 60,
            stop_timeout_secs: 2,
        }
    }
}

impl SimConfig {
    /// Load configuration from `simulator.*` and the environment
    ///
    /// Any load or deserialization failure falls back to defaults.
    pub fn load() -> Self {
        Self::load_from("simulator")
    }

    /// Load configuration from a named file stem
    pub fn load_from(path: &str) -> Self {
        let built = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("ELEARN_SIM").separator("__"))
            .build()
            .and_then(|c| c.try_deserialize::<SimConfig>());

        match built {
            Ok(config) => {
                info!("Loaded configuration (api_url: {})", config.api_url);
                config
            }
            Err(e) => {
                warn!("Failed to load configuration ({}), using defaults", e);
                SimConfig::default()
            }
        }
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_secs_f64(self.min_delay_secs)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_secs_f64(self.max_delay_secs)
    }

    pub fn summary_interval(&self) -> Duration {
        Duration::from_secs(self.summary_interval_secs)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }
}
