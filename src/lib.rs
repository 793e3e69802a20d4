//! E-Learning Workload Simulator Library
//!
//! This library drives populations of role-differentiated simulated users
//! (admins, instructors, students) against an e-learning backend API,
//! generating randomized but semantically plausible activity.
//!
//! # Architecture
//!
//! - **client**: authenticated, retrying HTTP request layer
//! - **actor**: per-user state, credentials and role memory
//! - **policy**: weighted per-role action tables and their handlers
//! - **synth**: synthetic course/content/notification payloads
//! - **population**: actor construction, authentication, task lifecycle
//! - **session**: continuous-mode orchestration across the population
//! - **utils**: configuration and error types

// Public module exports
pub mod actor;
pub mod client;
pub mod policy;
pub mod population;
pub mod session;
pub mod synth;
pub mod utils;

// Re-export commonly used types
pub use actor::{Actor, Role};
pub use client::{ApiClient, Payload};
pub use population::PopulationManager;
pub use session::SessionOrchestrator;
pub use utils::config::{SimConfig, SimMode};
pub use utils::errors::{Result, SimError};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
