//! Continuous-mode session orchestration

pub mod orchestrator;

pub use orchestrator::{OrchestratorState, SessionOrchestrator};
