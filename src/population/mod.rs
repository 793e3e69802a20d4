//! Population construction and lifecycle
//!
//! The manager builds actors from configuration, registers and logs them
//! in, then launches one independent task per authenticated actor. A
//! separate monitor task reports liveness counts per role.

pub mod manager;
pub mod monitor;

pub use manager::PopulationManager;
pub use monitor::ActivitySummary;

use crate::actor::{ActorVitals, Role};
use std::sync::Arc;

/// Cross-task view of one spawned actor
///
/// Carries only what the monitor and `stop()` need; actor state itself
/// stays owned by the behavior task.
#[derive(Debug, Clone)]
pub struct ActorHandle {
    pub name: String,
    pub role: Role,
    pub vitals: Arc<ActorVitals>,
}
