//! Periodic activity summary
//!
//! Observational only: counts actors whose lastActivity is set, broken
//! down by role, and logs the totals at a fixed interval. Never mutates
//! actor state.

use crate::actor::Role;
use crate::population::ActorHandle;
use std::time::Duration;
use tracing::info;

/// Per-role liveness counts at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivitySummary {
    pub active_admins: usize,
    pub total_admins: usize,
    pub active_instructors: usize,
    pub total_instructors: usize,
    pub active_students: usize,
    pub total_students: usize,
}

impl ActivitySummary {
    pub fn active(&self) -> usize {
        self.active_admins + self.active_instructors + self.active_students
    }

    pub fn total(&self) -> usize {
        self.total_admins + self.total_instructors + self.total_students
    }
}

/// Count actors with a non-null lastActivity, per role
pub fn summarize(handles: &[ActorHandle]) -> ActivitySummary {
    let mut summary = ActivitySummary::default();

    for handle in handles {
        let seen = handle.vitals.activity.last_activity().is_some();
        match handle.role {
            Role::Admin => {
                summary.total_admins += 1;
                summary.active_admins += seen as usize;
            }
            Role::Instructor => {
                summary.total_instructors += 1;
                summary.active_instructors += seen as usize;
            }
            Role::Student => {
                summary.total_students += 1;
                summary.active_students += seen as usize;
            }
        }
    }

    summary
}

/// Log summaries every `interval` until every actor has been deactivated
pub async fn run(handles: Vec<ActorHandle>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick fires immediately; skip it so summaries are spaced
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let summary = summarize(&handles);
        info!("--- ACTIVITY SUMMARY ---");
        info!("Active users: {}/{}", summary.active(), summary.total());
        info!("- Admins: {}/{}", summary.active_admins, summary.total_admins);
        info!(
            "- Instructors: {}/{}",
            summary.active_instructors, summary.total_instructors
        );
        info!(
            "- Students: {}/{}",
            summary.active_students, summary.total_students
        );
        info!("-----------------------");

        if handles.iter().all(|h| !h.vitals.is_active()) {
            break;
        }
    }
}
