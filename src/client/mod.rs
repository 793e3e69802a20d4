//! Authenticated, retrying HTTP request layer
//!
//! Every other component talks to the backend through [`ApiClient`]. The
//! client applies the bearer token, retries transient failures with
//! exponential backoff and returns a tagged [`Payload`] result; it never
//! unwinds across the component boundary.

pub mod api;
pub mod payload;

pub use api::{ApiClient, Payload, RetryPolicy};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

/// Per-actor lastActivity sink
///
/// Touched by the client on every request attempt, success or failure.
/// The population monitor reads it to build liveness summaries.
#[derive(Debug, Default)]
pub struct ActivityTracker {
    last_activity: RwLock<Option<DateTime<Utc>>>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a request attempt was just made
    pub fn touch(&self) {
        *self.last_activity.write() = Some(Utc::now());
    }

    /// Timestamp of the most recent request attempt, if any
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        *self.last_activity.read()
    }
}
