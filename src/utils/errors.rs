//! Error types for the simulation engine
//!
//! Request failures are values, not unwinds: the client resolves transient
//! conditions internally via retry and surfaces everything else as a tagged
//! `SimError`. Callers branch on the variant.

use thiserror::Error;

/// Result type used throughout the engine
pub type Result<T> = std::result::Result<T, SimError>;

/// Engine error taxonomy
#[derive(Debug, Error)]
pub enum SimError {
    /// Connection failure or timeout; eligible for retry
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx HTTP status; retried only when >= 500
    #[error("HTTP {status}: {detail}")]
    Protocol { status: u16, detail: String },

    /// Successful status but the body failed to parse as JSON
    #[error("decode error: {0}")]
    Decode(String),

    /// Call attempted without an auth token; local precondition, no I/O
    #[error("missing auth token: {0}")]
    Auth(String),

    /// Local state did not permit the action
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Configuration could not be loaded or deserialized
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// No actor in the population could register and log in
    #[error("no actor could be authenticated against the backend")]
    NoActorsAuthenticated,
}

impl SimError {
    /// Whether the retry loop should attempt the call again
    pub fn is_transient(&self) -> bool {
        match self {
            SimError::Network(_) => true,
            SimError::Protocol { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
