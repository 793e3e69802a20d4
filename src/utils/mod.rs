//! Common utilities: configuration and error types

pub mod config;
pub mod errors;

pub use config::{SimConfig, SimMode};
pub use errors::{Result, SimError};
