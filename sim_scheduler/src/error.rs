//! Scheduler error types

use thiserror::Error;

/// Errors reported synchronously by the scheduler boundary
///
/// Configuration errors leave the previous configuration in place.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Malformed policy or quantum configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Task request that can never complete
    #[error("Invalid task: {0}")]
    InvalidTask(String),

    /// A disruption decision arrived with nothing pending
    #[error("No disruption is awaiting a decision")]
    NoPendingDisruption,
}
