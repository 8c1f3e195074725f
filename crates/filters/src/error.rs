//! Error types for filters

use thiserror::Error;

/// Filter errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Filter error: {0}")]
    FilterError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An injected capability (language detection, segmentation) could not
    /// produce a result for this input.
    #[error("Capability unavailable: {capability}: {reason}")]
    CapabilityUnavailable {
        capability: &'static str,
        reason: String,
    },
}

impl Error {
    /// Shorthand for a capability failure
    pub fn unavailable(capability: &'static str, reason: impl Into<String>) -> Self {
        Self::CapabilityUnavailable {
            capability,
            reason: reason.into(),
        }
    }
}

/// Result type alias for filter operations
pub type Result<T> = std::result::Result<T, Error>;
