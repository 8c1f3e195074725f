//! Error types for the document filter and pipeline

use thiserror::Error;

/// Core filtering errors
#[derive(Error, Debug)]
pub enum Error {
    /// A record did not carry a string text field
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Filter(#[from] c4clean_filters::Error),

    #[error("Processing error: {0}")]
    ProcessingError(String),
}

impl Error {
    /// True when an injected capability failed for this input
    pub fn is_capability_failure(&self) -> bool {
        matches!(
            self,
            Self::Filter(c4clean_filters::Error::CapabilityUnavailable { .. })
        )
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;
