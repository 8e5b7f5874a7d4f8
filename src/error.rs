//! Error taxonomy
//!
//! `ScrapeError` is what a pipeline run can fail with and what a `Failure`
//! outcome carries. `ValidationError` belongs to the shell and is raised
//! before the core is ever invoked.

use thiserror::Error;

/// Fetch stage failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// Server answered with a non-2xx status
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Connection, DNS, TLS or timeout failure
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// Response arrived but its body could not be read as text
    #[error("failed to read response body from {url}: {reason}")]
    Body { url: String, reason: String },
}

/// Errors a pipeline run can produce
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScrapeError {
    #[error("NetworkError: {0}")]
    Network(#[from] NetworkError),

    #[error("SelectorError: invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },

    /// The worker panicked or could not be started
    #[error("WorkerError: {0}")]
    Worker(String),
}

impl ScrapeError {
    pub fn is_network(&self) -> bool {
        matches!(self, ScrapeError::Network(_))
    }

    pub fn is_selector(&self) -> bool {
        matches!(self, ScrapeError::Selector { .. })
    }
}

/// Missing or malformed input, caught by the shell before starting a scrape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please provide a URL.")]
    MissingUrl,

    #[error("Please provide a CSS selector or enable full-page mode.")]
    MissingSelector,

    #[error("Invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}
