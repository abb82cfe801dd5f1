//! Error types for the search pipeline.
//!
//! Upstream failures are split into two kinds so callers can tell a dead
//! provider from a provider that answered with something unusable. Per-record
//! validation failures are not errors at all: the normalizer returns `None`
//! and the record is dropped.

use thiserror::Error;

/// Failure talking to a search provider or the host platform API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Transport failure, timeout, or a non-2xx status.
    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    /// Body was not JSON, or a required envelope field was missing or false.
    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

/// Failure of a single workflow step invocation.
///
/// Only ever logged. The end user sees the step's fixed failure message.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("invalid step inputs: {0}")]
    InvalidInputs(String),

    #[error("unexpected internal error: {0}")]
    Internal(String),
}

impl StepError {
    /// Short machine-readable label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            StepError::Upstream(UpstreamError::Unavailable(_)) => "upstream_unavailable",
            StepError::Upstream(UpstreamError::Malformed(_)) => "upstream_malformed",
            StepError::InvalidInputs(_) => "invalid_inputs",
            StepError::Internal(_) => "unexpected_internal",
        }
    }
}
