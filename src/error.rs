//! Error taxonomy for the dispatch pipeline.
//!
//! Everything a handler can fail with is a [`PipelineError`]. Validation
//! failures and explicit handler errors are recovered at the chain boundary
//! and converted into well-formed HTTP responses by the finalizer; they never
//! cross the request boundary as panics. Route exhaustion is intentionally
//! not an error value; the finalizer maps an exhausted chain to 404.

use serde_json::Value;
use thiserror::Error;

/// Failure signal produced by handlers or the validation layer.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed or missing query/body fields. Finalized as a 400 with a
    /// machine-readable reason.
    #[error("validation failed: {reason}")]
    Validation {
        reason: String,
        /// Field the failure refers to, when one can be named.
        field: Option<String>,
    },

    /// A handler deliberately signalling a status plus message, optionally
    /// carrying a data payload (e.g. 403 Forbidden).
    #[error("{message}")]
    Handler {
        status: u16,
        message: String,
        data: Option<Value>,
    },

    /// Unexpected failure inside a handler (including caught panics).
    /// Finalized as a 500 with a deliberately generic body; the detail is
    /// logged, never sent to the client.
    #[error("internal handler fault: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Build a validation error without a named field.
    pub fn validation(reason: impl Into<String>) -> Self {
        PipelineError::Validation {
            reason: reason.into(),
            field: None,
        }
    }

    /// Build a validation error referring to a specific field.
    pub fn validation_field(reason: impl Into<String>, field: impl Into<String>) -> Self {
        PipelineError::Validation {
            reason: reason.into(),
            field: Some(field.into()),
        }
    }

    /// Build an explicit handler error.
    pub fn handler(status: u16, message: impl Into<String>, data: Option<Value>) -> Self {
        PipelineError::Handler {
            status,
            message: message.into(),
            data,
        }
    }

    /// Status code this error finalizes to.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            PipelineError::Validation { .. } => 400,
            PipelineError::Handler { status, .. } => *status,
            PipelineError::Internal(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(PipelineError::validation("bad").status(), 400);
        assert_eq!(PipelineError::handler(403, "Forbidden", None).status(), 403);
        assert_eq!(PipelineError::Internal("boom".into()).status(), 500);
    }
}
