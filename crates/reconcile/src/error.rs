//! Error taxonomy for reconciliation.
//!
//! The variants map to the stages of an invocation: retrieval (defaults
//! store), validation (definition shape), compile (candidate rejected
//! before any state-changing device interaction), apply (device rejected
//! or failed to commit). Retrieval, validation, and compile errors abort
//! before the device state can change.

use thiserror::Error;

/// Errors produced while reconciling a policy against a device.
#[derive(Debug, Error)]
pub enum Error {
    /// The defaults store is unreachable, or a required key is missing.
    #[error("retrieval error: {message}")]
    Retrieval {
        /// What could not be retrieved and why
        message: String,
    },

    /// The definition failed validation or canonicalization.
    #[error(transparent)]
    Validation(#[from] policykit::Error),

    /// The device transport rejected the candidate before any
    /// state-changing interaction.
    #[error("compile error: {message}")]
    Compile {
        /// Transport diagnostic
        message: String,
    },

    /// The device rejected the configuration or failed to commit.
    #[error("apply error: {message}")]
    Apply {
        /// Transport diagnostic, surfaced verbatim
        message: String,
    },
}

impl Error {
    /// Shorthand for a retrieval error.
    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::Retrieval {
            message: message.into(),
        }
    }

    /// Shorthand for a compile error.
    pub fn compile(message: impl Into<String>) -> Self {
        Self::Compile {
            message: message.into(),
        }
    }

    /// Shorthand for an apply error.
    pub fn apply(message: impl Into<String>) -> Self {
        Self::Apply {
            message: message.into(),
        }
    }
}

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;
