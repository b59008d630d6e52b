//! Error types for the mailwatch crate.
//!
//! All errors implement [`std::error::Error`] and provide context about what went wrong.
//! Errors are categorized by their retryability - see [`Error::is_retryable`].

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while watching mailboxes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Validation errors (NOT retryable)
    // ─────────────────────────────────────────────────────────────────────────
    /// Invalid email address format.
    #[error("invalid email address: {email}")]
    InvalidAddress {
        /// The invalid email address.
        email: String,
    },

    /// Invalid configuration provided.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Upstream provider errors (RETRYABLE - the next tick may succeed)
    // ─────────────────────────────────────────────────────────────────────────
    /// A request to the upstream provider failed or timed out.
    #[error("upstream {action} request failed")]
    UpstreamRequest {
        /// The provider action that failed (e.g. `getMessages`).
        action: &'static str,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The upstream provider returned a payload we could not decode.
    #[error("upstream {action} returned a malformed payload")]
    UpstreamDecode {
        /// The provider action whose response was malformed.
        action: &'static str,
        /// The underlying decode error.
        #[source]
        source: reqwest::Error,
    },
}

impl Error {
    /// Returns `true` if this error represents a transient failure that might succeed on retry.
    ///
    /// The polling scheduler never retries within a tick; retry cadence is simply
    /// the next tick, so this is primarily useful for callers doing one-shot fetches.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::UpstreamRequest { .. } => true,
            Error::InvalidAddress { .. }
            | Error::InvalidConfig { .. }
            | Error::UpstreamDecode { .. } => false,
        }
    }

    /// Returns the error category for metrics/logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidAddress { .. } => ErrorCategory::Validation,
            Error::InvalidConfig { .. } => ErrorCategory::Configuration,
            Error::UpstreamRequest { .. } => ErrorCategory::Upstream,
            Error::UpstreamDecode { .. } => ErrorCategory::Decode,
        }
    }
}

/// Error categories for metrics and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Input validation errors.
    Validation,
    /// Configuration errors.
    Configuration,
    /// Upstream transport or availability errors.
    Upstream,
    /// Upstream payload decode errors.
    Decode,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Upstream => write!(f, "upstream"),
            ErrorCategory::Decode => write!(f, "decode"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        // Validation errors are not retryable
        let err = Error::InvalidAddress { email: "bad".into() };
        assert!(!err.is_retryable());

        let err = Error::InvalidConfig {
            message: "check interval must be non-zero".into(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_categories() {
        let err = Error::InvalidAddress { email: "bad".into() };
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.category().to_string(), "validation");

        let err = Error::InvalidConfig { message: "x".into() };
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }
}
