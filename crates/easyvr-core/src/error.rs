//! Error types for easyvr-core.
//!
//! # Error Recovery Strategies
//!
//! | Error Type | Strategy | Rationale |
//! |------------|----------|-----------|
//! | [`Error::Validation`] | Do not retry | Fix the argument |
//! | [`Error::Timeout`] | Retry (2-3 times) | Module busy or line noise |
//! | [`Error::Protocol`] | Retry, then resync with `stop` | Corrupted or misaligned reply |
//! | [`Error::Busy`] | Finish the pending transaction first | Half-duplex link |
//! | [`Error::Io`] | Retry, then reopen the port | Transport failure |
//! | [`Error::InvalidConfig`] | Do not retry | Fix configuration and restart |
//! | [`Error::PersistentFault`] | Reopen the port or power-cycle | Retries exhausted |
//!
//! Outcomes the module reports on purpose (out of memory, training
//! conflicts, recognition errors) are not errors here. They arrive as
//! `Ok(false)` or `Ok(None)` and leave flags in the session state.
//!
//! ```ignore
//! use easyvr_core::{RetryConfig, with_retry};
//!
//! let id = with_retry(&RetryConfig::default(), "get_id", || async {
//!     shared.lock().await.get_id().await
//! })
//! .await?;
//! ```

use std::time::Duration;

use thiserror::Error;

use crate::device::Pending;

/// Errors that can occur when talking to an EasyVR module.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A caller-supplied value is outside its documented range. Nothing was sent.
    #[error("Invalid argument: {0}")]
    Validation(String),

    /// No reply arrived within the timeout class of the operation.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },

    /// A reply byte did not match what the protocol allows at this point.
    #[error("Protocol error during '{operation}': {message}")]
    Protocol {
        /// The operation in progress.
        operation: String,
        /// What was wrong with the reply.
        message: String,
    },

    /// Another transaction is still outstanding. Nothing was sent.
    #[error("Engine busy: {pending}")]
    Busy {
        /// The transaction that has to finish first.
        pending: Pending,
    },

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A retryable failure kept recurring until the retry budget ran out.
    #[error("Operation '{operation}' failed after {attempts} attempts: {source}")]
    PersistentFault {
        /// The operation that was retried.
        operation: String,
        /// Total number of attempts made.
        attempts: u32,
        /// The last failure.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a protocol error with operation context.
    pub fn protocol(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a protocol error for a status byte that is not the expected one.
    pub fn unexpected_status(operation: impl Into<String>, byte: u8) -> Self {
        Self::protocol(operation, format!("unexpected status byte 0x{byte:02X}"))
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Whether this failure happened on the link rather than in the caller's input.
    #[must_use]
    pub fn is_link_fault(&self) -> bool {
        matches!(
            self,
            Error::Timeout { .. } | Error::Protocol { .. } | Error::Io(_)
        )
    }
}

impl From<easyvr_types::ParseError> for Error {
    fn from(err: easyvr_types::ParseError) -> Self {
        use easyvr_types::ParseError;

        match err {
            ParseError::InvalidArgumentByte(byte) => Error::Protocol {
                operation: "decode argument".into(),
                message: format!("byte 0x{byte:02X} is not an argument"),
            },
            ParseError::UnknownStatus(byte) => Error::unexpected_status("decode status", byte),
            ParseError::InvalidData(msg) => Error::protocol("decode", msg),
            // Encoder, range and label failures all stem from caller input
            other => Error::Validation(other.to_string()),
        }
    }
}

/// Result type alias using easyvr-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
