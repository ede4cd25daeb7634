//! Token storage error types.

use thiserror::Error;

/// Errors from resolving or persisting the bot token.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum TokenError {
    #[error("invalid token format: {reason}")]
    InvalidFormat { reason: String },

    #[error("failed to read stored token: {message}")]
    RetrievalFailed { message: String },

    #[error("failed to store token: {message}")]
    StorageFailed { message: String },
}

impl TokenError {
    /// Creates an invalid format error.
    #[must_use]
    pub fn invalid_format(reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            reason: reason.into(),
        }
    }

    /// Creates a retrieval failure error.
    #[must_use]
    pub fn retrieval_failed(message: impl Into<String>) -> Self {
        Self::RetrievalFailed {
            message: message.into(),
        }
    }

    /// Creates a storage failure error.
    #[must_use]
    pub fn storage_failed(message: impl Into<String>) -> Self {
        Self::StorageFailed {
            message: message.into(),
        }
    }
}
