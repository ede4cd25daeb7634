//! Response delivery error types.

use thiserror::Error;

/// Errors from delivering a response back to the user.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum RespondError {
    #[error("transport error delivering response: {message}")]
    Transport { message: String },

    #[error("response rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
}

impl RespondError {
    /// Creates a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a rejection error from an API status.
    #[must_use]
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }
}
