//! Canvas persistence error types.

use thiserror::Error;

/// Errors from loading or saving a canvas.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum StoreError {
    #[error("canvas store io error: {message}")]
    Io { message: String },

    #[error("failed to encode canvas snapshot: {message}")]
    Encode { message: String },

    #[error("failed to decode canvas snapshot: {message}")]
    Decode { message: String },
}

impl StoreError {
    /// Creates an io error.
    #[must_use]
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a snapshot encode error.
    #[must_use]
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    /// Creates a snapshot decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}
