//! Image fetch error types.

use thiserror::Error;

/// Errors from retrieving and decoding a remote image.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum FetchError {
    #[error("network error fetching image: {message}")]
    Network { message: String },

    #[error("image fetch timed out")]
    Timeout,

    #[error("invalid image URL: {reason}")]
    InvalidUrl { reason: String },

    #[error("failed to decode image: {message}")]
    Undecodable { message: String },
}

impl FetchError {
    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates an invalid URL error.
    #[must_use]
    pub fn invalid_url(reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            reason: reason.into(),
        }
    }

    /// Creates a decode failure error.
    #[must_use]
    pub fn undecodable(message: impl Into<String>) -> Self {
        Self::Undecodable {
            message: message.into(),
        }
    }

    /// Whether the failure came from the transfer rather than the payload.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(FetchError::network("refused").is_transport());
        assert!(FetchError::Timeout.is_transport());
        assert!(!FetchError::invalid_url("no scheme").is_transport());
        assert!(!FetchError::undecodable("not an image").is_transport());
    }
}
