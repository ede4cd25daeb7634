use std::io;
use thiserror::Error;

use super::constants::GatewayOpcode;

/// Result alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors raised while talking to the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Websocket or TLS failure on an established connection.
    #[error("transport error: {message}")]
    Transport {
        /// Underlying failure description.
        message: String,
    },

    /// The connection could not be opened or the handshake did not finish.
    #[error("handshake failed: {message}")]
    Handshake {
        /// Underlying failure description.
        message: String,
    },

    /// Server sent a close frame.
    #[error("connection closed with code {code}: {reason}")]
    Closed {
        /// Websocket close code.
        code: u16,
        /// Close reason, empty when the server sent none.
        reason: String,
    },

    /// Server rejected the session via opcode 9.
    #[error("session invalidated, resumable: {resumable}")]
    SessionInvalidated {
        /// Whether the server allows resuming the session.
        resumable: bool,
    },

    /// The shared zlib stream desynchronized or produced garbage.
    #[error("inflate error: {message}")]
    Inflate {
        /// Underlying failure description.
        message: String,
    },

    /// A frame decoded but did not match the expected payload shape.
    #[error("protocol error: {message}")]
    Protocol {
        /// What was malformed or missing.
        message: String,
    },

    /// An opcode arrived at a point where it is not valid.
    #[error("protocol error: unexpected opcode {opcode:?}")]
    UnexpectedOpcode {
        /// The offending opcode, `None` when unrecognized.
        opcode: Option<GatewayOpcode>,
    },

    /// A handshake stage did not finish within its deadline.
    #[error("timed out waiting for {waiting_for}")]
    Timeout {
        /// The stage that timed out.
        waiting_for: &'static str,
    },

    /// An operation needs a live connection and there is none.
    #[error("not connected to gateway")]
    NotConnected,

    /// A second connect was attempted while one is active.
    #[error("already connecting or connected")]
    AlreadyConnected,

    /// Socket-level io error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl GatewayError {
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn handshake(message: impl Into<String>) -> Self {
        Self::Handshake {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn inflate(message: impl Into<String>) -> Self {
        Self::Inflate {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn timeout(waiting_for: &'static str) -> Self {
        Self::Timeout { waiting_for }
    }

    /// Whether the client should open a fresh connection after this error.
    #[must_use]
    pub fn should_reconnect(&self) -> bool {
        match self {
            Self::Closed { code, .. } => close_action(*code) != CloseAction::Fatal,

            // An invalid session that cannot resume still re-identifies.
            Self::SessionInvalidated { .. } => true,

            Self::Transport { .. }
            | Self::Handshake { .. }
            | Self::Inflate { .. }
            | Self::Timeout { .. }
            | Self::Io(_) => true,

            Self::Protocol { .. }
            | Self::UnexpectedOpcode { .. }
            | Self::NotConnected
            | Self::AlreadyConnected => false,
        }
    }

    /// Whether the held session may be resumed after this error.
    #[must_use]
    pub fn can_resume(&self) -> bool {
        match self {
            Self::Closed { code, .. } => close_action(*code) == CloseAction::Resume,
            Self::SessionInvalidated { resumable } => *resumable,
            Self::Transport { .. } | Self::Timeout { .. } | Self::Io(_) => true,
            _ => false,
        }
    }

    #[must_use]
    pub const fn close_code(&self) -> Option<u16> {
        if let Self::Closed { code, .. } = self {
            Some(*code)
        } else {
            None
        }
    }
}

/// How to react to a server close code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseAction {
    /// Reconnect and resume the held session.
    Resume,
    /// Reconnect with a fresh Identify.
    Reidentify,
    /// Give up; the condition will not clear on retry.
    Fatal,
}

/// Classifies a websocket close code.
///
/// The 4xxx table follows the gateway documentation; clean closes (1000
/// and 1001) invalidate the session while abnormal ones keep it alive.
#[must_use]
pub const fn close_action(code: u16) -> CloseAction {
    match code {
        // 4000 unknown error, 4001 unknown opcode, 4002 decode error,
        // 4003 not authenticated, 4007 invalid sequence, 4008 rate
        // limited, 4009 session timed out.
        4000..=4003 | 4007..=4009 => CloseAction::Resume,

        // 4004 bad token, 4010+ shard, API version, or intent
        // misconfiguration. Retrying sends the same bad values.
        4004 | 4010..=4014 => CloseAction::Fatal,

        // 4005 already authenticated.
        1000 | 1001 | 4005 => CloseAction::Reidentify,

        _ => CloseAction::Resume,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconnect_decisions() {
        assert!(GatewayError::handshake("test").should_reconnect());
        assert!(GatewayError::timeout("Hello").should_reconnect());
        assert!(GatewayError::inflate("desync").should_reconnect());
        assert!(!GatewayError::protocol("bad payload").should_reconnect());
        assert!(!GatewayError::NotConnected.should_reconnect());
    }

    #[test]
    fn test_handshake_failure_drops_session() {
        let error = GatewayError::handshake("Failed to receive Resumed");
        assert!(error.should_reconnect());
        assert!(!error.can_resume());
    }

    #[test]
    fn test_close_code_drives_reconnect() {
        let fatal = GatewayError::Closed {
            code: 4004,
            reason: "Authentication failed".to_string(),
        };
        assert!(!fatal.should_reconnect());
        assert_eq!(fatal.close_code(), Some(4004));

        let transient = GatewayError::Closed {
            code: 4000,
            reason: "Unknown error".to_string(),
        };
        assert!(transient.should_reconnect());
        assert!(transient.can_resume());

        let abnormal = GatewayError::Closed {
            code: 1006,
            reason: String::new(),
        };
        assert!(abnormal.should_reconnect());
        assert!(abnormal.can_resume());

        let clean = GatewayError::Closed {
            code: 1000,
            reason: String::new(),
        };
        assert!(clean.should_reconnect());
        assert!(!clean.can_resume());
    }

    #[test]
    fn test_invalid_session_reidentifies() {
        let dead = GatewayError::SessionInvalidated { resumable: false };
        assert!(dead.should_reconnect());
        assert!(!dead.can_resume());

        let alive = GatewayError::SessionInvalidated { resumable: true };
        assert!(alive.should_reconnect());
        assert!(alive.can_resume());
    }

    #[test]
    fn test_close_action_table() {
        assert_eq!(close_action(4009), CloseAction::Resume);
        assert_eq!(close_action(4005), CloseAction::Reidentify);
        assert_eq!(close_action(4013), CloseAction::Fatal);
        // Codes outside the documented table keep the session.
        assert_eq!(close_action(4242), CloseAction::Resume);
    }
}
