//! Worker-boundary error taxonomy.

use thiserror::Error;

use super::{CompositeError, FetchError, StoreError};
use crate::domain::ports::Visibility;

/// Errors surfaced at the worker boundary.
///
/// Every variant maps to exactly one user-facing notice so a failed
/// request still gets its single terminal response.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request queue is full.
    #[error("request queue is full")]
    Busy,

    /// The command arrived without a usable guild context.
    #[error("request is not associated with a guild")]
    InvalidGuild,

    /// The source image could not be fetched or decoded.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The source image could not be placed on the canvas.
    #[error(transparent)]
    Composite(#[from] CompositeError),

    /// The canvas could not be loaded or persisted.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A failure outside the normal taxonomy.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl ServiceError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The user-facing text and visibility for this failure.
    #[must_use]
    pub fn user_notice(&self) -> (String, Visibility) {
        match self {
            Self::Busy => (
                "I'm busy, give me a second.".to_string(),
                Visibility::Private,
            ),
            Self::InvalidGuild => ("Invalid guild.".to_string(), Visibility::Public),
            Self::Fetch(_) => ("Invalid URL".to_string(), Visibility::Private),
            Self::Composite(e) => (format!("Uh oh! {e}"), Visibility::Public),
            Self::Store(e) => (format!("Uh oh! {e}"), Visibility::Public),
            Self::Internal { .. } => ("Uh oh! Something went wrong.".to_string(), Visibility::Public),
        }
    }

    /// Whether the request was turned away before entering the queue.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Busy | Self::InvalidGuild)
    }
}
