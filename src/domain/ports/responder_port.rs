//! Response sink port definition.

use async_trait::async_trait;

use crate::domain::errors::RespondError;

/// Whether a response is visible to the whole channel or only the
/// requesting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Everyone in the channel sees the response.
    Public,
    /// Only the requesting user sees the response.
    Private,
}

impl Visibility {
    /// Whether only the requester sees the response.
    #[must_use]
    pub const fn is_private(self) -> bool {
        matches!(self, Self::Private)
    }
}

/// Port for delivering the single terminal response of a request.
#[async_trait]
pub trait ResponderPort: Send + Sync {
    /// Sends the rendered canvas as an image attachment.
    async fn send_canvas(&self, filename: &str, png: Vec<u8>) -> Result<(), RespondError>;

    /// Sends a plain text notice.
    async fn send_notice(&self, message: &str, visibility: Visibility)
    -> Result<(), RespondError>;
}

#[cfg(test)]
pub mod mock {
    use std::sync::Arc;

    use tokio::sync::mpsc;

    use super::{RespondError, ResponderPort, Visibility, async_trait};

    /// A reply captured by [`RecordingResponder`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum RecordedReply {
        /// A canvas attachment.
        Canvas {
            /// Attachment filename.
            filename: String,
            /// PNG bytes.
            png: Vec<u8>,
        },
        /// A text notice.
        Notice {
            /// Notice text.
            message: String,
            /// Who can see it.
            visibility: Visibility,
        },
    }

    /// Responder that forwards every reply to a channel for assertions.
    pub struct RecordingResponder {
        tx: mpsc::UnboundedSender<RecordedReply>,
    }

    impl RecordingResponder {
        /// Creates a responder and the receiving end for its replies.
        pub fn channel() -> (Arc<Self>, mpsc::UnboundedReceiver<RecordedReply>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (Arc::new(Self { tx }), rx)
        }
    }

    #[async_trait]
    impl ResponderPort for RecordingResponder {
        async fn send_canvas(&self, filename: &str, png: Vec<u8>) -> Result<(), RespondError> {
            self.tx
                .send(RecordedReply::Canvas {
                    filename: filename.to_string(),
                    png,
                })
                .map_err(|e| RespondError::transport(e.to_string()))
        }

        async fn send_notice(
            &self,
            message: &str,
            visibility: Visibility,
        ) -> Result<(), RespondError> {
            self.tx
                .send(RecordedReply::Notice {
                    message: message.to_string(),
                    visibility,
                })
                .map_err(|e| RespondError::transport(e.to_string()))
        }
    }
}
