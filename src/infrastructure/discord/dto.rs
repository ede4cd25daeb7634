use serde::{Deserialize, Serialize};

/// Message flag marking a response as visible only to the invoking user.
pub const MESSAGE_FLAG_EPHEMERAL: u32 = 1 << 6;

/// Interaction callback type for a deferred channel message.
const CALLBACK_DEFERRED_CHANNEL_MESSAGE: u8 = 5;

/// Discord API error response structure.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    /// Error message from Discord.
    pub message: String,
}

/// Discord API application response structure.
#[derive(Debug, Deserialize)]
pub struct ApplicationResponse {
    /// Application ID.
    pub id: String,
    /// Application name.
    #[serde(default)]
    pub name: String,
}

/// Interaction callback request body.
#[derive(Debug, Serialize)]
pub struct InteractionCallback {
    #[serde(rename = "type")]
    kind: u8,
}

impl InteractionCallback {
    /// Acknowledges the interaction and shows a visible loading state.
    #[must_use]
    pub const fn deferred() -> Self {
        Self {
            kind: CALLBACK_DEFERRED_CHANNEL_MESSAGE,
        }
    }
}

/// Attachment slot referenced by a multipart followup body.
#[derive(Debug, Serialize)]
pub struct AttachmentDescriptor {
    /// Index into the `files[N]` multipart parts.
    pub id: u64,
    /// Filename shown in the client.
    pub filename: String,
}

/// Followup message request body.
#[derive(Debug, Default, Serialize)]
pub struct FollowupBody {
    /// Message text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Message flags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,
    /// Attachment descriptors for multipart uploads.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub attachments: Vec<AttachmentDescriptor>,
}
