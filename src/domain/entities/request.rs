//! Composite request entity.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::GuildId;
use crate::domain::ports::ResponderPort;

/// Where the image for a composite comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositeSource {
    /// No image; the request only views the current canvas.
    View,
    /// Image referenced by a URL option.
    Url(String),
    /// Image uploaded as a command attachment, resolved to its CDN URL.
    Attachment(String),
}

impl CompositeSource {
    /// Builds a source from the command options. A URL option wins over an
    /// attachment when both are supplied.
    #[must_use]
    pub fn from_options(image_url: Option<String>, attachment_url: Option<String>) -> Self {
        match (image_url, attachment_url) {
            (Some(url), _) => Self::Url(url),
            (None, Some(url)) => Self::Attachment(url),
            (None, None) => Self::View,
        }
    }

    /// The URL to fetch, if the request carries an image.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::View => None,
            Self::Url(url) | Self::Attachment(url) => Some(url),
        }
    }

    /// Whether the request only views the canvas.
    #[must_use]
    pub const fn is_view(&self) -> bool {
        matches!(self, Self::View)
    }
}

/// One queued unit of work: a user command against one guild's canvas.
///
/// Carries its own responder so the worker can deliver the terminal
/// response without knowing anything about the transport.
#[derive(Clone)]
pub struct CompositeRequest {
    guild_id: GuildId,
    source: CompositeSource,
    submitted_at: DateTime<Utc>,
    responder: Arc<dyn ResponderPort>,
}

impl CompositeRequest {
    /// Creates a request stamped with the current time.
    #[must_use]
    pub fn new(guild_id: GuildId, source: CompositeSource, responder: Arc<dyn ResponderPort>) -> Self {
        Self {
            guild_id,
            source,
            submitted_at: Utc::now(),
            responder,
        }
    }

    /// The guild whose canvas this request targets.
    #[must_use]
    pub const fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// The image source.
    #[must_use]
    pub const fn source(&self) -> &CompositeSource {
        &self.source
    }

    /// When the request was accepted for queueing.
    #[must_use]
    pub const fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// The response sink for this request.
    #[must_use]
    pub fn responder(&self) -> &Arc<dyn ResponderPort> {
        &self.responder
    }
}

impl std::fmt::Debug for CompositeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeRequest")
            .field("guild_id", &self.guild_id)
            .field("source", &self.source)
            .field("submitted_at", &self.submitted_at)
            .finish_non_exhaustive()
    }
}
