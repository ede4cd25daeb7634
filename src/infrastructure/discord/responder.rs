//! Interaction followup responder.

use std::sync::Arc;

use async_trait::async_trait;

use super::client::{ApiError, DiscordRestClient};
use crate::domain::errors::RespondError;
use crate::domain::ports::{ResponderPort, Visibility};

/// Delivers replies through the followup webhook of one interaction.
#[derive(Debug)]
pub struct FollowupResponder {
    rest: Arc<DiscordRestClient>,
    application_id: String,
    interaction_token: String,
}

impl FollowupResponder {
    /// Creates a responder bound to one deferred interaction.
    #[must_use]
    pub fn new(
        rest: Arc<DiscordRestClient>,
        application_id: impl Into<String>,
        interaction_token: impl Into<String>,
    ) -> Self {
        Self {
            rest,
            application_id: application_id.into(),
            interaction_token: interaction_token.into(),
        }
    }
}

#[async_trait]
impl ResponderPort for FollowupResponder {
    async fn send_canvas(&self, filename: &str, png: Vec<u8>) -> Result<(), RespondError> {
        self.rest
            .create_image_followup(&self.application_id, &self.interaction_token, filename, png)
            .await?;
        Ok(())
    }

    async fn send_notice(&self, message: &str, visibility: Visibility) -> Result<(), RespondError> {
        self.rest
            .create_text_followup(
                &self.application_id,
                &self.interaction_token,
                message,
                visibility.is_private(),
            )
            .await?;
        Ok(())
    }
}

impl From<ApiError> for RespondError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Status { status, message } => Self::rejected(status, message),
            ApiError::Network { message } | ApiError::Unexpected { message } => {
                Self::transport(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_maps_to_rejected() {
        let error = ApiError::Status {
            status: 404,
            message: "Unknown Webhook".to_string(),
        };

        let mapped = RespondError::from(error);
        assert!(matches!(mapped, RespondError::Rejected { status: 404, .. }));
    }

    #[test]
    fn test_network_error_maps_to_transport() {
        let error = ApiError::Network {
            message: "request timed out".to_string(),
        };

        let mapped = RespondError::from(error);
        assert!(matches!(mapped, RespondError::Transport { .. }));
    }
}
