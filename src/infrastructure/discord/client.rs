//! Discord API HTTP client.

use reqwest::{Client, StatusCode, header, multipart};
use thiserror::Error;
use tracing::{debug, warn};

use super::commands::CommandDefinition;
use super::dto::{
    ApplicationResponse, AttachmentDescriptor, ErrorResponse, FollowupBody, InteractionCallback,
    MESSAGE_FLAG_EPHEMERAL,
};
use crate::domain::entities::BotToken;

const DISCORD_API_BASE: &str = "https://discord.com/api/v10";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// User agent in the form the API asks bots to send.
const BOT_USER_AGENT: &str = concat!(
    "DiscordBot (https://github.com/linuxmobile/mosaicord, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Errors returned by the Discord REST API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request never reached Discord or timed out.
    #[error("network error: {message}")]
    Network {
        /// Failure description.
        message: String,
    },
    /// Discord answered with a non-success status.
    #[error("discord rejected the request ({status}): {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },
    /// Response body could not be decoded.
    #[error("unexpected response: {message}")]
    Unexpected {
        /// Failure description.
        message: String,
    },
}

impl ApiError {
    fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }
}

/// Discord REST API client authenticated as the bot.
pub struct DiscordRestClient {
    client: Client,
    base_url: String,
    token: BotToken,
}

impl DiscordRestClient {
    /// Creates new client with default base URL.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(token: BotToken) -> Result<Self, ApiError> {
        Self::with_base_url(DISCORD_API_BASE, token)
    }

    /// Creates client with custom base URL.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn with_base_url(base_url: impl Into<String>, token: BotToken) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(BOT_USER_AGENT)
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ApiError::unexpected(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            token,
        })
    }

    /// Fetches the application the token belongs to.
    ///
    /// # Errors
    /// Returns error if the request fails or the token is rejected.
    pub async fn current_application(&self) -> Result<ApplicationResponse, ApiError> {
        let url = format!("{}/applications/@me", self.base_url);

        debug!("Fetching current application");

        let response = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, self.token.authorization())
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(handle_error_response(status, response).await);
        }

        response
            .json::<ApplicationResponse>()
            .await
            .map_err(|e| ApiError::unexpected(format!("failed to parse response: {e}")))
    }

    /// Replaces the global command set with the given definitions.
    ///
    /// Returns the number of commands Discord now holds.
    ///
    /// # Errors
    /// Returns error if the request fails or is rejected.
    pub async fn overwrite_global_commands(
        &self,
        application_id: &str,
        commands: &[CommandDefinition],
    ) -> Result<usize, ApiError> {
        let url = format!("{}/applications/{application_id}/commands", self.base_url);

        debug!(count = commands.len(), "Overwriting global commands");

        let response = self
            .client
            .put(&url)
            .header(header::AUTHORIZATION, self.token.authorization())
            .json(commands)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(handle_error_response(status, response).await);
        }

        let registered: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| ApiError::unexpected(format!("failed to parse response: {e}")))?;

        Ok(registered.len())
    }

    /// Acknowledges an interaction with a visible loading state.
    ///
    /// Must complete within three seconds of the interaction arriving or
    /// Discord drops it.
    ///
    /// # Errors
    /// Returns error if the request fails or is rejected.
    pub async fn defer_interaction(
        &self,
        interaction_id: &str,
        interaction_token: &str,
    ) -> Result<(), ApiError> {
        let url = format!(
            "{}/interactions/{interaction_id}/{interaction_token}/callback",
            self.base_url
        );

        let response = self
            .client
            .post(&url)
            .json(&InteractionCallback::deferred())
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(handle_error_response(status, response).await);
        }

        Ok(())
    }

    /// Sends a text followup to a deferred interaction.
    ///
    /// # Errors
    /// Returns error if the request fails or is rejected.
    pub async fn create_text_followup(
        &self,
        application_id: &str,
        interaction_token: &str,
        content: &str,
        ephemeral: bool,
    ) -> Result<(), ApiError> {
        let url = format!(
            "{}/webhooks/{application_id}/{interaction_token}",
            self.base_url
        );

        let body = FollowupBody {
            content: Some(content.to_string()),
            flags: ephemeral.then_some(MESSAGE_FLAG_EPHEMERAL),
            attachments: Vec::new(),
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(handle_error_response(status, response).await);
        }

        Ok(())
    }

    /// Uploads a PNG as the followup to a deferred interaction.
    ///
    /// # Errors
    /// Returns error if the request fails or is rejected.
    pub async fn create_image_followup(
        &self,
        application_id: &str,
        interaction_token: &str,
        filename: &str,
        png: Vec<u8>,
    ) -> Result<(), ApiError> {
        let url = format!(
            "{}/webhooks/{application_id}/{interaction_token}",
            self.base_url
        );

        let body = FollowupBody {
            content: None,
            flags: None,
            attachments: vec![AttachmentDescriptor {
                id: 0,
                filename: filename.to_string(),
            }],
        };
        let payload = serde_json::to_string(&body)
            .map_err(|e| ApiError::unexpected(format!("failed to encode payload: {e}")))?;

        let part = multipart::Part::bytes(png)
            .file_name(filename.to_string())
            .mime_str("image/png")
            .map_err(|e| ApiError::unexpected(format!("failed to build attachment part: {e}")))?;
        let form = multipart::Form::new()
            .text("payload_json", payload)
            .part("files[0]", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(handle_error_response(status, response).await);
        }

        Ok(())
    }
}

impl std::fmt::Debug for DiscordRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordRestClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

fn map_send_error(e: reqwest::Error) -> ApiError {
    warn!(error = %e, "Failed to reach Discord API");
    if e.is_timeout() {
        ApiError::network("request timed out")
    } else if e.is_connect() {
        ApiError::network("failed to connect to Discord")
    } else {
        ApiError::network(e.to_string())
    }
}

async fn handle_error_response(status: StatusCode, response: reqwest::Response) -> ApiError {
    let message = match response.json::<ErrorResponse>().await {
        Ok(error) => error.message,
        Err(_) => format!("HTTP {status}"),
    };

    ApiError::Status {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_TOKEN: &str =
        "MTIzNDU2Nzg5MDEyMzQ1Njc4.GhIjKl.MnOpQrStUvWxYz1234567890abcdefghijklmn";

    #[test]
    fn test_client_creation() {
        let token = BotToken::new(VALID_TOKEN).unwrap();
        let client = DiscordRestClient::new(token);
        assert!(client.is_ok());
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let token = BotToken::new(VALID_TOKEN).unwrap();
        let client = DiscordRestClient::new(token).unwrap();

        let debug = format!("{client:?}");
        assert!(!debug.contains("MnOpQrStUvWxYz"));
    }

    #[test]
    fn test_status_error_display() {
        let error = ApiError::Status {
            status: 403,
            message: "Missing Access".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "discord rejected the request (403): Missing Access"
        );
    }
}
