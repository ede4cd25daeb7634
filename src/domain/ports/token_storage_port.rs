//! Token storage port definition.

use async_trait::async_trait;

use crate::domain::entities::BotToken;
use crate::domain::errors::TokenError;

/// Port for bot token persistence.
#[async_trait]
pub trait TokenStoragePort: Send + Sync {
    /// Retrieves the stored token.
    async fn get_token(&self) -> Result<Option<BotToken>, TokenError>;

    /// Stores the token for future starts.
    async fn store_token(&self, token: &BotToken) -> Result<(), TokenError>;
}
