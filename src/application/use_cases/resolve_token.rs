//! Token resolution use case.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::entities::BotToken;
use crate::domain::errors::TokenError;
use crate::domain::ports::TokenStoragePort;

/// Source of a resolved token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// The token file in the data directory.
    Storage,
    /// The `--token` flag or `DISCORD_TOKEN` environment variable.
    CommandLine,
}

/// A token together with where it came from.
#[derive(Debug, Clone)]
pub struct ResolvedToken {
    /// The validated token.
    pub token: BotToken,
    /// Where the token was found.
    pub source: TokenSource,
}

impl ResolvedToken {
    /// Creates a resolved token.
    #[must_use]
    pub const fn new(token: BotToken, source: TokenSource) -> Self {
        Self { token, source }
    }
}

/// Resolves the bot token from the available sources.
///
/// Priority: 1. stored token file, 2. command line / environment. A
/// command-line token is persisted so the next start finds it in storage.
pub struct ResolveTokenUseCase {
    storage_port: Arc<dyn TokenStoragePort>,
}

impl ResolveTokenUseCase {
    /// Creates the use case with the given storage backend.
    #[must_use]
    pub fn new(storage_port: Arc<dyn TokenStoragePort>) -> Self {
        Self { storage_port }
    }

    /// Attempts to resolve a token. Returns `Ok(None)` when no source
    /// provides a valid one.
    ///
    /// # Errors
    /// Returns an error only when storage itself fails; an absent or
    /// malformed token is not an error.
    pub async fn execute(
        &self,
        cli_token: Option<String>,
    ) -> Result<Option<ResolvedToken>, TokenError> {
        match self.storage_port.get_token().await {
            Ok(Some(token)) => {
                debug!("Token resolved from storage");
                return Ok(Some(ResolvedToken::new(token, TokenSource::Storage)));
            }
            Ok(None) => debug!("No token in storage"),
            Err(e) => warn!(error = %e, "Token storage unavailable"),
        }

        if let Some(raw) = cli_token.filter(|s| !s.trim().is_empty()) {
            if let Some(token) = BotToken::new(raw) {
                if let Err(e) = self.storage_port.store_token(&token).await {
                    warn!(error = %e, "Failed to persist command-line token");
                }
                debug!("Token resolved from command line");
                return Ok(Some(ResolvedToken::new(token, TokenSource::CommandLine)));
            }
            warn!("Command-line token has invalid format, ignoring");
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::mocks::MockTokenStorage;

    const VALID_TOKEN: &str =
        "MTIzNDU2Nzg5MDEyMzQ1Njc4.GhIjKl.MnOpQrStUvWxYz1234567890abcdefghijklmn";
    const OTHER_TOKEN: &str =
        "OTg3NjU0MzIxMDk4NzY1NDMy.AbCdEf.ZyXwVuTsRqPoNm0987654321zyxwvutsrqpo";

    #[tokio::test]
    async fn test_storage_token_wins_over_cli() {
        let storage = Arc::new(MockTokenStorage::with_token(
            BotToken::new(VALID_TOKEN).unwrap(),
        ));
        let use_case = ResolveTokenUseCase::new(storage);

        let resolved = use_case
            .execute(Some(OTHER_TOKEN.to_string()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(resolved.source, TokenSource::Storage);
        assert_eq!(resolved.token.as_str(), VALID_TOKEN);
    }

    #[tokio::test]
    async fn test_cli_token_used_and_persisted_when_storage_empty() {
        let storage = Arc::new(MockTokenStorage::new());
        let use_case = ResolveTokenUseCase::new(storage.clone());

        let resolved = use_case
            .execute(Some(VALID_TOKEN.to_string()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(resolved.source, TokenSource::CommandLine);
        let stored = storage.get_token().await.unwrap().unwrap();
        assert_eq!(stored.as_str(), VALID_TOKEN);
    }

    #[tokio::test]
    async fn test_invalid_cli_token_resolves_to_none() {
        let storage = Arc::new(MockTokenStorage::new());
        let use_case = ResolveTokenUseCase::new(storage.clone());

        let resolved = use_case.execute(Some("too-short".to_string())).await.unwrap();

        assert!(resolved.is_none());
        assert!(storage.get_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_no_sources_resolves_to_none() {
        let storage = Arc::new(MockTokenStorage::new());
        let use_case = ResolveTokenUseCase::new(storage);

        assert!(use_case.execute(None).await.unwrap().is_none());
    }
}
