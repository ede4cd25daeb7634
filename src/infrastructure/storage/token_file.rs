//! File-backed token storage.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::entities::BotToken;
use crate::domain::errors::TokenError;
use crate::domain::ports::TokenStoragePort;

const TOKEN_FILE_NAME: &str = "token";

/// Stores the bot token as a single line in the data directory.
///
/// The bot runs headless, so a plaintext file with restricted permissions
/// stands in for a desktop keyring.
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    /// Creates storage using `data_dir/token`.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: data_dir.into().join(TOKEN_FILE_NAME),
        }
    }

    /// The token file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenStoragePort for FileTokenStorage {
    async fn get_token(&self) -> Result<Option<BotToken>, TokenError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let trimmed = content.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                match BotToken::new(trimmed) {
                    Some(token) => {
                        debug!(path = %self.path.display(), "Token file found");
                        Ok(Some(token))
                    }
                    None => {
                        warn!(path = %self.path.display(), "Stored token has invalid format, ignoring");
                        Ok(None)
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TokenError::retrieval_failed(e.to_string())),
        }
    }

    async fn store_token(&self, token: &BotToken) -> Result<(), TokenError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TokenError::storage_failed(e.to_string()))?;
        }

        tokio::fs::write(&self.path, token.as_str())
            .await
            .map_err(|e| TokenError::storage_failed(e.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            if let Err(e) = tokio::fs::set_permissions(&self.path, perms).await {
                warn!(error = %e, "Failed to restrict token file permissions");
            }
        }

        debug!(path = %self.path.display(), "Token stored");
        Ok(())
    }
}

/// Asks for a token on stdin. Used once at first start when no other
/// source provides one.
///
/// # Errors
/// Returns an error if stdin or stdout is unavailable.
pub fn prompt_for_token() -> Result<Option<BotToken>, TokenError> {
    use std::io::Write as _;

    println!("Token not found. Paste the bot token and press enter.");
    print!("Paste token: ");
    std::io::stdout()
        .flush()
        .map_err(|e| TokenError::retrieval_failed(e.to_string()))?;

    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .map_err(|e| TokenError::retrieval_failed(e.to_string()))?;

    Ok(BotToken::new(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const VALID_TOKEN: &str =
        "MTIzNDU2Nzg5MDEyMzQ1Njc4.GhIjKl.MnOpQrStUvWxYz1234567890abcdefghijklmn";

    #[tokio::test]
    async fn test_store_and_get_roundtrip() {
        let dir = TempDir::new().unwrap();
        let storage = FileTokenStorage::new(dir.path());
        let token = BotToken::new(VALID_TOKEN).unwrap();

        storage.store_token(&token).await.unwrap();
        let loaded = storage.get_token().await.unwrap().unwrap();

        assert_eq!(loaded.as_str(), VALID_TOKEN);
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let storage = FileTokenStorage::new(dir.path());

        assert!(storage.get_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_content_is_ignored() {
        let dir = TempDir::new().unwrap();
        let storage = FileTokenStorage::new(dir.path());
        tokio::fs::write(storage.path(), "not-a-token\n").await.unwrap();

        assert!(storage.get_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_trailing_newline_is_tolerated() {
        let dir = TempDir::new().unwrap();
        let storage = FileTokenStorage::new(dir.path());
        tokio::fs::write(storage.path(), format!("{VALID_TOKEN}\n"))
            .await
            .unwrap();

        let loaded = storage.get_token().await.unwrap().unwrap();
        assert_eq!(loaded.as_str(), VALID_TOKEN);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_token_file_permissions_are_restricted() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let storage = FileTokenStorage::new(dir.path());
        let token = BotToken::new(VALID_TOKEN).unwrap();
        storage.store_token(&token).await.unwrap();

        let mode = tokio::fs::metadata(storage.path())
            .await
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
