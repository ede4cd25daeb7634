//! Bot token entity with validation and masking.

/// Minimum plausible length for a Discord bot token.
const MIN_TOKEN_LENGTH: usize = 50;

/// A validated Discord bot token.
///
/// Never printed in full; `Debug` and `Display` both mask the value.
#[derive(Clone, PartialEq, Eq)]
pub struct BotToken {
    value: String,
}

impl BotToken {
    /// Creates a token after basic format validation.
    ///
    /// Bot tokens are three dot-separated base64 segments. Returns `None`
    /// if the input doesn't look like one.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.len() < MIN_TOKEN_LENGTH {
            return None;
        }

        let segments: Vec<&str> = trimmed.split('.').collect();
        if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
            return None;
        }

        Some(Self {
            value: trimmed.to_string(),
        })
    }

    /// Creates a token without validation. Only for values that were
    /// validated before being stored.
    #[must_use]
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Returns the raw token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Consumes the token and returns the raw value.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.value
    }

    /// Returns the `Authorization` header value for bot requests.
    #[must_use]
    pub fn authorization(&self) -> String {
        format!("Bot {}", self.value)
    }

    /// Returns a masked form safe for logs.
    #[must_use]
    pub fn masked(&self) -> String {
        if self.value.len() <= 10 {
            return "*".repeat(self.value.len());
        }
        format!(
            "{}...{}",
            &self.value[..4],
            &self.value[self.value.len() - 4..]
        )
    }
}

impl std::fmt::Debug for BotToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotToken")
            .field("value", &self.masked())
            .finish()
    }
}

impl std::fmt::Display for BotToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.masked())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_TOKEN: &str =
        "MTIzNDU2Nzg5MDEyMzQ1Njc4.GhIjKl.MnOpQrStUvWxYz1234567890abcdefghijklmn";

    #[test]
    fn test_accepts_valid_token() {
        let token = BotToken::new(VALID_TOKEN).unwrap();
        assert_eq!(token.as_str(), VALID_TOKEN);
    }

    #[test]
    fn test_trims_whitespace() {
        let token = BotToken::new(format!("  {VALID_TOKEN}\n")).unwrap();
        assert_eq!(token.as_str(), VALID_TOKEN);
    }

    #[test]
    fn test_rejects_short_token() {
        assert!(BotToken::new("abc.def.ghi").is_none());
    }

    #[test]
    fn test_rejects_wrong_segment_count() {
        let two_segments = "a".repeat(40) + "." + &"b".repeat(40);
        assert!(BotToken::new(two_segments).is_none());
    }

    #[test]
    fn test_authorization_header_has_bot_prefix() {
        let token = BotToken::new(VALID_TOKEN).unwrap();
        assert_eq!(token.authorization(), format!("Bot {VALID_TOKEN}"));
    }

    #[test]
    fn test_masked_keeps_edges_only() {
        let token = BotToken::new(VALID_TOKEN).unwrap();
        let masked = token.masked();
        assert!(masked.starts_with(&VALID_TOKEN[..4]));
        assert!(masked.ends_with(&VALID_TOKEN[VALID_TOKEN.len() - 4..]));
        assert!(masked.contains("..."));
        assert!(masked.len() < VALID_TOKEN.len());
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let token = BotToken::new(VALID_TOKEN).unwrap();
        let debug = format!("{token:?}");
        assert!(!debug.contains(VALID_TOKEN));
    }
}
