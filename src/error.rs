//! Error types for the cockpit gateway

use thiserror::Error;

/// Result type alias for cockpit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the cockpit gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Voice subsystem error
    #[error("voice error: {0}")]
    Voice(String),

    /// Assistant (language model) error
    #[error("assistant error: {0}")]
    Assistant(String),

    /// Places search error
    #[error("places error: {0}")]
    Places(String),

    /// Directions/routing error
    #[error("directions error: {0}")]
    Directions(String),

    /// Geolocation error
    #[error("geolocation error: {0}")]
    Geolocation(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl Error {
    /// Whether this error indicates a rate-limit/quota condition.
    ///
    /// Rate limits are the only class of assistant failure worth retrying:
    /// HTTP status 429, or an error message mentioning "429" or "quota".
    #[must_use]
    pub fn is_rate_limit(&self) -> bool {
        if let Self::Http(e) = self
            && e.status().is_some_and(|s| s.as_u16() == 429)
        {
            return true;
        }

        let message = self.to_string().to_lowercase();
        message.contains("429") || message.contains("quota")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_by_message_marker() {
        assert!(Error::Assistant("HTTP 429: too many requests".into()).is_rate_limit());
        assert!(Error::Assistant("Quota exceeded for model".into()).is_rate_limit());
    }

    #[test]
    fn non_rate_limit_errors() {
        assert!(!Error::Assistant("invalid API key".into()).is_rate_limit());
        assert!(!Error::Config("missing wake word".into()).is_rate_limit());
        assert!(!Error::Voice("recognizer gone".into()).is_rate_limit());
    }
}
