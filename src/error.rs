//! Error types for Pantry.

use thiserror::Error;

/// Library-level error type for Pantry operations.
#[derive(Error, Debug)]
pub enum PantryError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dataset format error: {0}")]
    DataFormat(String),

    #[error("{service} authentication failed: {message}")]
    AuthenticationFailed { service: String, message: String },

    #[error("{service} rate limit exceeded: {message}")]
    RateLimited { service: String, message: String },

    #[error("Could not reach {service}: {message}")]
    TransientConnection { service: String, message: String },

    #[error("{service} error: {message}")]
    Remote { service: String, message: String },

    #[error("Sync failed at batch {batch}/{total_batches}: {source}")]
    SyncFailure {
        batch: usize,
        total_batches: usize,
        #[source]
        source: Box<PantryError>,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// How a failure should be treated by the retry layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The remote service asked us to slow down.
    RateLimited,
    /// Connection refused, timed out, or the gateway was unavailable.
    TransientConnection,
    /// Credentials were rejected. Never retried.
    AuthenticationFailed,
    /// Anything else. Fatal by default.
    Other,
}

impl FailureClass {
    /// Whether an operation failing this way may succeed on a later attempt.
    pub fn is_retryable(self) -> bool {
        matches!(self, FailureClass::RateLimited | FailureClass::TransientConnection)
    }
}

impl PantryError {
    pub fn auth(service: impl Into<String>, message: impl Into<String>) -> Self {
        PantryError::AuthenticationFailed {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn rate_limited(service: impl Into<String>, message: impl Into<String>) -> Self {
        PantryError::RateLimited {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn transient(service: impl Into<String>, message: impl Into<String>) -> Self {
        PantryError::TransientConnection {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn remote(service: impl Into<String>, message: impl Into<String>) -> Self {
        PantryError::Remote {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Classify this error for retry decisions.
    pub fn failure_class(&self) -> FailureClass {
        match self {
            PantryError::RateLimited { .. } => FailureClass::RateLimited,
            PantryError::TransientConnection { .. } => FailureClass::TransientConnection,
            PantryError::AuthenticationFailed { .. } => FailureClass::AuthenticationFailed,
            PantryError::SyncFailure { source, .. } => source.failure_class(),
            _ => FailureClass::Other,
        }
    }

    /// Whether this error is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        self.failure_class().is_retryable()
    }
}

/// Result type alias for Pantry operations.
pub type Result<T> = std::result::Result<T, PantryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_classes() {
        assert_eq!(
            PantryError::rate_limited("groq", "slow down").failure_class(),
            FailureClass::RateLimited
        );
        assert!(PantryError::transient("upstash", "refused").is_retryable());
        assert!(!PantryError::auth("upstash", "bad token").is_retryable());
        assert!(!PantryError::DataFormat("broken".to_string()).is_retryable());
    }

    #[test]
    fn test_sync_failure_reports_batch() {
        let err = PantryError::SyncFailure {
            batch: 2,
            total_batches: 3,
            source: Box::new(PantryError::auth("upstash", "Invalid auth token")),
        };
        let msg = err.to_string();
        assert!(msg.contains("batch 2/3"));
        assert!(msg.contains("Invalid auth token"));
        assert_eq!(err.failure_class(), FailureClass::AuthenticationFailed);
    }
}
