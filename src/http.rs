//! Shared HTTP client construction and failure classification.

use crate::error::{PantryError, Result};
use reqwest::StatusCode;
use std::time::Duration;

/// Default timeout for remote requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Create an HTTP client with the configured timeout.
pub fn create_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("pantry/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| PantryError::Config(format!("failed to create HTTP client: {}", e)))
}

/// Map an unsuccessful HTTP status to the error taxonomy.
pub fn status_error(service: &str, status: StatusCode, message: impl Into<String>) -> PantryError {
    let message = message.into();
    let message = if message.trim().is_empty() {
        status.to_string()
    } else {
        message
    };

    match status.as_u16() {
        401 | 403 => PantryError::auth(service, message),
        429 => PantryError::rate_limited(service, message),
        502..=504 => PantryError::transient(service, message),
        _ => PantryError::remote(service, format!("{} ({})", message, status)),
    }
}

/// Map a transport-level failure to the error taxonomy.
pub fn transport_error(service: &str, err: &reqwest::Error) -> PantryError {
    if err.is_connect() || err.is_timeout() {
        return PantryError::transient(service, err.to_string());
    }
    if let Some(status) = err.status() {
        return status_error(service, status, err.to_string());
    }
    if err.is_decode() {
        return PantryError::remote(service, format!("malformed response: {}", err));
    }
    PantryError::remote(service, err.to_string())
}
