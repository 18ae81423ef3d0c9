use std::time::Duration;

use thiserror::Error;

/// Status codes the upstream returns when it is overloaded or flaky.
pub const RETRYABLE_STATUS_CODES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Returns true if an HTTP status is worth retrying.
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUS_CODES.contains(&status)
}

/// Application-wide error types for TramTimes.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP client could not be built or the request could not be sent.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Upstream answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The circuit breaker rejected the call without touching the network.
    #[error("Circuit breaker '{name}' is open. Retry after {} seconds.", .retry_after.as_secs())]
    CircuitOpen { name: String, retry_after: Duration },

    /// Departure time text could not be parsed.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Stop identifier was blank.
    #[error("Invalid stop identifier: {0:?}")]
    InvalidStop(String),

    /// Configuration value missing or malformed.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Writing a schedule document failed.
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl AppError {
    /// Returns true if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NetworkError(_) | AppError::Timeout(_) => true,
            AppError::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    /// Returns true if this error should count against the circuit breaker.
    ///
    /// Same conditions as [`is_retryable`](Self::is_retryable): the breaker
    /// and the retry loop guard the same upstream failure modes.
    pub fn should_trip_circuit(&self) -> bool {
        self.is_retryable()
    }
}
