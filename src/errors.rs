//! Error types for the SDG progress monitor
//!
//! Fetcher and cache failures propagate unchanged to the caller; the
//! progress evaluator never produces an error.

use thiserror::Error;

/// Main error type for the progress monitor
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MonitorError {
    /// Transient transport failure (timeout, connection reset, 5xx)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Remote source asked us to slow down
    #[error("Rate limited by remote source{}", retry_after_secs.map(|s| format!(" (retry after {}s)", s)).unwrap_or_default())]
    RateLimited { retry_after_secs: Option<u64> },

    /// Response parsed but does not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Non-retryable HTTP status other than 429
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Configuration or catalogue errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Goal id not present in the catalogue
    #[error("Unknown goal: {0}")]
    UnknownGoal(u8),

    /// Indicator code not present in the catalogue
    #[error("Unknown indicator: {0}")]
    UnknownIndicator(String),

    /// Not a three-letter ISO country code
    #[error("Invalid ISO3 country code: {0:?}")]
    InvalidCountry(String),

    /// Year range with start after end
    #[error("Invalid year range {start}..={end}")]
    InvalidYearRange { start: i32, end: i32 },

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(String),
}

impl MonitorError {
    /// Whether a retry of the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, MonitorError::NetworkError(_))
    }
}

impl From<std::io::Error> for MonitorError {
    fn from(err: std::io::Error) -> Self {
        MonitorError::IoError(err.to_string())
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MonitorError::NetworkError(format!("request timed out: {}", err))
        } else if err.is_decode() {
            MonitorError::MalformedResponse(err.to_string())
        } else {
            MonitorError::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        MonitorError::MalformedResponse(err.to_string())
    }
}

/// Result type alias for monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MonitorError::HttpStatus {
            status: 404,
            body: "not found".to_string(),
        };
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_rate_limited_display() {
        let err = MonitorError::RateLimited { retry_after_secs: Some(12) };
        assert!(err.to_string().contains("retry after 12s"));

        let err = MonitorError::RateLimited { retry_after_secs: None };
        assert_eq!(err.to_string(), "Rate limited by remote source");
    }

    #[test]
    fn test_only_network_errors_are_transient() {
        assert!(MonitorError::NetworkError("reset".to_string()).is_transient());
        assert!(!MonitorError::RateLimited { retry_after_secs: None }.is_transient());
        assert!(!MonitorError::MalformedResponse("x".to_string()).is_transient());
        assert!(!MonitorError::HttpStatus { status: 400, body: String::new() }.is_transient());
    }

    #[test]
    fn test_json_error_is_malformed() {
        let err: MonitorError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, MonitorError::MalformedResponse(_)));
    }
}
