//! Error Types for Runtime Integrations

use sentinel_core::SentinelError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} API error: {message}")]
    Api {
        service: &'static str,
        message: String,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Delivery failed after {attempts} attempts: {last}")]
    Delivery {
        attempts: u32,
        last: Box<RuntimeError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RuntimeError {
    /// Check if the failure is transient and worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<RuntimeError> for SentinelError {
    fn from(err: RuntimeError) -> Self {
        Self::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        let status = |service, status| RuntimeError::Status {
            service,
            status,
            body: String::new(),
        };

        assert!(status("telegram", 429).is_retryable());
        assert!(status("binance", 503).is_retryable());
        assert!(!status("binance", 400).is_retryable());

        let rejected = RuntimeError::Api {
            service: "telegram",
            message: "chat not found".into(),
        };
        assert!(!rejected.is_retryable());
    }

    #[test]
    fn test_converts_to_transport_error() {
        let err: SentinelError = RuntimeError::Config("missing token".into()).into();
        assert!(matches!(err, SentinelError::Transport(msg) if msg.contains("missing token")));
    }
}
